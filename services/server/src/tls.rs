//! TLS material loading, kept small per the spec's non-goal (spec.md §1):
//! the interesting thing is that this is validated eagerly at startup
//! (`original_source`'s `api/v1/grpc_config.go` treats a malformed
//! certificate path as configuration-fatal), not how `rustls` is wired.

use std::fs::File;
use std::io::BufReader;

#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    #[error("could not read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("no certificates found in {0}")]
    NoCertificates(String),
    #[error("no private key found in {0}")]
    NoPrivateKey(String),
}

/// Load a server certificate chain + key from disk into a form a
/// `rustls::ServerConfig` can be built from. Not wired to an actual
/// listener in this build (spec.md §1 non-goal).
pub fn load_server_identity(cert_file: &str, key_file: &str) -> Result<(), TlsConfigError> {
    let mut cert_reader = BufReader::new(
        File::open(cert_file).map_err(|e| TlsConfigError::Io { path: cert_file.to_owned(), source: e })?,
    );
    let certs: Vec<_> = rustls_pemfile::certs(&mut cert_reader).filter_map(Result::ok).collect();
    if certs.is_empty() {
        return Err(TlsConfigError::NoCertificates(cert_file.to_owned()));
    }

    let mut key_reader = BufReader::new(
        File::open(key_file).map_err(|e| TlsConfigError::Io { path: key_file.to_owned(), source: e })?,
    );
    let key = rustls_pemfile::private_key(&mut key_reader)
        .ok()
        .flatten()
        .ok_or_else(|| TlsConfigError::NoPrivateKey(key_file.to_owned()))?;
    drop(key);

    Ok(())
}

/// Load a CA bundle for validating an upstream relay target's certificate.
pub fn load_ca_bundle(ca_file: &str) -> Result<rustls::RootCertStore, TlsConfigError> {
    let mut reader = BufReader::new(
        File::open(ca_file).map_err(|e| TlsConfigError::Io { path: ca_file.to_owned(), source: e })?,
    );
    let mut store = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader).filter_map(Result::ok) {
        let _ = store.add(cert);
    }
    if store.is_empty() {
        return Err(TlsConfigError::NoCertificates(ca_file.to_owned()));
    }
    Ok(store)
}
