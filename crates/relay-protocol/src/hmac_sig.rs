//! HMAC-SHA256 webhook signature verification (`X-Hub-Signature-256`).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header is empty")]
    EmptyHeader,
    #[error("signature header is malformed, expected 'sha256=<hex>'")]
    Malformed,
    #[error("signature does not match")]
    Mismatch,
}

/// Verify `received` (the raw `X-Hub-Signature-256` header value) against the
/// HMAC-SHA256 of `body` keyed by `secret`.
///
/// Per `spec.md` §4.2 / §8 invariant 5: acceptance requires
/// `"sha256=" + hex(HMAC-SHA256(secret, body))` to equal `received`
/// byte-for-byte. The comparison itself runs in constant time over the
/// decoded digest bytes to avoid leaking timing information about how many
/// leading bytes matched.
pub fn verify_signature(secret: &[u8], body: &[u8], received: &str) -> Result<(), SignatureError> {
    if received.is_empty() {
        return Err(SignatureError::EmptyHeader);
    }
    let hex_digest = received
        .strip_prefix("sha256=")
        .ok_or(SignatureError::Malformed)?;
    let received_bytes = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    let expected_bytes = mac.finalize().into_bytes();

    if expected_bytes.len() != received_bytes.len()
        || expected_bytes.as_slice().ct_eq(&received_bytes).unwrap_u8() == 0
    {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

/// Compute the `sha256=<hex>` signature string for `body` keyed by `secret`.
/// Used by tests and by the relay client's local re-validation path.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_correctly_signed_body() {
        let secret = b"k";
        let body = br#"{"x":1}"#;
        let sig = sign(secret, body);
        assert!(verify_signature(secret, body, &sig).is_ok());
    }

    #[test]
    fn rejects_a_tampered_signature() {
        let secret = b"k";
        let body = br#"{"x":1}"#;
        assert!(matches!(
            verify_signature(secret, body, "sha256=deadbeef"),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn rejects_an_empty_header() {
        assert!(matches!(
            verify_signature(b"k", b"body", ""),
            Err(SignatureError::EmptyHeader)
        ));
    }

    #[test]
    fn rejects_a_malformed_header() {
        assert!(matches!(
            verify_signature(b"k", b"body", "not-a-signature"),
            Err(SignatureError::Malformed)
        ));
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let body = br#"{"x":1}"#;
        let sig = sign(b"right-secret", body);
        assert!(matches!(
            verify_signature(b"wrong-secret", body, &sig),
            Err(SignatureError::Mismatch)
        ));
    }
}
