//! Server-node configuration: CLI flags (spec.md §6) with environment
//! fallbacks for the ambient collaborators (`OAUTH_TOKEN`, `SENTRY_DSN`,
//! `OTEL_*`, `HOSTNAME`), read once at startup into a typed struct the rest
//! of the binary is handed by value.

use clap::Parser;
use event_store::Watchlist;
use relay_engine::config::{RelayTarget, Transport};
use std::net::SocketAddr;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gitstafette-server", version, about = "Webhook relay fabric server node")]
pub struct Cli {
    #[arg(long = "port", default_value_t = 8080)]
    pub port: u16,

    #[arg(long = "grpcPort", default_value_t = 9090)]
    pub grpc_port: u16,

    #[arg(long = "grpcHealthPort")]
    pub grpc_health_port: Option<u16>,

    /// Comma-separated repository ids this node accepts events for.
    #[arg(long = "repositories")]
    pub repositories: String,

    #[arg(long = "relayEnabled", default_value_t = false)]
    pub relay_enabled: bool,

    #[arg(long = "relayHost")]
    pub relay_host: Option<String>,

    #[arg(long = "relayPort")]
    pub relay_port: Option<u16>,

    #[arg(long = "relayPath", default_value = "/v1/github/")]
    pub relay_path: String,

    #[arg(long = "relayHealthCheckPath", default_value = "/")]
    pub relay_health_check_path: String,

    #[arg(long = "relayProtocol", default_value = "grpc")]
    pub relay_protocol: String,

    #[arg(long = "relayInsecure", default_value_t = false)]
    pub relay_insecure: bool,

    #[arg(long = "caFileLocation")]
    pub ca_file_location: Option<String>,

    #[arg(long = "certFileLocation")]
    pub cert_file_location: Option<String>,

    #[arg(long = "certKeyFileLocation")]
    pub cert_key_file_location: Option<String>,

    /// HMAC secret for `X-Hub-Signature-256` verification; unset disables
    /// signature verification (spec.md §4.2 step 2).
    #[arg(long = "webhookHMAC")]
    pub webhook_hmac: Option<String>,

    #[arg(long = "redisHost")]
    pub redis_host: Option<String>,

    #[arg(long = "redisPort", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long = "redisPassword")]
    pub redis_password: Option<String>,

    #[arg(long = "redisDatabase", default_value_t = 0)]
    pub redis_database: u8,

    /// Bearer token gating streaming RPCs (C7); falls back to `OAUTH_TOKEN`.
    #[arg(long = "oauthToken", env = "OAUTH_TOKEN")]
    pub oauth_token: Option<String>,

    #[arg(long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    #[arg(long, env = "OTEL_ENABLED", default_value_t = false)]
    pub otel_enabled: bool,

    #[arg(long, env = "OTEL_HOSTNAME")]
    pub otel_hostname: Option<String>,

    #[arg(long, env = "OTEL_PORT")]
    pub otel_port: Option<u16>,

    #[arg(long, env = "OTEL_PROTOCOL")]
    pub otel_protocol: Option<String>,

    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "gitstafette-server")]
    pub otel_service_name: String,

    #[arg(long, env = "HOSTNAME", default_value = "unknown")]
    pub hostname: String,

    /// This node's id, presented as `clientId` when it forwards events
    /// upstream (spec.md §4.5).
    #[arg(long = "clientId", default_value = "gitstafette-server")]
    pub client_id: String,
}

impl Cli {
    pub fn http_bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn grpc_bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.grpc_port))
    }

    pub fn grpc_health_bind_addr(&self) -> Option<SocketAddr> {
        self.grpc_health_port.map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Parse the watchlist, aborting the process on the configuration-fatal
    /// empty-list error (spec.md §4.7, §7).
    pub fn watchlist(&self) -> Watchlist {
        Watchlist::parse(&self.repositories).unwrap_or_else(|e| {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        })
    }

    pub fn redis_url(&self) -> Option<String> {
        let host = self.redis_host.as_ref()?;
        let auth = self
            .redis_password
            .as_ref()
            .map(|p| format!(":{p}@"))
            .unwrap_or_default();
        Some(format!("redis://{auth}{host}:{}/{}", self.redis_port, self.redis_database))
    }

    pub fn relay_target(&self) -> Option<RelayTarget> {
        if !self.relay_enabled {
            return None;
        }
        let host = self.relay_host.clone()?;
        let transport = Transport::parse(&self.relay_protocol).unwrap_or_else(|| {
            eprintln!("FATAL: --relayProtocol must be one of grpc, http, https");
            std::process::exit(1);
        });
        let port = self.relay_port.unwrap_or(match transport {
            Transport::Grpc => 9090,
            Transport::Https => 443,
            Transport::Http => 80,
        });
        Some(RelayTarget {
            transport,
            host,
            port,
            path: self.relay_path.clone(),
            health_check_path: self.relay_health_check_path.clone(),
            insecure: self.relay_insecure,
        })
    }

    /// Log the telemetry/error-reporting knobs as configured-but-unwired
    /// (spec.md §1 non-goal: the exporter/adapter itself is not implemented).
    pub fn log_unwired_telemetry(&self) {
        info!(
            otel_enabled = self.otel_enabled,
            sentry_configured = self.sentry_dsn.is_some(),
            "telemetry exporter and error-reporter adapter are configured but not wired in this build"
        );
    }
}
