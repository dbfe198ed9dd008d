//! Relay Client configuration: CLI flags shared with the server node
//! (spec.md §6), plus the client-only `--streamWindow`/`--clientId`/`--once`.

use clap::Parser;
use relay_engine::config::{RelayTarget, Transport};
use std::net::SocketAddr;

#[derive(Debug, Parser)]
#[command(name = "gitstafette-relay-client", version, about = "Webhook relay fabric client node")]
pub struct Cli {
    /// `host:port` of the upstream server's gRPC service.
    #[arg(long = "upstream")]
    pub upstream: String,

    #[arg(long = "port", default_value_t = 8081)]
    pub port: u16,

    #[arg(long = "repositories")]
    pub repositories: String,

    /// Seconds per pull cycle (`durationSecs` on `FetchWebhookEvents`).
    #[arg(long = "streamWindow", default_value_t = 60)]
    pub stream_window: u32,

    #[arg(long = "clientId", default_value = "gitstafette-relay-client")]
    pub client_id: String,

    /// Local re-validation secret; events failing this check are dropped
    /// rather than cached, same disposition as ingress signature failure.
    #[arg(long = "webhookHMAC")]
    pub webhook_hmac: Option<String>,

    #[arg(long = "caFileLocation")]
    pub ca_file_location: Option<String>,

    #[arg(long = "relayInsecure", default_value_t = false)]
    pub relay_insecure: bool,

    /// Bearer token presented to the upstream's auth interceptor (C7);
    /// falls back to `OAUTH_TOKEN`.
    #[arg(long = "oauthToken", env = "OAUTH_TOKEN")]
    pub oauth_token: Option<String>,

    #[arg(long, env = "HOSTNAME", default_value = "unknown")]
    pub hostname: String,

    /// Perform a single fetch-and-print cycle instead of looping forever —
    /// an operator smoke-test analogous to `original_source`'s
    /// `cmd/test-client/main.go` (`SPEC_FULL.md` §4).
    #[arg(long = "once", default_value_t = false)]
    pub once: bool,

    /// Forward-to-sink: re-relay pulled events to a second downstream node
    /// instead of only re-exposing them locally (`SPEC_FULL.md`'s
    /// `services/relay-client` "optional forward-to-sink" scope). Shares
    /// C6's forwarder/health loops with the server node via `relay-engine`.
    #[arg(long = "sinkEnabled", default_value_t = false)]
    pub sink_enabled: bool,

    #[arg(long = "sinkHost")]
    pub sink_host: Option<String>,

    #[arg(long = "sinkPort")]
    pub sink_port: Option<u16>,

    #[arg(long = "sinkPath", default_value = "/v1/github/")]
    pub sink_path: String,

    #[arg(long = "sinkHealthCheckPath", default_value = "/")]
    pub sink_health_check_path: String,

    #[arg(long = "sinkProtocol", default_value = "grpc")]
    pub sink_protocol: String,

    #[arg(long = "sinkInsecure", default_value_t = false)]
    pub sink_insecure: bool,
}

impl Cli {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn upstream_endpoint(&self) -> String {
        let scheme = if self.relay_insecure { "http" } else { "https" };
        format!("{scheme}://{}", self.upstream)
    }

    /// Parse the forward-to-sink target, aborting the process if
    /// `--sinkEnabled` is set without a `--sinkHost` or with an unrecognized
    /// `--sinkProtocol` (same fatal-config posture as the server's relay
    /// target, spec.md §4.7).
    pub fn sink_target(&self) -> Option<RelayTarget> {
        if !self.sink_enabled {
            return None;
        }
        let host = self.sink_host.clone().unwrap_or_else(|| {
            eprintln!("FATAL: --sinkEnabled requires --sinkHost");
            std::process::exit(1);
        });
        let transport = Transport::parse(&self.sink_protocol).unwrap_or_else(|| {
            eprintln!("FATAL: --sinkProtocol must be one of grpc, http, https");
            std::process::exit(1);
        });
        let port = self.sink_port.unwrap_or(match transport {
            Transport::Grpc => 9090,
            Transport::Https => 443,
            Transport::Http => 80,
        });
        Some(RelayTarget {
            transport,
            host,
            port,
            path: self.sink_path.clone(),
            health_check_path: self.sink_health_check_path.clone(),
            insecure: self.sink_insecure,
        })
    }
}
