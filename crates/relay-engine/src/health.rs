//! C6's health loop: periodically probes the relay target and records
//! [`RelayStatus`]. A failing probe is observability only — it never pauses
//! the forwarder (spec.md §4.5).

use crate::config::{RelayTarget, Transport};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const HEALTH_TICK: Duration = Duration::from_secs(60);

/// Literal shape of the `original_source` synthetic ping body, reused
/// verbatim as the HTTP relay target's health probe payload.
const SYNTHETIC_PING_BODY: &str = r#"{"zen":"Non-blocking is better than blocking.","repository":{"id":0}}"#;

#[derive(Debug, Clone, Default)]
pub struct RelayStatus {
    pub last_check_ok: bool,
    pub consecutive_failures: u32,
    pub last_check_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

pub type SharedRelayStatus = Arc<RwLock<RelayStatus>>;

pub async fn probe(target: &RelayTarget) -> bool {
    match target.transport {
        Transport::Grpc => probe_grpc(target).await,
        Transport::Http | Transport::Https => probe_http(target).await,
    }
}

async fn probe_grpc(target: &RelayTarget) -> bool {
    use tonic_health::pb::health_client::HealthClient;
    use tonic_health::pb::HealthCheckRequest;
    use tonic_health::pb::health_check_response::ServingStatus;

    let Ok(endpoint) = tonic::transport::Endpoint::from_shared(target.grpc_endpoint()) else {
        return false;
    };
    let channel = endpoint.connect_lazy();
    let mut client = HealthClient::new(channel);
    match client.check(HealthCheckRequest { service: String::new() }).await {
        Ok(response) => response.into_inner().status == ServingStatus::Serving as i32,
        Err(_) => false,
    }
}

async fn probe_http(target: &RelayTarget) -> bool {
    let client = reqwest::Client::new();
    match client
        .post(target.http_health_endpoint())
        .header("content-type", "application/json")
        .body(SYNTHETIC_PING_BODY)
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

async fn run_probe(target: &RelayTarget, status: &SharedRelayStatus) {
    let ok = probe(target).await;
    let now = Utc::now();
    let mut status = status.write().await;
    status.last_check_ok = ok;
    status.last_check_at = Some(now);
    if ok {
        status.consecutive_failures = 0;
    } else {
        status.consecutive_failures += 1;
        status.last_failure_at = Some(now);
    }
}

pub async fn run_health_loop(target: RelayTarget, status: SharedRelayStatus, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(HEALTH_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_probe(&target, &status).await;
            }
            _ = shutdown.cancelled() => {
                debug!("health loop shutting down");
                return;
            }
        }
    }
}
