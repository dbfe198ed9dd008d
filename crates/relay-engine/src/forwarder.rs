//! C6's forwarder loop: pushes not-yet-relayed events to a configured
//! upstream sink over gRPC or HTTP (spec.md §4.5).

use crate::config::{RelayTarget, Transport};
use chrono::Utc;
use event_store::{EventStore, RepositoryId};
use relay_protocol::proto::webhook_relay_client::WebhookRelayClient;
use relay_protocol::proto::WebhookEventPushRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const FORWARD_TICK: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("dial failed: {0}")]
    Dial(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Forward every `is_relayed=false` event across all watched repositories,
/// one snapshot per repository, and flip the flag on delivered ones.
///
/// A slow or unreachable target must not block other repositories beyond
/// this single tick (spec.md §4.5) — each repository's forward attempt is
/// independent and errors are logged, never propagated to the caller.
pub async fn forward_tick(
    store: &Arc<dyn EventStore>,
    repositories: impl IntoIterator<Item = &RepositoryId>,
    target: &RelayTarget,
    client_id: &str,
) {
    for repository_id in repositories {
        if let Err(e) = forward_repository(store, repository_id, target, client_id).await {
            warn!(repository_id, error = %e, "forwarder tick failed for repository");
        }
    }
}

async fn forward_repository(
    store: &Arc<dyn EventStore>,
    repository_id: &RepositoryId,
    target: &RelayTarget,
    client_id: &str,
) -> Result<(), ForwardError> {
    let events = store
        .retrieve(repository_id)
        .await
        .map_err(|e| ForwardError::Transport(e.to_string()))?;
    let pending: Vec<_> = events.into_iter().filter(|e| !e.is_relayed).collect();
    if pending.is_empty() {
        return Ok(());
    }

    match target.transport {
        Transport::Grpc => forward_via_grpc(store, repository_id, &pending, target, client_id).await,
        Transport::Http | Transport::Https => forward_via_http(store, repository_id, &pending, target).await,
    }
}

async fn forward_via_grpc(
    store: &Arc<dyn EventStore>,
    repository_id: &RepositoryId,
    pending: &[relay_protocol::CanonicalEvent],
    target: &RelayTarget,
    client_id: &str,
) -> Result<(), ForwardError> {
    let mut client = WebhookRelayClient::connect(target.grpc_endpoint())
        .await
        .map_err(|e| ForwardError::Dial(e.to_string()))?;

    for event in pending {
        let request = WebhookEventPushRequest {
            client_id: client_id.to_owned(),
            repository_id: repository_id.clone(),
            webhook_event: Some(event.to_wire()),
        };
        match client.webhook_event_push(request).await {
            Ok(_) => {
                let _ = store.mark_relayed(repository_id, &event.event_id, Utc::now()).await;
                debug!(repository_id, event_id = %event.event_id, "forwarded via grpc");
            }
            Err(e) => warn!(repository_id, event_id = %event.event_id, error = %e, "grpc push failed, will retry next tick"),
        }
    }
    Ok(())
}

async fn forward_via_http(
    store: &Arc<dyn EventStore>,
    repository_id: &RepositoryId,
    pending: &[relay_protocol::CanonicalEvent],
    target: &RelayTarget,
) -> Result<(), ForwardError> {
    let client = reqwest::Client::new();
    let endpoint = target.http_endpoint();

    for event in pending {
        let mut request = client.post(&endpoint).body(event.body.clone());
        for header in &event.headers {
            request = request.header(header.name.clone(), header.value.clone());
        }
        match request.send().await {
            Ok(response) if response.status().is_success() => {
                let _ = store.mark_relayed(repository_id, &event.event_id, Utc::now()).await;
                debug!(repository_id, event_id = %event.event_id, "forwarded via http");
            }
            Ok(response) => {
                warn!(repository_id, event_id = %event.event_id, status = %response.status(), "http relay target rejected event, will retry next tick");
            }
            Err(e) => warn!(repository_id, event_id = %event.event_id, error = %e, "http relay request failed, will retry next tick"),
        }
    }
    Ok(())
}

/// Run the forwarder tick on a fixed interval until `shutdown` fires.
pub async fn run_forwarder_loop(
    store: Arc<dyn EventStore>,
    repositories: Vec<RepositoryId>,
    target: RelayTarget,
    client_id: String,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(FORWARD_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                forward_tick(&store, &repositories, &target, &client_id).await;
            }
            _ = shutdown.cancelled() => {
                debug!("forwarder loop shutting down");
                return;
            }
        }
    }
}
