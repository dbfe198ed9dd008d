//! C8 — the reconnecting stream client (spec.md §4.8).

use chrono::Utc;
use event_store::{EventStore, RepositoryId};
use relay_protocol::proto::webhook_relay_client::WebhookRelayClient;
use relay_protocol::proto::FetchWebhookEventsRequest;
use relay_protocol::{verify_signature, CanonicalEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{debug, info, warn};

pub const REQUEST_INTERVAL: Duration = Duration::from_secs(5);
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    #[error("dial failed: {0}")]
    Dial(String),
    #[error("open stream failed: {0}")]
    OpenStream(String),
}

#[derive(Clone)]
pub struct StreamClientConfig {
    pub upstream_endpoint: String,
    pub client_id: String,
    pub repository_id: RepositoryId,
    pub duration_secs: u32,
    pub auth_token: Option<String>,
    pub hmac_secret: Option<Vec<u8>>,
}

/// Outer dial/open loop: connect, run the inner receive loop until it
/// reports EOF or error, sleep the fixed backoff, then reconnect. Returns
/// when `shutdown` fires.
pub async fn run(store: Arc<dyn EventStore>, config: StreamClientConfig, shutdown: CancellationToken) {
    loop {
        if shutdown.is_cancelled() {
            return;
        }

        match open_and_drain(&store, &config, &shutdown).await {
            Ok(()) => debug!(repository_id = %config.repository_id, "stream ended, reconnecting"),
            Err(e) => warn!(repository_id = %config.repository_id, error = %e, "stream client error, reconnecting"),
        }

        if shutdown.is_cancelled() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_BACKOFF) => {}
            _ = shutdown.cancelled() => return,
        }
    }
}

/// Run a single fetch-and-print cycle: open the stream, drain exactly one
/// `durationSecs` window, then return without reconnecting.
pub async fn run_once(store: Arc<dyn EventStore>, config: StreamClientConfig) -> Result<(), StreamClientError> {
    open_and_drain(&store, &config, &CancellationToken::new()).await
}

async fn open_and_drain(
    store: &Arc<dyn EventStore>,
    config: &StreamClientConfig,
    shutdown: &CancellationToken,
) -> Result<(), StreamClientError> {
    let channel = Channel::from_shared(config.upstream_endpoint.clone())
        .map_err(|e| StreamClientError::Dial(e.to_string()))?
        .connect()
        .await
        .map_err(|e| StreamClientError::Dial(e.to_string()))?;

    let mut client = WebhookRelayClient::new(channel);
    let mut request = Request::new(FetchWebhookEventsRequest {
        client_id: config.client_id.clone(),
        repository_id: config.repository_id.clone(),
        last_received_event_id: String::new(),
        duration_secs: config.duration_secs,
    });
    if let Some(token) = &config.auth_token {
        let value = format!("Bearer {token}").parse().map_err(|_| StreamClientError::OpenStream("invalid token".to_owned()))?;
        request.metadata_mut().insert("authorization", value);
    }

    let mut stream = client
        .fetch_webhook_events(request)
        .await
        .map_err(|e| StreamClientError::OpenStream(e.to_string()))?
        .into_inner();

    info!(repository_id = %config.repository_id, "stream opened");

    loop {
        tokio::select! {
            received = tokio::time::timeout(REQUEST_INTERVAL, stream.message()) => {
                match received {
                    Ok(Ok(Some(batch))) => store_batch(store, config, batch).await,
                    Ok(Ok(None)) => return Ok(()), // EOF: server closed cleanly, reconnect.
                    Ok(Err(status)) => return Err(StreamClientError::OpenStream(status.to_string())),
                    Err(_elapsed) => {} // no batch within this tick; keep waiting.
                }
            }
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}

async fn store_batch(
    store: &Arc<dyn EventStore>,
    config: &StreamClientConfig,
    batch: relay_protocol::proto::FetchWebhookEventsResponse,
) {
    for wire_event in batch.webhook_events {
        if let Some(secret) = &config.hmac_secret {
            let signature = wire_event
                .headers
                .iter()
                .find(|h| h.name == "X-Hub-Signature-256")
                .map(|h| h.value.as_str())
                .unwrap_or("");
            if verify_signature(secret, &wire_event.body, signature).is_err() {
                warn!(event_id = %wire_event.event_id, "local signature re-validation failed, dropping event");
                continue;
            }
        }

        let event = CanonicalEvent::from_wire(wire_event, Utc::now());
        match store.store(&config.repository_id, event).await {
            Ok(_) => {}
            Err(e) => warn!(repository_id = %config.repository_id, error = %e, "local store failed"),
        }
    }
}
