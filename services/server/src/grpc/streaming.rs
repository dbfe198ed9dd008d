//! C4 — the bounded-duration streaming pull service (spec.md §4.3).

use crate::state::AppState;
use chrono::Utc;
use futures_util::Stream;
use relay_protocol::proto::{FetchWebhookEventsRequest, FetchWebhookEventsResponse};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::debug;

pub const RESPONSE_INTERVAL: Duration = Duration::from_secs(5);

pub async fn fetch_webhook_events(
    state: &AppState,
    shutdown: CancellationToken,
    request: Request<FetchWebhookEventsRequest>,
) -> Result<Response<Pin<Box<dyn Stream<Item = Result<FetchWebhookEventsResponse, Status>> + Send>>>, Status> {
    let request = request.into_inner();
    if !state.watchlist.contains(&request.repository_id) {
        return Err(Status::not_found(format!("repository {} is not watched", request.repository_id)));
    }

    let deadline = Duration::from_secs(request.duration_secs as u64);
    let (tx, rx) = mpsc::channel(4);
    let state = state.clone();

    tokio::spawn(async move {
        run_stream(state, request.repository_id, deadline, shutdown, tx).await;
    });

    let stream: Pin<Box<dyn Stream<Item = Result<FetchWebhookEventsResponse, Status>> + Send>> =
        Box::pin(ReceiverStream::new(rx));
    Ok(Response::new(stream))
}

async fn run_stream(
    state: AppState,
    repository_id: String,
    deadline: Duration,
    shutdown: CancellationToken,
    tx: mpsc::Sender<Result<FetchWebhookEventsResponse, Status>>,
) {
    let deadline_sleep = tokio::time::sleep(deadline);
    tokio::pin!(deadline_sleep);
    let mut ticker = tokio::time::interval(RESPONSE_INTERVAL);
    // durationSecs=0 closes immediately without sending (spec.md §8 boundary).
    if deadline.is_zero() {
        return;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match send_batch(&state, &repository_id, &tx).await {
                    Ok(true) => {}
                    Ok(false) => return,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
            () = &mut deadline_sleep => {
                debug!(repository_id, "stream duration elapsed, closing");
                return;
            }
            _ = shutdown.cancelled() => {
                debug!(repository_id, "shutdown signal, closing stream");
                return;
            }
            _ = tx.closed() => {
                debug!(repository_id, "peer disconnected, closing stream");
                return;
            }
        }
    }
}

/// Produce and send one batch. Returns `Ok(false)` if the receiver has gone
/// away (caller should stop), `Ok(true)` on a normal send, or `Err` if the
/// store itself failed.
async fn send_batch(
    state: &AppState,
    repository_id: &str,
    tx: &mpsc::Sender<Result<FetchWebhookEventsResponse, Status>>,
) -> Result<bool, Status> {
    let events = state
        .store
        .retrieve(&repository_id.to_owned())
        .await
        .map_err(|e| Status::unavailable(e.to_string()))?;

    let pending: Vec<_> = events.into_iter().filter(|e| !e.is_relayed).collect();
    let batch = FetchWebhookEventsResponse { webhook_events: pending.iter().map(|e| e.to_wire()).collect() };

    if tx.send(Ok(batch)).await.is_err() {
        return Ok(false);
    }

    let now = Utc::now();
    for event in &pending {
        let _ = state.store.mark_relayed(&repository_id.to_owned(), &event.event_id, now).await;
    }
    Ok(true)
}
