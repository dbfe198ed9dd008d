use crate::state::AppState;
use event_store::CLEANUP_GRACE;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const CLEANUP_TICK: Duration = Duration::from_secs(5);

pub async fn run(state: AppState, shutdown: CancellationToken) {
    let repositories = state.watchlist.to_vec();
    let mut ticker = tokio::time::interval(CLEANUP_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = event_store::cleanup::sweep_once(&state.store, &repositories, CLEANUP_GRACE, chrono::Utc::now()).await;
                if removed > 0 {
                    debug!(removed, "cleanup sweep removed relayed events past grace period");
                }
            }
            _ = shutdown.cancelled() => {
                debug!("cleanup loop shutting down");
                return;
            }
        }
    }
}
