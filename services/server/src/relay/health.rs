use relay_engine::{RelayStatus, RelayTarget, SharedRelayStatus};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub async fn run(target: RelayTarget, shutdown: CancellationToken) {
    let status: SharedRelayStatus = Arc::new(RwLock::new(RelayStatus::default()));
    relay_engine::health::run_health_loop(target, status, shutdown).await;
}
