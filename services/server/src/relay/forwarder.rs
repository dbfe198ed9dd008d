use crate::state::AppState;
use relay_engine::RelayTarget;
use tokio_util::sync::CancellationToken;

pub async fn run(state: AppState, client_id: String, target: RelayTarget, shutdown: CancellationToken) {
    let repositories = state.watchlist.to_vec();
    relay_engine::forwarder::run_forwarder_loop(state.store, repositories, target, client_id, shutdown).await;
}
