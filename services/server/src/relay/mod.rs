pub mod cleanup;
pub mod forwarder;
pub mod health;

use crate::state::AppState;
use relay_engine::RelayTarget;
use tokio_util::sync::CancellationToken;

/// Spawn C6's three cooperative loops. The cleanup loop always runs (it owns
/// the only deletion path in the system); the forwarder and health loops
/// only run when a relay target is configured.
pub fn spawn_loops(
    state: AppState,
    client_id: String,
    target: Option<RelayTarget>,
    shutdown: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = vec![tokio::spawn(cleanup::run(state.clone(), shutdown.clone()))];

    if let Some(target) = target {
        handles.push(tokio::spawn(forwarder::run(state.clone(), client_id, target.clone(), shutdown.clone())));
        handles.push(tokio::spawn(health::run(target, shutdown)));
    }

    handles
}
