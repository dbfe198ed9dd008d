//! Local re-exposure: a thin diagnostic HTTP surface over this node's own
//! event store (spec.md §1 "re-exposes events locally"), the same shape as
//! the server's ingress diagnostics (`SPEC_FULL.md` §2).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use event_store::EventStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalState {
    pub store: Arc<dyn EventStore>,
    pub hostname: String,
}

pub fn router(state: LocalState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route("/v1/events/:repo", get(events))
        .route("/v1/info", get(info))
        .with_state(state)
}

#[derive(Serialize)]
struct EventsResponse {
    #[serde(rename = "Events")]
    events: Vec<relay_protocol::CanonicalEvent>,
}

async fn events(State(state): State<LocalState>, Path(repo): Path<String>) -> Response {
    match state.store.retrieve(&repo).await {
        Ok(events) => Json(EventsResponse { events }).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

#[derive(Serialize)]
struct InfoResponse {
    hostname: String,
    version: &'static str,
}

async fn info(State(state): State<LocalState>) -> Json<InfoResponse> {
    Json(InfoResponse { hostname: state.hostname.clone(), version: env!("CARGO_PKG_VERSION") })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use event_store::memory::InMemoryStore;
    use tower::ServiceExt;

    #[tokio::test]
    async fn events_endpoint_returns_empty_snapshot_for_unknown_repo() {
        let state = LocalState { store: Arc::new(InMemoryStore::new()), hostname: "h".to_owned() };
        let app = router(state);
        let response = app
            .oneshot(Request::get("/v1/events/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
