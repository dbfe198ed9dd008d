//! The HTTP ingress surface (spec.md §6).

use crate::ingestion::{self, IngestError, IngestOutcome};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/v1/github/", post(github_webhook))
        .route("/v1/watchlist", get(watchlist))
        .route("/v1/events/:repo", get(events))
        .route("/v1/info", get(info))
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello, World!"
}

async fn github_webhook(State(state): State<AppState>, headers: HeaderMap, body: bytes::Bytes) -> Response {
    let raw_headers: Vec<(&str, &str)> = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect();

    let result = ingestion::ingest(
        &state.store,
        &state.watchlist,
        state.hmac_secret.as_deref(),
        &raw_headers,
        &body,
    )
    .await;

    match result {
        Ok(IngestOutcome::Cached) => (StatusCode::CREATED, "Repository event cached").into_response(),
        Ok(IngestOutcome::AlreadyCached) => (StatusCode::NO_CONTENT, "already cached").into_response(),
        Err(IngestError::SignatureInvalid) => (StatusCode::BAD_REQUEST, "signature invalid").into_response(),
        Err(IngestError::NotARepositoryEvent) => {
            (StatusCode::NOT_ACCEPTABLE, "not a repository event").into_response()
        }
        Err(IngestError::NotWatched) => (StatusCode::NOT_ACCEPTABLE, "repository not watched").into_response(),
        Err(IngestError::StoreUnavailable(msg)) => (StatusCode::SERVICE_UNAVAILABLE, msg).into_response(),
    }
}

#[derive(Serialize)]
struct WatchlistResponse {
    #[serde(rename = "GitHubRepositoryIDs")]
    github_repository_ids: Vec<String>,
}

async fn watchlist(State(state): State<AppState>) -> Json<WatchlistResponse> {
    Json(WatchlistResponse { github_repository_ids: state.watchlist.to_vec() })
}

#[derive(Serialize)]
struct EventsResponse {
    #[serde(rename = "Events")]
    events: Vec<relay_protocol::CanonicalEvent>,
}

async fn events(State(state): State<AppState>, Path(repo): Path<String>) -> Response {
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

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse { hostname: state.hostname.clone(), version: env!("CARGO_PKG_VERSION") })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use event_store::Watchlist;
    use relay_protocol::sign;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        AppState::new(Watchlist::parse("R1").unwrap(), None, Some("k".to_owned()), None, "test-host".to_owned()).await
    }

    #[tokio::test]
    async fn root_returns_hello_world() {
        let app = router(test_state().await);
        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn happy_path_ingest_returns_201() {
        let app = router(test_state().await);
        let body = br#"{"x":1}"#;
        let sig = sign(b"k", body);
        let request = Request::post("/v1/github/")
            .header("X-Github-Hook-Installation-Target-Type", "repository")
            .header("X-Github-Hook-Installation-Target-Id", "R1")
            .header("X-Github-Delivery", "d1")
            .header("X-Hub-Signature-256", sig)
            .body(Body::from(body.to_vec()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn bad_signature_returns_400() {
        let app = router(test_state().await);
        let request = Request::post("/v1/github/")
            .header("X-Github-Hook-Installation-Target-Type", "repository")
            .header("X-Github-Hook-Installation-Target-Id", "R1")
            .header("X-Github-Delivery", "d1")
            .header("X-Hub-Signature-256", "sha256=deadbeef")
            .body(Body::from(&b"{}"[..]))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn watchlist_endpoint_reports_configured_repositories() {
        let app = router(test_state().await);
        let response = app.oneshot(Request::get("/v1/watchlist").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
