//! End-to-end scenarios through the public HTTP ingress + in-memory store,
//! matching spec.md §8's S1/S3/S4.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use event_store::Watchlist;
use relay_protocol::sign;
use server::http::ingress;
use server::state::AppState;
use tower::ServiceExt;

async fn state_with_watchlist(repo: &str, hmac: Option<&str>) -> AppState {
    AppState::new(
        Watchlist::parse(repo).unwrap(),
        None,
        hmac.map(str::to_owned),
        None,
        "test-host".to_owned(),
    )
    .await
}

#[tokio::test]
async fn s1_happy_ingress_caches_a_correctly_signed_watched_event() {
    let state = state_with_watchlist("R1", Some("k")).await;
    let body = br#"{"x":1}"#;
    let sig = sign(b"k", body);

    let app = ingress::router(state.clone());
    let request = Request::post("/v1/github/")
        .header("X-Github-Hook-Installation-Target-Type", "repository")
        .header("X-Github-Hook-Installation-Target-Id", "R1")
        .header("X-Github-Delivery", "d1")
        .header("X-Hub-Signature-256", sig)
        .body(Body::from(body.to_vec()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cached = state.store.retrieve(&"R1".to_owned()).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].event_id, "d1");
    assert_eq!(cached[0].body, body);
    assert!(!cached[0].is_relayed);
}

#[tokio::test]
async fn s3_duplicate_delivery_returns_201_then_204_and_cache_holds_one_event() {
    let state = state_with_watchlist("R1", None).await;
    let headers = [
        ("X-Github-Hook-Installation-Target-Type", "repository"),
        ("X-Github-Hook-Installation-Target-Id", "R1"),
        ("X-Github-Delivery", "d1"),
    ];

    let build_request = || {
        let mut builder = Request::post("/v1/github/");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder.body(Body::from(&b"{}"[..])).unwrap()
    };

    let app = ingress::router(state.clone());
    let first = app.clone().oneshot(build_request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(build_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::NO_CONTENT);

    assert_eq!(state.store.count(&"R1".to_owned()).await.unwrap(), 1);
}

#[tokio::test]
async fn s4_cleanup_removes_a_relayed_event_once_past_grace_period() {
    let state = state_with_watchlist("R1", None).await;
    let headers = [
        ("X-Github-Hook-Installation-Target-Type", "repository"),
        ("X-Github-Hook-Installation-Target-Id", "R1"),
        ("X-Github-Delivery", "d1"),
    ];
    let mut builder = Request::post("/v1/github/");
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    let request = builder.body(Body::from(&b"{}"[..])).unwrap();

    let app = ingress::router(state.clone());
    app.oneshot(request).await.unwrap();

    let t_relayed = chrono::Utc::now();
    state.store.mark_relayed(&"R1".to_owned(), "d1", t_relayed).await.unwrap();

    let past_grace = t_relayed + event_store::CLEANUP_GRACE + chrono::Duration::seconds(1);
    let removed = event_store::cleanup::sweep_once(&state.store, &state.watchlist.to_vec(), event_store::CLEANUP_GRACE, past_grace).await;
    assert_eq!(removed, 1);
    assert!(state.store.retrieve(&"R1".to_owned()).await.unwrap().is_empty());
}
