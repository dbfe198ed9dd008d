//! C5 — the push receiver, plus status introspection (spec.md §4.4, §6).

use crate::state::AppState;
use futures_util::Stream;
use relay_protocol::proto::{
    WebhookEventPushRequest, WebhookEventPushResponse, WebhookEventStatusRequest, WebhookEventStatusResponse,
    WebhookEventStatusesRequest,
};
use std::pin::Pin;
use tonic::{Request, Response, Status};

pub async fn webhook_event_push(
    state: &AppState,
    request: Request<WebhookEventPushRequest>,
) -> Result<Response<WebhookEventPushResponse>, Status> {
    let request = request.into_inner();

    if !state.watchlist.contains(&request.repository_id) {
        return Ok(Response::new(WebhookEventPushResponse {
            accepted: false,
            response_code: 406,
            response_description: "repository not watched".to_owned(),
        }));
    }

    let Some(wire_event) = request.webhook_event else {
        return Ok(Response::new(WebhookEventPushResponse {
            accepted: false,
            response_code: 400,
            response_description: "missing webhook_event".to_owned(),
        }));
    };

    let event = relay_protocol::CanonicalEvent::from_wire(wire_event, chrono::Utc::now());
    match state.store.store(&request.repository_id, event).await {
        Ok(true) => Ok(Response::new(WebhookEventPushResponse {
            accepted: true,
            response_code: 201,
            response_description: "cached".to_owned(),
        })),
        Ok(false) => Ok(Response::new(WebhookEventPushResponse {
            accepted: true,
            response_code: 200,
            response_description: "already cached".to_owned(),
        })),
        Err(e) => Ok(Response::new(WebhookEventPushResponse {
            accepted: false,
            response_code: 503,
            response_description: e.to_string(),
        })),
    }
}

pub async fn webhook_event_status(
    state: &AppState,
    request: Request<WebhookEventStatusRequest>,
) -> Result<Response<WebhookEventStatusResponse>, Status> {
    let request = request.into_inner();
    let events = state
        .store
        .retrieve(&request.repository_id)
        .await
        .map_err(|e| Status::unavailable(e.to_string()))?;

    match events.into_iter().find(|e| e.event_id == request.event_id) {
        Some(event) => Ok(Response::new(WebhookEventStatusResponse { event_id: event.event_id, is_relayed: event.is_relayed })),
        None => Err(Status::not_found("event not found")),
    }
}

pub async fn webhook_event_statuses(
    state: &AppState,
    request: Request<WebhookEventStatusesRequest>,
) -> Result<Response<Pin<Box<dyn Stream<Item = Result<WebhookEventStatusResponse, Status>> + Send>>>, Status> {
    let request = request.into_inner();
    let events = state
        .store
        .retrieve(&request.repository_id)
        .await
        .map_err(|e| Status::unavailable(e.to_string()))?;

    let responses: Vec<Result<WebhookEventStatusResponse, Status>> = events
        .into_iter()
        .map(|e| Ok(WebhookEventStatusResponse { event_id: e.event_id, is_relayed: e.is_relayed }))
        .collect();

    let stream: Pin<Box<dyn Stream<Item = Result<WebhookEventStatusResponse, Status>> + Send>> =
        Box::pin(tokio_stream::iter(responses));
    Ok(Response::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::Watchlist;
    use relay_protocol::proto::{WebhookEvent, WebhookEventHeader};

    async fn test_state() -> AppState {
        AppState::new(Watchlist::parse("R1").unwrap(), None, None, None, "h".to_owned()).await
    }

    fn wire_event(id: &str) -> WebhookEvent {
        WebhookEvent {
            event_id: id.to_owned(),
            body: b"{}".to_vec(),
            headers: vec![WebhookEventHeader { name: "X-Github-Delivery".to_owned(), value: id.to_owned() }],
        }
    }

    #[tokio::test]
    async fn push_of_fresh_event_is_accepted_with_201() {
        let state = test_state().await;
        let request = Request::new(WebhookEventPushRequest {
            client_id: "c1".to_owned(),
            repository_id: "R1".to_owned(),
            webhook_event: Some(wire_event("d1")),
        });
        let response = webhook_event_push(&state, request).await.unwrap().into_inner();
        assert!(response.accepted);
        assert_eq!(response.response_code, 201);
    }

    #[tokio::test]
    async fn push_of_duplicate_event_is_still_accepted() {
        let state = test_state().await;
        for _ in 0..2 {
            let request = Request::new(WebhookEventPushRequest {
                client_id: "c1".to_owned(),
                repository_id: "R1".to_owned(),
                webhook_event: Some(wire_event("d1")),
            });
            webhook_event_push(&state, request).await.unwrap();
        }
        assert_eq!(state.store.count(&"R1".to_owned()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn push_to_an_unwatched_repository_is_rejected() {
        let state = test_state().await;
        let request = Request::new(WebhookEventPushRequest {
            client_id: "c1".to_owned(),
            repository_id: "R2".to_owned(),
            webhook_event: Some(wire_event("d1")),
        });
        let response = webhook_event_push(&state, request).await.unwrap().into_inner();
        assert!(!response.accepted);
        assert_eq!(response.response_code, 406);
    }

    #[tokio::test]
    async fn status_of_unknown_event_is_not_found() {
        let state = test_state().await;
        let request = Request::new(WebhookEventStatusRequest { repository_id: "R1".to_owned(), event_id: "ghost".to_owned() });
        assert!(webhook_event_status(&state, request).await.is_err());
    }
}
