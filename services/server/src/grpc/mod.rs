pub mod health;
pub mod push;
pub mod streaming;

use crate::state::AppState;
use futures_util::Stream;
use relay_protocol::proto::webhook_relay_server::WebhookRelay;
use relay_protocol::proto::{
    FetchWebhookEventsRequest, FetchWebhookEventsResponse, WebhookEventPushRequest, WebhookEventPushResponse,
    WebhookEventStatusRequest, WebhookEventStatusResponse, WebhookEventStatusesRequest,
};
use std::pin::Pin;
use tonic::{Request, Response, Status};
use tokio_util::sync::CancellationToken;

/// The gRPC-facing WebhookRelay service: C4 (streaming pull), C5 (push
/// receiver), and status introspection, wired against the composition
/// root's store and watchlist.
#[derive(Clone)]
pub struct WebhookRelayService {
    pub state: AppState,
    pub shutdown: CancellationToken,
}

impl WebhookRelayService {
    pub fn new(state: AppState, shutdown: CancellationToken) -> Self {
        Self { state, shutdown }
    }
}

#[tonic::async_trait]
impl WebhookRelay for WebhookRelayService {
    type FetchWebhookEventsStream = Pin<Box<dyn Stream<Item = Result<FetchWebhookEventsResponse, Status>> + Send>>;

    async fn fetch_webhook_events(
        &self,
        request: Request<FetchWebhookEventsRequest>,
    ) -> Result<Response<Self::FetchWebhookEventsStream>, Status> {
        streaming::fetch_webhook_events(&self.state, self.shutdown.clone(), request).await
    }

    async fn webhook_event_push(
        &self,
        request: Request<WebhookEventPushRequest>,
    ) -> Result<Response<WebhookEventPushResponse>, Status> {
        push::webhook_event_push(&self.state, request).await
    }

    async fn webhook_event_status(
        &self,
        request: Request<WebhookEventStatusRequest>,
    ) -> Result<Response<WebhookEventStatusResponse>, Status> {
        push::webhook_event_status(&self.state, request).await
    }

    type WebhookEventStatusesStream = Pin<Box<dyn Stream<Item = Result<WebhookEventStatusResponse, Status>> + Send>>;

    async fn webhook_event_statuses(
        &self,
        request: Request<WebhookEventStatusesRequest>,
    ) -> Result<Response<Self::WebhookEventStatusesStream>, Status> {
        push::webhook_event_statuses(&self.state, request).await
    }
}
