//! Standard gRPC health-check service (`grpc.health.v1`), served alongside
//! `WebhookRelay` (`SPEC_FULL.md` §4, grounded on `original_source`'s
//! `internal/grpc/healthcheck.go`).

use tonic_health::server::HealthReporter;

/// Build the health-check service and mark the relay service `SERVING`
/// immediately — this node has no external dependency that must come up
/// first before it can serve streams.
pub async fn serving_health_service() -> (HealthReporter, tonic_health::pb::health_server::HealthServer<impl tonic_health::pb::health_server::Health>) {
    let (mut reporter, service) = tonic_health::server::health_reporter();
    reporter
        .set_serving::<relay_protocol::proto::webhook_relay_server::WebhookRelayServer<crate::grpc::WebhookRelayService>>()
        .await;
    (reporter, service)
}
