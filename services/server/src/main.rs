use clap::Parser;
use server::auth::BearerAuth;
use server::config::Cli;
use server::grpc::health::serving_health_service;
use server::grpc::WebhookRelayService;
use server::state::AppState;
use server::{http, relay};
use std::env;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server as GrpcServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(log_level)).init();

    let cli = Cli::parse();
    cli.log_unwired_telemetry();

    let watchlist = cli.watchlist();
    info!(repositories = watchlist.len(), "watchlist loaded");

    let state = AppState::new(
        watchlist,
        cli.redis_url(),
        cli.webhook_hmac.clone(),
        cli.oauth_token.clone(),
        cli.hostname.clone(),
    )
    .await;

    let shutdown = CancellationToken::new();

    let relay_target = cli.relay_target();
    let loop_handles = relay::spawn_loops(state.clone(), cli.client_id.clone(), relay_target, shutdown.clone());

    let http_addr = cli.http_bind_addr();
    let http_router = http::ingress::router(state.clone());
    let http_shutdown = shutdown.clone();
    let http_task = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(http_addr).await.expect("failed to bind HTTP listener");
        info!(addr = %http_addr, "HTTP ingress listening");
        axum::serve(listener, http_router)
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
            .expect("HTTP server error");
    });

    let grpc_addr = cli.grpc_bind_addr();
    let grpc_shutdown = shutdown.clone();
    let relay_service = WebhookRelayService::new(state.clone(), shutdown.clone());
    let auth = BearerAuth::new(cli.oauth_token.clone());
    let relay_server = relay_protocol::proto::webhook_relay_server::WebhookRelayServer::with_interceptor(relay_service, auth);
    let (_health_reporter, health_service) = serving_health_service().await;

    // `--grpcHealthPort` splits the health-check service onto its own port;
    // otherwise it is multiplexed on the main gRPC service port (spec.md §6).
    let health_addr = cli.grpc_health_bind_addr();
    let health_task = health_addr.map(|addr| {
        let shutdown = shutdown.clone();
        let dedicated_health_service = health_service.clone();
        tokio::spawn(async move {
            info!(addr = %addr, "dedicated gRPC health port listening");
            GrpcServer::builder()
                .add_service(dedicated_health_service)
                .serve_with_shutdown(addr, async move { shutdown.cancelled().await })
                .await
                .expect("gRPC health server error");
        })
    });

    let grpc_task = tokio::spawn(async move {
        info!(addr = %grpc_addr, "gRPC service listening");
        let mut builder = GrpcServer::builder().add_service(relay_server);
        if health_addr.is_none() {
            builder = builder.add_service(health_service);
        }
        builder
            .serve_with_shutdown(grpc_addr, async move { grpc_shutdown.cancelled().await })
            .await
            .expect("gRPC server error");
    });

    shutdown_signal().await;
    info!("shutdown signal received, stopping all loops");
    shutdown.cancel();

    let _ = tokio::join!(http_task, grpc_task);
    if let Some(health_task) = health_task {
        let _ = health_task.await;
    }
    for handle in loop_handles {
        let _ = handle.await;
    }
    info!("server shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
