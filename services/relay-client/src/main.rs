use clap::Parser;
use event_store::{memory::InMemoryStore, EventStore, Watchlist};
use relay_client::client::{self, StreamClientConfig};
use relay_client::config::Cli;
use relay_client::http::{self, LocalState};
use std::env;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(log_level)).init();

    let cli = Cli::parse();
    let watchlist = Watchlist::parse(&cli.repositories).unwrap_or_else(|e| {
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    });

    let store: Arc<dyn EventStore> = Arc::new(InMemoryStore::new());
    let upstream_endpoint = cli.upstream_endpoint();
    let hmac_secret = cli.webhook_hmac.clone().map(String::into_bytes);

    if cli.once {
        for repository_id in watchlist.iter() {
            let config = StreamClientConfig {
                upstream_endpoint: upstream_endpoint.clone(),
                client_id: cli.client_id.clone(),
                repository_id: repository_id.clone(),
                duration_secs: cli.stream_window,
                auth_token: cli.oauth_token.clone(),
                hmac_secret: hmac_secret.clone(),
            };
            if let Err(e) = client::run_once(store.clone(), config).await {
                eprintln!("fetch failed for {repository_id}: {e}");
                std::process::exit(1);
            }
        }
        let snapshot = snapshot_all(&store, &watchlist).await;
        println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
        return;
    }

    let shutdown = CancellationToken::new();
    let mut handles = Vec::new();
    for repository_id in watchlist.iter() {
        let config = StreamClientConfig {
            upstream_endpoint: upstream_endpoint.clone(),
            client_id: cli.client_id.clone(),
            repository_id: repository_id.clone(),
            duration_secs: cli.stream_window,
            auth_token: cli.oauth_token.clone(),
            hmac_secret: hmac_secret.clone(),
        };
        let store = store.clone();
        let shutdown = shutdown.clone();
        handles.push(tokio::spawn(client::run(store, config, shutdown)));
    }

    if let Some(sink) = cli.sink_target() {
        let repositories = watchlist.to_vec();
        let sink_for_health = sink.clone();
        handles.push(tokio::spawn(relay_engine::forwarder::run_forwarder_loop(
            store.clone(),
            repositories,
            sink,
            cli.client_id.clone(),
            shutdown.clone(),
        )));
        let status: relay_engine::SharedRelayStatus =
            Arc::new(tokio::sync::RwLock::new(relay_engine::RelayStatus::default()));
        handles.push(tokio::spawn(relay_engine::health::run_health_loop(
            sink_for_health,
            status,
            shutdown.clone(),
        )));
    }

    let local_state = LocalState { store: store.clone(), hostname: cli.hostname.clone() };
    let local_router = http::router(local_state);
    let bind_addr = cli.bind_addr();
    let http_shutdown = shutdown.clone();
    let http_task = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(bind_addr).await.expect("failed to bind local HTTP listener");
        info!(addr = %bind_addr, "local re-exposure listening");
        axum::serve(listener, local_router)
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
            .expect("local HTTP server error");
    });

    shutdown_signal().await;
    info!("shutdown signal received, stopping stream clients");
    shutdown.cancel();

    let _ = http_task.await;
    for handle in handles {
        let _ = handle.await;
    }
    info!("relay client shut down gracefully");
}

async fn snapshot_all(
    store: &Arc<dyn EventStore>,
    watchlist: &Watchlist,
) -> std::collections::HashMap<String, Vec<relay_protocol::CanonicalEvent>> {
    let mut out = std::collections::HashMap::new();
    for repository_id in watchlist.iter() {
        let events = store.retrieve(repository_id).await.unwrap_or_default();
        out.insert(repository_id.clone(), events);
    }
    out
}

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
