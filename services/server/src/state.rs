//! The composition root (spec.md §9): explicit dependency handles passed to
//! every component at construction, instead of global mutable singletons.

use event_store::{memory::InMemoryStore, redis_store::RedisStore, EventStore, Watchlist};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub watchlist: Arc<Watchlist>,
    pub hmac_secret: Option<Vec<u8>>,
    pub auth_token: Option<String>,
    pub hostname: String,
}

impl AppState {
    /// Select the Redis backend if a URL is configured and its startup ping
    /// succeeds; otherwise fall back to the in-memory backend
    /// (spec.md §4.1 "Backend selection").
    pub async fn new(
        watchlist: Watchlist,
        redis_url: Option<String>,
        hmac_secret: Option<String>,
        auth_token: Option<String>,
        hostname: String,
    ) -> Self {
        let store: Arc<dyn EventStore> = match redis_url {
            Some(url) => {
                let redis = RedisStore::connect(&url).await;
                if redis.is_connected().await {
                    info!("connected to Redis event store backend");
                    Arc::new(redis)
                } else {
                    info!("Redis ping failed at startup, falling back to in-memory event store");
                    Arc::new(InMemoryStore::new())
                }
            }
            None => Arc::new(InMemoryStore::new()),
        };

        Self {
            store,
            watchlist: Arc::new(watchlist),
            hmac_secret: hmac_secret.map(String::into_bytes),
            auth_token,
            hostname,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_in_memory_when_no_redis_url_is_configured() {
        let state = AppState::new(Watchlist::parse("R1").unwrap(), None, None, None, "h".to_owned()).await;
        assert!(state.store.is_connected().await);
    }

    #[tokio::test]
    async fn falls_back_to_in_memory_when_redis_is_unreachable() {
        let state = AppState::new(
            Watchlist::parse("R1").unwrap(),
            Some("redis://127.0.0.1:1/0".to_owned()),
            None,
            None,
            "h".to_owned(),
        )
        .await;
        // Unreachable Redis falls back to in-memory, which reports connected.
        assert!(state.store.is_connected().await);
    }
}
