//! Redis-backed Event Store: one list per repository id.
//!
//! Resolves the Open Question in `SPEC_FULL.md` §6.2: the source's
//! `retrieve` destructively `RPOP`s the list it reads, which would let a
//! stream batch delivered at `t` stay deliverable again at `t+1` once the
//! cache accidentally repopulates — this implementation instead treats
//! `retrieve` as `LRANGE 0 -1`, a non-destructive snapshot, and requires
//! the explicit `remove`/`mark_relayed` paths to mutate the list. That is
//! what satisfies invariants 2 and 4 in spec.md §8.

use crate::store::{EventStore, StoreError};
use crate::{CanonicalEvent, RepositoryId};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::warn;

pub struct RedisStore {
    conn: Mutex<Option<ConnectionManager>>,
    connected: bool,
}

impl RedisStore {
    /// Connect and ping. Construction always succeeds; `is_connected`
    /// reflects whether the initial ping went through (spec.md §4.1 —
    /// backend selection falls back to in-memory when this is false).
    pub async fn connect(redis_url: &str) -> Self {
        let client = match redis::Client::open(redis_url) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "malformed Redis URL");
                return Self { conn: Mutex::new(None), connected: false };
            }
        };
        let mut conn = match client.get_connection_manager().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "could not establish Redis connection manager");
                return Self { conn: Mutex::new(None), connected: false };
            }
        };
        let connected = redis::cmd("PING").query_async::<String>(&mut conn).await.is_ok();
        if !connected {
            warn!("Redis PING failed at startup; backend considered unavailable");
        }
        Self { conn: Mutex::new(Some(conn)), connected }
    }

    fn key(repository_id: &RepositoryId) -> String {
        format!("gitstafette:events:{repository_id}")
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.conn
            .lock()
            .await
            .clone()
            .ok_or_else(|| StoreError::Unavailable("Redis connection was never established".to_owned()))
    }
}

#[async_trait]
impl EventStore for RedisStore {
    async fn store(&self, repository_id: &RepositoryId, mut event: CanonicalEvent) -> Result<bool, StoreError> {
        let existing = self.retrieve(repository_id).await?;
        if existing.iter().any(|e| e.event_id == event.event_id) {
            return Ok(false);
        }
        event.is_relayed = false;
        event.time_relayed = None;
        let json = serde_json::to_string(&event).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut conn = self.connection().await?;
        let _: i64 = conn
            .rpush(Self::key(repository_id), json)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(true)
    }

    async fn retrieve(&self, repository_id: &RepositoryId) -> Result<Vec<CanonicalEvent>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn
            .lrange(Self::key(repository_id), 0, -1)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        raw.into_iter()
            .map(|s| serde_json::from_str(&s).map_err(|e| StoreError::Serialization(e.to_string())))
            .collect()
    }

    async fn count(&self, repository_id: &RepositoryId) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;
        let n: i64 = conn
            .llen(Self::key(repository_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(n.max(0) as usize)
    }

    async fn remove(&self, repository_id: &RepositoryId, event_id: &str) -> Result<bool, StoreError> {
        let events = self.retrieve(repository_id).await?;
        let Some(target) = events.iter().find(|e| e.event_id == event_id) else { return Ok(false) };
        let json = serde_json::to_string(target).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut conn = self.connection().await?;
        let removed: i64 = conn
            .lrem(Self::key(repository_id), 1, json)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn mark_relayed(
        &self,
        repository_id: &RepositoryId,
        event_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError> {
        // Redis has no server-side "update the Nth matching list element by
        // value", so flipping a flag is read-modify-write: read the whole
        // bucket, mutate the match, rewrite the list under the key's lock.
        let mut events = self.retrieve(repository_id).await?;
        let Some(event) = events.iter_mut().find(|e| e.event_id == event_id) else { return Ok(false) };
        event.mark_relayed(now);
        let rewritten = events
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let key = Self::key(repository_id);
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().del(&key);
        if !rewritten.is_empty() {
            pipe.rpush(&key, rewritten);
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(true)
    }

    async fn is_connected(&self) -> bool {
        self.connected
    }
}
