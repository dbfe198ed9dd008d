use crate::{CanonicalEvent, RepositoryId};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend serialization error: {0}")]
    Serialization(String),
}

/// C2 — the capability set every Event Store backend implements. All
/// methods are safe to call concurrently from any number of tasks; mutating
/// operations are serialized per-store (spec.md §4.1, §5).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert `event` into `repository_id`'s bucket. Returns `true` if it was
    /// newly inserted, `false` if an event with the same `event_id` was
    /// already present (dedup, not an error).
    async fn store(&self, repository_id: &RepositoryId, event: CanonicalEvent) -> Result<bool, StoreError>;

    /// Snapshot of the events currently held for `repository_id`, in
    /// insertion order. May be empty. Callers must treat the result as a
    /// snapshot: later mutation of the store is not reflected in a sequence
    /// already returned.
    async fn retrieve(&self, repository_id: &RepositoryId) -> Result<Vec<CanonicalEvent>, StoreError>;

    async fn count(&self, repository_id: &RepositoryId) -> Result<usize, StoreError>;

    /// Remove the event with `event.event_id` from `repository_id`'s bucket.
    /// Returns `true` if it was present and removed.
    async fn remove(&self, repository_id: &RepositoryId, event_id: &str) -> Result<bool, StoreError>;

    /// Flip `is_relayed` to true and stamp `time_relayed` for the given
    /// event, performed against the live store (not a detached copy) so a
    /// subsequent `retrieve` does not re-offer it. Returns `false` if the
    /// event was no longer present (e.g. already cleaned up).
    async fn mark_relayed(
        &self,
        repository_id: &RepositoryId,
        event_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError>;

    /// Backend liveness, as determined at construction (and, for networked
    /// backends, refreshable by re-pinging).
    async fn is_connected(&self) -> bool;
}
