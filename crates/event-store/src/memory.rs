//! In-memory Event Store backend: `Mutex<HashMap<RepositoryId, Vec<CanonicalEvent>>>`.
//!
//! One mutex covers all mutations (spec.md §4.1 / §5): `store` scans the
//! target bucket under the lock for a duplicate `event_id` before
//! appending, `remove`/`mark_relayed` rebuild or mutate the bucket in place.
//! Never persisted across restarts.

use crate::store::{EventStore, StoreError};
use crate::{CanonicalEvent, RepositoryId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct InMemoryStore {
    buckets: Mutex<HashMap<RepositoryId, Vec<CanonicalEvent>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { buckets: Mutex::new(HashMap::new()) }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn store(&self, repository_id: &RepositoryId, mut event: CanonicalEvent) -> Result<bool, StoreError> {
        let mut buckets = self.buckets.lock().expect("event store mutex poisoned");
        let bucket = buckets.entry(repository_id.clone()).or_default();
        if bucket.iter().any(|e| e.event_id == event.event_id) {
            return Ok(false);
        }
        event.is_relayed = false;
        event.time_relayed = None;
        bucket.push(event);
        Ok(true)
    }

    async fn retrieve(&self, repository_id: &RepositoryId) -> Result<Vec<CanonicalEvent>, StoreError> {
        let buckets = self.buckets.lock().expect("event store mutex poisoned");
        Ok(buckets.get(repository_id).cloned().unwrap_or_default())
    }

    async fn count(&self, repository_id: &RepositoryId) -> Result<usize, StoreError> {
        let buckets = self.buckets.lock().expect("event store mutex poisoned");
        Ok(buckets.get(repository_id).map_or(0, Vec::len))
    }

    async fn remove(&self, repository_id: &RepositoryId, event_id: &str) -> Result<bool, StoreError> {
        let mut buckets = self.buckets.lock().expect("event store mutex poisoned");
        let Some(bucket) = buckets.get_mut(repository_id) else { return Ok(false) };
        let before = bucket.len();
        bucket.retain(|e| e.event_id != event_id);
        Ok(bucket.len() != before)
    }

    async fn mark_relayed(
        &self,
        repository_id: &RepositoryId,
        event_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError> {
        let mut buckets = self.buckets.lock().expect("event store mutex poisoned");
        let Some(bucket) = buckets.get_mut(repository_id) else { return Ok(false) };
        match bucket.iter_mut().find(|e| e.event_id == event_id) {
            Some(event) => {
                event.mark_relayed(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_connected(&self) -> bool {
        true
    }
}
