//! The cleanup sweep (part of C6's three loops): removes events whose
//! `is_relayed=true` and `now - time_relayed > CLEANUP_GRACE`. An event with
//! `is_relayed=false` is never touched regardless of age (spec.md §3, §4.5,
//! §8 invariant 4).

use crate::{EventStore, RepositoryId, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Run a single sweep pass over every watched repository against `store`.
/// Returns the total number of events removed. Errors on individual
/// `retrieve`/`remove` calls are logged and treated as transient — the
/// sweep continues to the next repository rather than aborting (spec.md
/// §4.5: a single slow/unavailable repository must not block the others).
pub async fn sweep_once(
    store: &Arc<dyn EventStore>,
    repositories: impl IntoIterator<Item = &RepositoryId>,
    grace: std::time::Duration,
    now: DateTime<Utc>,
) -> usize {
    let mut removed = 0;
    for repository_id in repositories {
        match sweep_repository(store, repository_id, grace, now).await {
            Ok(n) => removed += n,
            Err(e) => warn!(repository_id, error = %e, "cleanup sweep failed for repository"),
        }
    }
    removed
}

async fn sweep_repository(
    store: &Arc<dyn EventStore>,
    repository_id: &RepositoryId,
    grace: std::time::Duration,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::seconds(120));
    let events = store.retrieve(repository_id).await?;
    let mut removed = 0;
    for event in events {
        let eligible = event.is_relayed
            && event
                .time_relayed
                .is_some_and(|relayed_at| now.signed_duration_since(relayed_at) > grace);
        if eligible && store.remove(repository_id, &event.event_id).await? {
            debug!(repository_id, event_id = %event.event_id, "cleanup removed relayed event");
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use relay_protocol::{CanonicalEvent, HeaderPair};

    fn event(id: &str) -> CanonicalEvent {
        CanonicalEvent::new(id.to_owned(), b"{}".to_vec(), Vec::<HeaderPair>::new(), Utc::now())
    }

    #[tokio::test]
    async fn sweep_removes_only_relayed_events_past_grace() {
        let store: Arc<dyn EventStore> = Arc::new(InMemoryStore::new());
        let repo = "R1".to_owned();
        let t0 = Utc::now();

        store.store(&repo, event("unrelayed")).await.unwrap();
        store.store(&repo, event("relayed-fresh")).await.unwrap();
        store.store(&repo, event("relayed-stale")).await.unwrap();

        store.mark_relayed(&repo, "relayed-fresh", t0).await.unwrap();
        store.mark_relayed(&repo, "relayed-stale", t0).await.unwrap();

        let grace = std::time::Duration::from_secs(120);
        let check_at = t0 + chrono::Duration::seconds(300);

        let removed = sweep_once(&store, [&repo], grace, check_at).await;
        assert_eq!(removed, 1);

        let remaining: Vec<_> = store.retrieve(&repo).await.unwrap().into_iter().map(|e| e.event_id).collect();
        assert!(remaining.contains(&"unrelayed".to_owned()));
        assert!(remaining.contains(&"relayed-fresh".to_owned()));
        assert!(!remaining.contains(&"relayed-stale".to_owned()));
    }

    #[tokio::test]
    async fn sweep_never_removes_an_unrelayed_event_regardless_of_age() {
        let store: Arc<dyn EventStore> = Arc::new(InMemoryStore::new());
        let repo = "R1".to_owned();
        let old = Utc::now() - chrono::Duration::days(1);
        let mut e = event("ancient-but-unrelayed");
        e.time_received = old;
        store.store(&repo, e).await.unwrap();

        let removed = sweep_once(&store, [&repo], std::time::Duration::from_secs(120), Utc::now()).await;
        assert_eq!(removed, 0);
        assert_eq!(store.count(&repo).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sweep_of_a_repository_exactly_at_the_grace_boundary_is_not_removed() {
        let store: Arc<dyn EventStore> = Arc::new(InMemoryStore::new());
        let repo = "R1".to_owned();
        let t0 = Utc::now();
        store.store(&repo, event("d1")).await.unwrap();
        store.mark_relayed(&repo, "d1", t0).await.unwrap();

        let grace = std::time::Duration::from_secs(120);
        // now - time_relayed == grace, strictly greater-than is required.
        let removed = sweep_once(&store, [&repo], grace, t0 + chrono::Duration::seconds(120)).await;
        assert_eq!(removed, 0);
    }
}
