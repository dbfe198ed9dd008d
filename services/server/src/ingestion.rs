//! C3 — webhook ingestion & validation (spec.md §4.2).

use event_store::{EventStore, RepositoryId, Watchlist};
use relay_protocol::{headers, verify_signature, CanonicalEvent, HeaderPair};
use std::sync::Arc;
use tracing::warn;

pub const TARGET_TYPE_HEADER: &str = "X-Github-Hook-Installation-Target-Type";
pub const TARGET_ID_HEADER: &str = "X-Github-Hook-Installation-Target-Id";
pub const DELIVERY_HEADER: &str = "X-Github-Delivery";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("not a repository event")]
    NotARepositoryEvent,
    #[error("signature invalid")]
    SignatureInvalid,
    #[error("repository not watched")]
    NotWatched,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

pub enum IngestOutcome {
    Cached,
    AlreadyCached,
}

/// Run the full C3 algorithm against one raw HTTP request's headers + body.
///
/// `raw_headers` is the ordered sequence exactly as received (before any
/// multi-value collapsing); this function normalizes it internally.
pub async fn ingest(
    store: &Arc<dyn EventStore>,
    watchlist: &Watchlist,
    hmac_secret: Option<&[u8]>,
    raw_headers: &[(&str, &str)],
    body: &[u8],
) -> Result<IngestOutcome, IngestError> {
    let normalized = headers::normalize(raw_headers.iter().copied());

    let target_type = headers::find(&normalized, TARGET_TYPE_HEADER);
    let target_id = headers::find(&normalized, TARGET_ID_HEADER);
    let delivery_id = headers::find(&normalized, DELIVERY_HEADER);

    let (target_type, repository_id, event_id) = match (target_type, target_id, delivery_id) {
        (Some(t), Some(id), Some(delivery)) => (t, id.to_owned(), delivery.to_owned()),
        _ => return Err(IngestError::NotARepositoryEvent),
    };
    if target_type != "repository" {
        return Err(IngestError::NotARepositoryEvent);
    }

    match hmac_secret {
        Some(secret) => {
            let signature = headers::find(&normalized, SIGNATURE_HEADER).unwrap_or("");
            verify_signature(secret, body, signature).map_err(|_| IngestError::SignatureInvalid)?;
        }
        None => warn!("no HMAC secret configured, skipping webhook signature verification"),
    }

    let repository_id: RepositoryId = repository_id;
    if !watchlist.contains(&repository_id) {
        return Err(IngestError::NotWatched);
    }

    let headers: Vec<HeaderPair> = normalized;
    let event = CanonicalEvent::new(event_id, body.to_vec(), headers, chrono::Utc::now());

    let inserted = store
        .store(&repository_id, event)
        .await
        .map_err(|e| IngestError::StoreUnavailable(e.to_string()))?;

    Ok(if inserted { IngestOutcome::Cached } else { IngestOutcome::AlreadyCached })
}
