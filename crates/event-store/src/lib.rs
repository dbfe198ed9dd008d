//! The Event Cache (C2) and Repository Watchlist (C1).
//!
//! One mapping per node from [`RepositoryId`] to an ordered sequence of
//! [`relay_protocol::CanonicalEvent`]s, behind a small `{store, retrieve,
//! count, remove, is_connected}` capability trait ([`EventStore`]) with two
//! implementations ([`memory::InMemoryStore`], [`redis_store::RedisStore`]).

pub mod cleanup;
pub mod memory;
pub mod redis_store;
mod store;
mod watchlist;

pub use relay_protocol::CanonicalEvent;
pub use store::{EventStore, StoreError};
pub use watchlist::Watchlist;

/// Opaque repository identifier; equality is byte-identity.
pub type RepositoryId = String;

/// Default minimum age (from `time_relayed`) a relayed event must reach
/// before the cleanup sweep removes it. See `spec.md` §3.
pub const CLEANUP_GRACE: std::time::Duration = std::time::Duration::from_secs(120);
