//! C6 — the Relay Engine: forwarder loop, health loop, and the cleanup
//! sweep (re-exported from `event-store`, since cleanup needs only the
//! store, not a relay target). Shared between the Server and Relay Client
//! node roles, either of which may have a configured relay target
//! (spec.md §1, §4.5).

pub mod config;
pub mod forwarder;
pub mod health;

pub use config::{RelayTarget, Transport};
pub use event_store::cleanup::sweep_once;
pub use health::{RelayStatus, SharedRelayStatus};
