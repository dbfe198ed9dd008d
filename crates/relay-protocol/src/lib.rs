//! Wire types and canonical conversions for the webhook relay fabric.
//!
//! The generated gRPC stubs live under [`proto`]. Everything else in this
//! crate bridges the wire form (`proto::WebhookEvent`, flat byte strings and
//! header pairs) to the canonical internal event the rest of the fabric
//! operates on ([`CanonicalEvent`]).

pub mod proto {
    tonic::include_proto!("gitstafette.v1");
}

mod hmac_sig;
pub mod headers;

pub use hmac_sig::{sign, verify_signature, SignatureError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single header as retained internally: name case-preserved, multi-value
/// collapsed to the first value. See `spec.md` §3 and the Open Question in
/// `SPEC_FULL.md` §6.1 — this is always a clean sequence, never pre-sized
/// with holes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// The canonical internal event, as stored in the Event Cache (C2) and
/// mutated in place by the Streaming Pull Service (C4) / Relay Engine (C6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub event_id: String,
    pub body: Vec<u8>,
    pub headers: Vec<HeaderPair>,
    pub is_relayed: bool,
    pub time_received: DateTime<Utc>,
    pub time_relayed: Option<DateTime<Utc>>,
}

impl CanonicalEvent {
    /// Construct a freshly-ingested event: `is_relayed=false`, `time_received=now`.
    pub fn new(event_id: String, body: Vec<u8>, headers: Vec<HeaderPair>, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            body,
            headers,
            is_relayed: false,
            time_received: now,
            time_relayed: None,
        }
    }

    /// Flip `is_relayed` to true and stamp `time_relayed`.
    pub fn mark_relayed(&mut self, now: DateTime<Utc>) {
        self.is_relayed = true;
        self.time_relayed = Some(now);
    }

    pub fn to_wire(&self) -> proto::WebhookEvent {
        proto::WebhookEvent {
            event_id: self.event_id.clone(),
            body: self.body.clone(),
            headers: self
                .headers
                .iter()
                .map(|h| proto::WebhookEventHeader {
                    name: h.name.clone(),
                    value: h.value.clone(),
                })
                .collect(),
        }
    }

    pub fn from_wire(wire: proto::WebhookEvent, now: DateTime<Utc>) -> Self {
        Self::new(
            wire.event_id,
            wire.body,
            wire.headers
                .into_iter()
                .map(|h| HeaderPair { name: h.name, value: h.value })
                .collect(),
            now,
        )
    }
}
