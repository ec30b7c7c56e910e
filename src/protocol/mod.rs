//! Wire protocol types.
//!
//! This module defines what travels between a content context and its host.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `Envelope` | Host → Context | Inbound frame with origin and source handle |
//! | `OutboundEnvelope` | Context → Host | Frame addressed to the counterpart or host |
//! | `dispatch-action` | Context → Host | Serialized batch of [`ActionRecord`]s |
//! | `query-response` | Host → Context | Reply to a synchronous query |
//!
//! Every frame is the JSON array `[eventName, ...args]`.

// ============================================================================
// Submodules
// ============================================================================

/// Action records and batch serialization.
pub mod action;

/// Typed inbound events.
pub mod event;

/// Frames and envelopes.
pub mod frame;

/// Reserved event names.
pub mod names;

// ============================================================================
// Re-exports
// ============================================================================

pub use action::{ActionRecord, ActionType, decode_batch, encode_batch};
pub use event::{ParsedEvent, SnapshotKind};
pub use frame::{Envelope, Frame, OutboundEnvelope};
