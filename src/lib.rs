//! Embedder Bridge - origin-gated messaging for isolated content contexts.
//!
//! Code running inside untrusted content contexts (embedded web views,
//! extension content scripts, internal "about:" pages) talks to a privileged
//! host process through this crate. Content cannot be trusted to identify
//! itself, so every inbound message is checked against one expected origin
//! before anything else happens.
//!
//! # Architecture
//!
//! ```text
//! host ─► Transport ─► Bridge (origin gate, binding) ─► { Hydration | ZoomReplicator | stubs }
//! stub ─► ActionForwarder ─► Transport ─► host Dispatcher
//! ```
//!
//! Key design principles:
//!
//! - Each [`ContentContext`] owns its binding, subscription table and zoom
//!   level; nothing is shared between contexts
//! - The first sender with the expected origin becomes the counterpart and
//!   can never be replaced
//! - Inbound failures degrade to silent drops; nothing is surfaced to the
//!   page that could leak information to an adversarial context
//! - Only the spell-check query waits for a reply, with a timeout
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use embedder_bridge::{BridgeOptions, ContentContext, Envelope, Frame, SnapshotKind};
//! use embedder_bridge::transport::ChannelTransport;
//!
//! # fn main() -> embedder_bridge::Result<()> {
//! let (transport, mut host) = ChannelTransport::pair();
//! let context = ContentContext::new(BridgeOptions::new(), Arc::new(transport))?;
//!
//! // Listen once for settings, then tell the host we're ready.
//! let mut settings = context.hydration().listen(SnapshotKind::Settings);
//! context.hydration().signal_ready(&["settings-updated"])?;
//! assert_eq!(host.try_recv().map(|o| o.frame().event.clone()).as_deref(), Some("hydration-ready"));
//!
//! // The host answers through the origin gate.
//! let frame = Frame::new("settings-updated", vec![serde_json::json!({"theme": "dark"})]);
//! context.receive(Envelope::new("file://", "embedder", &frame));
//!
//! assert!(settings.try_recv().is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | [`Bridge`], [`Hydration`], [`ZoomReplicator`], [`ContentContext`] |
//! | [`forwarder`] | [`ActionForwarder`] and [`QueryClient`] |
//! | [`stubs`] | Content-script stubs built on the forwarder |
//! | [`host`] | Host-side [`Dispatcher`] and [`HydrationPublisher`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Frames, envelopes, action records, typed events |
//! | [`transport`] | Channel and WebSocket transports |

// ============================================================================
// Modules
// ============================================================================

/// Per-context bridge components.
pub mod bridge;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Action forwarding and synchronous queries.
pub mod forwarder;

/// Host-side counterparts of the messaging contract.
pub mod host;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire protocol types.
pub mod protocol;

/// Content-script stubs.
pub mod stubs;

/// Channel Transport implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{
    Bridge, BridgeOptions, ContentContext, Delivery, Hydration, Renderer, SnapshotReceiver,
    SnapshotStore, ZoomBounds, ZoomCommand, ZoomReplicator,
};

// Forwarder types
pub use forwarder::{ActionForwarder, QueryClient};

// Host types
pub use host::{Dispatcher, HydrationPublisher};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ContextId, RequestId, SourceHandle};

// Protocol types
pub use protocol::{ActionRecord, ActionType, Envelope, Frame, ParsedEvent, SnapshotKind};

// Transport types
pub use transport::Transport;
