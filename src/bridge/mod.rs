//! Per-context bridge components.
//!
//! - [`Bridge`] - origin-gated named-event pub/sub
//! - [`Hydration`] - one-shot initial state delivery
//! - [`ZoomReplicator`] - host-driven zoom level
//! - [`ContentContext`] - everything above, owned by one page

// ============================================================================
// Submodules
// ============================================================================

/// Content context lifecycle.
pub mod context;

/// Origin gate, binding and inbound dispatch.
pub mod core;

/// Hydration handshake.
pub mod hydration;

/// Bridge configuration.
pub mod options;

/// Event subscription table.
pub mod subscription;

/// Zoom state replicator.
pub mod zoom;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::ContentContext;
pub use core::{Bridge, Delivery};
pub use hydration::{Hydration, SnapshotReceiver, SnapshotStore};
pub use options::{BridgeOptions, ZoomBounds};
pub use subscription::{Handler, OnceHandler, SubscriptionTable};
pub use zoom::{Renderer, ZoomCommand, ZoomReplicator};
