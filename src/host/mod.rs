//! Host-side counterparts.
//!
//! The privileged process is external to content contexts, but two of its
//! duties are part of the messaging contract and live here:
//!
//! - [`Dispatcher`] consumes `dispatch-action` batches
//! - [`HydrationPublisher`] re-emits snapshots on `hydration-ready`

// ============================================================================
// Submodules
// ============================================================================

pub mod dispatcher;
pub mod publisher;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{ActionCallback, CallbackId, Dispatcher};
pub use publisher::{EmitFn, HydrationPublisher};
