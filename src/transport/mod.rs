//! Channel Transport layer.
//!
//! The bridge is built on one duplex primitive per content context: a way to
//! send frames out, and a way to receive `(origin, source, payload)` tuples.
//! This module defines the sending half as the [`Transport`] trait and ships
//! two implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                          ┌─────────────────┐
//! │  ContentContext  │   post_message(target)   │                 │
//! │                  │─────────────────────────►│  Embedder       │
//! │  Bridge          │                          │  (host side)    │
//! │  ActionForwarder │   send_to_host           │                 │
//! │  QueryClient     │─────────────────────────►│  Dispatcher     │
//! │                  │◄─────────────────────────│                 │
//! └──────────────────┘   Envelope (inbound)     └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | In-process unbounded channel transport |
//! | `connection` | WebSocket connection and event loop |
//! | `server` | WebSocket server binding and acceptance |

// ============================================================================
// Submodules
// ============================================================================

/// In-process channel transport.
pub mod channel;

/// WebSocket connection and event loop.
pub mod connection;

/// WebSocket server the host connects to.
pub mod server;

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::identifiers::SourceHandle;
use crate::protocol::Frame;

// ============================================================================
// Transport
// ============================================================================

/// Sending half of the Channel Transport.
///
/// Implementations must not block; every send is fire-and-forget from the
/// caller's point of view and only reports whether the frame was accepted.
pub trait Transport: Send + Sync {
    /// Sends `frame` to the bound counterpart `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is gone.
    fn post_message(&self, target: &SourceHandle, frame: Frame) -> Result<()>;

    /// Sends `frame` on the host process channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is gone.
    fn send_to_host(&self, frame: Frame) -> Result<()>;
}

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelTransport, HostEnd, Outbound};
pub use connection::Connection;
pub use server::PendingServer;
