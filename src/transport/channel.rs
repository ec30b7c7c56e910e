//! In-process channel transport.
//!
//! Pairs a [`ChannelTransport`] (held by the content context) with a
//! [`HostEnd`] (held by whatever plays the host). Used when both sides live
//! in one process, and throughout the tests.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::SourceHandle;
use crate::protocol::Frame;

use super::Transport;

// ============================================================================
// Outbound
// ============================================================================

/// A frame leaving the content context.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Addressed to the bound counterpart.
    Embedder {
        /// Counterpart handle.
        target: SourceHandle,
        /// Frame.
        frame: Frame,
    },
    /// Sent on the host process channel.
    Host {
        /// Frame.
        frame: Frame,
    },
}

impl Outbound {
    /// Returns the carried frame.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> &Frame {
        match self {
            Self::Embedder { frame, .. } | Self::Host { frame } => frame,
        }
    }
}

// ============================================================================
// ChannelTransport
// ============================================================================

/// Sending half backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelTransport {
    /// Creates a connected transport / host-end pair.
    #[must_use]
    pub fn pair() -> (Self, HostEnd) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, HostEnd { rx })
    }

    fn push(&self, outbound: Outbound) -> Result<()> {
        trace!(event = %outbound.frame().event, "Frame queued");
        self.tx.send(outbound).map_err(|_| Error::ConnectionClosed)
    }
}

impl Transport for ChannelTransport {
    fn post_message(&self, target: &SourceHandle, frame: Frame) -> Result<()> {
        self.push(Outbound::Embedder {
            target: target.clone(),
            frame,
        })
    }

    fn send_to_host(&self, frame: Frame) -> Result<()> {
        self.push(Outbound::Host { frame })
    }
}

// ============================================================================
// HostEnd
// ============================================================================

/// Receiving half: everything the content context sent.
#[derive(Debug)]
pub struct HostEnd {
    rx: mpsc::UnboundedReceiver<Outbound>,
}

impl HostEnd {
    /// Waits for the next frame. Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.rx.recv().await
    }

    /// Returns the next frame if one is queued.
    #[must_use]
    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.rx.try_recv().ok()
    }

    /// Drains every queued frame.
    #[must_use]
    pub fn drain(&mut self) -> Vec<Outbound> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
