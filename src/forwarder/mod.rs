//! Action forwarding.
//!
//! Content-script stubs turn local signals into [`ActionRecord`]s and hand
//! them to the [`ActionForwarder`], which serializes a one-element batch as
//! text and sends it under `dispatch-action` on the host process channel.
//! Forwarding never waits for acknowledgement.
//!
//! The only blocking path is the synchronous query in [`query`], used by the
//! spell-check stub.

// ============================================================================
// Submodules
// ============================================================================

/// Synchronous request/response queries.
pub mod query;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::Result;
use crate::protocol::{ActionRecord, ActionType, Frame, encode_batch, names};
use crate::transport::Transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use query::QueryClient;

// ============================================================================
// ActionForwarder
// ============================================================================

/// Packages actions and forwards them to the host dispatcher.
#[derive(Clone)]
pub struct ActionForwarder {
    transport: Arc<dyn Transport>,
}

impl ActionForwarder {
    /// Creates a forwarder over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Merges `action_type` into `fields` and forwards the record.
    ///
    /// Fire-and-forget: transport failures are logged and swallowed.
    pub fn dispatch(&self, action_type: impl Into<ActionType>, fields: Map<String, Value>) {
        self.dispatch_record(ActionRecord::new(action_type, fields));
    }

    /// Forwards an already-built record.
    pub fn dispatch_record(&self, record: ActionRecord) {
        let action_type = record.action_type.clone();

        match self.try_dispatch(record) {
            Ok(()) => trace!(%action_type, "Action forwarded"),
            Err(e) => warn!(%action_type, error = %e, "Failed to forward action"),
        }
    }

    /// Forwards a record, reporting transport failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails or
    /// the transport error if the host channel is gone.
    pub fn try_dispatch(&self, record: ActionRecord) -> Result<()> {
        self.transport.send_to_host(Self::frame(&[record])?)
    }

    /// Builds the `dispatch-action` frame for a batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn frame(records: &[ActionRecord]) -> Result<Frame> {
        Ok(Frame::new(
            names::DISPATCH_ACTION,
            vec![Value::String(encode_batch(records)?)],
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::transport::{ChannelTransport, Outbound};

    #[test]
    fn test_idle_action_forwarded_as_text_batch() {
        let (transport, mut host) = ChannelTransport::pair();
        let forwarder = ActionForwarder::new(Arc::new(transport));

        let mut fields = Map::new();
        fields.insert("idleState".to_string(), json!("idle"));
        forwarder.dispatch("app-idle-state-changed", fields);

        let Some(Outbound::Host { frame }) = host.try_recv() else {
            panic!("expected host frame");
        };
        assert_eq!(frame.event, "dispatch-action");

        let text = frame.arg(0).and_then(Value::as_str).expect("text payload");
        let batch: Value = serde_json::from_str(text).expect("json");
        assert_eq!(
            batch,
            json!([{"actionType": "app-idle-state-changed", "idleState": "idle"}])
        );
    }

    #[test]
    fn test_dispatch_without_host_is_swallowed() {
        let (transport, host) = ChannelTransport::pair();
        drop(host);

        let forwarder = ActionForwarder::new(Arc::new(transport));
        forwarder.dispatch("app-idle-state-changed", Map::new());

        let err = forwarder
            .try_dispatch(ActionRecord::new("app-idle-state-changed", Map::new()))
            .unwrap_err();
        assert!(err.is_connection_error());
    }
}
