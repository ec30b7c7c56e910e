//! Idle-state stub.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::forwarder::ActionForwarder;
use crate::protocol::ActionType;

// ============================================================================
// IdleState
// ============================================================================

/// Host-reported user presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    /// User is interacting.
    #[default]
    Active,
    /// No input for the idle threshold.
    Idle,
    /// Screen is locked.
    Locked,
}

impl IdleState {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for IdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// IdleStateStub
// ============================================================================

/// Forwards `app-idle-state-changed` on every actual transition.
pub struct IdleStateStub {
    forwarder: ActionForwarder,
    current: Mutex<IdleState>,
}

impl IdleStateStub {
    /// Creates a stub starting in [`IdleState::Active`].
    #[must_use]
    pub fn new(forwarder: ActionForwarder) -> Self {
        Self {
            forwarder,
            current: Mutex::new(IdleState::Active),
        }
    }

    /// Returns the last observed state.
    #[must_use]
    pub fn state(&self) -> IdleState {
        *self.current.lock()
    }

    /// Records `state`, forwarding it if it differs from the last one.
    ///
    /// Returns `true` if an action was forwarded.
    pub fn observe(&self, state: IdleState) -> bool {
        {
            let mut current = self.current.lock();
            if *current == state {
                trace!(%state, "Idle state unchanged");
                return false;
            }
            *current = state;
        }

        let mut fields = Map::new();
        fields.insert("idleState".to_string(), Value::String(state.to_string()));
        self.forwarder.dispatch(ActionType::IdleStateChanged, fields);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use serde_json::json;

    use crate::protocol::decode_batch;
    use crate::transport::ChannelTransport;

    #[test]
    fn test_only_transitions_forwarded() {
        let (transport, mut host) = ChannelTransport::pair();
        let stub = IdleStateStub::new(ActionForwarder::new(Arc::new(transport)));

        assert!(!stub.observe(IdleState::Active));
        assert!(stub.observe(IdleState::Idle));
        assert!(!stub.observe(IdleState::Idle));
        assert!(stub.observe(IdleState::Locked));

        let sent = host.drain();
        assert_eq!(sent.len(), 2);

        let text = sent[0].frame().arg(0).and_then(Value::as_str).expect("text");
        let records = decode_batch(text).expect("batch");
        assert_eq!(records[0].action_type, ActionType::IdleStateChanged);
        assert_eq!(records[0].get("idleState"), Some(&json!("idle")));
        assert_eq!(stub.state(), IdleState::Locked);
    }

    #[test]
    fn test_idle_state_serde() {
        assert_eq!(serde_json::to_value(IdleState::Locked).unwrap(), json!("locked"));
        let state: IdleState = serde_json::from_value(json!("idle")).unwrap();
        assert_eq!(state, IdleState::Idle);
    }
}
