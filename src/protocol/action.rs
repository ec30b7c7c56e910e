//! Action records.
//!
//! An action is a serializable instruction for the host's central
//! dispatcher: a required `actionType` string plus arbitrary fields.
//!
//! # Format
//!
//! ```json
//! { "actionType": "app-idle-state-changed", "idleState": "idle" }
//! ```
//!
//! Records always travel as a list. Content contexts currently send batches
//! of one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// ActionType
// ============================================================================

/// Action kinds the bundled stubs emit.
///
/// Unknown kinds pass through as [`ActionType::Other`]; rejecting them is the
/// host's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    /// Host-reported idle/active transition.
    IdleStateChanged,
    /// Content was blocked (scripts suppressed by noScript).
    SetBlockedBy,
    /// Page asks for the current wallet balance.
    WalletBalanceRequested,
    /// Any other kind.
    Other(String),
}

impl ActionType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::IdleStateChanged => "app-idle-state-changed",
            Self::SetBlockedBy => "window-set-blocked-by",
            Self::WalletBalanceRequested => "app-wallet-balance-requested",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "app-idle-state-changed" => Self::IdleStateChanged,
            "window-set-blocked-by" => Self::SetBlockedBy,
            "app-wallet-balance-requested" => Self::WalletBalanceRequested,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ActionType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        match value {
            ActionType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ActionRecord
// ============================================================================

/// One action: `actionType` merged with its payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Action kind.
    #[serde(rename = "actionType")]
    pub action_type: ActionType,

    /// Additional payload fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ActionRecord {
    /// Creates a record, dropping any `actionType` key in `fields`.
    #[must_use]
    pub fn new(action_type: impl Into<ActionType>, mut fields: Map<String, Value>) -> Self {
        fields.remove("actionType");
        Self {
            action_type: action_type.into(),
            fields,
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "actionType" {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Returns a field value.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Validates and converts a raw JSON object into a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAction`] if `value` is not an object or has no
    /// string `actionType`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::invalid_action("action record is not an object"));
        };

        match fields.remove("actionType") {
            Some(Value::String(action_type)) => Ok(Self {
                action_type: ActionType::from(action_type),
                fields,
            }),
            Some(_) => Err(Error::invalid_action("actionType is not a string")),
            None => Err(Error::invalid_action("undefined actionType")),
        }
    }
}

// ============================================================================
// Batch Serialization
// ============================================================================

/// Serializes records as a JSON list in text form.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn encode_batch(records: &[ActionRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parses a text batch, validating every record.
///
/// # Errors
///
/// - [`Error::Json`] if `text` is not JSON
/// - [`Error::InvalidAction`] if it is not a list or a record is invalid
pub fn decode_batch(text: &str) -> Result<Vec<ActionRecord>> {
    let Value::Array(items) = serde_json::from_str::<Value>(text)? else {
        return Err(Error::invalid_action("action batch is not a list"));
    };

    items.into_iter().map(ActionRecord::from_value).collect()
}

// ============================================================================
// Tests
// ============================================================================
