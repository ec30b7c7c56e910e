//! Frame and envelope types.
//!
//! A frame is the unit every message is serialized to: the JSON array
//! `[eventName, ...args]`. Envelopes wrap frames with the addressing data the
//! Channel Transport supplies.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::SourceHandle;

// ============================================================================
// Frame
// ============================================================================

/// A named event with its positional arguments.
///
/// # Format
///
/// ```json
/// ["settings-updated", { "general.language": "en-US" }]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Event name (first array element).
    pub event: String,
    /// Remaining array elements.
    pub args: Vec<Value>,
}

impl Frame {
    /// Creates a frame.
    #[inline]
    #[must_use]
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }

    /// Creates a frame without arguments.
    #[inline]
    #[must_use]
    pub fn bare(event: impl Into<String>) -> Self {
        Self::new(event, Vec::new())
    }

    /// Returns the argument at `index`.
    #[inline]
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Returns the first argument, or `Null` when absent.
    #[inline]
    #[must_use]
    pub fn detail(&self) -> Value {
        self.args.first().cloned().unwrap_or(Value::Null)
    }

    /// Converts the frame into its array form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Value::String(self.event.clone()));
        items.extend(self.args.iter().cloned());
        Value::Array(items)
    }

    /// Serializes the frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    /// Decodes a frame from its array form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] unless `value` is a non-empty array whose
    /// first element is a string.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(mut items) = value else {
            return Err(Error::protocol("frame is not an array"));
        };

        if items.is_empty() {
            return Err(Error::protocol("frame is empty"));
        }

        let Value::String(event) = items.remove(0) else {
            return Err(Error::protocol("frame event name is not a string"));
        };

        Ok(Self { event, args: items })
    }

    /// Decodes a frame from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for invalid JSON, [`Error::Protocol`] for a
    /// valid document with the wrong shape.
    pub fn decode(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// An inbound message as delivered by the Channel Transport.
///
/// # Format
///
/// ```json
/// {
///   "origin": "file://",
///   "source": "embedder-1",
///   "payload": ["zoom-in"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Declared origin of the sender.
    pub origin: String,
    /// Handle used to address replies to the sender.
    pub source: SourceHandle,
    /// Undecoded frame.
    pub payload: Value,
}

impl Envelope {
    /// Creates an envelope around an already-built frame.
    #[must_use]
    pub fn new(origin: impl Into<String>, source: impl Into<SourceHandle>, frame: &Frame) -> Self {
        Self {
            origin: origin.into(),
            source: source.into(),
            payload: frame.to_value(),
        }
    }
}

// ============================================================================
// OutboundEnvelope
// ============================================================================

/// An outbound message written by socket transports.
///
/// `target` is the bound counterpart, or `None` for the host process channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Addressed counterpart.
    pub target: Option<SourceHandle>,
    /// Frame in array form.
    pub payload: Value,
}

impl OutboundEnvelope {
    /// Creates an envelope for `frame`.
    #[inline]
    #[must_use]
    pub fn new(target: Option<SourceHandle>, frame: &Frame) -> Self {
        Self {
            target,
            payload: frame.to_value(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
