//! Event Subscription Table.
//!
//! Maps an event name to exactly one handler. Registering again under the
//! same name replaces the previous handler. A handler registered with
//! [`SubscriptionTable::once`] is removed from the table before it runs, so
//! a second delivery under that name finds nothing.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::protocol::Frame;

// ============================================================================
// Types
// ============================================================================

/// Handler callback type.
///
/// Receives the full decoded frame (event name and arguments).
pub type Handler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// Single-fire handler callback type.
pub type OnceHandler = Box<dyn FnOnce(&Frame) + Send>;

/// A table entry.
enum Subscription {
    /// Fires on every delivery.
    Persistent(Handler),
    /// Fires on the first delivery, then is gone.
    Once(OnceHandler),
}

/// What dispatch pulled out of the table.
pub(crate) enum Resolved {
    Persistent(Handler),
    Once(OnceHandler),
}

impl Resolved {
    /// Runs the handler.
    pub(crate) fn invoke(self, frame: &Frame) {
        match self {
            Self::Persistent(handler) => handler(frame),
            Self::Once(handler) => handler(frame),
        }
    }
}

// ============================================================================
// SubscriptionTable
// ============================================================================

/// Event name to handler mapping.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: FxHashMap<String, Subscription>,
}

impl SubscriptionTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, replacing any handler under `event`.
    pub fn on(&mut self, event: impl Into<String>, handler: Handler) {
        self.entries
            .insert(event.into(), Subscription::Persistent(handler));
    }

    /// Registers a single-fire handler, replacing any handler under `event`.
    pub fn once(&mut self, event: impl Into<String>, handler: OnceHandler) {
        self.entries.insert(event.into(), Subscription::Once(handler));
    }

    /// Removes the handler under `event`. Returns `true` if one was present.
    pub fn off(&mut self, event: &str) -> bool {
        self.entries.remove(event).is_some()
    }

    /// Returns `true` if a handler is registered under `event`.
    #[inline]
    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.entries.contains_key(event)
    }

    /// Returns the number of registered names.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the handler for `event`.
    ///
    /// Persistent handlers are cloned out; single-fire handlers are removed.
    /// The caller invokes the result after releasing any lock on the table.
    pub(crate) fn resolve(&mut self, event: &str) -> Option<Resolved> {
        match self.entries.get(event)? {
            Subscription::Persistent(handler) => Some(Resolved::Persistent(Arc::clone(handler))),
            Subscription::Once(_) => match self.entries.remove(event)? {
                Subscription::Once(handler) => Some(Resolved::Once(handler)),
                Subscription::Persistent(handler) => Some(Resolved::Persistent(handler)),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
