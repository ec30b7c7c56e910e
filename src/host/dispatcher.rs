//! Central action dispatcher.
//!
//! Receives `dispatch-action` batches from content contexts and fans each
//! record out to every registered callback, in registration order.
//!
//! # Re-entrancy
//!
//! A dispatch issued while another is running (from a callback, or from
//! another thread) is queued and delivered by the running dispatch after
//! the current record. Dispatches never nest.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{ActionRecord, Frame, decode_batch, names};

/// Field stamped with the originating tab.
const SENDER_TAB_ID: &str = "senderTabId";

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for every dispatched record.
pub type ActionCallback = Arc<dyn Fn(&ActionRecord) + Send + Sync>;

/// Handle returned by [`Dispatcher::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Default)]
struct DispatchState {
    queue: VecDeque<ActionRecord>,
    dispatching: bool,
}

/// Clears the dispatching flag if a callback unwinds out of the drain loop.
struct DrainGuard<'a> {
    state: &'a Mutex<DispatchState>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }

        let mut state = self.state.lock();
        let dropped = state.queue.len();
        state.queue.clear();
        state.dispatching = false;
        warn!(dropped, "Action callback panicked, queued actions dropped");
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Host-side action dispatcher.
#[derive(Default)]
pub struct Dispatcher {
    callbacks: Mutex<Vec<(CallbackId, ActionCallback)>>,
    state: Mutex<DispatchState>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` after all existing ones.
    pub fn register<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ActionRecord) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.lock().push((id, Arc::new(callback)));
        id
    }

    /// Removes a callback. Returns `false` if it was not registered.
    pub fn unregister(&self, id: CallbackId) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Stops delivering; later dispatches are dropped.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        self.state.lock().queue.clear();
    }

    /// Dispatches one record, or queues it if a dispatch is running.
    pub fn dispatch(&self, record: ActionRecord) {
        if self.shut_down.load(Ordering::Acquire) {
            trace!(action_type = %record.action_type, "Dispatcher shut down, dropping action");
            return;
        }

        {
            let mut state = self.state.lock();
            state.queue.push_back(record);
            if state.dispatching {
                trace!(queued = state.queue.len(), "Dispatch in progress, queued");
                return;
            }
            state.dispatching = true;
        }

        let _guard = DrainGuard { state: &self.state };
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(record) => record,
                    None => {
                        state.dispatching = false;
                        break;
                    }
                }
            };
            self.deliver(&next);
        }
    }

    /// Decodes a serialized batch and dispatches each record.
    ///
    /// When `sender_tab` is given it is stamped on every record as
    /// `senderTabId`. Returns the number of records dispatched.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if `text` is not JSON
    /// - [`Error::InvalidAction`] if any record lacks a string `actionType`;
    ///   nothing from the batch is dispatched in that case
    pub fn dispatch_serialized(&self, text: &str, sender_tab: Option<u64>) -> Result<usize> {
        let records = decode_batch(text)?;
        let count = records.len();

        for mut record in records {
            if let Some(tab) = sender_tab {
                record.fields.insert(SENDER_TAB_ID.to_string(), Value::from(tab));
            }
            self.dispatch(record);
        }

        Ok(count)
    }

    /// Handles a `dispatch-action` frame from a content context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for any other event or a non-text payload,
    /// plus the errors of [`dispatch_serialized`](Self::dispatch_serialized).
    pub fn handle_frame(&self, frame: &Frame, sender_tab: Option<u64>) -> Result<usize> {
        if frame.event != names::DISPATCH_ACTION {
            return Err(Error::protocol(format!(
                "Expected {}, got {}",
                names::DISPATCH_ACTION,
                frame.event
            )));
        }

        let text = frame
            .arg(0)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("dispatch-action payload must be text"))?;

        self.dispatch_serialized(text, sender_tab).inspect_err(|e| {
            warn!(error = %e, "Rejected action batch");
        })
    }

    fn deliver(&self, record: &ActionRecord) {
        let callbacks: Vec<ActionCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        debug!(
            action_type = %record.action_type,
            callbacks = callbacks.len(),
            "Dispatching action"
        );

        for callback in callbacks {
            callback(record);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
