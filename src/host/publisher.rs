//! Snapshot publisher.
//!
//! Keeps the most recent payload per hydration event and re-emits the
//! requested ones when a page signals `hydration-ready`. A page therefore
//! receives its snapshot even if the first emission happened before its
//! listener existed.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{Frame, names};

// ============================================================================
// Types
// ============================================================================

/// Sends a frame toward a page.
pub type EmitFn = Box<dyn Fn(Frame) + Send + Sync>;

// ============================================================================
// HydrationPublisher
// ============================================================================

/// Host-side half of the hydration handshake.
pub struct HydrationPublisher {
    latest: Mutex<FxHashMap<String, Value>>,
    emit: EmitFn,
}

impl HydrationPublisher {
    /// Creates a publisher that emits through `emit`.
    #[must_use]
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(Frame) + Send + Sync + 'static,
    {
        Self {
            latest: Mutex::new(FxHashMap::default()),
            emit: Box::new(emit),
        }
    }

    /// Stores `payload` as the latest snapshot for `event` and emits it.
    pub fn publish(&self, event: &str, payload: Value) {
        self.latest.lock().insert(event.to_string(), payload.clone());
        trace!(%event, "Snapshot published");
        (self.emit)(Frame::new(event, vec![payload]));
    }

    /// Returns the latest snapshot for `event`.
    #[must_use]
    pub fn latest(&self, event: &str) -> Option<Value> {
        self.latest.lock().get(event).cloned()
    }

    /// Re-emits the latest snapshot for each of `events`.
    ///
    /// Names with nothing published yet are skipped; they go out on the
    /// next [`publish`](Self::publish). Returns the number re-emitted.
    pub fn handle_ready<S: AsRef<str>>(&self, events: &[S]) -> usize {
        let frames: Vec<Frame> = {
            let latest = self.latest.lock();
            events
                .iter()
                .filter_map(|event| {
                    let event = event.as_ref();
                    latest
                        .get(event)
                        .map(|payload| Frame::new(event, vec![payload.clone()]))
                })
                .collect()
        };

        let count = frames.len();
        for frame in frames {
            (self.emit)(frame);
        }

        debug!(requested = events.len(), resent = count, "Page ready, snapshots resent");
        count
    }

    /// Handles a `hydration-ready` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for any other event or if the first
    /// argument is not a list of names.
    pub fn handle_frame(&self, frame: &Frame) -> Result<usize> {
        if frame.event != names::HYDRATION_READY {
            return Err(Error::protocol(format!(
                "Expected {}, got {}",
                names::HYDRATION_READY,
                frame.event
            )));
        }

        let events: Vec<&str> = frame
            .arg(0)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::protocol("hydration-ready payload must be a list"))?
            .iter()
            .filter_map(Value::as_str)
            .collect();

        Ok(self.handle_ready(&events))
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

    fn publisher() -> (HydrationPublisher, Arc<Mutex<Vec<Frame>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&sent);
        (
            HydrationPublisher::new(move |frame| log.lock().push(frame)),
            sent,
        )
    }

    #[test]
    fn test_publish_emits_and_buffers_latest() {
        let (publisher, sent) = publisher();
        publisher.publish("settings-updated", json!({"v": 1}));
        publisher.publish("settings-updated", json!({"v": 2}));

        assert_eq!(sent.lock().len(), 2);
        assert_eq!(publisher.latest("settings-updated"), Some(json!({"v": 2})));
    }

    #[test]
    fn test_ready_resends_requested_only() {
        let (publisher, sent) = publisher();
        publisher.publish("settings-updated", json!({"v": 1}));
        publisher.publish("bookmarks-updated", json!({"bookmarks": []}));
        sent.lock().clear();

        let count = publisher
            .handle_frame(&Frame::new(
                "hydration-ready",
                vec![json!(["bookmarks-updated", "language"])],
            ))
            .expect("ready");

        assert_eq!(count, 1);
        assert_eq!(
            *sent.lock(),
            vec![Frame::new("bookmarks-updated", vec![json!({"bookmarks": []})])]
        );
    }

    #[test]
    fn test_handle_frame_rejects_bad_shape() {
        let (publisher, _) = publisher();

        assert!(publisher.handle_frame(&Frame::bare("zoom-in")).is_err());
        assert!(
            publisher
                .handle_frame(&Frame::new("hydration-ready", vec![json!("settings-updated")]))
                .is_err()
        );
    }
}
