//! Origin-gated bridge.
//!
//! One [`Bridge`] per content context. It owns the Event Subscription Table
//! and the Channel Binding, and enforces the security boundary: inbound
//! traffic must declare the expected origin before anything else happens.
//!
//! # Inbound Processing
//!
//! 1. Origin check (mismatch: drop, nothing else runs)
//! 2. Bind the sender as counterpart if nothing is bound yet
//! 3. Decode the frame (malformed: drop)
//! 4. Look up the handler by event name (miss: drop)
//! 5. Invoke the handler with the full frame
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use embedder_bridge::{Bridge, BridgeOptions, Envelope, Frame};
//! use embedder_bridge::transport::ChannelTransport;
//!
//! # fn main() -> embedder_bridge::Result<()> {
//! let (transport, _host) = ChannelTransport::pair();
//! let bridge = Bridge::new(&BridgeOptions::new(), Arc::new(transport))?;
//!
//! bridge.on("ping", |frame| println!("got {}", frame.event));
//! bridge.receive(Envelope::new("file://", "embedder", &Frame::bare("ping")));
//!
//! assert!(bridge.is_bound());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::identifiers::{ContextId, SourceHandle};
use crate::protocol::{Envelope, Frame, ParsedEvent};
use crate::transport::Transport;

use super::options::BridgeOptions;
use super::subscription::SubscriptionTable;

// ============================================================================
// Delivery
// ============================================================================

/// Outcome of processing one inbound message.
///
/// Reported to the transport pump for diagnostics; page code never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Origin did not match; dropped before any other processing.
    Rejected,
    /// Payload was not a valid frame.
    Malformed,
    /// No handler registered for the event name.
    Unrouted,
    /// A handler ran.
    Delivered,
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a bridge.
struct BridgeInner {
    /// Context id for logs.
    context_id: ContextId,
    /// The single trusted origin.
    expected_origin: String,
    /// Write-once counterpart binding.
    embedder: OnceLock<SourceHandle>,
    /// Event name to handler table.
    subscriptions: Mutex<SubscriptionTable>,
    /// Sending half of the Channel Transport.
    transport: Arc<dyn Transport>,
}

// ============================================================================
// Bridge
// ============================================================================

/// Named-event pub/sub bound to one verified counterpart.
///
/// Cloning is cheap and every clone shares the same binding and table.
/// Construct a fresh bridge per page load; never share one across contexts.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("context_id", &self.inner.context_id)
            .field("expected_origin", &self.inner.expected_origin)
            .field("embedder", &self.inner.embedder.get())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Bridge - Constructor
// ============================================================================

impl Bridge {
    /// Creates an unbound bridge with an empty subscription table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `options` are
    /// invalid, e.g. an empty expected origin.
    pub fn new(options: &BridgeOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        options.validate()?;

        let context_id = ContextId::generate();
        debug!(context = %context_id, origin = %options.expected_origin, "Bridge created");

        Ok(Self {
            inner: Arc::new(BridgeInner {
                context_id,
                expected_origin: options.expected_origin.clone(),
                embedder: OnceLock::new(),
                subscriptions: Mutex::new(SubscriptionTable::new()),
                transport,
            }),
        })
    }
}

// ============================================================================
// Bridge - Accessors
// ============================================================================

impl Bridge {
    /// Returns the context id.
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.inner.context_id
    }

    /// Returns the trusted origin.
    #[inline]
    #[must_use]
    pub fn expected_origin(&self) -> &str {
        &self.inner.expected_origin
    }

    /// Returns the bound counterpart, if any.
    #[inline]
    #[must_use]
    pub fn embedder(&self) -> Option<&SourceHandle> {
        self.inner.embedder.get()
    }

    /// Returns `true` once a counterpart is bound.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.embedder.get().is_some()
    }

    /// Returns the underlying transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Returns `true` if a handler is registered under `event`.
    #[inline]
    #[must_use]
    pub fn has_handler(&self, event: &str) -> bool {
        self.inner.subscriptions.lock().contains(event)
    }
}

// ============================================================================
// Bridge - Public API
// ============================================================================

impl Bridge {
    /// Registers `handler` under `event`, replacing any previous one.
    pub fn on<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.inner
            .subscriptions
            .lock()
            .on(event, Arc::new(handler));
    }

    /// Registers a handler that runs on the first delivery only.
    ///
    /// The entry leaves the table before the handler runs, so later
    /// deliveries under `event` find no observer.
    pub fn once<F>(&self, event: impl Into<String>, handler: F)
    where
        F: FnOnce(&Frame) + Send + 'static,
    {
        self.inner
            .subscriptions
            .lock()
            .once(event, Box::new(handler));
    }

    /// Removes the handler under `event`.
    pub fn off(&self, event: &str) -> bool {
        self.inner.subscriptions.lock().off(event)
    }

    /// Sends `[event, ...args]` to the bound counterpart.
    ///
    /// Before any counterpart is bound this is a silent no-op: the frame is
    /// dropped, not queued. Transport failures are logged and swallowed.
    pub fn send(&self, event: impl Into<String>, args: Vec<Value>) {
        let Some(target) = self.inner.embedder.get() else {
            trace!(context = %self.inner.context_id, "Send before binding dropped");
            return;
        };

        let frame = Frame::new(event, args);
        let event = frame.event.clone();

        if let Err(e) = self.inner.transport.post_message(target, frame) {
            warn!(context = %self.inner.context_id, %event, error = %e, "Failed to post frame");
        }
    }

    /// Processes one inbound message from the Channel Transport.
    pub fn receive(&self, envelope: Envelope) -> Delivery {
        let Envelope {
            origin,
            source,
            payload,
        } = envelope;

        if origin != self.inner.expected_origin {
            debug!(context = %self.inner.context_id, %origin, "Dropping message from untrusted origin");
            return Delivery::Rejected;
        }

        self.bind(source);

        let frame = match Frame::from_value(payload) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(context = %self.inner.context_id, error = %e, "Dropping malformed frame");
                return Delivery::Malformed;
            }
        };

        if !ParsedEvent::is_known(&frame.event) {
            debug!(context = %self.inner.context_id, event = %frame.event, "Unknown event kind");
        }

        // Lock released before the handler runs so it may touch the table.
        let resolved = self.inner.subscriptions.lock().resolve(&frame.event);

        match resolved {
            Some(handler) => {
                trace!(context = %self.inner.context_id, event = %frame.event, "Dispatching");
                handler.invoke(&frame);
                Delivery::Delivered
            }
            None => {
                trace!(context = %self.inner.context_id, event = %frame.event, "No handler");
                Delivery::Unrouted
            }
        }
    }

    /// Binds `source` unless a counterpart is already bound.
    fn bind(&self, source: SourceHandle) {
        let bound = self.inner.embedder.get_or_init(|| source.clone());

        if *bound == source {
            return;
        }

        debug!(
            context = %self.inner.context_id,
            bound = %bound,
            attempted = %source,
            "Ignoring rebind attempt"
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::transport::{ChannelTransport, HostEnd, Outbound};

    fn bridge() -> (Bridge, HostEnd) {
        let (transport, host) = ChannelTransport::pair();
        (
            Bridge::new(&BridgeOptions::new(), Arc::new(transport)).expect("valid options"),
            host,
        )
    }

    #[test]
    fn test_empty_origin_rejected() {
        let (transport, _host) = ChannelTransport::pair();
        let options = BridgeOptions::new().with_expected_origin("");

        let err = Bridge::new(&options, Arc::new(transport)).unwrap_err();
        assert!(matches!(err, crate::Error::Config { .. }));
    }

    fn trusted(source: &str, frame: &Frame) -> Envelope {
        Envelope::new("file://", source, frame)
    }

    #[test]
    fn test_send_before_binding_is_noop() {
        let (bridge, mut host) = bridge();
        bridge.send("hello", vec![json!(1)]);

        assert!(!bridge.is_bound());
        assert!(host.try_recv().is_none());
    }

    #[test]
    fn test_untrusted_origin_rejected_before_binding() {
        let (bridge, _host) = bridge();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bridge.on("ping", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let delivery = bridge.receive(Envelope::new(
            "https://evil.example",
            "attacker",
            &Frame::bare("ping"),
        ));

        assert_eq!(delivery, Delivery::Rejected);
        assert!(!bridge.is_bound());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_sender_binds_and_receives_replies() {
        let (bridge, mut host) = bridge();
        bridge.receive(trusted("embedder-1", &Frame::bare("hello")));
        bridge.send("reply", vec![json!("ok")]);

        assert_eq!(bridge.embedder(), Some(&SourceHandle::from("embedder-1")));
        assert_eq!(
            host.try_recv(),
            Some(Outbound::Embedder {
                target: SourceHandle::from("embedder-1"),
                frame: Frame::new("reply", vec![json!("ok")]),
            })
        );
    }

    #[test]
    fn test_binding_never_changes() {
        let (bridge, _host) = bridge();
        bridge.receive(trusted("embedder-1", &Frame::bare("hello")));

        for i in 0..10 {
            bridge.receive(Envelope::new(
                "file://",
                format!("impostor-{i}"),
                &Frame::bare("hello"),
            ));
        }

        assert_eq!(bridge.embedder(), Some(&SourceHandle::from("embedder-1")));
    }

    #[test]
    fn test_handler_receives_full_frame() {
        let (bridge, _host) = bridge();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        bridge.on("settings-updated", move |frame| {
            *slot.lock() = Some(frame.clone());
        });

        let frame = Frame::new("settings-updated", vec![json!({"a": 1}), json!(2)]);
        assert_eq!(bridge.receive(trusted("e", &frame)), Delivery::Delivered);
        assert_eq!(seen.lock().clone(), Some(frame));
    }

    #[test]
    fn test_unrouted_and_malformed() {
        let (bridge, _host) = bridge();

        assert_eq!(
            bridge.receive(trusted("e", &Frame::bare("nobody-listens"))),
            Delivery::Unrouted
        );

        let malformed = Envelope {
            origin: "file://".to_string(),
            source: SourceHandle::from("e"),
            payload: json!({"not": "a frame"}),
        };
        assert_eq!(bridge.receive(malformed), Delivery::Malformed);
    }

    #[test]
    fn test_malformed_trusted_message_still_binds() {
        let (bridge, _host) = bridge();
        let malformed = Envelope {
            origin: "file://".to_string(),
            source: SourceHandle::from("e"),
            payload: json!(42),
        };

        bridge.receive(malformed);
        assert!(bridge.is_bound());
    }

    #[test]
    fn test_once_handler_fires_once() {
        let (bridge, _host) = bridge();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bridge.once("settings-updated", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let frame = Frame::new("settings-updated", vec![json!({})]);
        assert_eq!(bridge.receive(trusted("e", &frame)), Delivery::Delivered);
        assert_eq!(bridge.receive(trusted("e", &frame)), Delivery::Unrouted);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_reregister_itself() {
        let (bridge, _host) = bridge();
        let inner = bridge.clone();
        bridge.on("swap", move |_| {
            inner.off("swap");
        });

        assert_eq!(
            bridge.receive(trusted("e", &Frame::bare("swap"))),
            Delivery::Delivered
        );
        assert!(!bridge.has_handler("swap"));
    }

    #[test]
    fn test_send_failure_is_swallowed() {
        let (bridge, host) = bridge();
        bridge.receive(trusted("e", &Frame::bare("hello")));
        drop(host);

        bridge.send("reply", Vec::new());
    }
}
