//! Hydration handshake.
//!
//! A freshly loaded page receives each initial-state snapshot exactly once.
//! The page attaches a single-fire listener per snapshot, then tells the host
//! it is ready. The host (re-)emits after the ready signal, so the snapshot
//! arrives regardless of whether the host's data was ready before or after
//! the listener attached. Emissions before the listener exists find no
//! handler and are dropped; emissions after the first delivery find none
//! either, because the single-fire entry is already gone from the table.
//!
//! # Example
//!
//! ```no_run
//! use embedder_bridge::{Hydration, SnapshotKind};
//!
//! # async fn example(hydration: Hydration) -> embedder_bridge::Result<()> {
//! let mut pending = hydration.request(&[SnapshotKind::Settings, SnapshotKind::Bookmarks])?;
//! let settings = pending.remove(0).recv().await?;
//! println!("settings: {}", settings.detail());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{Frame, SnapshotKind, names};

use super::core::Bridge;

// ============================================================================
// SnapshotStore
// ============================================================================

/// Page-global holder for delivered snapshots, keyed by event name.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slots: Mutex<FxHashMap<String, Value>>,
}

impl SnapshotStore {
    /// Returns the delivered payload for `event`.
    #[must_use]
    pub fn get(&self, event: &str) -> Option<Value> {
        self.slots.lock().get(event).cloned()
    }

    /// Returns `true` once `event` was delivered.
    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.slots.lock().contains_key(event)
    }

    /// Stores the first delivery for `event`. Returns `false` if one was
    /// already stored; the stored payload is never replaced.
    fn insert_first(&self, event: &str, payload: Value) -> bool {
        let mut slots = self.slots.lock();
        if slots.contains_key(event) {
            return false;
        }
        slots.insert(event.to_string(), payload);
        true
    }
}

// ============================================================================
// SnapshotReceiver
// ============================================================================

/// Resolves with the first (and only) delivery of one snapshot event.
#[derive(Debug)]
pub struct SnapshotReceiver {
    event: String,
    rx: oneshot::Receiver<Frame>,
}

impl SnapshotReceiver {
    /// Returns the event name this receiver waits on.
    #[inline]
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Waits for the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the listener was replaced or the
    /// context was torn down before delivery.
    pub async fn recv(self) -> Result<Frame> {
        Ok(self.rx.await?)
    }

    /// Waits for the snapshot at most `limit`.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceUnavailable`] if nothing arrived in time
    /// - [`Error::ChannelClosed`] as for [`recv`](Self::recv)
    pub async fn recv_timeout(self, limit: Duration) -> Result<Frame> {
        let event = self.event.clone();
        match timeout(limit, self.rx).await {
            Ok(frame) => Ok(frame?),
            Err(_) => Err(Error::service_unavailable(
                event,
                format!("no snapshot within {}ms", limit.as_millis()),
            )),
        }
    }

    /// Returns the snapshot if it already arrived.
    #[must_use]
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

// ============================================================================
// Hydration
// ============================================================================

/// Per-context hydration coordinator.
#[derive(Debug, Clone)]
pub struct Hydration {
    bridge: Bridge,
    store: Arc<SnapshotStore>,
}

impl Hydration {
    /// Creates a coordinator over `bridge`.
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            store: Arc::new(SnapshotStore::default()),
        }
    }

    /// Returns the page-global snapshot holder.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Attaches a single-fire listener for `kind`.
    pub fn listen(&self, kind: SnapshotKind) -> SnapshotReceiver {
        self.listen_event(kind.event_name())
    }

    /// Attaches a single-fire listener for an arbitrary event name.
    ///
    /// On first delivery the payload is copied into the store and the
    /// receiver resolves; the listener is detached before it runs.
    ///
    /// Once `event` was delivered no listener is attached again: the
    /// returned receiver is already resolved with the stored snapshot and
    /// later emissions under `event` find no observer.
    pub fn listen_event(&self, event: impl Into<String>) -> SnapshotReceiver {
        let event = event.into();
        let (tx, rx) = oneshot::channel();

        if let Some(payload) = self.store.get(&event) {
            trace!(%event, "Snapshot already delivered, not listening again");
            let _ = tx.send(Frame::new(event.clone(), vec![payload]));
            return SnapshotReceiver { event, rx };
        }

        let store = Arc::clone(&self.store);
        self.bridge.once(event.clone(), move |frame: &Frame| {
            if !store.insert_first(&frame.event, frame.detail()) {
                debug!(event = %frame.event, "Duplicate snapshot dropped");
                return;
            }
            trace!(event = %frame.event, "Snapshot delivered");
            let _ = tx.send(frame.clone());
        });

        SnapshotReceiver { event, rx }
    }

    /// Returns `true` once `kind` was delivered.
    #[must_use]
    pub fn is_delivered(&self, kind: SnapshotKind) -> bool {
        self.store.contains(kind.event_name())
    }

    /// Tells the host the page is listening for `events`.
    ///
    /// Sent on the host process channel so it works before any counterpart
    /// is bound.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the host channel is gone.
    pub fn signal_ready<S: AsRef<str>>(&self, events: &[S]) -> Result<()> {
        let names: Vec<Value> = events
            .iter()
            .map(|event| Value::String(event.as_ref().to_string()))
            .collect();

        debug!(count = names.len(), "Signalling hydration ready");

        self.bridge
            .transport()
            .send_to_host(Frame::new(names::HYDRATION_READY, vec![Value::Array(names)]))
    }

    /// Listens for every kind in `kinds`, then signals readiness.
    ///
    /// Receivers are returned in the order of `kinds`; each completes
    /// independently. Kinds already delivered resolve immediately and are
    /// left out of the ready signal, which is skipped when nothing is left.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the ready signal could not be sent.
    /// The listeners stay attached.
    pub fn request(&self, kinds: &[SnapshotKind]) -> Result<Vec<SnapshotReceiver>> {
        let events: Vec<&str> = kinds
            .iter()
            .filter(|kind| !self.is_delivered(**kind))
            .map(|kind| kind.event_name())
            .collect();
        let receivers: Vec<_> = kinds.iter().map(|kind| self.listen(*kind)).collect();

        if !events.is_empty() {
            self.signal_ready(&events)?;
        }
        Ok(receivers)
    }

    /// Returns the delivered snapshot for `kind`.
    #[must_use]
    pub fn snapshot(&self, kind: SnapshotKind) -> Option<Value> {
        self.store.get(kind.event_name())
    }

    /// Returns `true` once every kind in `kinds` was delivered.
    #[must_use]
    pub fn is_complete(&self, kinds: &[SnapshotKind]) -> bool {
        kinds
            .iter()
            .all(|kind| self.store.contains(kind.event_name()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::bridge::{BridgeOptions, Delivery};
    use crate::protocol::Envelope;
    use crate::transport::{ChannelTransport, HostEnd, Outbound};

    fn hydration() -> (Hydration, Bridge, HostEnd) {
        let (transport, host) = ChannelTransport::pair();
        let bridge = Bridge::new(&BridgeOptions::new(), Arc::new(transport)).expect("valid options");
        (Hydration::new(bridge.clone()), bridge, host)
    }

    fn emit(bridge: &Bridge, event: &str, payload: Value) -> Delivery {
        bridge.receive(Envelope::new(
            "file://",
            "embedder",
            &Frame::new(event, vec![payload]),
        ))
    }

    #[tokio::test]
    async fn test_settings_delivered_exactly_once() {
        let (hydration, bridge, _host) = hydration();
        let receiver = hydration.listen(SnapshotKind::Settings);

        assert_eq!(
            emit(&bridge, "settings-updated", json!({"v": 1})),
            Delivery::Delivered
        );
        assert_eq!(
            emit(&bridge, "settings-updated", json!({"v": 2})),
            Delivery::Unrouted
        );

        let frame = receiver.recv().await.expect("snapshot");
        assert_eq!(frame.detail(), json!({"v": 1}));
        assert_eq!(hydration.snapshot(SnapshotKind::Settings), Some(json!({"v": 1})));
    }

    #[test]
    fn test_emission_before_listener_is_not_observed() {
        let (hydration, bridge, _host) = hydration();
        assert_eq!(
            emit(&bridge, "bookmarks-updated", json!({"bookmarks": []})),
            Delivery::Unrouted
        );

        let mut receiver = hydration.listen(SnapshotKind::Bookmarks);
        assert!(receiver.try_recv().is_none());
        assert!(hydration.snapshot(SnapshotKind::Bookmarks).is_none());
    }

    #[test]
    fn test_request_listens_then_signals() {
        let (hydration, bridge, mut host) = hydration();
        let receivers = hydration
            .request(&[SnapshotKind::Settings, SnapshotKind::PasswordDetails])
            .expect("request");

        assert_eq!(receivers.len(), 2);
        assert!(bridge.has_handler("settings-updated"));
        assert!(bridge.has_handler("password-details-updated"));

        let outbound = host.try_recv().expect("ready signal");
        assert_eq!(
            outbound,
            Outbound::Host {
                frame: Frame::new(
                    "hydration-ready",
                    vec![json!(["settings-updated", "password-details-updated"])],
                ),
            }
        );
    }

    #[test]
    fn test_kinds_complete_independently() {
        let (hydration, bridge, _host) = hydration();
        let kinds = [SnapshotKind::Settings, SnapshotKind::SiteSettings];
        let _receivers = hydration.request(&kinds).expect("request");

        emit(&bridge, "site-settings-updated", json!({}));
        assert!(!hydration.is_complete(&kinds));

        emit(&bridge, "settings-updated", json!({}));
        assert!(hydration.is_complete(&kinds));
    }

    #[tokio::test]
    async fn test_listen_after_delivery_never_reattaches() {
        let (hydration, bridge, _host) = hydration();
        let first = hydration.listen(SnapshotKind::Settings);
        emit(&bridge, "settings-updated", json!({"v": 1}));
        assert_eq!(first.recv().await.expect("first").detail(), json!({"v": 1}));

        let mut again = hydration.listen(SnapshotKind::Settings);
        assert!(!bridge.has_handler("settings-updated"));
        assert_eq!(
            again.try_recv().map(|frame| frame.detail()),
            Some(json!({"v": 1}))
        );

        assert_eq!(
            emit(&bridge, "settings-updated", json!({"v": 2})),
            Delivery::Unrouted
        );
        assert_eq!(hydration.snapshot(SnapshotKind::Settings), Some(json!({"v": 1})));
    }

    #[test]
    fn test_request_skips_ready_for_delivered_kinds() {
        let (hydration, bridge, mut host) = hydration();
        let _settings = hydration.listen(SnapshotKind::Settings);
        emit(&bridge, "settings-updated", json!({}));

        let receivers = hydration
            .request(&[SnapshotKind::Settings, SnapshotKind::Bookmarks])
            .expect("request");
        assert_eq!(receivers.len(), 2);

        let outbound = host.try_recv().expect("ready signal");
        assert_eq!(outbound.frame().detail(), json!(["bookmarks-updated"]));

        let _ = hydration.request(&[SnapshotKind::Settings]).expect("request");
        assert!(host.try_recv().is_none());
    }

    #[test]
    fn test_store_keeps_first_payload() {
        let store = SnapshotStore::default();
        assert!(store.insert_first("language", json!("en-US")));
        assert!(!store.insert_first("language", json!("de")));
        assert_eq!(store.get("language"), Some(json!("en-US")));
    }

    #[tokio::test]
    async fn test_recv_closed_when_listener_replaced() {
        let (hydration, _bridge, _host) = hydration();
        let first = hydration.listen(SnapshotKind::Language);
        let _second = hydration.listen(SnapshotKind::Language);

        let err = first.recv().await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed(_)));
    }

    #[tokio::test]
    async fn test_recv_timeout() {
        let (hydration, _bridge, _host) = hydration();
        let receiver = hydration.listen(SnapshotKind::Downloads);

        let err = receiver
            .recv_timeout(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { .. }));
    }
}
