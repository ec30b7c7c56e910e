//! Synchronous queries.
//!
//! A query sends `[event, requestId, ...args]` on the host process channel
//! and suspends the caller until the host answers with
//! `["query-response", requestId, value]` through the origin-gated bridge,
//! or until the timeout elapses.
//!
//! # Correlation
//!
//! Each in-flight query holds a oneshot sender keyed by its [`RequestId`].
//! Responses for unknown ids (late, duplicated, or forged) are dropped.

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
use tracing::{debug, trace, warn};

use crate::bridge::{Bridge, BridgeOptions};
use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Frame, ParsedEvent, names};
use crate::transport::Transport;

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to reply channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Value>>;

// ============================================================================
// QueryClient
// ============================================================================

/// Request/response client for synchronous host services.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    correlation: Arc<Mutex<CorrelationMap>>,
    timeout: Duration,
    max_pending: usize,
}

impl QueryClient {
    /// Creates a client and registers the `query-response` handler on
    /// `bridge`.
    #[must_use]
    pub fn attach(bridge: &Bridge, options: &BridgeOptions) -> Self {
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));

        let pending = Arc::clone(&correlation);
        bridge.on(names::QUERY_RESPONSE, move |frame| {
            Self::resolve(&pending, frame);
        });

        Self {
            transport: Arc::clone(bridge.transport()),
            correlation,
            timeout: options.query_timeout,
            max_pending: options.max_pending_queries,
        }
    }

    /// Returns the number of in-flight queries.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns the per-query timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends a query and waits for the reply.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if too many queries are in flight
    /// - the transport error if the host channel is gone
    /// - [`Error::RequestTimeout`] if no reply arrives in time
    /// - [`Error::ConnectionClosed`] if the client was torn down while waiting
    pub async fn query(&self, event: &str, args: Vec<Value>) -> Result<Value> {
        let request_id = RequestId::generate();
        let (tx, rx) = oneshot::channel();

        {
            let mut correlation = self.correlation.lock();
            if correlation.len() >= self.max_pending {
                warn!(
                    pending = correlation.len(),
                    max = self.max_pending,
                    "Too many pending queries"
                );
                return Err(Error::protocol(format!(
                    "Too many pending queries: {}/{}",
                    correlation.len(),
                    self.max_pending
                )));
            }
            correlation.insert(request_id, tx);
        }

        let mut frame_args = Vec::with_capacity(args.len() + 1);
        frame_args.push(Value::String(request_id.to_string()));
        frame_args.extend(args);

        if let Err(e) = self.transport.send_to_host(Frame::new(event, frame_args)) {
            self.correlation.lock().remove(&request_id);
            return Err(e);
        }

        trace!(%request_id, %event, "Query sent");

        match timeout(self.timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.correlation.lock().remove(&request_id);
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                Err(Error::request_timeout(request_id, timeout_ms))
            }
        }
    }

    /// Fails every in-flight query with [`Error::ConnectionClosed`].
    pub fn cancel_all(&self) {
        let pending: Vec<_> = self.correlation.lock().drain().collect();
        let count = pending.len();

        // Dropping the senders wakes the waiters with a receive error.
        drop(pending);

        if count > 0 {
            debug!(count, "Cancelled pending queries");
        }
    }

    /// Completes the query a `query-response` frame answers.
    fn resolve(correlation: &Mutex<CorrelationMap>, frame: &Frame) {
        match ParsedEvent::parse(frame) {
            ParsedEvent::QueryResponse { request_id, value } => {
                let tx = correlation.lock().remove(&request_id);
                match tx {
                    Some(tx) => {
                        let _ = tx.send(value);
                    }
                    None => debug!(%request_id, "Response for unknown query"),
                }
            }
            other => debug!(?other, "Dropping malformed query response"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::Envelope;
    use crate::transport::{ChannelTransport, HostEnd, Outbound};

    fn client(options: BridgeOptions) -> (QueryClient, Bridge, HostEnd) {
        let (transport, host) = ChannelTransport::pair();
        let bridge = Bridge::new(&options, Arc::new(transport)).expect("valid options");
        let client = QueryClient::attach(&bridge, &options);
        (client, bridge, host)
    }

    fn reply(bridge: &Bridge, origin: &str, request_id: &str, value: Value) {
        bridge.receive(Envelope::new(
            origin,
            "host",
            &Frame::new(names::QUERY_RESPONSE, vec![json!(request_id), value]),
        ));
    }

    #[tokio::test]
    async fn test_query_roundtrip() {
        let (client, bridge, mut host) = client(BridgeOptions::new());

        let responder = tokio::spawn(async move {
            let Some(Outbound::Host { frame }) = host.recv().await else {
                panic!("expected query frame");
            };
            assert_eq!(frame.event, "is-misspelled");
            assert_eq!(frame.arg(1), Some(&json!("teh")));

            let id = frame.arg(0).and_then(Value::as_str).expect("id").to_string();
            reply(&bridge, "file://", &id, json!(true));
        });

        let value = client
            .query("is-misspelled", vec![json!("teh")])
            .await
            .expect("reply");
        responder.await.expect("responder");

        assert_eq!(value, json!(true));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_query_times_out_and_cleans_up() {
        let options = BridgeOptions::new().with_query_timeout(Duration::from_millis(20));
        let (client, _bridge, _host) = client(options);

        let err = client.query("is-misspelled", vec![json!("x")]).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_query_without_host_fails_fast() {
        let (client, _bridge, host) = client(BridgeOptions::new());
        drop(host);

        let err = client.query("is-misspelled", vec![json!("x")]).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_response_from_untrusted_origin_ignored() {
        let options = BridgeOptions::new().with_query_timeout(Duration::from_millis(50));
        let (client, bridge, mut host) = client(options);

        let forger = tokio::spawn(async move {
            let Some(outbound) = host.recv().await else {
                panic!("expected query frame");
            };
            let id = outbound
                .frame()
                .arg(0)
                .and_then(Value::as_str)
                .expect("id")
                .to_string();
            reply(&bridge, "https://evil.example", &id, json!(false));
        });

        let err = client.query("is-misspelled", vec![json!("x")]).await.unwrap_err();
        forger.await.expect("forger");
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_pending_limit() {
        let options = BridgeOptions::new()
            .with_max_pending_queries(1)
            .with_query_timeout(Duration::from_millis(100));
        let (client, _bridge, _host) = client(options);

        let first = {
            let client = client.clone();
            tokio::spawn(async move { client.query("slow", Vec::new()).await })
        };
        tokio::task::yield_now().await;
        while client.pending_count() == 0 {
            tokio::task::yield_now().await;
        }

        let err = client.query("slow", Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));

        client.cancel_all();
        let first = first.await.expect("join");
        assert!(matches!(first, Err(Error::ConnectionClosed)));
    }

    #[test]
    fn test_unknown_response_dropped() {
        let (client, bridge, _host) = client(BridgeOptions::new());
        reply(&bridge, "file://", &RequestId::generate().to_string(), json!(1));
        assert_eq!(client.pending_count(), 0);
    }
}
