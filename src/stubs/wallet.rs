//! Wallet balance stub.
//!
//! Requests the balance once when the page loads and writes every
//! `wallet-balance-updated` payload into a text sink.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Map;
use tracing::debug;

use crate::bridge::Bridge;
use crate::forwarder::ActionForwarder;
use crate::protocol::{ActionType, ParsedEvent, names};

// ============================================================================
// BalanceDisplay
// ============================================================================

/// The page element showing the balance.
pub trait BalanceDisplay: Send + Sync {
    /// Replaces the displayed text.
    fn set_text(&self, text: &str);
}

// ============================================================================
// WalletBalanceStub
// ============================================================================

/// Wires balance requests and updates for one page.
pub struct WalletBalanceStub;

impl WalletBalanceStub {
    /// Registers the update handler on `bridge` and requests the balance.
    pub fn attach(bridge: &Bridge, forwarder: &ActionForwarder, display: Arc<dyn BalanceDisplay>) {
        bridge.on(names::WALLET_BALANCE_UPDATED, move |frame| {
            match ParsedEvent::parse(frame) {
                ParsedEvent::WalletBalanceUpdated { balance, currency } => {
                    let text = match currency {
                        Some(currency) => format!("{balance} {currency}"),
                        None => balance,
                    };
                    display.set_text(&text);
                }
                other => debug!(?other, "Ignoring malformed balance update"),
            }
        });

        forwarder.dispatch(ActionType::WalletBalanceRequested, Map::new());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use crate::bridge::BridgeOptions;
    use crate::protocol::{Envelope, Frame, decode_batch};
    use crate::transport::ChannelTransport;

    #[derive(Default)]
    struct TextNode(Mutex<Vec<String>>);

    impl BalanceDisplay for TextNode {
        fn set_text(&self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    #[test]
    fn test_request_on_load_then_update() {
        let (transport, mut host) = ChannelTransport::pair();
        let transport = Arc::new(transport);
        let bridge = Bridge::new(&BridgeOptions::new(), transport.clone()).expect("valid options");
        let forwarder = ActionForwarder::new(transport);
        let node = Arc::new(TextNode::default());

        WalletBalanceStub::attach(&bridge, &forwarder, node.clone());

        let request = host.try_recv().expect("request");
        let text = request.frame().arg(0).and_then(Value::as_str).expect("text");
        let records = decode_batch(text).expect("batch");
        assert_eq!(records[0].action_type, ActionType::WalletBalanceRequested);

        for payload in [
            json!({"balance": "12.5", "currency": "BAT"}),
            json!({"balance": "3"}),
            json!({"currency": "BAT"}),
        ] {
            bridge.receive(Envelope::new(
                "file://",
                "embedder",
                &Frame::new("wallet-balance-updated", vec![payload]),
            ));
        }

        assert_eq!(*node.0.lock(), vec!["12.5 BAT".to_string(), "3".to_string()]);
    }
}
