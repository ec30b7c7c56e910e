//! Property tests for the origin gate and the counterpart binding.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use serde_json::json;

use embedder_bridge::transport::ChannelTransport;
use embedder_bridge::{Bridge, BridgeOptions, Delivery, Envelope, Frame};

const TRUSTED: &str = "file://";

fn bridge_with_counter(events: &[String]) -> (Bridge, Arc<AtomicUsize>) {
    let (transport, _host) = ChannelTransport::pair();
    let bridge = Bridge::new(&BridgeOptions::new(), Arc::new(transport)).expect("valid options");
    let hits = Arc::new(AtomicUsize::new(0));

    for event in events {
        let hits = Arc::clone(&hits);
        bridge.on(event.clone(), move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    (bridge, hits)
}

fn untrusted_origin() -> impl Strategy<Value = String> {
    prop_oneof![
        "https?://[a-z]{1,12}\\.[a-z]{2,4}",
        "file:/{0,1}",
        "file:///[a-z]{1,8}",
        "FILE://",
        "chrome-extension://[a-p]{32}",
        Just(String::new()),
    ]
    .prop_filter("must differ from the trusted origin", |origin| origin != TRUSTED)
}

proptest! {
    #[test]
    fn mismatched_origins_never_reach_handlers(
        events in prop::collection::vec("[a-z-]{1,16}", 1..6),
        messages in prop::collection::vec((untrusted_origin(), "[a-z0-9]{1,8}", 0usize..6), 1..40),
    ) {
        let (bridge, hits) = bridge_with_counter(&events);

        for (origin, source, pick) in messages {
            let event = &events[pick % events.len()];
            let delivery = bridge.receive(Envelope::new(
                origin,
                source,
                &Frame::new(event.as_str(), vec![json!({"payload": true})]),
            ));
            prop_assert_eq!(delivery, Delivery::Rejected);
        }

        prop_assert_eq!(hits.load(Ordering::SeqCst), 0);
        prop_assert!(!bridge.is_bound());
    }

    #[test]
    fn first_trusted_sender_stays_bound(
        first in "[a-z]{1,10}",
        others in prop::collection::vec("[a-z]{1,10}", 10..20),
    ) {
        let events = vec!["ping".to_string()];
        let (bridge, hits) = bridge_with_counter(&events);

        bridge.receive(Envelope::new(TRUSTED, first.clone(), &Frame::bare("ping")));
        for other in &others {
            bridge.receive(Envelope::new(TRUSTED, other.clone(), &Frame::bare("ping")));
        }

        prop_assert_eq!(bridge.embedder().map(|handle| handle.as_str()), Some(first.as_str()));
        prop_assert_eq!(hits.load(Ordering::SeqCst), others.len() + 1);
    }
}
