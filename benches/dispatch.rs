//! Inbound dispatch benchmarks.
//!
//! Measures the origin gate and handler lookup on the hot path:
//! - rejected (untrusted origin)
//! - unrouted (no handler)
//! - delivered (persistent handler)
//! - action batch decode on the host dispatcher
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;

use embedder_bridge::transport::ChannelTransport;
use embedder_bridge::{Bridge, BridgeOptions, Dispatcher, Envelope, Frame};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const HANDLER_COUNTS: &[usize] = &[1, 16, 256];
const BATCH_SIZES: &[usize] = &[1, 32];

fn bridge_with_handlers(count: usize) -> Bridge {
    let (transport, _host) = ChannelTransport::pair();
    let bridge = Bridge::new(&BridgeOptions::new(), Arc::new(transport)).expect("valid options");
    for i in 0..count {
        bridge.on(format!("event-{i}"), |frame| {
            black_box(frame.detail());
        });
    }
    bridge
}

// ============================================================================
// Benchmark: Bridge Receive
// ============================================================================

fn bench_receive(c: &mut Criterion) {
    let mut group = c.benchmark_group("bridge_receive");
    let frame = Frame::new("event-0", vec![json!({"theme": "dark", "zoom": 3})]);

    for &count in HANDLER_COUNTS {
        let bridge = bridge_with_handlers(count);

        group.bench_with_input(BenchmarkId::new("rejected", count), &count, |b, _| {
            b.iter(|| bridge.receive(Envelope::new("https://evil.example", "x", &frame)));
        });

        group.bench_with_input(BenchmarkId::new("delivered", count), &count, |b, _| {
            b.iter(|| bridge.receive(Envelope::new("file://", "embedder", &frame)));
        });

        let miss = Frame::bare("unregistered");
        group.bench_with_input(BenchmarkId::new("unrouted", count), &count, |b, _| {
            b.iter(|| bridge.receive(Envelope::new("file://", "embedder", &miss)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Host Dispatcher
// ============================================================================

fn bench_dispatcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatcher");
    let dispatcher = Dispatcher::new();
    dispatcher.register(|record| {
        black_box(record);
    });

    for &size in BATCH_SIZES {
        let batch: Vec<_> = (0..size)
            .map(|_| json!({"actionType": "app-idle-state-changed", "idleState": "idle"}))
            .collect();
        let text = serde_json::to_string(&batch).expect("encode batch");

        group.bench_with_input(BenchmarkId::new("serialized", size), &text, |b, text| {
            b.iter(|| dispatcher.dispatch_serialized(text, Some(1)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_receive, bench_dispatcher);
criterion_main!(benches);
