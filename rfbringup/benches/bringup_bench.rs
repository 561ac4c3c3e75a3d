//! Benchmarks for bring-up runs against a simulated board.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rfbringup::checkpoint::Checkpoint;
use rfbringup::config::ExpectedStatus;
use rfbringup::events::NoOpEventSink;
use rfbringup::testing::{test_config, test_firmware, SimulatedBoard};
use rfbringup::bring_up;
use std::sync::Arc;

fn bringup_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    c.bench_function("full_bringup_and_shutdown", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let sim = SimulatedBoard::new();
                let mut session = bring_up(
                    test_config(),
                    sim.board(),
                    test_firmware(),
                    Arc::new(NoOpEventSink),
                )
                .await
                .unwrap();
                black_box(session.shutdown())
            })
        });
    });

    c.bench_function("failed_bringup_teardown", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let sim = SimulatedBoard::new();
                sim.set_pll_lock(0x01, 0x07);
                let failure = bring_up(
                    test_config(),
                    sim.board(),
                    test_firmware(),
                    Arc::new(NoOpEventSink),
                )
                .await
                .unwrap_err();
                black_box(failure.teardown.attempted())
            })
        });
    });
}

fn checkpoint_benchmark(c: &mut Criterion) {
    let expected = ExpectedStatus::default();
    let checkpoint = Checkpoint::rx_framer(&expected);

    c.bench_function("checkpoint_check", |b| {
        b.iter(|| black_box(checkpoint.check(black_box(0x3E)).is_pass()));
    });
}

criterion_group!(benches, bringup_benchmark, checkpoint_benchmark);
criterion_main!(benches);
