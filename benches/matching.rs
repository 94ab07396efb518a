//! Matching engine benchmarks.
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run a specific group
//! cargo bench -- single_match
//! ```
//!
//! Results land in `target/criterion/` with HTML reports.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::time::Duration;

use matchbook::book::Orderbook;
use matchbook::types::{Order, OrderType, Side};
use matchbook::workload::generate_orders;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn buy(id: u64, price: i64, qty: u64) -> Order {
    Order::new(OrderType::GoodTillCancel, id, Side::Buy, price, qty)
}

fn sell(id: u64, price: i64, qty: u64) -> Order {
    Order::new(OrderType::GoodTillCancel, id, Side::Sell, price, qty)
}

/// Pre-populate ask levels starting at `base_price`, one order per level.
fn populate_asks(book: &mut Orderbook, count: u64, base_price: i64, qty: u64) {
    for i in 0..count {
        book.submit(sell(500_000 + i, base_price + i as i64, qty))
            .expect("populate ask");
    }
}

/// Pre-populate bid levels going down from `base_price`.
fn populate_bids(book: &mut Orderbook, count: u64, base_price: i64, qty: u64) {
    for i in 0..count {
        book.submit(buy(700_000 + i, base_price - i as i64, qty))
            .expect("populate bid");
    }
}

// ============================================================================
// BENCHMARK: Single Match Latency
// ============================================================================

fn bench_single_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_match");
    group.measurement_time(Duration::from_secs(10));

    // Match one buy against the best of 1,000 resting asks.
    group.bench_function("against_1k_orders", |b| {
        b.iter_batched(
            || {
                let mut book = Orderbook::with_capacity(2_000);
                populate_asks(&mut book, 1_000, 1_000, 10);
                book
            },
            |mut book| black_box(book.submit(buy(999_999, 1_000, 10)).unwrap()),
            BatchSize::SmallInput,
        );
    });

    // One large buy sweeping ten price levels.
    group.bench_function("multi_level_sweep", |b| {
        b.iter_batched(
            || {
                let mut book = Orderbook::with_capacity(200);
                populate_asks(&mut book, 100, 1_000, 10);
                book
            },
            |mut book| black_box(book.submit(buy(999_999, 1_009, 100)).unwrap()),
            BatchSize::SmallInput,
        );
    });

    // Order rests without matching.
    group.bench_function("no_match_rest_on_book", |b| {
        b.iter_batched(
            || {
                let mut book = Orderbook::with_capacity(2_000);
                populate_asks(&mut book, 1_000, 1_000, 10);
                book
            },
            |mut book| black_box(book.submit(buy(999_999, 500, 10)).unwrap()),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Order Operations
// ============================================================================

fn bench_order_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_operations");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("add_to_empty", |b| {
        b.iter_batched(
            Orderbook::new,
            |mut book| black_box(book.submit(buy(1, 500, 10)).unwrap()),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("add_to_1k_book", |b| {
        b.iter_batched(
            || {
                let mut book = Orderbook::with_capacity(2_000);
                populate_asks(&mut book, 500, 1_000, 10);
                populate_bids(&mut book, 500, 999, 10);
                book
            },
            |mut book| black_box(book.submit(buy(999_999, 400, 10)).unwrap()),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("cancel_order", |b| {
        b.iter_batched(
            || {
                let mut book = Orderbook::with_capacity(2_000);
                populate_bids(&mut book, 1_000, 5_000, 10);
                book
            },
            |mut book| {
                // Middle of the book.
                book.cancel(700_500);
                black_box(book.size())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Throughput
// ============================================================================

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(50);

    for batch_size in [1_000usize, 10_000, 50_000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("orders", batch_size),
            &batch_size,
            |b, &size| {
                let orders = generate_orders(size, 42);
                b.iter_batched(
                    || (Orderbook::with_capacity(size * 2), orders.clone()),
                    |(mut book, orders)| {
                        for order in orders {
                            black_box(book.submit(order).unwrap());
                        }
                        book.size()
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

// ============================================================================
// BENCHMARK: Deterministic Sequence
// ============================================================================

fn bench_determinism(c: &mut Criterion) {
    let mut group = c.benchmark_group("determinism");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("1k_deterministic_sequence", |b| {
        let orders = generate_orders(1_000, 12345);
        b.iter_batched(
            || orders.clone(),
            |orders| {
                let mut book = Orderbook::with_capacity(2_000);
                let mut trade_count = 0usize;
                for order in orders {
                    trade_count += book.submit(order).unwrap().len();
                }
                black_box((book.size(), trade_count, book.state_digest()))
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// CRITERION ENTRY POINT
// ============================================================================

criterion_group!(
    benches,
    bench_single_match,
    bench_order_operations,
    bench_throughput,
    bench_determinism
);

criterion_main!(benches);
