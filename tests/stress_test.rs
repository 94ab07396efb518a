//! Stress tests for the matching engine.
//!
//! These verify:
//! 1. The engine stays stable under sustained mixed load
//! 2. Determinism is preserved across runs
//! 3. The book stays bounded when flows are balanced
//!
//! ```bash
//! cargo test --release --test stress_test -- --nocapture
//! ```

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use matchbook::book::Orderbook;
use matchbook::types::{Order, OrderType, Side};
use matchbook::workload::generate_orders;

const STRESS_ORDER_COUNT: usize = 100_000;

/// Run a seeded order sequence and return the final state digest.
fn run_deterministic_sequence(seed: u64, count: usize) -> [u8; 32] {
    let orders = generate_orders(count, seed);

    let mut book = Orderbook::with_capacity(count * 2);
    for order in orders {
        book.submit(order).expect("submit");
    }
    book.state_digest()
}

#[test]
fn stress_mixed_inserts() {
    println!("\n=== STRESS TEST: {STRESS_ORDER_COUNT} orders ===\n");

    let orders = generate_orders(STRESS_ORDER_COUNT, 42);
    let mut book = Orderbook::with_capacity(STRESS_ORDER_COUNT * 2);

    let start = Instant::now();
    let mut trade_count = 0usize;
    for order in orders {
        trade_count += book.submit(order).expect("submit").len();
    }
    let elapsed = start.elapsed();
    let throughput = STRESS_ORDER_COUNT as f64 / elapsed.as_secs_f64();

    println!("  Orders processed:  {STRESS_ORDER_COUNT:>12}");
    println!("  Trades generated:  {trade_count:>12}");
    println!("  Final book size:   {:>12}", book.size());
    println!("  Elapsed:           {elapsed:>12.2?}");
    println!("  Throughput:        {throughput:>12.0} orders/sec");
    println!("  State digest:      {}", hex::encode(book.state_digest()));

    assert!(trade_count > 0, "expected some trades to occur");
    assert!(
        book.matched_count() as usize == trade_count,
        "matched counter must track emitted trades"
    );
}

#[test]
fn verify_determinism() {
    const TEST_COUNT: usize = 10_000;
    const SEED: u64 = 12345;

    let digest1 = run_deterministic_sequence(SEED, TEST_COUNT);
    let digest2 = run_deterministic_sequence(SEED, TEST_COUNT);

    println!("  Run 1 digest: {}", hex::encode(digest1));
    println!("  Run 2 digest: {}", hex::encode(digest2));
    assert_eq!(digest1, digest2, "digests must match for determinism");

    let digest3 = run_deterministic_sequence(SEED + 1, TEST_COUNT);
    println!("  Other seed:   {}", hex::encode(digest3));
    assert_ne!(digest1, digest3, "different seeds should diverge");
}

#[test]
fn stress_cancellations() {
    const ORDER_COUNT: usize = 50_000;
    const CANCEL_RATE: f64 = 0.3;

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut book = Orderbook::with_capacity(ORDER_COUNT * 2);

    let mut orders_placed = 0usize;
    let mut orders_cancelled = 0usize;
    let mut resting_ids: Vec<u64> = Vec::new();

    for i in 0..ORDER_COUNT {
        if !resting_ids.is_empty() && rng.gen_bool(CANCEL_RATE) {
            let idx = rng.gen_range(0..resting_ids.len());
            let id = resting_ids.swap_remove(idx);
            book.cancel(id);
            orders_cancelled += 1;
        }

        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = rng.gen_range(1..=1000);
        let qty = rng.gen_range(1..=10);
        let id = (i + 1) as u64;

        let trades = book
            .submit(Order::new(OrderType::GoodTillCancel, id, side, price, qty))
            .expect("submit");
        orders_placed += 1;

        // Only orders that were not fully swept can be cancelled later.
        let filled: u64 = trades.iter().map(|t| t.quantity()).sum();
        if filled < qty {
            resting_ids.push(id);
        }
    }

    println!("  Orders placed:     {orders_placed:>10}");
    println!("  Orders cancelled:  {orders_cancelled:>10}");
    println!("  Final book size:   {:>10}", book.size());

    assert!(orders_cancelled > 0);
    assert!(book.size() <= orders_placed - orders_cancelled);
}

#[test]
fn stress_book_stays_bounded() {
    const ITERATIONS: usize = 50_000;
    const MAX_BOOK_SIZE: usize = 30_000;

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut book = Orderbook::with_capacity(MAX_BOOK_SIZE);

    let mut max_size_seen = 0usize;

    for i in 0..ITERATIONS {
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        // Tight price band so flows keep crossing.
        let price = rng.gen_range(490..=510);
        let qty = rng.gen_range(1..=10);

        book.submit(Order::new(
            OrderType::GoodTillCancel,
            (i + 1) as u64,
            side,
            price,
            qty,
        ))
        .expect("submit");

        max_size_seen = max_size_seen.max(book.size());
    }

    println!("  Iterations:        {ITERATIONS:>10}");
    println!("  Max book size:     {max_size_seen:>10}");
    println!("  Final book size:   {:>10}", book.size());

    assert!(
        max_size_seen < MAX_BOOK_SIZE,
        "book grew too large: {max_size_seen} (max {MAX_BOOK_SIZE})"
    );
}
