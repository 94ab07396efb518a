//! Seed-deterministic workload generation.
//!
//! Scenarios drive a book through a configurable mix of queries,
//! cancels, explicit matching passes, modifies and adds, with Market,
//! ImmediateOrCancel and FillOrKill orders sprinkled in at fixed strides
//! so every admission path gets exercised without biasing the mix.
//!
//! All randomness comes from a ChaCha8 generator seeded per scenario:
//! the same seed always produces the same operation stream, which is
//! what lets a golden run and its trace replay be compared byte for
//! byte.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::book::Orderbook;
use crate::replay::trace::{TraceError, TraceOp, TraceWriter};
use crate::types::{Order, OrderId, OrderType, Price, Quantity, Side};

const PRICE_MIN: Price = 1;
const PRICE_MAX: Price = 1000;
const QTY_MIN: Quantity = 1;
const QTY_MAX: Quantity = 10;

/// A named, seeded workload size.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub seed: u64,
    /// GTC orders inserted up front.
    pub bulk_orders: u64,
    /// Mixed operations after the bulk phase.
    pub random_ops: u64,
}

/// Operation mix fractions; whatever is left after queries, cancels and
/// explicit matches becomes adds/modifies.
#[derive(Debug, Clone, Copy)]
pub struct OpMix {
    pub query_fraction: f64,
    pub cancel_fraction: f64,
    pub match_fraction: f64,
    pub warmup_orders: u64,
}

impl OpMix {
    /// Higher query and cancel ratios, tiny warmup: exercises logic.
    pub fn correctness() -> Self {
        Self {
            query_fraction: 0.35,
            cancel_fraction: 0.30,
            match_fraction: 0.10,
            warmup_orders: 10,
        }
    }

    /// Throughput-oriented mix.
    pub fn performance() -> Self {
        Self {
            query_fraction: 0.40,
            cancel_fraction: 0.25,
            match_fraction: 0.05,
            warmup_orders: 50_000,
        }
    }
}

/// Small scenarios for replay verification.
pub fn correctness_scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "correct_small_1", seed: 4242424201, bulk_orders: 20, random_ops: 50 },
        Scenario { name: "correct_small_2", seed: 4242424202, bulk_orders: 30, random_ops: 60 },
        Scenario { name: "correct_small_3", seed: 4242424203, bulk_orders: 40, random_ops: 80 },
        Scenario { name: "correct_small_4", seed: 4242424204, bulk_orders: 30, random_ops: 50 },
        Scenario { name: "correct_small_5", seed: 4242424205, bulk_orders: 50, random_ops: 100 },
    ]
}

/// Large scenarios for throughput measurement.
pub fn performance_scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "100k-100k", seed: 123456789, bulk_orders: 100_000, random_ops: 100_000 },
        Scenario { name: "500k-200k", seed: 123456790, bulk_orders: 500_000, random_ops: 200_000 },
        Scenario { name: "1M-500k", seed: 123456791, bulk_orders: 1_000_000, random_ops: 500_000 },
    ]
}

/// Operation counts observed while running a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub adds: u64,
    pub cancels: u64,
    pub queries: u64,
    pub matches: u64,
    pub modifies: u64,
    pub trades: u64,
}

impl RunStats {
    pub fn ops(&self) -> u64 {
        self.adds + self.cancels + self.queries + self.matches + self.modifies
    }
}

/// Drive `book` through one scenario, optionally mirroring every
/// mutating operation into a trace.
pub fn run_scenario(
    book: &mut Orderbook,
    scenario: &Scenario,
    mix: &OpMix,
    mut trace: Option<&mut TraceWriter>,
) -> Result<RunStats, TraceError> {
    let mut rng = ChaCha8Rng::seed_from_u64(scenario.seed);
    let mut stats = RunStats::default();

    let record = |trace: &mut Option<&mut TraceWriter>, op: TraceOp| -> Result<(), TraceError> {
        if let Some(writer) = trace.as_mut() {
            writer.record(&op)?;
        }
        Ok(())
    };

    // --- Warmup: seed some resting liquidity, then clear a sample of it
    // so the id space has holes.
    let mut warmup_kept: Vec<OrderId> = Vec::new();
    for i in 0..mix.warmup_orders {
        let id = 10 + i;
        let side = if i & 1 == 1 { Side::Buy } else { Side::Sell };
        let price = rng.gen_range(PRICE_MIN..=PRICE_MAX);
        let qty = rng.gen_range(QTY_MIN..=QTY_MAX);

        let trades = book.submit(Order::new(OrderType::GoodTillCancel, id, side, price, qty))?;
        stats.adds += 1;
        stats.trades += trades.len() as u64;
        record(&mut trace, TraceOp::Add { id, order_type: OrderType::GoodTillCancel, side, price, qty })?;

        if i % 64 == 0 {
            warmup_kept.push(id);
        }
    }
    for id in warmup_kept {
        book.cancel(id);
        stats.cancels += 1;
        record(&mut trace, TraceOp::Cancel { id })?;
    }

    // --- Bulk insert.
    let mut live_ids: Vec<OrderId> = Vec::new();
    for i in 0..scenario.bulk_orders {
        let id = 1_000_000 + i;
        let side = if i & 1 == 1 { Side::Buy } else { Side::Sell };
        let price = rng.gen_range(PRICE_MIN..=PRICE_MAX);
        let qty = rng.gen_range(QTY_MIN..=QTY_MAX);

        let trades = book.submit(Order::new(OrderType::GoodTillCancel, id, side, price, qty))?;
        stats.adds += 1;
        stats.trades += trades.len() as u64;
        record(&mut trace, TraceOp::Add { id, order_type: OrderType::GoodTillCancel, side, price, qty })?;
        live_ids.push(id);
    }

    // --- Randomized mix.
    let mut next_add_id: OrderId = 2_000_000;
    for op in 0..scenario.random_ops {
        let r: f64 = rng.gen();

        if r < mix.query_fraction {
            if op & 1 == 0 {
                let _ = book.best_bid();
            } else {
                let _ = book.best_ask();
            }
            stats.queries += 1;
            continue;
        }

        if r < mix.query_fraction + mix.cancel_fraction {
            if !live_ids.is_empty() {
                let idx = rng.gen_range(0..live_ids.len());
                let id = live_ids.swap_remove(idx);
                book.cancel(id);
                stats.cancels += 1;
                record(&mut trace, TraceOp::Cancel { id })?;
            }
            continue;
        }

        if r < mix.query_fraction + mix.cancel_fraction + mix.match_fraction {
            let trades = book.match_orders()?;
            stats.matches += 1;
            stats.trades += trades.len() as u64;
            record(&mut trace, TraceOp::Match)?;
            continue;
        }

        // Periodically replace an existing order instead of adding.
        if op % 43 == 0 && !live_ids.is_empty() {
            let idx = rng.gen_range(0..live_ids.len());
            let id = live_ids[idx];
            let side = if op & 1 == 1 { Side::Buy } else { Side::Sell };
            let price = rng.gen_range(PRICE_MIN..=PRICE_MAX);
            let qty = rng.gen_range(QTY_MIN..=QTY_MAX);

            let trades = book.modify(crate::types::OrderModify::new(id, side, price, qty))?;
            stats.modifies += 1;
            stats.trades += trades.len() as u64;
            record(&mut trace, TraceOp::Modify { id, side, price, qty })?;
            continue;
        }

        // Add, with conditional types at fixed non-overlapping strides.
        let id = next_add_id;
        next_add_id += 1;
        let side = if op & 1 == 1 { Side::Buy } else { Side::Sell };
        let price = rng.gen_range(PRICE_MIN..=PRICE_MAX);
        let qty = rng.gen_range(QTY_MIN..=QTY_MAX);
        let order_type = if op % 97 == 0 {
            OrderType::Market
        } else if op % 61 == 0 {
            OrderType::ImmediateOrCancel
        } else if op % 43 == 0 {
            OrderType::FillOrKill
        } else {
            OrderType::GoodTillCancel
        };

        let trades = book.submit(Order::new(order_type, id, side, price, qty))?;
        stats.adds += 1;
        stats.trades += trades.len() as u64;
        record(&mut trace, TraceOp::Add { id, order_type, side, price, qty })?;
        live_ids.push(id);
    }

    Ok(stats)
}

/// Generate a standalone batch of GTC orders with balanced sides and
/// overlapping prices. Same seed, same orders.
pub fn generate_orders(count: usize, seed: u64) -> Vec<Order> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut orders = Vec::with_capacity(count);

    for i in 0..count {
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = rng.gen_range(PRICE_MIN..=PRICE_MAX);
        let qty = rng.gen_range(QTY_MIN..=QTY_MAX);
        orders.push(Order::new(
            OrderType::GoodTillCancel,
            (i + 1) as OrderId,
            side,
            price,
            qty,
        ));
    }
    orders
}

// ============================================================================
// Unit Tests
// ============================================================================
