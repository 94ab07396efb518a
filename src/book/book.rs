//! The order book and matching core.
//!
//! ## Architecture
//!
//! The book combines three structures that must stay consistent:
//!
//! - **Slab**: arena storage for every resting order, O(1) access by key
//! - **BTreeMap price levels**: bids keyed by `Reverse(price)` and asks by
//!   `price`, so the first entry of each map is that side's best level
//! - **HashMap index**: order id -> slab key, for O(1) cancel
//!
//! Every resting order is referenced from exactly one price level queue
//! and one index entry; removal always drops both. A price level whose
//! queue empties is removed from its map immediately, never left behind.
//!
//! ## Operation flow
//!
//! `submit` admits the order (Market coercion, IOC/FOK pre-checks),
//! inserts it, emits `Add`, then runs the matching pass. The pass
//! consumes the best opposing levels front-to-back (price priority, FIFO
//! within a level) until the book no longer crosses, then cancels any
//! still-resting non-GoodTillCancel order. No matching happens between
//! operations.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};

use sha2::{Digest, Sha256};
use slab::Slab;
use tracing::error;

use crate::book::level::PriceLevel;
use crate::book::node::OrderNode;
use crate::error::EngineResult;
use crate::types::{
    Event, EventKind, EventObserver, Order, OrderId, OrderModify, OrderType, Price, Quantity,
    Side, Trade,
};

/// Aggregated view of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub price: Price,
    pub quantity: Quantity,
}

/// Per-level aggregates for both sides, in book priority order (bids
/// descending, asks ascending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelInfos {
    pub bids: Vec<LevelInfo>,
    pub asks: Vec<LevelInfo>,
}

/// Single-instrument limit order book with price-time priority matching.
///
/// The book is single-threaded: every public operation runs to
/// completion, including cascading matches, cleanup and event emission,
/// before returning.
///
/// ## Example
///
/// ```
/// use matchbook::book::Orderbook;
/// use matchbook::types::{Order, OrderType, Side};
///
/// let mut book = Orderbook::new();
/// book.submit(Order::new(OrderType::GoodTillCancel, 1, Side::Sell, 100, 10)).unwrap();
/// let trades = book.submit(Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 100, 4)).unwrap();
///
/// assert_eq!(trades.len(), 1);
/// assert_eq!(trades[0].price(), 100);
/// assert_eq!(book.best_ask(), 100); // 6 remaining at 100
/// ```
pub struct Orderbook {
    /// Arena holding every resting order.
    orders: Slab<OrderNode>,

    /// Bid levels, best (highest) price first via `Reverse`.
    bids: BTreeMap<Reverse<Price>, PriceLevel>,

    /// Ask levels, best (lowest) price first.
    asks: BTreeMap<Price, PriceLevel>,

    /// Order id -> slab key.
    order_index: HashMap<OrderId, usize>,

    matched_orders: u64,

    /// Cached best prices; 0 when the side is empty.
    best_bid: Price,
    best_ask: Price,

    /// Side of the order currently crossing the book. Trades execute at
    /// the price of the opposite (passive) side's front. Defaults to Buy,
    /// which prices an explicit pass off the ask side.
    last_aggressor: Side,

    observer: Option<EventObserver>,
    events_enabled: bool,
    event_seq: u64,
}

impl Default for Orderbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Orderbook {
    pub fn new() -> Self {
        Self {
            orders: Slab::new(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::new(),
            matched_orders: 0,
            best_bid: 0,
            best_ask: 0,
            last_aggressor: Side::Buy,
            observer: None,
            events_enabled: false,
            event_seq: 0,
        }
    }

    /// Create a book with pre-allocated order storage.
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            order_index: HashMap::with_capacity(order_capacity),
            ..Self::new()
        }
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Submit an order; returns the trades it produced.
    ///
    /// A duplicate order id is a silent no-op. Market orders are coerced
    /// to aggressive ImmediateOrCancel internally; IOC orders that do not
    /// cross and FOK orders that cannot fully fill are rejected before
    /// insertion, producing neither events nor trades.
    pub fn submit(&mut self, mut order: Order) -> EngineResult<Vec<Trade>> {
        if self.order_index.contains_key(&order.order_id) {
            return Ok(Vec::new());
        }

        let is_market = order.order_type == OrderType::Market;

        if is_market {
            // Rewrite to IOC at the most aggressive representable price;
            // the post-match cleanup then sweeps any remainder.
            let aggressive = match order.side {
                Side::Buy => Price::MAX,
                Side::Sell => Price::MIN,
            };
            order.to_immediate_or_cancel(aggressive)?;
        } else {
            if order.order_type == OrderType::ImmediateOrCancel
                && !self.can_match(order.side, order.price)
            {
                return Ok(Vec::new());
            }
            if order.order_type == OrderType::FillOrKill
                && !self.can_fully_fill(order.side, order.price, order.quantity)
            {
                return Ok(Vec::new());
            }
        }

        let order_id = order.order_id;
        let side = order.side;
        let price = order.price;
        let quantity = order.quantity;

        self.insert(order);
        self.update_best_prices();
        self.emit_order_event(EventKind::Add, order_id, price, quantity, side);

        self.last_aggressor = side;
        self.run_matching_pass()
    }

    /// Cancel a resting order. Unknown ids are a no-op, which makes
    /// cancellation idempotent and replay robust to out-of-order cancels.
    pub fn cancel(&mut self, order_id: OrderId) {
        let Some(&key) = self.order_index.get(&order_id) else {
            return;
        };

        let node = &self.orders[key];
        let side = node.order.side;
        let price = node.price();
        let remaining = node.remaining();

        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    level.remove(key, &mut self.orders);
                    if level.is_empty() {
                        self.bids.remove(&Reverse(price));
                    }
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.remove(key, &mut self.orders);
                    if level.is_empty() {
                        self.asks.remove(&price);
                    }
                }
            }
        }

        self.order_index.remove(&order_id);
        self.orders.remove(key);

        self.emit_order_event(EventKind::Cancel, order_id, price, remaining, side);
        self.update_best_prices();
    }

    /// Replace an existing order: cancel it and submit a new order with
    /// the same id, the inherited order type, and the new side, price and
    /// quantity. Unknown ids return no trades.
    ///
    /// The event stream encodes the intent first: `Modify`, then the
    /// `Cancel` of the old order, then the `Add` of the replacement and
    /// whatever trades it triggers.
    pub fn modify(&mut self, modify: OrderModify) -> EngineResult<Vec<Trade>> {
        let Some(&key) = self.order_index.get(&modify.order_id) else {
            return Ok(Vec::new());
        };
        let order_type = self.orders[key].order.order_type;

        self.emit_order_event(
            EventKind::Modify,
            modify.order_id,
            modify.price,
            modify.quantity,
            modify.side,
        );

        self.cancel(modify.order_id);
        self.submit(modify.to_order(order_type))
    }

    /// Run an explicit matching pass.
    ///
    /// Every operation leaves the book uncrossed, so this normally finds
    /// nothing; it exists for trace replay. With no order in flight the
    /// pass prices any crossing off the ask side.
    pub fn match_orders(&mut self) -> EngineResult<Vec<Trade>> {
        self.last_aggressor = Side::Buy;
        self.run_matching_pass()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of resting orders.
    #[inline]
    pub fn size(&self) -> usize {
        self.order_index.len()
    }

    /// Cumulative count of matched order pairs.
    #[inline]
    pub fn matched_count(&self) -> u64 {
        self.matched_orders
    }

    /// Best bid price, 0 when there are no bids.
    #[inline]
    pub fn best_bid(&self) -> Price {
        self.best_bid
    }

    /// Best ask price, 0 when there are no asks.
    #[inline]
    pub fn best_ask(&self) -> Price {
        self.best_ask
    }

    /// Snapshot of aggregated per-price quantities, both sides in book
    /// priority order.
    pub fn level_infos(&self) -> LevelInfos {
        let bids = self
            .bids
            .values()
            .map(|level| LevelInfo {
                price: level.price,
                quantity: level.total_quantity,
            })
            .collect();
        let asks = self
            .asks
            .values()
            .map(|level| LevelInfo {
                price: level.price,
                quantity: level.total_quantity,
            })
            .collect();
        LevelInfos { bids, asks }
    }

    /// SHA-256 digest of the observable book state (counters plus
    /// per-level aggregates). Two books that processed the same operation
    /// stream produce the same digest.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.matched_orders.to_le_bytes());
        hasher.update((self.order_index.len() as u64).to_le_bytes());
        for level in self.bids.values() {
            hasher.update(level.price.to_le_bytes());
            hasher.update(level.total_quantity.to_le_bytes());
        }
        // Side separator: keeps a level that switches sides from hashing
        // identically.
        hasher.update(u64::MAX.to_le_bytes());
        for level in self.asks.values() {
            hasher.update(level.price.to_le_bytes());
            hasher.update(level.total_quantity.to_le_bytes());
        }
        hasher.finalize().into()
    }

    // ========================================================================
    // Event emission
    // ========================================================================

    /// Install or remove the event observer.
    pub fn set_observer(&mut self, observer: Option<EventObserver>) {
        self.observer = observer;
    }

    /// Gate event emission. While disabled, sequence numbers are not
    /// consumed; the counter only advances on actual emission.
    pub fn enable_events(&mut self, enabled: bool) {
        self.events_enabled = enabled;
    }

    fn emit_order_event(
        &mut self,
        kind: EventKind,
        order_id: OrderId,
        price: Price,
        qty: Quantity,
        side: Side,
    ) {
        if !self.events_enabled {
            return;
        }
        let event = Event::for_order(kind, self.event_seq, order_id, price, qty, side);
        self.event_seq += 1;
        self.dispatch(event);
    }

    fn emit_trade_event(&mut self, bid: OrderId, ask: OrderId, price: Price, qty: Quantity) {
        if !self.events_enabled {
            return;
        }
        let event = Event::for_trade(self.event_seq, bid, ask, price, qty);
        self.event_seq += 1;
        self.dispatch(event);
    }

    /// Invoke the observer, trapping panics at the boundary. The book's
    /// state transition has already happened; a failing observer must not
    /// undo or interrupt it.
    fn dispatch(&mut self, event: Event) {
        if let Some(observer) = self.observer.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
                error!(seq = event.seq, "event observer panicked; book state unaffected");
            }
        }
    }

    // ========================================================================
    // Admission checks
    // ========================================================================

    /// Whether an order at `price` would cross the opposing side.
    fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => match self.asks.keys().next() {
                Some(&best_ask) => price >= best_ask,
                None => false,
            },
            Side::Sell => match self.bids.keys().next() {
                Some(&Reverse(best_bid)) => price <= best_bid,
                None => false,
            },
        }
    }

    /// Whether the opposing side holds at least `quantity` within the
    /// levels tradeable against `price`.
    fn can_fully_fill(&self, side: Side, price: Price, quantity: Quantity) -> bool {
        if !self.can_match(side, price) {
            return false;
        }

        let mut available: Quantity = 0;
        match side {
            Side::Buy => {
                for (&level_price, level) in &self.asks {
                    if level_price > price {
                        break;
                    }
                    available += level.total_quantity;
                    if available >= quantity {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (&Reverse(level_price), level) in &self.bids {
                    if level_price < price {
                        break;
                    }
                    available += level.total_quantity;
                    if available >= quantity {
                        return true;
                    }
                }
            }
        }
        false
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn insert(&mut self, order: Order) {
        let order_id = order.order_id;
        let side = order.side;
        let price = order.price;

        let key = self.orders.insert(OrderNode::new(order));
        match side {
            Side::Buy => {
                let level = self
                    .bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(key, &mut self.orders);
            }
            Side::Sell => {
                let level = self
                    .asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(key, &mut self.orders);
            }
        }
        self.order_index.insert(order_id, key);
    }

    fn update_best_prices(&mut self) {
        self.best_bid = self.bids.keys().next().map(|k| k.0).unwrap_or(0);
        self.best_ask = self.asks.keys().next().copied().unwrap_or(0);
    }

    /// Fully remove an order that the matching loop just filled. The
    /// level is left in place even if emptied; the pass drops empty
    /// levels when it moves on.
    fn discard_filled(&mut self, key: usize, side: Side, price: Price) {
        let order_id = self.orders[key].order_id();
        match side {
            Side::Buy => {
                self.bids
                    .get_mut(&Reverse(price))
                    .expect("bid level present while matching")
                    .remove(key, &mut self.orders);
            }
            Side::Sell => {
                self.asks
                    .get_mut(&price)
                    .expect("ask level present while matching")
                    .remove(key, &mut self.orders);
            }
        }
        self.order_index.remove(&order_id);
        self.orders.remove(key);
    }

    /// Core matching loop: consume the best opposing levels while the
    /// book crosses, then cancel any resting non-GoodTillCancel order.
    fn run_matching_pass(&mut self) -> EngineResult<Vec<Trade>> {
        let mut trades = Vec::new();

        loop {
            let Some(bid_price) = self.bids.keys().next().map(|k| k.0) else {
                break;
            };
            let Some(ask_price) = self.asks.keys().next().copied() else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            // Front-to-front within the two best levels: FIFO at each
            // price, oldest orders first.
            loop {
                let Some(bid_key) = self.bids.get(&Reverse(bid_price)).and_then(|l| l.front())
                else {
                    break;
                };
                let Some(ask_key) = self.asks.get(&ask_price).and_then(|l| l.front()) else {
                    break;
                };

                let bid_remaining = self.orders[bid_key].remaining();
                let ask_remaining = self.orders[ask_key].remaining();
                let quantity = bid_remaining.min(ask_remaining);

                // The passive side is the one that was already resting;
                // the aggressor's own front is the order being worked.
                let trade_price = match self.last_aggressor {
                    Side::Buy => self.orders[ask_key].price(),
                    Side::Sell => self.orders[bid_key].price(),
                };

                self.orders[bid_key].order.fill(quantity)?;
                self.orders[ask_key].order.fill(quantity)?;
                self.bids
                    .get_mut(&Reverse(bid_price))
                    .expect("bid level present while matching")
                    .reduce_quantity(quantity);
                self.asks
                    .get_mut(&ask_price)
                    .expect("ask level present while matching")
                    .reduce_quantity(quantity);

                let bid_id = self.orders[bid_key].order_id();
                let ask_id = self.orders[ask_key].order_id();

                trades.push(Trade::new(bid_id, ask_id, trade_price, quantity));
                self.matched_orders += 1;
                self.emit_trade_event(bid_id, ask_id, trade_price, quantity);

                if self.orders[bid_key].order.is_filled() {
                    self.discard_filled(bid_key, Side::Buy, bid_price);
                }
                if self.orders[ask_key].order.is_filled() {
                    self.discard_filled(ask_key, Side::Sell, ask_price);
                }
            }

            if self
                .bids
                .get(&Reverse(bid_price))
                .map_or(false, |l| l.is_empty())
            {
                self.bids.remove(&Reverse(bid_price));
            }
            if self.asks.get(&ask_price).map_or(false, |l| l.is_empty()) {
                self.asks.remove(&ask_price);
            }
        }

        // Sweep non-GTC remainders (IOC partials, coerced Markets).
        // Cancelling mid-iteration would invalidate the traversal, so
        // collect ids first: bids in priority order, then asks.
        let mut to_cancel: Vec<OrderId> = Vec::new();
        for level in self.bids.values() {
            let mut cursor = level.front();
            while let Some(key) = cursor {
                let node = &self.orders[key];
                if node.order.order_type != OrderType::GoodTillCancel {
                    to_cancel.push(node.order_id());
                }
                cursor = node.next;
            }
        }
        for level in self.asks.values() {
            let mut cursor = level.front();
            while let Some(key) = cursor {
                let node = &self.orders[key];
                if node.order.order_type != OrderType::GoodTillCancel {
                    to_cancel.push(node.order_id());
                }
                cursor = node.next;
            }
        }
        for order_id in to_cancel {
            self.cancel(order_id);
        }

        self.update_best_prices();
        Ok(trades)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
