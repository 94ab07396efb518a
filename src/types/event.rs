//! Domain events and their CSV wire format.
//!
//! Every externally meaningful state transition (add, cancel, trade,
//! modify) is assigned a monotonically increasing sequence number and
//! dispatched synchronously to the registered observer. The CSV line
//! format is what makes a replay comparable byte-for-byte with the run
//! that produced the trace:
//!
//! ```text
//! seq,type,order_id,order_id2,price,qty,side
//! ```
//!
//! `type` is 1=Add, 2=Cancel, 3=Trade, 4=Modify. `side` is 0=Sell,
//! 1=Buy, or [`SIDE_NOT_APPLICABLE`] for trades, where `order_id` is the
//! bid leg and `order_id2` the ask leg.

use std::fmt;

use crate::types::{OrderId, Price, Quantity, Side};

/// Sentinel `side` value for trade events.
pub const SIDE_NOT_APPLICABLE: u8 = 255;

// ============================================================================
// EventKind enum
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Cancel,
    Trade,
    Modify,
}

impl EventKind {
    /// Convert to the wire encoding (1-based).
    pub fn to_u8(self) -> u8 {
        match self {
            EventKind::Add => 1,
            EventKind::Cancel => 2,
            EventKind::Trade => 3,
            EventKind::Modify => 4,
        }
    }

    /// Convert from the wire encoding.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(EventKind::Add),
            2 => Some(EventKind::Cancel),
            3 => Some(EventKind::Trade),
            4 => Some(EventKind::Modify),
            _ => None,
        }
    }
}

// ============================================================================
// Event struct
// ============================================================================

/// A sequenced book event.
///
/// For non-trade events `order_id2` is 0 and `side` encodes the order's
/// side. For trades, `order_id` is the bid leg, `order_id2` the ask leg,
/// and `side` is [`SIDE_NOT_APPLICABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub kind: EventKind,
    pub order_id: OrderId,
    pub order_id2: OrderId,
    pub price: Price,
    pub qty: Quantity,
    pub side: u8,
}

impl Event {
    /// Build a non-trade event for one order.
    pub fn for_order(
        kind: EventKind,
        seq: u64,
        order_id: OrderId,
        price: Price,
        qty: Quantity,
        side: Side,
    ) -> Self {
        Self {
            seq,
            kind,
            order_id,
            order_id2: 0,
            price,
            qty,
            side: side.to_u8(),
        }
    }

    /// Build a trade event between a bid and an ask order.
    pub fn for_trade(
        seq: u64,
        bid_order_id: OrderId,
        ask_order_id: OrderId,
        price: Price,
        qty: Quantity,
    ) -> Self {
        Self {
            seq,
            kind: EventKind::Trade,
            order_id: bid_order_id,
            order_id2: ask_order_id,
            price,
            qty,
            side: SIDE_NOT_APPLICABLE,
        }
    }

    /// Render the CSV line: `seq,type,order_id,order_id2,price,qty,side`.
    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.seq,
            self.kind.to_u8(),
            self.order_id,
            self.order_id2,
            self.price,
            self.qty,
            self.side
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

/// Observer callback invoked synchronously for every emitted event.
///
/// Observers must not touch the book; a panicking observer is trapped at
/// the emission boundary and does not disturb engine state.
pub type EventObserver = Box<dyn FnMut(&Event)>;

// ============================================================================
// Unit Tests
// ============================================================================
