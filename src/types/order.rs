//! Order types for the matching engine.
//!
//! ## Representation
//!
//! Prices are signed integer ticks (`i64`); quantities are unsigned
//! (`u64`). A Market order is constructed with the [`INVALID_PRICE`]
//! sentinel and is rewritten in place to an aggressive ImmediateOrCancel
//! before it reaches the matching loop, so the loop itself never sees a
//! "market" type.
//!
//! ## Wire encodings
//!
//! Side and order type both cross process boundaries (event CSV, trace
//! CSV) as small integers:
//! - Side: 0 = Sell, 1 = Buy
//! - OrderType: 0 = GoodTillCancel, 1 = ImmediateOrCancel,
//!   2 = FillOrKill, 3 = Market

use crate::error::{EngineError, EngineResult};

pub type OrderId = u64;
pub type Price = i64;
pub type Quantity = u64;

/// Placeholder price carried by Market orders at construction.
///
/// Not a tradeable price; coercion replaces it before matching.
pub const INVALID_PRICE: Price = 0;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy (bid) or Sell (ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Convert to the wire encoding (0 = Sell, 1 = Buy).
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Sell => 0,
            Side::Buy => 1,
        }
    }

    /// Convert from the wire encoding.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Sell),
            1 => Some(Side::Buy),
            _ => None,
        }
    }

    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

// ============================================================================
// OrderType enum
// ============================================================================

/// Order time-in-force / execution constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    /// Rests until fully filled or explicitly cancelled.
    GoodTillCancel,
    /// Matches whatever crosses immediately; the remainder is cancelled.
    ImmediateOrCancel,
    /// Matches the full quantity immediately or does nothing.
    FillOrKill,
    /// Matches against any available price; never rests.
    Market,
}

impl OrderType {
    /// Convert to the wire encoding.
    pub fn to_u8(self) -> u8 {
        match self {
            OrderType::GoodTillCancel => 0,
            OrderType::ImmediateOrCancel => 1,
            OrderType::FillOrKill => 2,
            OrderType::Market => 3,
        }
    }

    /// Convert from the wire encoding.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OrderType::GoodTillCancel),
            1 => Some(OrderType::ImmediateOrCancel),
            2 => Some(OrderType::FillOrKill),
            3 => Some(OrderType::Market),
            _ => None,
        }
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A single order.
///
/// `quantity` is fixed at creation; `remaining` decreases as the order is
/// filled and satisfies `0 <= remaining <= quantity` for its whole life.
///
/// ## Example
///
/// ```
/// use matchbook::types::{Order, OrderType, Side};
///
/// let order = Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10);
/// assert_eq!(order.remaining, 10);
/// assert!(!order.is_filled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unique order identifier, stable for the order's lifetime.
    pub order_id: OrderId,

    pub side: Side,

    pub order_type: OrderType,

    /// Limit price in ticks. Market orders carry [`INVALID_PRICE`] until
    /// coerced.
    pub price: Price,

    /// Quantity at creation.
    pub quantity: Quantity,

    /// Unfilled quantity.
    pub remaining: Quantity,
}

impl Order {
    pub fn new(
        order_type: OrderType,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_id,
            side,
            order_type,
            price,
            quantity,
            remaining: quantity,
        }
    }

    /// Create a Market order. The price is the invalid sentinel until the
    /// engine rewrites it.
    pub fn market(order_id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(OrderType::Market, order_id, side, INVALID_PRICE, quantity)
    }

    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining
    }

    /// Consume `quantity` of the order's remaining size.
    ///
    /// The matching loop always fills the minimum of the two front orders'
    /// remainders, so an overfill here means engine-internal corruption.
    pub fn fill(&mut self, quantity: Quantity) -> EngineResult<()> {
        if quantity > self.remaining {
            return Err(EngineError::Overfill {
                order_id: self.order_id,
                remaining: self.remaining,
                requested: quantity,
            });
        }
        self.remaining -= quantity;
        Ok(())
    }

    /// Rewrite a Market order into an aggressive ImmediateOrCancel.
    ///
    /// The id is unchanged; only the price and type are replaced. The
    /// synthetic price is `i64::MAX` for buys and `i64::MIN` for sells, so
    /// the only rejected input is the invalid construction sentinel.
    pub fn to_immediate_or_cancel(&mut self, price: Price) -> EngineResult<()> {
        if price == INVALID_PRICE {
            return Err(EngineError::UntradeablePrice {
                order_id: self.order_id,
                price,
            });
        }
        self.price = price;
        self.order_type = OrderType::ImmediateOrCancel;
        Ok(())
    }
}

// ============================================================================
// OrderModify struct
// ============================================================================

/// Replacement parameters for an existing order.
///
/// The order type is not part of the request: it is inherited from the
/// live order when the modify is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderModify {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl OrderModify {
    pub fn new(order_id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            order_id,
            side,
            price,
            quantity,
        }
    }

    /// Build the replacement order, carrying over the original's type.
    pub fn to_order(&self, order_type: OrderType) -> Order {
        Order::new(order_type, self.order_id, self.side, self.price, self.quantity)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
