//! Engine fault types.
//!
//! These represent programmer errors: no well-formed caller produces them.
//! Admission rejections (an IOC that does not cross, a FOK that cannot be
//! fully filled) and unknown or duplicate order ids are NOT errors — those
//! paths return successfully with no trades and leave the book unchanged.

use thiserror::Error;

use crate::types::{OrderId, Price};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Attempted to fill an order past its remaining quantity.
    #[error("order {order_id} cannot be filled more than its remaining quantity ({remaining} < {requested})")]
    Overfill {
        order_id: OrderId,
        remaining: u64,
        requested: u64,
    },

    /// Market coercion was handed the invalid-price construction sentinel.
    #[error("order {order_id} must be coerced to a tradeable price, got {price}")]
    UntradeablePrice { order_id: OrderId, price: Price },
}

pub type EngineResult<T> = Result<T, EngineError>;
