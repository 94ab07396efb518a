//! Core data types for the matching engine.
//!
//! ## Types
//!
//! - [`Order`], [`OrderModify`]: order records and replacement requests
//! - [`Side`], [`OrderType`]: enums with small-integer wire encodings
//! - [`Trade`]: an executed match (bid leg + ask leg)
//! - [`Event`], [`EventKind`]: sequenced domain events with a CSV form
//!
//! All prices are signed integer ticks; all quantities are unsigned.

mod event;
mod order;
mod trade;

pub use event::{Event, EventKind, EventObserver, SIDE_NOT_APPLICABLE};
pub use order::{Order, OrderId, OrderModify, OrderType, Price, Quantity, Side, INVALID_PRICE};
pub use trade::{Trade, TradeLeg};
