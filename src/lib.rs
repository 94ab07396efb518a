//! # matchbook
//!
//! Price-time priority limit order matching engine for a single
//! instrument, with an event stream built for bit-identical deterministic
//! replay.
//!
//! ## Architecture
//!
//! - **Types**: orders, trades, sequenced events and their wire encodings
//! - **Book**: slab-backed two-sided price book with O(1) cancel
//! - **Replay**: operation traces, snapshots, golden-vs-replay diffing
//! - **Workload**: seeded scenario generation for verification and
//!   benchmarks
//!
//! ## Design principles
//!
//! 1. **Determinism**: the same operation stream always produces the same
//!    trades, events and final book
//! 2. **Integer ticks**: prices are signed integers end to end, no
//!    floating point anywhere near matching
//! 3. **Synchronous execution**: each operation runs to completion,
//!    including cascading matches, cleanup and event emission
//! 4. **Price-time priority**: best price first, FIFO within a price

pub mod book;
pub mod error;
pub mod replay;
pub mod types;
pub mod workload;

pub use book::{LevelInfo, LevelInfos, Orderbook};
pub use error::{EngineError, EngineResult};
pub use types::{Event, EventKind, Order, OrderId, OrderModify, OrderType, Price, Quantity, Side, Trade};
