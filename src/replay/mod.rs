//! Deterministic replay: operation traces and book snapshots.
//!
//! A run with events enabled produces three artifacts — the trace of
//! operations, the event CSV, and the final snapshot. Feeding the trace
//! into a fresh book reproduces the other two byte-for-byte; the
//! [`snapshot::diff`] report pinpoints the first divergence when it does
//! not.

pub mod snapshot;
pub mod trace;

pub use snapshot::SnapshotError;
pub use trace::{TraceError, TraceOp, TraceWriter};
