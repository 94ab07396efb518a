//! Operation traces: the line-oriented CSV format that makes a run
//! reproducible.
//!
//! A trace records every mutating operation fed to a book, one line per
//! op, first field the op tag:
//!
//! ```text
//! # seed=42,scenario=example
//! ADD,<id>,<type>,<side>,<price>,<qty>
//! CANCEL,<id>
//! MODIFY,<id>,<side>,<price>,<qty>
//! MATCH
//! ```
//!
//! `type` is the order-type wire encoding (0=GTC, 1=IOC, 2=FOK,
//! 3=Market); `side` is 0=Sell, 1=Buy. The header line is informational.
//! Readers skip `#` comments and blank lines, so traces survive hand
//! annotation.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::book::Orderbook;
use crate::error::EngineError;
use crate::types::{Order, OrderId, OrderModify, OrderType, Price, Quantity, Side, Trade};

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed trace line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn parse_error(line: u64, message: impl Into<String>) -> TraceError {
    TraceError::Parse {
        line,
        message: message.into(),
    }
}

// ============================================================================
// Trace operations
// ============================================================================

/// One recorded book operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Add {
        id: OrderId,
        order_type: OrderType,
        side: Side,
        price: Price,
        qty: Quantity,
    },
    Cancel {
        id: OrderId,
    },
    Modify {
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    },
    Match,
}

impl TraceOp {
    /// Render the CSV line for this operation (no trailing newline).
    pub fn to_csv(&self) -> String {
        match self {
            TraceOp::Add {
                id,
                order_type,
                side,
                price,
                qty,
            } => format!(
                "ADD,{},{},{},{},{}",
                id,
                order_type.to_u8(),
                side.to_u8(),
                price,
                qty
            ),
            TraceOp::Cancel { id } => format!("CANCEL,{}", id),
            TraceOp::Modify {
                id,
                side,
                price,
                qty,
            } => format!("MODIFY,{},{},{},{}", id, side.to_u8(), price, qty),
            TraceOp::Match => "MATCH".to_string(),
        }
    }

    /// Parse one non-comment, non-blank trace line. `line_no` is used for
    /// error reporting only.
    pub fn parse(line: &str, line_no: u64) -> Result<Self, TraceError> {
        let mut fields = line.split(',');
        let tag = fields.next().unwrap_or("");

        let mut next_field = |name: &str| {
            fields
                .next()
                .ok_or_else(|| parse_error(line_no, format!("missing {name}")))
        };

        match tag {
            "ADD" => {
                let id = parse_num(next_field("id")?, line_no, "id")?;
                let type_raw: u8 = parse_num(next_field("type")?, line_no, "type")?;
                let order_type = OrderType::from_u8(type_raw)
                    .ok_or_else(|| parse_error(line_no, format!("bad order type {type_raw}")))?;
                let side_raw: u8 = parse_num(next_field("side")?, line_no, "side")?;
                let side = Side::from_u8(side_raw)
                    .ok_or_else(|| parse_error(line_no, format!("bad side {side_raw}")))?;
                let price = parse_num(next_field("price")?, line_no, "price")?;
                let qty = parse_num(next_field("qty")?, line_no, "qty")?;
                Ok(TraceOp::Add {
                    id,
                    order_type,
                    side,
                    price,
                    qty,
                })
            }
            "CANCEL" => {
                let id = parse_num(next_field("id")?, line_no, "id")?;
                Ok(TraceOp::Cancel { id })
            }
            "MODIFY" => {
                let id = parse_num(next_field("id")?, line_no, "id")?;
                let side_raw: u8 = parse_num(next_field("side")?, line_no, "side")?;
                let side = Side::from_u8(side_raw)
                    .ok_or_else(|| parse_error(line_no, format!("bad side {side_raw}")))?;
                let price = parse_num(next_field("price")?, line_no, "price")?;
                let qty = parse_num(next_field("qty")?, line_no, "qty")?;
                Ok(TraceOp::Modify {
                    id,
                    side,
                    price,
                    qty,
                })
            }
            "MATCH" => Ok(TraceOp::Match),
            other => Err(parse_error(line_no, format!("unknown op '{other}'"))),
        }
    }
}

fn parse_num<T: std::str::FromStr>(field: &str, line: u64, name: &str) -> Result<T, TraceError> {
    field
        .trim()
        .parse()
        .map_err(|_| parse_error(line, format!("bad {name} '{field}'")))
}

// ============================================================================
// Writing
// ============================================================================

/// Buffered trace file writer. Mirrors operations as they are fed to a
/// live book; the resulting file replays into an identical book.
pub struct TraceWriter {
    out: BufWriter<File>,
}

impl TraceWriter {
    /// Create the trace file and write the informational header.
    pub fn create(path: &Path, seed: u64, scenario: &str) -> Result<Self, TraceError> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "# seed={seed},scenario={scenario}")?;
        Ok(Self { out })
    }

    pub fn record(&mut self, op: &TraceOp) -> Result<(), TraceError> {
        writeln!(self.out, "{}", op.to_csv())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), TraceError> {
        self.out.flush()?;
        Ok(())
    }
}

// ============================================================================
// Reading and replay
// ============================================================================

/// Read every operation from a trace file, skipping `#` comments and
/// blank lines.
pub fn read_trace(path: &Path) -> Result<Vec<TraceOp>, TraceError> {
    let reader = BufReader::new(File::open(path)?);
    let mut ops = Vec::new();
    let mut line_no = 0u64;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        ops.push(TraceOp::parse(&line, line_no)?);
    }
    Ok(ops)
}

/// Apply one traced operation to a book, returning the trades it
/// produced.
///
/// A traced Market order is rebuilt through the ordinary constructor; the
/// engine rewrites its price on submission exactly as it did during the
/// original run, so the replayed Add event matches the golden one.
pub fn apply(book: &mut Orderbook, op: &TraceOp) -> Result<Vec<Trade>, EngineError> {
    match *op {
        TraceOp::Add {
            id,
            order_type,
            side,
            price,
            qty,
        } => book.submit(Order::new(order_type, id, side, price, qty)),
        TraceOp::Cancel { id } => {
            book.cancel(id);
            Ok(Vec::new())
        }
        TraceOp::Modify {
            id,
            side,
            price,
            qty,
        } => book.modify(OrderModify::new(id, side, price, qty)),
        TraceOp::Match => book.match_orders(),
    }
}

/// Replay a whole trace file into `book`. Returns the number of
/// operations executed.
pub fn replay_into(book: &mut Orderbook, path: &Path) -> Result<u64, TraceError> {
    let ops = read_trace(path)?;
    let mut executed = 0u64;
    for op in &ops {
        apply(book, op)?;
        executed += 1;
        if executed % 100_000 == 0 {
            debug!(executed, "replay progress");
        }
    }
    Ok(executed)
}

// ============================================================================
// Unit Tests
// ============================================================================
