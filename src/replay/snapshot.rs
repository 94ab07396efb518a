//! Book snapshots: the text summary compared between a golden run and
//! its replay.
//!
//! ```text
//! matchedOrders,<n>
//! book_size,<n>
//! bids_levels
//! <price>,<aggregated_qty>     one line per level, descending
//! asks_levels
//! <price>,<aggregated_qty>     ascending
//! ```
//!
//! The snapshot aggregates per-level quantities plus counters; it is
//! independent of individual order ids, which is what makes it a stable
//! determinism witness.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::book::Orderbook;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Render a book to the snapshot text form.
pub fn render(book: &Orderbook) -> String {
    let infos = book.level_infos();
    let mut out = String::new();

    // Infallible for String targets.
    let _ = writeln!(out, "matchedOrders,{}", book.matched_count());
    let _ = writeln!(out, "book_size,{}", book.size());
    let _ = writeln!(out, "bids_levels");
    for level in &infos.bids {
        let _ = writeln!(out, "{},{}", level.price, level.quantity);
    }
    let _ = writeln!(out, "asks_levels");
    for level in &infos.asks {
        let _ = writeln!(out, "{},{}", level.price, level.quantity);
    }
    out
}

/// Write a snapshot file for `book`.
pub fn write(book: &Orderbook, path: &Path) -> Result<(), SnapshotError> {
    fs::write(path, render(book))?;
    Ok(())
}

/// Line-by-line comparison of two snapshot (or event log) texts.
///
/// Returns `None` when identical, otherwise a report naming every
/// differing line.
pub fn diff(golden: &str, replay: &str) -> Option<String> {
    let mut report = String::new();
    let mut golden_lines = golden.lines();
    let mut replay_lines = replay.lines();
    let mut line_no = 0usize;

    loop {
        let a = golden_lines.next();
        let b = replay_lines.next();
        if a.is_none() && b.is_none() {
            break;
        }
        line_no += 1;
        if a != b {
            let _ = writeln!(
                report,
                "line {}:\n  GOLDEN: {}\n  REPLAY: {}",
                line_no,
                a.unwrap_or("<EOF>"),
                b.unwrap_or("<EOF>")
            );
        }
    }

    if report.is_empty() {
        None
    } else {
        Some(report)
    }
}

/// Compare two snapshot files on disk.
pub fn diff_files(golden: &Path, replay: &Path) -> Result<Option<String>, SnapshotError> {
    let a = fs::read_to_string(golden)?;
    let b = fs::read_to_string(replay)?;
    Ok(diff(&a, &b))
}

// ============================================================================
// Unit Tests
// ============================================================================
