//! Benchmark and replay harness.
//!
//! Three modes:
//! - `verify`: run the small correctness scenarios with events enabled,
//!   replay every trace into a fresh book, and compare snapshots and
//!   event logs byte for byte. Exits non-zero on any mismatch.
//! - `bench`: run the large scenarios and report per-scenario throughput.
//! - `replay`: apply a single trace file and write its snapshot (and
//!   optionally its event log).

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use matchbook::book::Orderbook;
use matchbook::types::Event;
use matchbook::replay::trace::{self, TraceWriter};
use matchbook::replay::snapshot;
use matchbook::workload::{self, OpMix};

#[derive(Parser)]
#[command(name = "matchbook")]
#[command(about = "Order matching engine harness: deterministic trace, replay and snapshot compare")]
struct Cli {
    /// Directory for traces, snapshots and event logs.
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Golden run + replay + byte compare for the correctness scenarios.
    Verify,
    /// Throughput runs for the performance scenarios (events disabled).
    Bench,
    /// Replay one trace file into a fresh book.
    Replay {
        /// Trace file to apply.
        #[arg(long)]
        trace: PathBuf,
        /// Where to write the final snapshot.
        #[arg(long)]
        snapshot: PathBuf,
        /// Optional event log output; enables event emission.
        #[arg(long)]
        events: Option<PathBuf>,
    },
}

const EVENTS_HEADER: &str = "# columns=seq,type,order_id,order_id2,price,qty,side";

/// Attach an observer that renders every event to CSV into a shared
/// buffer. The buffer is written out once the run finishes.
fn collect_events(book: &mut Orderbook) -> Rc<RefCell<Vec<String>>> {
    let lines = Rc::new(RefCell::new(vec![EVENTS_HEADER.to_string()]));
    let sink = lines.clone();
    book.set_observer(Some(Box::new(move |event: &Event| {
        sink.borrow_mut().push(event.to_csv());
    })));
    book.enable_events(true);
    lines
}

fn write_lines(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(path, text)
}

fn verify(out: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let mix = OpMix::correctness();
    let mut all_ok = true;

    for scenario in workload::correctness_scenarios() {
        let trace_path = out.join(format!("trace_ops_{}.csv", scenario.name));
        let golden_snapshot = out.join(format!("snapshot_golden_{}.txt", scenario.name));
        let replay_snapshot = out.join(format!("snapshot_replay_{}.txt", scenario.name));
        let golden_events = out.join(format!("events_golden_{}.csv", scenario.name));
        let replay_events = out.join(format!("events_replay_{}.csv", scenario.name));

        // Golden run: live book, events on, every op mirrored to the trace.
        let mut book = Orderbook::new();
        let events = collect_events(&mut book);
        let mut writer = TraceWriter::create(&trace_path, scenario.seed, scenario.name)?;
        let stats = workload::run_scenario(&mut book, &scenario, &mix, Some(&mut writer))?;
        writer.flush()?;
        book.set_observer(None);

        write_lines(&golden_events, &events.borrow())?;
        snapshot::write(&book, &golden_snapshot)?;
        info!(
            scenario = scenario.name,
            ops = stats.ops(),
            trades = stats.trades,
            book_size = book.size(),
            "golden run complete"
        );

        // Replay the trace into a fresh book.
        let mut replayed = Orderbook::new();
        let replay_lines = collect_events(&mut replayed);
        let executed = trace::replay_into(&mut replayed, &trace_path)?;
        replayed.set_observer(None);

        write_lines(&replay_events, &replay_lines.borrow())?;
        snapshot::write(&replayed, &replay_snapshot)?;
        info!(scenario = scenario.name, executed, "replay complete");

        match snapshot::diff_files(&golden_snapshot, &replay_snapshot)? {
            None => info!(scenario = scenario.name, "REPLAY OK"),
            Some(report) => {
                all_ok = false;
                error!(scenario = scenario.name, "REPLAY MISMATCH:\n{report}");
            }
        }
        match snapshot::diff_files(&golden_events, &replay_events)? {
            None => info!(scenario = scenario.name, "EVENT LOGS MATCH"),
            Some(report) => {
                all_ok = false;
                error!(scenario = scenario.name, "EVENT LOG MISMATCH:\n{report}");
            }
        }
    }

    Ok(all_ok)
}

fn bench(out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mix = OpMix::performance();

    for scenario in workload::performance_scenarios() {
        let trace_path = out.join(format!("trace_ops_{}.csv", scenario.name));
        let mut writer = TraceWriter::create(&trace_path, scenario.seed, scenario.name)?;

        let mut book = Orderbook::with_capacity(scenario.bulk_orders as usize * 2);
        let start = Instant::now();
        let stats = workload::run_scenario(&mut book, &scenario, &mix, Some(&mut writer))?;
        let elapsed = start.elapsed();
        writer.flush()?;

        let ops = stats.ops();
        let throughput = ops as f64 / elapsed.as_secs_f64();
        info!(
            scenario = scenario.name,
            ops,
            trades = stats.trades,
            book_size = book.size(),
            elapsed_ms = elapsed.as_millis() as u64,
            ops_per_sec = throughput as u64,
            "scenario finished"
        );

        snapshot::write(&book, &out.join(format!("snapshot_golden_{}.txt", scenario.name)))?;
    }

    Ok(())
}

fn replay_one(
    trace_path: &Path,
    snapshot_path: &Path,
    events_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut book = Orderbook::new();
    let events = events_path.map(|_| collect_events(&mut book));

    let executed = trace::replay_into(&mut book, trace_path)?;
    book.set_observer(None);

    if let (Some(path), Some(lines)) = (events_path, events) {
        write_lines(path, &lines.borrow())?;
    }
    snapshot::write(&book, snapshot_path)?;

    info!(
        executed,
        book_size = book.size(),
        matched = book.matched_count(),
        "replay finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    if let Err(err) = fs::create_dir_all(&cli.out) {
        error!("cannot create output directory {}: {err}", cli.out.display());
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Verify => match verify(&cli.out) {
            Ok(true) => Ok(()),
            Ok(false) => {
                error!("verification failed: at least one scenario diverged on replay");
                return ExitCode::FAILURE;
            }
            Err(err) => Err(err),
        },
        Commands::Bench => bench(&cli.out),
        Commands::Replay {
            trace,
            snapshot,
            events,
        } => replay_one(&trace, &snapshot, events.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
