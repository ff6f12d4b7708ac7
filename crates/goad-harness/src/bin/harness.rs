//! CLI entrypoint for the goad simulation kernel harness.
//!
//! Scenario file parsing and real protocol wiring are someone else's job;
//! this binary exists only so the kernel is runnable end-to-end from the
//! command line, driving the deterministic [`goad_protocol::ScriptedHandler`]
//! stub rather than a real network client.

use std::fs::File;
use std::io::Cursor;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use goad_harness::structured_log::{LogEmitter, LogLevel, Milestone, Outcome as LogOutcome};
use goad_protocol::{ScriptedHandler, ScriptedOutcome};
use goad_scheduler::{Scenario, Scheduler, SchedulerConfig};

/// Command-line tooling for the goad simulation kernel.
#[derive(Debug, Parser)]
#[command(name = "goad-harness")]
#[command(about = "Run, replay, and verify goad simulation kernel scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario to completion, writing a finalized ledger.
    Run {
        /// Path to a scenario JSON file (see `goad_scheduler::scenario::Scenario`).
        #[arg(long)]
        scenario: PathBuf,
        /// Override the scenario's `prng_seed`.
        #[arg(long)]
        seed: Option<u64>,
        /// Output ledger path.
        #[arg(long)]
        output: PathBuf,
        /// Optional structured JSONL log path for run milestones.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Replay a finalized ledger: verify its footer hash and print metrics.
    Replay {
        /// Ledger file to replay.
        #[arg(long)]
        ledger: PathBuf,
    },
    /// Run a scenario twice under the same seed and check byte-identical
    /// ledgers (P1/P2).
    Verify {
        /// Path to a scenario JSON file.
        #[arg(long)]
        scenario: PathBuf,
        /// Override the scenario's `prng_seed`.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_scenario(path: &PathBuf, seed: Option<u64>) -> Result<Scenario, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let mut scenario: Scenario = serde_json::from_str(&content)?;
    if let Some(seed) = seed {
        scenario.runtime.prng_seed = seed;
    }
    Ok(scenario)
}

fn config_for(scenario: &Scenario) -> SchedulerConfig {
    SchedulerConfig {
        max_vus: scenario.runtime.vus,
        prng_seed: scenario.runtime.prng_seed,
        duration_ticks: u64::from(scenario.runtime.duration_ticks),
        ..SchedulerConfig::default()
    }
}

/// The harness binary's own driver handler: answers every request with
/// `200` after one poll. A real embedding binary supplies its own
/// `ProtocolHandler` at compile time instead of going through this CLI.
fn demo_handler(scenario: &Scenario) -> ScriptedHandler {
    let sends = scenario.runtime.vus as usize * scenario.runtime.total_steps as usize + 1;
    let script = (0..sends)
        .map(|i| ScriptedOutcome::success_after(1, 200, i as u64 + 1))
        .collect();
    ScriptedHandler::new(script, scenario.runtime.vus.max(1))
}

fn run(scenario_path: PathBuf, seed: Option<u64>, output: PathBuf, log: Option<PathBuf>) -> Result<bool, Box<dyn std::error::Error>> {
    let scenario = load_scenario(&scenario_path, seed)?;
    let config = config_for(&scenario);
    let handler = demo_handler(&scenario);
    let run_id = format!("{}-{}", scenario.metadata.name, scenario.runtime.prng_seed);
    let assertions = scenario.assertions.clone();

    let mut emitter = match &log {
        Some(path) => Some(LogEmitter::to_file(path, &run_id)?),
        None => None,
    };
    if let Some(emitter) = emitter.as_mut() {
        emitter.emit(LogLevel::Info, "run_started", Milestone::RunStarted)?;
    }

    let mut scheduler = Scheduler::new(config, scenario, handler, 0)?;
    let mut file = File::create(&output)?;
    let result = scheduler.run(&mut file, 0);

    if let Some(emitter) = emitter.as_mut() {
        let entry = goad_harness::structured_log::LogEntry::new("", LogLevel::Info, "run_finished")
            .with_milestone(Milestone::RunFinished)
            .with_tick(scheduler.current_tick())
            .with_record_count(scheduler.ledger().len() as u64)
            .with_outcome(if result.is_ok() {
                LogOutcome::Pass
            } else {
                LogOutcome::Error
            });
        emitter.emit_entry(entry)?;
        emitter.flush()?;
    }

    result?;
    println!("wrote {} records to {}", scheduler.ledger().len(), output.display());

    let metrics = goad_metrics::reduce(scheduler.ledger())?;
    let outcomes = goad_harness::evaluate(&assertions, &metrics);
    for outcome in &outcomes {
        println!(
            "assertion {:?}: {} ({})",
            outcome.assertion,
            if outcome.passed { "PASS" } else { "FAIL" },
            outcome.observed
        );
    }
    Ok(goad_harness::all_passed(&outcomes))
}

fn replay(ledger_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(&ledger_path)?;
    let read = goad_ledger::read_from(&mut Cursor::new(bytes))?;
    println!(
        "records={} hash_matches={}",
        read.records.len(),
        read.hash_matches
    );
    let metrics = goad_metrics::reduce_records(&read.records)?;
    println!(
        "total={} success={} failed={} p50={}ns p99={}ns",
        metrics.request.total,
        metrics.request.success,
        metrics.request.failed,
        metrics.latency.p50,
        metrics.latency.p99,
    );
    Ok(())
}

fn verify(scenario_path: PathBuf, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = load_scenario(&scenario_path, seed)?;
    let config = config_for(&scenario);
    let handler_a = demo_handler(&scenario);
    let handler_b = demo_handler(&scenario);
    let row = goad_harness::conformance_matrix::check_determinism(
        &scenario.metadata.name,
        scenario,
        config,
        handler_a,
        handler_b,
    )?;
    println!(
        "{}: byte_equal={} record_count={}",
        row.name, row.byte_equal, row.record_count
    );
    if !row.byte_equal {
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let assertions_passed = match cli.command {
        Command::Run {
            scenario,
            seed,
            output,
            log,
        } => run(scenario, seed, output, log)?,
        Command::Replay { ledger } => {
            replay(ledger)?;
            true
        }
        Command::Verify { scenario, seed } => {
            verify(scenario, seed)?;
            true
        }
    };
    if !assertions_passed {
        std::process::exit(1);
    }
    Ok(())
}
