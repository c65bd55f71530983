//! Headless battle runner.
//!
//! Runs a scenario without graphics and prints a JSON report on stdout.
//! Designed for CI testing and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in skirmish
//! cargo run -p battle_headless -- run
//!
//! # Run a scenario file with a coarser step
//! cargo run -p battle_headless -- run --scenario crates/battle_headless/scenarios/duel.ron --step-ms 100
//!
//! # Check that eight parallel runs agree
//! cargo run -p battle_headless -- verify --scenario crates/battle_headless/scenarios/duel.ron --runs 8
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battle_headless::{run_scenario, verify_scenario, RunConfig, Scenario};
use battle_headless::runner::{DEFAULT_MAX_TICKS, DEFAULT_STEP_MS, MIN_VERIFY_RUNS};

#[derive(Parser)]
#[command(name = "battle_headless")]
#[command(about = "Headless autobattler runner for scenario testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario to completion and print the report
    Run {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Milliseconds of simulated time per tick
        #[arg(long, default_value_t = DEFAULT_STEP_MS)]
        step_ms: u32,

        /// Stop after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Run a scenario several times in parallel and compare state hashes
    Verify {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs (at least two)
        #[arg(
            short,
            long,
            default_value = "5",
            value_parser = clap::value_parser!(u32).range(i64::from(MIN_VERIFY_RUNS)..)
        )]
        runs: u32,

        /// Milliseconds of simulated time per tick
        #[arg(long, default_value_t = DEFAULT_STEP_MS)]
        step_ms: u32,

        /// Stop after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries the report
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            step_ms,
            max_ticks,
            pretty,
        }) => cmd_run(scenario, RunConfig { step_ms, max_ticks }, pretty),
        Some(Commands::Verify {
            scenario,
            runs,
            step_ms,
            max_ticks,
        }) => cmd_verify(scenario, RunConfig { step_ms, max_ticks }, runs),
        None => cmd_run(None, RunConfig::default(), true),
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        return Scenario::mixed_skirmish();
    };
    match Scenario::load(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("FATAL: {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_run(scenario: Option<PathBuf>, config: RunConfig, pretty: bool) {
    let scenario = load_scenario(scenario);
    let report = match run_scenario(&scenario, &config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("FATAL: Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }

    if report.timed_out() {
        eprintln!("Battle hit the tick limit after {} ticks", report.ticks);
        std::process::exit(2);
    }
}

fn cmd_verify(scenario: Option<PathBuf>, config: RunConfig, runs: u32) {
    let scenario = load_scenario(scenario);
    let report = match verify_scenario(&scenario, &config, runs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("FATAL: Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }

    if report.deterministic {
        eprintln!("{}: {} runs agree", report.scenario, report.hashes.len());
    } else {
        eprintln!("{}: DESYNC across {} runs", report.scenario, report.hashes.len());
        std::process::exit(1);
    }
}
