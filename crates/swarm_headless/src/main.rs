//! Headless swarm runner.
//!
//! This binary runs the game without graphics, controlled via JSON on stdin/stdout.
//! Designed for scripted play, balance runs and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p swarm_headless
//!
//! # Interactive mode with a scenario
//! cargo run -p swarm_headless -- run --scenario scenarios/crowded.ron
//!
//! # One unattended game, JSON summary on stdout
//! cargo run -p swarm_headless -- simulate --seed 3 --seconds 300
//!
//! # Balance run across 64 seeds
//! cargo run -p swarm_headless -- batch --seeds 64 --seconds 600
//!
//! # Determinism check
//! cargo run -p swarm_headless -- verify --seed 3 --runs 4
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swarm_headless::{
    batch::{run_batch, run_game, verify_determinism, BatchConfig},
    runner::run_stdio,
    scenario,
};

#[derive(Parser)]
#[command(name = "swarm_headless")]
#[command(about = "Headless swarm runner for scripted play, balance runs and determinism checks")]
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
    /// Play one game over the JSON-line protocol
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Answer speed, build and debug_wave with a state line
        #[arg(long)]
        auto_state: bool,
    },

    /// Play one unattended game and print a JSON summary
    Simulate {
        /// Galaxy seed (overrides the scenario)
        #[arg(long)]
        seed: Option<u64>,

        /// Game time limit in seconds
        #[arg(long, default_value = "300")]
        seconds: f32,

        /// Frame delta in seconds (clamped to 0.1)
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },

    /// Run unattended games over consecutive seeds and print aggregate JSON
    Batch {
        /// Number of seeds to run
        #[arg(long, default_value = "16")]
        seeds: u32,

        /// First seed
        #[arg(long, default_value = "0")]
        start_seed: u64,

        /// Game time limit per game in seconds
        #[arg(long, default_value = "300")]
        seconds: f32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Scenario file shared by every game
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Include per-game metrics in the output
        #[arg(long)]
        games: bool,
    },

    /// Replay one seed several times and compare final state hashes
    Verify {
        /// Galaxy seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of runs
        #[arg(long, default_value = "3")]
        runs: u32,

        /// Game time per run in seconds
        #[arg(long, default_value = "60")]
        seconds: f32,

        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
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

    let command = cli.command.unwrap_or(Commands::Run {
        scenario: None,
        auto_state: false,
    });

    let outcome = match command {
        Commands::Run {
            scenario,
            auto_state,
        } => cmd_run(scenario, auto_state),
        Commands::Simulate {
            seed,
            seconds,
            dt,
            scenario,
        } => cmd_simulate(seed, seconds, dt, scenario),
        Commands::Batch {
            seeds,
            start_seed,
            seconds,
            parallel,
            scenario,
            games,
        } => cmd_batch(seeds, start_seed, seconds, parallel, scenario, games),
        Commands::Verify {
            seed,
            runs,
            seconds,
            scenario,
        } => cmd_verify(seed, runs, seconds, scenario),
    };

    match outcome {
        Ok(code) => code,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(scenario: Option<PathBuf>, auto_state: bool) -> Result<ExitCode, String> {
    let config = scenario::load_or_default(scenario.as_deref()).map_err(|e| e.to_string())?;
    let summary = run_stdio(config, auto_state).map_err(|e| e.to_string())?;
    info!(commands = summary.commands, quit = summary.quit, "runner stopped");
    Ok(ExitCode::SUCCESS)
}

fn cmd_simulate(
    seed: Option<u64>,
    seconds: f32,
    dt: f32,
    scenario: Option<PathBuf>,
) -> Result<ExitCode, String> {
    let mut config = scenario::load_or_default(scenario.as_deref()).map_err(|e| e.to_string())?;
    if let Some(seed) = seed {
        config.galaxy.seed = seed;
    }
    let metrics = run_game(config, seconds, dt);
    print_json(&metrics)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_batch(
    seeds: u32,
    start_seed: u64,
    seconds: f32,
    parallel: u32,
    scenario: Option<PathBuf>,
    games: bool,
) -> Result<ExitCode, String> {
    let base = scenario::load_or_default(scenario.as_deref()).map_err(|e| e.to_string())?;
    let config = BatchConfig::new(seeds, seconds)
        .with_seed(start_seed)
        .with_parallel(parallel)
        .with_base(base);
    let mut results = run_batch(config);
    if !games {
        results.games.clear();
    }
    print_json(&results)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_verify(
    seed: u64,
    runs: u32,
    seconds: f32,
    scenario: Option<PathBuf>,
) -> Result<ExitCode, String> {
    let mut config = scenario::load_or_default(scenario.as_deref()).map_err(|e| e.to_string())?;
    config.galaxy.seed = seed;
    let report = verify_determinism(&config, runs, seconds, 1.0 / 60.0);
    print_json(&report)?;
    if report.deterministic {
        info!(seed, runs, "deterministic");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(seed, runs, "runs diverged");
        Ok(ExitCode::FAILURE)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
