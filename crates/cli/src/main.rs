//! Cartstorm CLI - Load and stress tests for the shop API.
//!
//! # Usage
//!
//! ```bash
//! # Run every built-in profile with 50 users, 5 started per second, for 10 minutes
//! cartstorm run -u 50 -r 5 -t 10m --host http://localhost:8080
//!
//! # Flash-sale order stress only, failing if p95 targets are missed
//! cartstorm run order-stress -u 200 -r 20 -t 5m --check-thresholds
//!
//! # One pass of the purchase journey per user, with an HTML report
//! cartstorm run purchase-flow -u 10 --iterations 1 --report-file report.html
//!
//! # List the built-in profiles
//! cartstorm profiles
//! ```
//!
//! # Commands
//!
//! - `run` - Run a load test
//! - `profiles` - List the built-in user profiles
//!
//! Settings not given as flags are read from `CARTSTORM_*` environment
//! variables (see `cartstorm_loadtest::config`). Log verbosity follows
//! `RUST_LOG` (default: `info`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cartstorm")]
#[command(author, version, about = "Load and stress tests for the shop API")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a load test
    Run(RunArgs),
    /// List the built-in user profiles
    Profiles,
}

/// Flags for `cartstorm run`. Unset flags fall back to the environment.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Profiles to run (default: all built-in profiles)
    #[arg(value_name = "PROFILE")]
    profiles: Vec<String>,

    /// Base URL of the shop API
    #[arg(long, short = 'H')]
    host: Option<String>,

    /// Number of simulated users
    #[arg(long, short)]
    users: Option<usize>,

    /// Users started per second
    #[arg(long, short = 'r')]
    spawn_rate: Option<f64>,

    /// Stop after this long (e.g. 90s, 5m, 1h30m)
    #[arg(long, short = 't')]
    run_time: Option<String>,

    /// Stop each user after this many passes through its profile
    #[arg(long, short = 'i', conflicts_with = "run_time")]
    iterations: Option<usize>,

    /// Seed for reproducible random choices
    #[arg(long)]
    seed: Option<u64>,

    /// Username of the test account
    #[arg(long)]
    username: Option<String>,

    /// Write goose's HTML report to this file
    #[arg(long)]
    report_file: Option<PathBuf>,

    /// Fail if a request's p95 response time exceeds its target
    #[arg(long)]
    check_thresholds: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run(args) => commands::run::execute(args).await?,
        Commands::Profiles => commands::profiles::list()?,
    }
    Ok(())
}
