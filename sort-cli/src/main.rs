//! # sortline
//!
//! CLI tool for replaying and stress-testing sortline collections.
//!
//! ## Commands
//!
//! - `replay`: Apply a TOML scenario to a collection and print every event
//! - `check`: Validate a scenario file without running it
//! - `stress`: Concurrent inserts from many tasks, then verify the result
//!
//! ## Example
//!
//! ```bash
//! # Replay a scenario, events as JSON lines
//! sortline replay scenario.toml --json
//!
//! # Validate only
//! sortline check scenario.toml
//!
//! # 32 tasks x 100 inserts
//! sortline stress --tasks 32 --per-task 100
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod entry;

use commands::{check, replay, stress};

/// CLI tool for replaying and stress-testing sortline collections.
#[derive(Parser, Debug)]
#[command(name = "sortline")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter (overrides the scenario's [log] level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a scenario and print the resulting events
    Replay {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario file
    Check {
        /// Scenario file (TOML)
        scenario: PathBuf,
    },

    /// Insert distinct keys from concurrent tasks and verify the result
    Stress {
        /// Number of concurrent tasks
        #[arg(long, default_value = "8")]
        tasks: u64,

        /// Inserts per task
        #[arg(long, default_value = "100")]
        per_task: u64,

        /// Give up on a mutation after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { scenario, json } => {
            let scenario = config::Scenario::load(&scenario).await?;
            init_logging(cli.log_level.as_deref().unwrap_or(&scenario.log.level));
            replay::run(&scenario, json).await?;
        }
        Commands::Check { scenario } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            check::run(&scenario).await?;
        }
        Commands::Stress {
            tasks,
            per_task,
            timeout_ms,
        } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            stress::run(tasks, per_task, timeout_ms).await?;
        }
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `default`.
fn init_logging(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
