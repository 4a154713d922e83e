//! Climber CLI - Headless training and inspection for the tower-climber agent
//!
//! This CLI provides:
//! - Training the Q-learning agent on simulated arena floors
//! - Summarizing the telemetry of a saved agent
//! - Browsing learned Q-values per decision context

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "climber")]
#[command(version, about = "Q-learning toolkit for the tower-climber agent", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the agent on arena floors
    Train(Box<climber::cli::commands::train::TrainArgs>),

    /// Show telemetry of a saved agent
    Stats(climber::cli::commands::stats::StatsArgs),

    /// Browse learned Q-values
    Inspect(climber::cli::commands::inspect::InspectArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Train(args) => climber::cli::commands::train::execute(*args),
        Commands::Stats(args) => climber::cli::commands::stats::execute(args),
        Commands::Inspect(args) => climber::cli::commands::inspect::execute(args),
    }
}
