//! Stats command - Summarize a saved agent

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Parser;

use crate::cli::{app_for_path, load_config, output};

#[derive(Parser, Debug)]
#[command(about = "Show telemetry and intelligence of a saved agent")]
pub struct StatsArgs {
    /// Agent save file
    #[arg(default_value = "climber_agent.json")]
    pub agent: PathBuf,

    /// Agent configuration file (JSON) describing table shapes
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn execute(args: StatsArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let app = app_for_path(&args.agent);
    if !app.agent_repository().exists(&args.agent) {
        bail!("No saved agent at {}", args.agent.display());
    }

    let (agent, report) = app
        .load_agent(&args.agent, &config)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;
    let stats = agent.stats_summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    output::print_section(&format!("Agent {}", args.agent.display()));
    for context in &report.discarded {
        output::print_kv("Discarded", &format!("{context} table (shape mismatch)"));
    }
    output::print_stats(&stats);
    Ok(())
}
