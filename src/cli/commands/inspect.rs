//! Inspect command - Browse the learned Q-values of a saved agent

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Parser;

use crate::{
    cli::{app_for_path, load_config, output},
    context::Context,
    q_learning::QTable,
    types::Observation,
};

#[derive(Parser, Debug)]
#[command(about = "List learned states and their action values")]
pub struct InspectArgs {
    /// Agent save file
    #[arg(default_value = "climber_agent.json")]
    pub agent: PathBuf,

    /// Decision context to inspect (combat, base, or minigame)
    #[arg(long, default_value = "combat")]
    pub context: String,

    /// Number of states to show, ordered by best action value
    #[arg(long, short = 't', default_value_t = 20)]
    pub top: usize,

    /// Show only this observation, written as a tuple like "(1, 0, 2, 1)"
    #[arg(long)]
    pub state: Option<String>,

    /// Agent configuration file (JSON) describing table shapes
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// One state with the value of every action in its context.
struct StateRow {
    state: Observation,
    values: Vec<f64>,
    best: u8,
}

impl StateRow {
    fn best_value(&self) -> f64 {
        self.values[self.best as usize]
    }
}

fn rows(table: &QTable, context: Context) -> Vec<StateRow> {
    let action_count = context.action_count() as u8;
    table
        .states()
        .into_iter()
        .map(|state| {
            let values: Vec<f64> = (0..action_count).map(|a| table.get(&state, a)).collect();
            let best = (0..action_count)
                .max_by(|&a, &b| values[a as usize].total_cmp(&values[b as usize]))
                .unwrap_or(0);
            StateRow { state, values, best }
        })
        .collect()
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let context: Context = args.context.parse()?;
    let filter = args
        .state
        .as_deref()
        .map(str::parse::<Observation>)
        .transpose()
        .context("Invalid --state")?;

    let config = load_config(args.config.as_ref())?;
    let app = app_for_path(&args.agent);
    if !app.agent_repository().exists(&args.agent) {
        bail!("No saved agent at {}", args.agent.display());
    }
    let (agent, report) = app
        .load_agent(&args.agent, &config)
        .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?;
    if report.discarded.contains(&context) {
        bail!("The saved {context} table does not match the configured observation shape");
    }

    let table = agent.table(context);
    let mut rows = rows(table, context);
    if let Some(filter) = &filter {
        rows.retain(|row| &row.state == filter);
    }
    rows.sort_by(|a, b| b.best_value().total_cmp(&a.best_value()));

    output::print_section(&format!("{context} Q-values"));
    output::print_kv("States", &output::format_number(table.states().len() as u64));
    output::print_kv("Entries", &output::format_number(table.size() as u64));
    output::print_kv("Arity", &table.arity().to_string());

    if rows.is_empty() {
        println!("\n  No learned states{}.", if filter.is_some() { " match" } else { "" });
        return Ok(());
    }

    let combat = context == Context::Combat;
    for row in rows.iter().take(args.top) {
        output::print_subsection(&output::observation_label(&row.state, combat));
        for (index, value) in row.values.iter().enumerate() {
            let index = index as u8;
            let marker = if index == row.best { "*" } else { " " };
            println!("  {marker} {:16} {value:>10.4}", context.action_name(index));
        }
    }
    if rows.len() > args.top {
        println!("\n  ... {} more states", rows.len() - args.top);
    }
    Ok(())
}
