//! Train command - Run the agent through arena floors

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Context as _, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::{
    cli::{app_for_path, load_config, output},
    decision::{FloorSummary, ThreatMemory, TickReport},
    encoder::EncoderVariant,
    pipeline::{
        JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver, Observer,
        ProgressObserver, TrainingConfig, TrainingPipeline, TrainingResult,
    },
    q_learning::{Priority, StatsSummary},
};

#[derive(Parser, Debug)]
#[command(about = "Train the agent on headless arena floors")]
pub struct TrainArgs {
    /// Number of floor attempts
    #[arg(long, short = 'n', default_value_t = 200)]
    pub attempts: usize,

    /// Floor of the first attempt
    #[arg(long, default_value_t = 1)]
    pub start_floor: u32,

    /// Agent save file (.json, or .msgpack for MessagePack)
    #[arg(long, short = 'a', default_value = "climber_agent.json")]
    pub agent: PathBuf,

    /// Ignore an existing save and start from an empty agent
    #[arg(long, default_value_t = false)]
    pub fresh: bool,

    /// Do not write the agent back after training
    #[arg(long, default_value_t = false)]
    pub no_save: bool,

    /// Agent configuration file (JSON); flags below override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Decision priority (aggressive, defensive, or balanced)
    #[arg(long)]
    pub priority: Option<String>,

    /// Observation layout for combat decisions
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Whether threat memory survives between encounters on a floor
    #[arg(long, value_enum)]
    pub threat_memory: Option<ThreatMemoryArg>,

    /// Intelligence stat for the learning-rate modifier
    #[arg(long)]
    pub intelligence: Option<u32>,

    /// Frames between decisions
    #[arg(long)]
    pub cadence: Option<u32>,

    /// Restart from the start floor after a failure instead of retrying
    #[arg(long, default_value_t = false)]
    pub no_retry: bool,

    /// Optional file for JSONL floor traces
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// hp, enemy, threat, in-range
    Basic,
    /// basic plus stamina, height, hazard
    Extended,
}

impl From<VariantArg> for EncoderVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Basic => EncoderVariant::Basic,
            VariantArg::Extended => EncoderVariant::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThreatMemoryArg {
    Floor,
    Encounter,
}

impl From<ThreatMemoryArg> for ThreatMemory {
    fn from(arg: ThreatMemoryArg) -> Self {
        match arg {
            ThreatMemoryArg::Floor => ThreatMemory::PerFloor,
            ThreatMemoryArg::Encounter => ThreatMemory::PerEncounter,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    training: &'a TrainingResult,
    agent: &'a StatsSummary,
    metrics: MetricsSummary,
    first_clear: Option<usize>,
    longest_streak: usize,
    seed: Option<u64>,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(priority) = &args.priority {
        config.decision.priority = priority.parse::<Priority>()?;
    }
    if let Some(variant) = args.variant {
        config.encoder.variant = variant.into();
    }
    if let Some(threat_memory) = args.threat_memory {
        config.decision.threat_memory = threat_memory.into();
    }
    if let Some(cadence) = args.cadence {
        config.decision.cadence = cadence;
    }
    if let Some(intelligence) = args.intelligence {
        config.intelligence = intelligence;
    }
    config.validate()?;

    let app = app_for_path(&args.agent);
    let (mut agent, report) = if args.fresh {
        (app.create_agent(&config)?, Default::default())
    } else {
        app.load_or_create_agent(&args.agent, &config)
            .with_context(|| format!("Failed to load agent from {}", args.agent.display()))?
    };
    for context in &report.discarded {
        eprintln!(
            "Warning: discarded the saved {context} table because its observation shape no longer matches."
        );
    }
    let mut decision_loop = app.create_decision_loop(&config);

    output::print_section("Training");
    output::print_kv("Attempts", &args.attempts.to_string());
    output::print_kv("Start floor", &args.start_floor.to_string());
    output::print_kv("Priority", config.decision.priority.as_str());
    output::print_kv("Observation arity", &config.encoder.variant.arity().to_string());
    output::print_kv("Epsilon", &format!("{:.4}", agent.epsilon()));

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        attempts: args.attempts,
        start_floor: args.start_floor,
        retry_on_failure: !args.no_retry,
    });
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    // Kept behind Arc<Mutex<>> so the tallies can be read after the run.
    let metrics = Arc::new(Mutex::new(MetricsObserver::new()));
    let milestones = Arc::new(Mutex::new(MilestoneObserver::new()));
    pipeline = pipeline
        .with_observer(Box::new(SharedObserver(Arc::clone(&metrics))))
        .with_observer(Box::new(SharedObserver(Arc::clone(&milestones))));

    let result = pipeline.run(&mut agent, &mut decision_loop)?;
    let metrics = metrics.lock().map_err(|_| anyhow!("metrics observer lock poisoned"))?;
    let milestones = milestones
        .lock()
        .map_err(|_| anyhow!("milestone observer lock poisoned"))?;

    let stats = agent.stats_summary();

    output::print_section("Results");
    output::print_kv(
        "Cleared",
        &format!("{} / {} ({:.1}%)", result.cleared, result.attempts, result.clear_rate * 100.0),
    );
    output::print_kv("Highest floor", &result.highest_floor.to_string());
    output::print_kv("Next floor", &result.next_floor.to_string());
    output::print_kv("Average reward", &format!("{:.1}", metrics.avg_reward()));
    output::print_kv("Average ticks", &format!("{:.1}", metrics.avg_ticks()));
    if let Some(first) = milestones.first_clear() {
        output::print_kv("First clear", &format!("attempt {}", first + 1));
    }
    output::print_kv("Longest streak", &milestones.longest_streak().to_string());
    output::print_stats(&stats);

    if !args.no_save {
        app.save_agent(&agent, &args.agent)
            .with_context(|| format!("Failed to save agent to {}", args.agent.display()))?;
        println!("\nSaved agent to {}", args.agent.display());
    }

    if let Some(path) = &args.summary {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let summary = TrainingSummaryFile {
            training: &result,
            agent: &stats,
            metrics: metrics.summary(),
            first_clear: milestones.first_clear(),
            longest_streak: milestones.longest_streak(),
            seed: config.seed,
        };
        serde_json::to_writer_pretty(file, &summary)?;
        println!("Wrote summary to {}", path.display());
    }

    Ok(())
}

/// Delegates to an observer that stays readable after the pipeline run.
struct SharedObserver<O>(Arc<Mutex<O>>);

impl<O: Observer> SharedObserver<O> {
    fn inner(&self) -> crate::Result<MutexGuard<'_, O>> {
        self.0.lock().map_err(|_| crate::Error::Io {
            operation: "lock shared observer".to_string(),
            source: std::io::Error::other("observer lock poisoned"),
        })
    }
}

impl<O: Observer> Observer for SharedObserver<O> {
    fn on_training_start(&mut self, total_floors: usize) -> crate::Result<()> {
        self.inner()?.on_training_start(total_floors)
    }

    fn on_floor_start(&mut self, attempt: usize, floor: u32) -> crate::Result<()> {
        self.inner()?.on_floor_start(attempt, floor)
    }

    fn on_decision(&mut self, attempt: usize, report: &TickReport) -> crate::Result<()> {
        self.inner()?.on_decision(attempt, report)
    }

    fn on_floor_end(&mut self, attempt: usize, summary: &FloorSummary) -> crate::Result<()> {
        self.inner()?.on_floor_end(attempt, summary)
    }

    fn on_training_end(&mut self, stats: &StatsSummary) -> crate::Result<()> {
        self.inner()?.on_training_end(stats)
    }
}
