//! Headless training runs through the arena

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Result,
    arena::Arena,
    decision::DecisionLoop,
    ports::Observer,
    q_learning::{IntelligenceTier, QLearningAgent},
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of floor attempts
    pub attempts: usize,

    /// Floor of the first attempt
    pub start_floor: u32,

    /// Retry a failed floor instead of restarting from `start_floor`
    pub retry_on_failure: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            attempts: 200,
            start_floor: 1,
            retry_on_failure: true,
        }
    }
}

/// Result of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    pub attempts: usize,
    pub cleared: usize,
    pub failed: usize,
    pub clear_rate: f64,
    /// Highest floor cleared during this run
    pub highest_floor: u32,
    /// Floor the next attempt would start on
    pub next_floor: u32,
    pub final_epsilon: f64,
    pub intelligence_score: f64,
    pub intelligence_tier: IntelligenceTier,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Training pipeline: floors through the arena, driven by the decision loop
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run every attempt, climbing one floor per clear.
    pub fn run(&mut self, agent: &mut QLearningAgent, decision_loop: &mut DecisionLoop) -> Result<TrainingResult> {
        for observer in &mut self.observers {
            observer.on_training_start(self.config.attempts)?;
        }

        let start_floor = self.config.start_floor.max(1);
        let mut floor = start_floor;
        let mut cleared = 0;
        let mut highest_floor = 0;

        for attempt in 0..self.config.attempts {
            for observer in &mut self.observers {
                observer.on_floor_start(attempt, floor)?;
            }

            let mut arena = Arena::for_floor(floor);
            decision_loop.begin_floor(agent)?;
            decision_loop.begin_encounter();

            while !arena.is_done() {
                arena.step();
                if let Some(report) = decision_loop.on_frame(agent, &mut arena)? {
                    for observer in &mut self.observers {
                        observer.on_decision(attempt, &report)?;
                    }
                }
            }

            let floor_cleared = arena.is_cleared();
            let summary = decision_loop.end_floor(agent, &mut arena, floor, floor_cleared)?;
            for observer in &mut self.observers {
                observer.on_floor_end(attempt, &summary)?;
            }

            if floor_cleared {
                cleared += 1;
                highest_floor = highest_floor.max(floor);
                floor += 1;
            } else if !self.config.retry_on_failure {
                floor = start_floor;
            }
        }

        let stats = agent.stats_summary();
        for observer in &mut self.observers {
            observer.on_training_end(&stats)?;
        }

        let attempts = self.config.attempts;
        let result = TrainingResult {
            attempts,
            cleared,
            failed: attempts - cleared,
            clear_rate: if attempts == 0 {
                0.0
            } else {
                cleared as f64 / attempts as f64
            },
            highest_floor,
            next_floor: floor,
            final_epsilon: agent.epsilon(),
            intelligence_score: stats.intelligence_score,
            intelligence_tier: stats.intelligence_tier,
        };
        info!(
            attempts,
            cleared,
            highest_floor,
            epsilon = result.final_epsilon,
            tier = %result.intelligence_tier,
            "training finished"
        );
        Ok(result)
    }
}
