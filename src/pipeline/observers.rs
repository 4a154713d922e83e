//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    context::ContextAction,
    decision::{FloorSummary, TickReport},
    ports::Observer,
    q_learning::StatsSummary,
};

/// One decision tick as written to a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub tick: usize,
    /// Canonical tuple text of the observation
    pub state: String,
    pub action: String,
    pub taught: bool,
    pub reward: f64,
    pub updated_q: Option<f64>,
}

/// Complete trace of one floor attempt (one JSONL line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorRecord {
    pub attempt: usize,
    pub floor: u32,
    pub cleared: bool,
    pub cumulative_reward: f64,
    pub epsilon: f64,
    pub decisions: Vec<DecisionRecord>,
}

/// Progress bar observer - Shows training progress
#[derive(Default)]
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    cleared: usize,
    failed: usize,
    floor: u32,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn message(&self) -> String {
        format!("floor {} | cleared {} failed {}", self.floor, self.cleared, self.failed)
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_floors: usize) -> Result<()> {
        let pb = ProgressBar::new(total_floors as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} floors ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_floor_start(&mut self, _attempt: usize, floor: u32) -> Result<()> {
        self.floor = floor;
        Ok(())
    }

    fn on_floor_end(&mut self, attempt: usize, summary: &FloorSummary) -> Result<()> {
        if summary.cleared {
            self.cleared += 1;
        } else {
            self.failed += 1;
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_position(attempt as u64 + 1);
            pb.set_message(format!("{} eps {:.3}", self.message(), summary.epsilon));
        }
        Ok(())
    }

    fn on_training_end(&mut self, stats: &StatsSummary) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!("{} | {}", self.message(), stats.intelligence_tier));
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
#[derive(Default)]
pub struct MetricsObserver {
    cleared: usize,
    failed: usize,
    highest_floor: u32,
    rewards: Vec<f64>,
    ticks: Vec<u64>,
    taught: usize,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.cleared + self.failed
    }

    pub fn clear_rate(&self) -> f64 {
        if self.attempts() == 0 {
            0.0
        } else {
            self.cleared as f64 / self.attempts() as f64
        }
    }

    pub fn avg_reward(&self) -> f64 {
        if self.rewards.is_empty() {
            0.0
        } else {
            self.rewards.iter().sum::<f64>() / self.rewards.len() as f64
        }
    }

    pub fn avg_ticks(&self) -> f64 {
        if self.ticks.is_empty() {
            0.0
        } else {
            self.ticks.iter().sum::<u64>() as f64 / self.ticks.len() as f64
        }
    }

    /// Mean floor reward over the last `window` attempts.
    pub fn recent_avg_reward(&self, window: usize) -> f64 {
        let start = self.rewards.len().saturating_sub(window);
        let recent = &self.rewards[start..];
        if recent.is_empty() {
            0.0
        } else {
            recent.iter().sum::<f64>() / recent.len() as f64
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            attempts: self.attempts(),
            cleared: self.cleared,
            failed: self.failed,
            clear_rate: self.clear_rate(),
            highest_floor: self.highest_floor,
            avg_reward: self.avg_reward(),
            avg_ticks: self.avg_ticks(),
            taught_decisions: self.taught,
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub attempts: usize,
    pub cleared: usize,
    pub failed: usize,
    pub clear_rate: f64,
    pub highest_floor: u32,
    pub avg_reward: f64,
    pub avg_ticks: f64,
    pub taught_decisions: usize,
}

impl Observer for MetricsObserver {
    fn on_decision(&mut self, _attempt: usize, report: &TickReport) -> Result<()> {
        if report.taught {
            self.taught += 1;
        }
        Ok(())
    }

    fn on_floor_end(&mut self, _attempt: usize, summary: &FloorSummary) -> Result<()> {
        if summary.cleared {
            self.cleared += 1;
            self.highest_floor = self.highest_floor.max(summary.floor);
        } else {
            self.failed += 1;
        }
        self.rewards.push(summary.cumulative_reward);
        self.ticks.push(summary.ticks);
        Ok(())
    }
}

/// JSONL observer - Exports one floor trace per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current: Vec<DecisionRecord>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            current: Vec::new(),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_floor_start(&mut self, _attempt: usize, _floor: u32) -> Result<()> {
        self.current.clear();
        Ok(())
    }

    fn on_decision(&mut self, _attempt: usize, report: &TickReport) -> Result<()> {
        self.current.push(DecisionRecord {
            tick: self.current.len(),
            state: report.observation.to_string(),
            action: report.action.name().to_string(),
            taught: report.taught,
            reward: report.reward,
            updated_q: report.updated_q,
        });
        Ok(())
    }

    fn on_floor_end(&mut self, attempt: usize, summary: &FloorSummary) -> Result<()> {
        let record = FloorRecord {
            attempt,
            floor: summary.floor,
            cleared: summary.cleared,
            cumulative_reward: summary.cumulative_reward,
            epsilon: summary.epsilon,
            decisions: std::mem::take(&mut self.current),
        };

        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Milestone observer - Tracks key learning achievements
#[derive(Default)]
pub struct MilestoneObserver {
    first_clear: Option<usize>,
    last_failure: Option<usize>,
    longest_streak: usize,
    streak: usize,
}

impl MilestoneObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt index of the first cleared floor.
    pub fn first_clear(&self) -> Option<usize> {
        self.first_clear
    }

    pub fn last_failure(&self) -> Option<usize> {
        self.last_failure
    }

    /// Longest run of consecutive clears.
    pub fn longest_streak(&self) -> usize {
        self.longest_streak
    }
}

impl Observer for MilestoneObserver {
    fn on_floor_end(&mut self, attempt: usize, summary: &FloorSummary) -> Result<()> {
        if summary.cleared {
            self.first_clear.get_or_insert(attempt);
            self.streak += 1;
            self.longest_streak = self.longest_streak.max(self.streak);
        } else {
            self.last_failure = Some(attempt);
            self.streak = 0;
        }
        Ok(())
    }
}
