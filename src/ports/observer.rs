//! Observer port - abstraction for training observation and data collection
//!
//! Training runs notify observers of floor and decision events so progress
//! display, metrics, and trace export stay out of the training loop itself.

use crate::{
    Result,
    decision::{FloorSummary, TickReport},
    q_learning::StatsSummary,
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_floors)` - once
/// 2. For each floor attempt:
///    - `on_floor_start(attempt, floor)`
///    - `on_decision(attempt, report)` - once per decision tick
///    - `on_floor_end(attempt, summary)`
/// 3. `on_training_end(stats)` - once
///
/// # Examples
///
/// ```no_run
/// use climber::{decision::FloorSummary, ports::Observer};
///
/// struct ClearCounter {
///     cleared: usize,
/// }
///
/// impl Observer for ClearCounter {
///     fn on_floor_end(&mut self, _attempt: usize, summary: &FloorSummary) -> climber::Result<()> {
///         if summary.cleared {
///             self.cleared += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called once before the first floor.
    fn on_training_start(&mut self, _total_floors: usize) -> Result<()> {
        Ok(())
    }

    /// Called when a floor attempt begins.
    ///
    /// `attempt` counts every floor played in this run (0-based); `floor` is
    /// the tower floor being attempted.
    fn on_floor_start(&mut self, _attempt: usize, _floor: u32) -> Result<()> {
        Ok(())
    }

    /// Called after each decision tick.
    fn on_decision(&mut self, _attempt: usize, _report: &TickReport) -> Result<()> {
        Ok(())
    }

    /// Called after the floor's terminal update and epsilon decay.
    fn on_floor_end(&mut self, _attempt: usize, _summary: &FloorSummary) -> Result<()> {
        Ok(())
    }

    /// Called once when training completes.
    fn on_training_end(&mut self, _stats: &StatsSummary) -> Result<()> {
        Ok(())
    }
}
