//! Tabular Q-learning over several decision contexts
//!
//! The agent keeps one sparse Q-table per [`Context`](crate::context::Context)
//! and learns each with the off-policy Q-learning rule:
//!
//! ```text
//! Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') − Q(s,a)]
//! ```
//!
//! Terminal transitions use `r` alone as the target.
//!
//! ## Schedules
//!
//! | Parameter | Default | Changes |
//! |-----------|---------|---------|
//! | α | 0.1 | `set_alpha_from_intelligence`: `base_alpha × (1 + (i − 1) × 0.1)` |
//! | γ | 0.95 | fixed |
//! | ε | 1.0 | `decay_epsilon` once per floor, floored at 0.05 |
//!
//! ## Usage Example
//!
//! ```no_run
//! use climber::{
//!     context::CombatAction,
//!     q_learning::{ContextShapes, Hyperparameters, QLearningAgent},
//!     types::Observation,
//! };
//!
//! let mut agent = QLearningAgent::new(Hyperparameters::default(), ContextShapes::default())
//!     .with_seed(42);
//! let state = Observation::from_array([0, 0, 1, 1, 0, 0, 0]);
//! let action: CombatAction = agent.choose_action(&state)?;
//! let next = Observation::from_array([1, 0, 1, 1, 0, 0, 0]);
//! agent.learn(&state, action, 5.0, &next, false)?;
//! # Ok::<(), climber::Error>(())
//! ```

pub mod agent;
pub mod priority;
pub mod q_table;
pub mod serialization;
pub mod telemetry;

// Public re-exports
pub use agent::{
    ContextShapes, Hyperparameters, LESSON_DELTA, QLearningAgent, StatsSummary, Transition,
};
pub use priority::{AGGRESSIVE_BIAS, DEFENSIVE_BIAS, Priority};
pub use q_table::QTable;
pub use serialization::{LoadReport, SAVE_FORMAT_VERSION, SavedAgent, format_key, parse_key};
pub use telemetry::{
    IntelligenceInputs, IntelligenceTier, MAX_LESSONS, Telemetry, combat_lesson,
};
