//! Tabular Q-learning core for an autonomous tower-climber character
//!
//! This crate provides:
//! - A state encoder that discretizes live battle data into small observations
//! - A multi-context Q-learning agent (combat, base, minigame) with
//!   epsilon-greedy exploration, priority biasing, and player teaching
//! - A decision loop that throttles choices and turns outcomes into updates
//! - Save/load of learned tables in a human-readable format
//! - A headless arena and training pipeline for running the agent offline

pub mod adapters;
pub mod app;
pub mod arena;
pub mod cli;
pub mod context;
pub mod decision;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod types;

pub use context::{BaseAction, CombatAction, Context, ContextAction, MinigameAction};
pub use decision::{DecisionConfig, DecisionLoop};
pub use encoder::{EncoderConfig, EncoderVariant, StateEncoder};
pub use error::{Error, Result};
pub use q_learning::{Hyperparameters, Priority, QLearningAgent, QTable, SavedAgent};
pub use types::Observation;
