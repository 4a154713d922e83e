//! Configuration types for agent creation.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    decision::{DecisionConfig, ThreatMemory},
    encoder::{EncoderConfig, EncoderVariant, Thresholds},
    error::Error,
    q_learning::{ContextShapes, Hyperparameters, Priority},
    types::MAX_ARITY,
};

/// Configuration for creating an agent and its decision loop.
///
/// Builder-style and serde-serializable, so the same settings can come from
/// code, a JSON file, or CLI flags layered over a file.
///
/// # Examples
///
/// ```
/// use climber::{app::AgentConfig, encoder::EncoderVariant, q_learning::Priority};
///
/// let config = AgentConfig::new()
///     .with_seed(42)
///     .with_variant(EncoderVariant::Basic)
///     .with_priority(Priority::Defensive);
/// assert_eq!(config.shapes().combat, 4);
/// config.validate()?;
/// # Ok::<(), climber::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub hyperparameters: Hyperparameters,
    pub encoder: EncoderConfig,
    /// Observation arity of base-menu decisions
    pub base_arity: usize,
    /// Observation arity of minigame decisions
    pub minigame_arity: usize,
    pub decision: DecisionConfig,
    /// Intelligence stat feeding the learning-rate modifier
    pub intelligence: u32,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let shapes = ContextShapes::default();
        Self {
            hyperparameters: Hyperparameters::default(),
            encoder: EncoderConfig::default(),
            base_arity: shapes.base,
            minigame_arity: shapes.minigame,
            decision: DecisionConfig::default(),
            intelligence: 1,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| Error::SerializationContext {
            operation: format!("parse config {path:?}"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_variant(mut self, variant: EncoderVariant) -> Self {
        self.encoder.variant = variant;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.decision.priority = priority;
        self
    }

    pub fn with_threat_memory(mut self, threat_memory: ThreatMemory) -> Self {
        self.decision.threat_memory = threat_memory;
        self
    }

    pub fn with_cadence(mut self, cadence: u32) -> Self {
        self.decision.cadence = cadence;
        self
    }

    pub fn with_intelligence(mut self, intelligence: u32) -> Self {
        self.intelligence = intelligence;
        self
    }

    /// Table arities implied by this configuration.
    ///
    /// The combat arity always follows the encoder variant.
    pub fn shapes(&self) -> ContextShapes {
        ContextShapes {
            combat: self.encoder.variant.arity(),
            base: self.base_arity,
            minigame: self.minigame_arity,
        }
    }

    /// Check ranges and orderings of every setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let h = &self.hyperparameters;
        check(h.base_alpha > 0.0 && h.base_alpha <= 1.0, "base_alpha must be in (0, 1]")?;
        check((0.0..=1.0).contains(&h.gamma), "gamma must be in [0, 1]")?;
        check(
            (0.0..=1.0).contains(&h.epsilon_min) && h.epsilon_min <= h.epsilon_start,
            "epsilon_min must be in [0, epsilon_start]",
        )?;
        check(h.epsilon_start <= 1.0, "epsilon_start must be at most 1")?;
        check(
            h.epsilon_decay > 0.0 && h.epsilon_decay <= 1.0,
            "epsilon_decay must be in (0, 1]",
        )?;

        for (name, arity) in [("base_arity", self.base_arity), ("minigame_arity", self.minigame_arity)] {
            if arity == 0 || arity > MAX_ARITY {
                return Err(invalid(format!("{name} must be between 1 and {MAX_ARITY}, got {arity}")));
            }
        }

        let e = &self.encoder;
        check_thresholds("hp_thresholds", &e.hp_thresholds)?;
        check_thresholds("stamina_thresholds", &e.stamina_thresholds)?;
        check(e.threat_radius > 0.0, "threat_radius must be positive")?;
        check(e.damage_per_threat > 0.0, "damage_per_threat must be positive")?;
        check((0.0..=1.0).contains(&e.damage_decay), "damage_decay must be in [0, 1]")?;
        check(e.attack_range >= 0.0, "attack_range must not be negative")?;
        check(e.height_margin >= 0.0, "height_margin must not be negative")?;
        check(e.hazard_radius >= 0.0, "hazard_radius must not be negative")?;

        check(self.decision.cadence >= 1, "cadence must be at least 1 frame")?;
        check(self.intelligence >= 1, "intelligence must be at least 1")?;
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfiguration { message }
}

fn check(ok: bool, message: &str) -> Result<()> {
    if ok { Ok(()) } else { Err(invalid(message.to_string())) }
}

fn check_thresholds(name: &str, t: &Thresholds) -> Result<()> {
    if 0.0 < t.critical && t.critical < t.low && t.low < t.medium && t.medium < 1.0 {
        Ok(())
    } else {
        Err(invalid(format!(
            "{name} must satisfy 0 < critical < low < medium < 1, got {}/{}/{}",
            t.critical, t.low, t.medium
        )))
    }
}
