//! Decision-time priority overlays.
//!
//! A priority adds a bias to raw Q-values before the arg-max. The biased
//! values only steer the current decision; they are never written back into
//! a Q-table.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{context::Stance, error::Error};

/// Bonus applied to aggressive actions, and penalty to retreating, under
/// [`Priority::Aggressive`].
pub const AGGRESSIVE_BIAS: f64 = 5.0;

/// Retreat bonus at zero HP under [`Priority::Defensive`]; scales linearly
/// down to nothing at full HP.
pub const DEFENSIVE_BIAS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Aggressive,
    Defensive,
    #[default]
    Balanced,
}

impl Priority {
    /// Additive bias for an action of the given stance.
    ///
    /// `hp_ratio` is the agent's current HP fraction, clamped to `[0, 1]`.
    pub fn bias(self, stance: Stance, hp_ratio: f64) -> f64 {
        let hp_ratio = if hp_ratio.is_nan() { 0.0 } else { hp_ratio.clamp(0.0, 1.0) };
        match (self, stance) {
            (Priority::Aggressive, Stance::Aggressive) => AGGRESSIVE_BIAS,
            (Priority::Aggressive, Stance::Retreat) => -AGGRESSIVE_BIAS,
            (Priority::Defensive, Stance::Retreat) => DEFENSIVE_BIAS * (1.0 - hp_ratio),
            _ => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Aggressive => "aggressive",
            Priority::Defensive => "defensive",
            Priority::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(Priority::Aggressive),
            "defensive" => Ok(Priority::Defensive),
            "balanced" => Ok(Priority::Balanced),
            other => Err(Error::UnknownPriority {
                name: other.to_string(),
            }),
        }
    }
}
