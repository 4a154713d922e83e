//! Decision contexts and their typed action sets.
//!
//! Each context owns an independent Q-table and a fixed, finite action set.
//! Action indices are part of the persisted key format and must not be
//! renumbered.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An independent decision domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    Combat,
    Base,
    Minigame,
}

impl Context {
    pub const ALL: [Context; 3] = [Context::Combat, Context::Base, Context::Minigame];

    pub fn as_str(self) -> &'static str {
        match self {
            Context::Combat => "combat",
            Context::Base => "base",
            Context::Minigame => "minigame",
        }
    }

    /// Number of actions available in this context.
    pub fn action_count(self) -> usize {
        match self {
            Context::Combat => CombatAction::ALL.len(),
            Context::Base => BaseAction::ALL.len(),
            Context::Minigame => MinigameAction::ALL.len(),
        }
    }

    /// Whether `index` names an action of this context.
    pub fn is_valid_action(self, index: u8) -> bool {
        (index as usize) < self.action_count()
    }

    /// Display name of the action at `index`, or `"UNKNOWN"`.
    pub fn action_name(self, index: u8) -> &'static str {
        let name = match self {
            Context::Combat => CombatAction::from_index(index).map(CombatAction::name),
            Context::Base => BaseAction::from_index(index).map(BaseAction::name),
            Context::Minigame => MinigameAction::from_index(index).map(MinigameAction::name),
        };
        name.unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Context {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combat" => Ok(Context::Combat),
            "base" => Ok(Context::Base),
            "minigame" | "mini-game" => Ok(Context::Minigame),
            other => Err(Error::UnknownContext {
                name: other.to_string(),
            }),
        }
    }
}

/// How an action relates to the nearest threat, used by priority biasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    /// Closes distance or deals damage.
    Aggressive,
    /// Opens distance.
    Retreat,
    Neutral,
}

/// An action belonging to exactly one context.
pub trait ContextAction: Copy + Eq + fmt::Debug + 'static {
    /// The context whose table this action indexes.
    const CONTEXT: Context;

    /// Every action of the context, in index order.
    const ALL: &'static [Self];

    /// Persisted action index.
    fn index(self) -> u8;

    fn from_index(index: u8) -> Option<Self>;

    /// Upper-case display name used in lessons and CLI output.
    fn name(self) -> &'static str;

    fn stance(self) -> Stance {
        Stance::Neutral
    }
}

/// Actions available while fighting on a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    /// Approach the nearest enemy and strike when in range.
    Attack,
    /// Move away from the nearest enemy.
    Run,
    /// Rush toward the nearest enemy at double speed.
    Charge,
}

impl ContextAction for CombatAction {
    const CONTEXT: Context = Context::Combat;
    const ALL: &'static [Self] = &[CombatAction::Attack, CombatAction::Run, CombatAction::Charge];

    fn index(self) -> u8 {
        match self {
            CombatAction::Attack => 0,
            CombatAction::Run => 1,
            CombatAction::Charge => 2,
        }
    }

    fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    fn name(self) -> &'static str {
        match self {
            CombatAction::Attack => "ATTACK",
            CombatAction::Run => "RUN",
            CombatAction::Charge => "CHARGE",
        }
    }

    fn stance(self) -> Stance {
        match self {
            CombatAction::Attack | CombatAction::Charge => Stance::Aggressive,
            CombatAction::Run => Stance::Retreat,
        }
    }
}

/// Actions available at the base camp between climbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseAction {
    TrainStrength,
    TrainIntelligence,
    TrainAgility,
    TrainDefense,
    TrainLuck,
    StartClimb,
}

impl ContextAction for BaseAction {
    const CONTEXT: Context = Context::Base;
    const ALL: &'static [Self] = &[
        BaseAction::TrainStrength,
        BaseAction::TrainIntelligence,
        BaseAction::TrainAgility,
        BaseAction::TrainDefense,
        BaseAction::TrainLuck,
        BaseAction::StartClimb,
    ];

    fn index(self) -> u8 {
        match self {
            BaseAction::TrainStrength => 0,
            BaseAction::TrainIntelligence => 1,
            BaseAction::TrainAgility => 2,
            BaseAction::TrainDefense => 3,
            BaseAction::TrainLuck => 4,
            BaseAction::StartClimb => 5,
        }
    }

    fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    fn name(self) -> &'static str {
        match self {
            BaseAction::TrainStrength => "TRAIN STRENGTH",
            BaseAction::TrainIntelligence => "TRAIN INTELLIGENCE",
            BaseAction::TrainAgility => "TRAIN AGILITY",
            BaseAction::TrainDefense => "TRAIN DEFENSE",
            BaseAction::TrainLuck => "TRAIN LUCK",
            BaseAction::StartClimb => "START CLIMB",
        }
    }
}

/// Timing mini-game inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameAction {
    Press,
    Wait,
}

impl ContextAction for MinigameAction {
    const CONTEXT: Context = Context::Minigame;
    const ALL: &'static [Self] = &[MinigameAction::Press, MinigameAction::Wait];

    fn index(self) -> u8 {
        match self {
            MinigameAction::Press => 0,
            MinigameAction::Wait => 1,
        }
    }

    fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    fn name(self) -> &'static str {
        match self {
            MinigameAction::Press => "PRESS",
            MinigameAction::Wait => "WAIT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_round_trip<A: ContextAction>() {
        for (i, action) in A::ALL.iter().enumerate() {
            assert_eq!(action.index() as usize, i);
            assert_eq!(A::from_index(i as u8), Some(*action));
        }
        assert_eq!(A::from_index(A::ALL.len() as u8), None);
        assert_eq!(A::CONTEXT.action_count(), A::ALL.len());
    }

    #[test]
    fn test_action_indices_are_dense() {
        assert_indices_round_trip::<CombatAction>();
        assert_indices_round_trip::<BaseAction>();
        assert_indices_round_trip::<MinigameAction>();
    }

    #[test]
    fn test_context_parse() {
        assert_eq!("Combat".parse::<Context>().unwrap(), Context::Combat);
        assert_eq!("mini-game".parse::<Context>().unwrap(), Context::Minigame);
        assert!("dungeon".parse::<Context>().is_err());
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Context::Combat.action_name(2), "CHARGE");
        assert_eq!(Context::Base.action_name(5), "START CLIMB");
        assert_eq!(Context::Minigame.action_name(9), "UNKNOWN");
    }
}
