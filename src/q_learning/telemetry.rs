//! Learning telemetry: counters, lessons learned, and the intelligence score.

use std::{collections::VecDeque, fmt};

use serde::{Deserialize, Serialize};

use crate::encoder::Level;

/// Most lessons kept; older lessons are evicted first.
pub const MAX_LESSONS: usize = 20;

/// Accumulating counters and lessons. Only discarding the agent resets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    pub total_battles: u64,
    pub battles_won: u64,
    pub floors_cleared: u64,
    pub highest_floor: u32,
    pub total_learning_updates: u64,
    pub player_taught_actions: u64,
    lessons: VecDeque<String>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lessons learned, oldest first.
    pub fn lessons(&self) -> impl Iterator<Item = &str> {
        self.lessons.iter().map(String::as_str)
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    /// Append a lesson unless an identical one is already recorded.
    ///
    /// Returns `true` when the lesson was added.
    pub fn record_lesson(&mut self, lesson: String) -> bool {
        if self.lessons.iter().any(|existing| *existing == lesson) {
            return false;
        }
        self.lessons.push_back(lesson);
        while self.lessons.len() > MAX_LESSONS {
            self.lessons.pop_front();
        }
        true
    }

    pub fn record_battle(&mut self, won: bool) {
        self.total_battles += 1;
        if won {
            self.battles_won += 1;
        }
    }

    pub fn record_floor_cleared(&mut self, floor: u32) {
        self.floors_cleared += 1;
        self.highest_floor = self.highest_floor.max(floor);
    }

    pub fn win_rate(&self) -> f64 {
        self.battles_won as f64 / self.total_battles.max(1) as f64
    }
}

/// Derive a lesson from a large combat Q-value change.
///
/// The HP bucket is read from the first observation component.
pub fn combat_lesson(action_name: &str, hp_bucket: Option<u8>, new_q: f64, reward: f64) -> Option<String> {
    let hp = hp_bucket
        .and_then(Level::from_index)
        .map(Level::name)
        .unwrap_or("unknown");

    if reward > 20.0 {
        Some(format!("{action_name} works great at {hp} HP"))
    } else if reward < -20.0 {
        Some(format!("{action_name} is a bad idea at {hp} HP"))
    } else if new_q > 30.0 {
        Some(format!("Mastered {action_name} at {hp} HP"))
    } else {
        None
    }
}

/// Inputs to the intelligence score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntelligenceInputs {
    pub combat_entries: usize,
    pub minigame_entries: usize,
    pub battles_won: u64,
    pub total_battles: u64,
    pub total_learning_updates: u64,
    pub epsilon: f64,
    pub player_taught_actions: u64,
}

impl IntelligenceInputs {
    /// Score in `[0, 100]`; informational only, never feeds back into learning.
    pub fn score(&self) -> f64 {
        let knowledge = ((self.combat_entries + self.minigame_entries) as f64 / 4.0).min(25.0);
        let win_rate = self.battles_won as f64 / self.total_battles.max(1) as f64 * 25.0;
        let experience = (self.total_learning_updates as f64 / 100.0).min(25.0);
        let exploitation = (1.0 - self.epsilon) * 15.0;
        let teaching = (self.player_taught_actions as f64 / 5.0).min(10.0);

        (knowledge + win_rate + experience + exploitation + teaching).clamp(0.0, 100.0)
    }
}

/// Named band of the intelligence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntelligenceTier {
    Newborn,
    Infant,
    Toddler,
    Novice,
    Apprentice,
    Skilled,
    Expert,
    Master,
    Superhuman,
}

impl IntelligenceTier {
    /// Lower bound of each tier, ascending.
    const THRESHOLDS: [(f64, IntelligenceTier); 9] = [
        (0.0, IntelligenceTier::Newborn),
        (10.0, IntelligenceTier::Infant),
        (20.0, IntelligenceTier::Toddler),
        (35.0, IntelligenceTier::Novice),
        (50.0, IntelligenceTier::Apprentice),
        (65.0, IntelligenceTier::Skilled),
        (80.0, IntelligenceTier::Expert),
        (90.0, IntelligenceTier::Master),
        (98.0, IntelligenceTier::Superhuman),
    ];

    pub fn from_score(score: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .rev()
            .find(|(lower, _)| score >= *lower)
            .map(|(_, tier)| *tier)
            .unwrap_or(IntelligenceTier::Newborn)
    }

    pub fn name(self) -> &'static str {
        match self {
            IntelligenceTier::Newborn => "Newborn",
            IntelligenceTier::Infant => "Infant",
            IntelligenceTier::Toddler => "Toddler",
            IntelligenceTier::Novice => "Novice",
            IntelligenceTier::Apprentice => "Apprentice",
            IntelligenceTier::Skilled => "Skilled",
            IntelligenceTier::Expert => "Expert",
            IntelligenceTier::Master => "Master",
            IntelligenceTier::Superhuman => "Superhuman",
        }
    }
}

impl fmt::Display for IntelligenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lessons_are_deduplicated_and_bounded() {
        let mut telemetry = Telemetry::new();
        assert!(telemetry.record_lesson("RUN works great at low HP".into()));
        assert!(!telemetry.record_lesson("RUN works great at low HP".into()));

        for i in 0..30 {
            telemetry.record_lesson(format!("lesson {i}"));
        }
        assert_eq!(telemetry.lesson_count(), MAX_LESSONS);
        assert_eq!(telemetry.lessons().next(), Some("lesson 10"));
        assert_eq!(telemetry.lessons().last(), Some("lesson 29"));
    }

    #[test]
    fn test_combat_lesson_templates() {
        assert_eq!(
            combat_lesson("ATTACK", Some(0), 3.0, 50.0).as_deref(),
            Some("ATTACK works great at high HP")
        );
        assert_eq!(
            combat_lesson("CHARGE", Some(3), -9.0, -100.0).as_deref(),
            Some("CHARGE is a bad idea at critical HP")
        );
        assert_eq!(
            combat_lesson("RUN", Some(2), 31.0, 5.0).as_deref(),
            Some("Mastered RUN at low HP")
        );
        assert_eq!(combat_lesson("RUN", Some(2), 10.0, 5.0), None);
        assert_eq!(combat_lesson("RUN", Some(2), 10.0, 20.0), None);
    }

    #[test]
    fn test_floor_telemetry() {
        let mut telemetry = Telemetry::new();
        telemetry.record_battle(true);
        telemetry.record_battle(false);
        telemetry.record_floor_cleared(3);
        telemetry.record_floor_cleared(2);
        assert_eq!(telemetry.total_battles, 2);
        assert_eq!(telemetry.battles_won, 1);
        assert_eq!(telemetry.floors_cleared, 2);
        assert_eq!(telemetry.highest_floor, 3);
        assert_eq!(telemetry.win_rate(), 0.5);
    }

    #[test]
    fn test_fresh_agent_score() {
        let inputs = IntelligenceInputs {
            epsilon: 1.0,
            ..Default::default()
        };
        assert_eq!(inputs.score(), 0.0);
        assert_eq!(IntelligenceTier::from_score(inputs.score()), IntelligenceTier::Newborn);
    }

    #[test]
    fn test_saturated_score() {
        let inputs = IntelligenceInputs {
            combat_entries: 400,
            minigame_entries: 0,
            battles_won: 10,
            total_battles: 10,
            total_learning_updates: 10_000,
            epsilon: 0.0,
            player_taught_actions: 100,
        };
        assert_eq!(inputs.score(), 100.0);
        assert_eq!(IntelligenceTier::from_score(100.0), IntelligenceTier::Superhuman);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(IntelligenceTier::from_score(9.999), IntelligenceTier::Newborn);
        assert_eq!(IntelligenceTier::from_score(10.0), IntelligenceTier::Infant);
        assert_eq!(IntelligenceTier::from_score(49.0), IntelligenceTier::Novice);
        assert_eq!(IntelligenceTier::from_score(97.9), IntelligenceTier::Master);
        assert_eq!(IntelligenceTier::from_score(98.0), IntelligenceTier::Superhuman);
    }
}
