//! Combat state encoder.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
    bucket::{Level, Thresholds, bucket, ratio},
    snapshot::{AgentVitals, EnemyKind, EnemyView, TerrainHints},
};
use crate::types::Observation;

/// Class of the nearest living enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnemyClass {
    Melee = 0,
    Ranged = 1,
    None = 2,
}

impl EnemyClass {
    pub const COUNT: u8 = 3;

    fn name(self) -> &'static str {
        match self {
            EnemyClass::Melee => "Melee",
            EnemyClass::Ranged => "Ranged",
            EnemyClass::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThreatLevel {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl ThreatLevel {
    pub const COUNT: u8 = 3;

    fn name(self) -> &'static str {
        match self {
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
        }
    }
}

/// Vertical position of the agent relative to the nearest enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HeightAdvantage {
    Level = 0,
    Above = 1,
    Below = 2,
}

impl HeightAdvantage {
    pub const COUNT: u8 = 3;

    fn name(self) -> &'static str {
        match self {
            HeightAdvantage::Level => "Level",
            HeightAdvantage::Above => "Above",
            HeightAdvantage::Below => "Below",
        }
    }
}

/// Which signals make up an observation.
///
/// The variant fixes the observation arity for the lifetime of a save file;
/// switching variants invalidates previously learned combat tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderVariant {
    /// `(hp, enemy, threat, in_range)`
    Basic,
    /// `(hp, enemy, threat, in_range, stamina, height, near_hazard)`
    #[default]
    Extended,
}

impl EncoderVariant {
    pub fn arity(self) -> usize {
        match self {
            EncoderVariant::Basic => 4,
            EncoderVariant::Extended => 7,
        }
    }

    /// Number of buckets per component, in component order.
    pub fn cardinalities(self) -> &'static [u8] {
        static EXTENDED: [u8; 7] = [
            Level::COUNT,
            EnemyClass::COUNT,
            ThreatLevel::COUNT,
            2,
            Level::COUNT,
            HeightAdvantage::COUNT,
            2,
        ];
        &EXTENDED[..self.arity()]
    }
}

/// Tunable constants of the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub variant: EncoderVariant,
    pub hp_thresholds: Thresholds,
    pub stamina_thresholds: Thresholds,
    /// Enemies strictly closer than this count toward threat.
    pub threat_radius: f64,
    /// Recent damage worth one threat point.
    pub damage_per_threat: f64,
    /// Multiplier applied to recent damage once per decision tick.
    pub damage_decay: f64,
    pub attack_range: f64,
    /// Vertical offset beyond which the agent is above or below its target.
    pub height_margin: f64,
    pub hazard_radius: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            variant: EncoderVariant::default(),
            hp_thresholds: Thresholds::default(),
            stamina_thresholds: Thresholds::default(),
            threat_radius: 150.0,
            damage_per_threat: 20.0,
            damage_decay: 0.8,
            attack_range: 50.0,
            height_margin: 30.0,
            hazard_radius: 60.0,
        }
    }
}

impl EncoderConfig {
    pub fn with_variant(mut self, variant: EncoderVariant) -> Self {
        self.variant = variant;
        self
    }
}

/// Compresses a battle snapshot into an [`Observation`].
///
/// Encoding is pure except for the recent-damage accumulator, which callers
/// feed with [`record_damage`](Self::record_damage), decay once per decision
/// tick, and clear at floor boundaries.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    config: EncoderConfig,
    recent_damage: f64,
}

impl StateEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            recent_damage: 0.0,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn arity(&self) -> usize {
        self.config.variant.arity()
    }

    pub fn recent_damage(&self) -> f64 {
        self.recent_damage
    }

    /// Encode the current situation.
    pub fn encode(
        &self,
        vitals: &AgentVitals,
        enemies: &[EnemyView],
        terrain: Option<&TerrainHints>,
    ) -> Observation {
        let hp = bucket(ratio(vitals.hp, vitals.max_hp), &self.config.hp_thresholds);
        let nearest = self.nearest_enemy(vitals, enemies);
        let enemy_class = match nearest {
            Some((enemy, _)) => match enemy.kind {
                EnemyKind::Melee => EnemyClass::Melee,
                EnemyKind::Ranged => EnemyClass::Ranged,
            },
            None => EnemyClass::None,
        };
        let threat = self.threat_level(vitals, enemies);
        let in_range = nearest.is_some_and(|(_, distance)| distance <= self.config.attack_range);

        let core = [hp.index(), enemy_class as u8, threat as u8, u8::from(in_range)];

        let observation = match self.config.variant {
            EncoderVariant::Basic => Observation::from_array(core),
            EncoderVariant::Extended => {
                let stamina = bucket(
                    ratio(vitals.stamina, vitals.max_stamina),
                    &self.config.stamina_thresholds,
                );
                let height = nearest
                    .map(|(enemy, _)| self.height_advantage(vitals, enemy))
                    .unwrap_or(HeightAdvantage::Level);
                let near_hazard = terrain
                    .and_then(|t| t.hazard_distance)
                    .is_some_and(|distance| distance <= self.config.hazard_radius);
                let [hp, enemy, threat, in_range] = core;
                Observation::from_array([
                    hp,
                    enemy,
                    threat,
                    in_range,
                    stamina.index(),
                    height as u8,
                    u8::from(near_hazard),
                ])
            }
        };

        debug_assert!(
            observation
                .buckets()
                .iter()
                .zip(self.config.variant.cardinalities())
                .all(|(bucket, count)| bucket < count),
            "encoder produced an out-of-range bucket: {observation}"
        );

        trace!(%observation, recent_damage = self.recent_damage, "encoded state");
        observation
    }

    /// Nearest living enemy and its distance.
    ///
    /// Ties keep the earliest enemy in slice order.
    pub fn nearest_enemy<'a>(
        &self,
        vitals: &AgentVitals,
        enemies: &'a [EnemyView],
    ) -> Option<(&'a EnemyView, f64)> {
        enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| (enemy, vitals.position.distance_to(&enemy.position)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }

    /// Threat from nearby enemies plus recent damage.
    ///
    /// With no living enemy the threat is low regardless of recent damage.
    pub fn threat_level(&self, vitals: &AgentVitals, enemies: &[EnemyView]) -> ThreatLevel {
        let mut alive = enemies.iter().filter(|enemy| enemy.is_alive()).peekable();
        if alive.peek().is_none() {
            return ThreatLevel::Low;
        }

        let close = alive
            .filter(|enemy| vitals.position.distance_to(&enemy.position) < self.config.threat_radius)
            .count();
        let score = close as f64 + self.recent_damage / self.config.damage_per_threat;

        if score >= 2.0 {
            ThreatLevel::High
        } else if score >= 1.0 {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }

    fn height_advantage(&self, vitals: &AgentVitals, enemy: &EnemyView) -> HeightAdvantage {
        // Screen y grows downward, so a positive offset means the agent is higher.
        let offset = enemy.position.y - vitals.position.y;
        if offset > self.config.height_margin {
            HeightAdvantage::Above
        } else if offset < -self.config.height_margin {
            HeightAdvantage::Below
        } else {
            HeightAdvantage::Level
        }
    }

    pub fn record_damage(&mut self, amount: f64) {
        self.recent_damage += amount;
    }

    /// Apply one tick of decay to the recent-damage accumulator.
    pub fn decay_damage(&mut self) {
        self.recent_damage *= self.config.damage_decay;
    }

    /// Clear the recent-damage accumulator.
    pub fn reset(&mut self) {
        self.recent_damage = 0.0;
    }
}

fn level_label(bucket: Option<u8>) -> &'static str {
    match bucket.and_then(Level::from_index) {
        Some(Level::High) => "High",
        Some(Level::Medium) => "Medium",
        Some(Level::Low) => "Low",
        Some(Level::Critical) => "Critical",
        None => "?",
    }
}

/// Human-readable rendering of a combat observation.
pub fn describe(observation: &Observation) -> String {
    let hp = level_label(observation.get(0));
    let enemy = match observation.get(1) {
        Some(0) => EnemyClass::Melee.name(),
        Some(1) => EnemyClass::Ranged.name(),
        Some(2) => EnemyClass::None.name(),
        _ => "?",
    };
    let threat = match observation.get(2) {
        Some(0) => ThreatLevel::Low.name(),
        Some(1) => ThreatLevel::Medium.name(),
        Some(2) => ThreatLevel::High.name(),
        _ => "?",
    };
    let yes_no = |value: Option<u8>| match value {
        Some(0) => "No",
        Some(1) => "Yes",
        _ => "?",
    };

    let mut text = format!(
        "HP: {hp} | Enemy: {enemy} | Threat: {threat} | In Range: {}",
        yes_no(observation.get(3))
    );

    if observation.arity() >= 7 {
        let stamina = level_label(observation.get(4));
        let height = match observation.get(5) {
            Some(0) => HeightAdvantage::Level.name(),
            Some(1) => HeightAdvantage::Above.name(),
            Some(2) => HeightAdvantage::Below.name(),
            _ => "?",
        };
        text.push_str(&format!(
            " | Stamina: {stamina} | Height: {height} | Hazard: {}",
            yes_no(observation.get(6))
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Point;

    fn vitals(hp: f64) -> AgentVitals {
        AgentVitals::new(hp, 100.0, Point::new(100.0, 450.0))
    }

    fn melee(x: f64) -> EnemyView {
        EnemyView::new(EnemyKind::Melee, Point::new(x, 450.0), 30.0)
    }

    fn ranged(x: f64) -> EnemyView {
        EnemyView::new(EnemyKind::Ranged, Point::new(x, 450.0), 20.0)
    }

    fn basic() -> StateEncoder {
        StateEncoder::new(EncoderConfig::default().with_variant(EncoderVariant::Basic))
    }

    #[test]
    fn test_basic_encoding() {
        let encoder = basic();
        let obs = encoder.encode(&vitals(100.0), &[melee(140.0), ranged(500.0)], None);
        // high hp, melee nearest, one enemy close, in range (40 <= 50)
        assert_eq!(obs.buckets(), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_no_enemies() {
        let mut encoder = basic();
        encoder.record_damage(100.0);
        let obs = encoder.encode(&vitals(20.0), &[], None);
        assert_eq!(obs.buckets(), &[3, 2, 0, 0]);
    }

    #[test]
    fn test_dead_enemies_are_ignored() {
        let encoder = basic();
        let mut corpse = melee(105.0);
        corpse.hp = 0.0;
        let obs = encoder.encode(&vitals(60.0), &[corpse, ranged(400.0)], None);
        assert_eq!(obs.buckets(), &[1, 1, 0, 0]);
    }

    #[test]
    fn test_nearest_ties_keep_first() {
        let encoder = basic();
        let enemies = [ranged(150.0), melee(50.0)];
        let (nearest, distance) = encoder.nearest_enemy(&vitals(100.0), &enemies).unwrap();
        assert_eq!(nearest.kind, EnemyKind::Ranged);
        assert_eq!(distance, 50.0);
    }

    #[test]
    fn test_threat_counts_recent_damage() {
        let mut encoder = basic();
        let enemies = [melee(600.0)];
        assert_eq!(encoder.threat_level(&vitals(100.0), &enemies), ThreatLevel::Low);
        encoder.record_damage(20.0);
        assert_eq!(encoder.threat_level(&vitals(100.0), &enemies), ThreatLevel::Medium);
        encoder.record_damage(20.0);
        assert_eq!(encoder.threat_level(&vitals(100.0), &enemies), ThreatLevel::High);
        encoder.decay_damage();
        // 40 * 0.8 = 32 -> 1.6 points
        assert_eq!(encoder.threat_level(&vitals(100.0), &enemies), ThreatLevel::Medium);
        encoder.reset();
        assert_eq!(encoder.recent_damage(), 0.0);
    }

    #[test]
    fn test_threat_radius_is_strict() {
        let encoder = basic();
        let enemies = [melee(250.0)];
        assert_eq!(encoder.threat_level(&vitals(100.0), &enemies), ThreatLevel::Low);
    }

    #[test]
    fn test_attack_range_is_inclusive() {
        let encoder = basic();
        let obs = encoder.encode(&vitals(100.0), &[melee(150.0)], None);
        assert_eq!(obs.get(3), Some(1));
        let obs = encoder.encode(&vitals(100.0), &[melee(150.5)], None);
        assert_eq!(obs.get(3), Some(0));
    }

    #[test]
    fn test_extended_encoding() {
        let encoder = StateEncoder::new(EncoderConfig::default());
        let agent = vitals(100.0).with_stamina(20.0, 100.0);
        let mut high_enemy = melee(300.0);
        high_enemy.position.y = 400.0;
        let terrain = TerrainHints {
            hazard_distance: Some(45.0),
        };
        let obs = encoder.encode(&agent, &[high_enemy], Some(&terrain));
        assert_eq!(obs.arity(), 7);
        assert_eq!(&obs.buckets()[4..], &[3, 2, 1]);

        let obs = encoder.encode(&agent, &[melee(300.0)], None);
        assert_eq!(&obs.buckets()[4..], &[3, 0, 0]);
    }

    #[test]
    fn test_describe() {
        let text = describe(&Observation::from_array([0, 1, 2, 1]));
        assert_eq!(text, "HP: High | Enemy: Ranged | Threat: High | In Range: Yes");
        let text = describe(&Observation::from_array([3, 2, 0, 0, 1, 1, 0]));
        assert_eq!(
            text,
            "HP: Critical | Enemy: None | Threat: Low | In Range: No | Stamina: Medium | Height: Above | Hazard: No"
        );
    }
}
