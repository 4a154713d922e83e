//! World observables consumed by the state encoder.

use serde::{Deserialize, Serialize};

/// Position in screen space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The controlled agent's vitals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentVitals {
    pub hp: f64,
    pub max_hp: f64,
    pub stamina: f64,
    pub max_stamina: f64,
    pub position: Point,
}

impl AgentVitals {
    /// Vitals with full stamina.
    pub fn new(hp: f64, max_hp: f64, position: Point) -> Self {
        Self {
            hp,
            max_hp,
            stamina: 100.0,
            max_stamina: 100.0,
            position,
        }
    }

    pub fn with_stamina(mut self, stamina: f64, max_stamina: f64) -> Self {
        self.stamina = stamina;
        self.max_stamina = max_stamina;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Melee,
    Ranged,
}

/// What the encoder needs to know about one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub kind: EnemyKind,
    pub position: Point,
    pub hp: f64,
}

impl EnemyView {
    pub fn new(kind: EnemyKind, position: Point, hp: f64) -> Self {
        Self { kind, position, hp }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}

/// Optional terrain information.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainHints {
    /// Horizontal distance to the closest hazard, if any exists on the floor.
    pub hazard_distance: Option<f64>,
}
