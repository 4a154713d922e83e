//! Severity bucketing of normalized ratios.

use serde::{Deserialize, Serialize};

/// Upper bounds for each severity bucket; the `high` bucket is bounded by 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub critical: f64,
    pub low: f64,
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical: 0.25,
            low: 0.50,
            medium: 0.75,
        }
    }
}

/// Discretized level of a ratio such as HP or stamina.
///
/// Discriminants are the persisted bucket indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Level {
    High = 0,
    Medium = 1,
    Low = 2,
    Critical = 3,
}

impl Level {
    pub const COUNT: u8 = 4;

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Level::High),
            1 => Some(Level::Medium),
            2 => Some(Level::Low),
            3 => Some(Level::Critical),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
            Level::Critical => "critical",
        }
    }
}

/// Map a ratio to the most severe bucket whose bound it does not exceed.
///
/// Boundaries belong to the more severe bucket (`0.25` is critical). Ratios
/// above 1.0 are high; NaN is treated as critical.
pub fn bucket(ratio: f64, thresholds: &Thresholds) -> Level {
    if ratio.is_nan() || ratio <= thresholds.critical {
        Level::Critical
    } else if ratio <= thresholds.low {
        Level::Low
    } else if ratio <= thresholds.medium {
        Level::Medium
    } else {
        Level::High
    }
}

/// `current / max`, or 0.0 when `max` is not positive.
pub fn ratio(current: f64, max: f64) -> f64 {
    if max > 0.0 { current / max } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_fall_into_more_severe_bucket() {
        let t = Thresholds::default();
        assert_eq!(bucket(0.0, &t), Level::Critical);
        assert_eq!(bucket(0.25, &t), Level::Critical);
        assert_eq!(bucket(0.2500001, &t), Level::Low);
        assert_eq!(bucket(0.50, &t), Level::Low);
        assert_eq!(bucket(0.75, &t), Level::Medium);
        assert_eq!(bucket(0.76, &t), Level::High);
        assert_eq!(bucket(1.0, &t), Level::High);
    }

    #[test]
    fn test_every_ratio_maps_to_exactly_one_ordered_bucket() {
        let t = Thresholds::default();
        let mut previous = Level::Critical;
        for step in 0..=1000 {
            let level = bucket(step as f64 / 1000.0, &t);
            // Severity never increases as the ratio grows.
            assert!(level.index() <= previous.index());
            previous = level;
        }
        assert_eq!(previous, Level::High);
    }

    #[test]
    fn test_ratio_guards_zero_max() {
        assert_eq!(ratio(10.0, 0.0), 0.0);
        assert_eq!(ratio(50.0, 100.0), 0.5);
    }
}
