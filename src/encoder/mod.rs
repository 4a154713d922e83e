//! State discretization for the combat context.
//!
//! The encoder turns an agent's vitals, the enemy roster, and optional
//! terrain hints into a small fixed-arity [`Observation`](crate::Observation).
//! Component order for [`EncoderVariant::Extended`]:
//!
//! | # | Signal        | Buckets                                  |
//! |---|---------------|------------------------------------------|
//! | 0 | HP            | high, medium, low, critical              |
//! | 1 | Nearest enemy | melee, ranged, none                      |
//! | 2 | Threat        | low, medium, high                        |
//! | 3 | In range      | no, yes                                  |
//! | 4 | Stamina       | high, medium, low, critical              |
//! | 5 | Height        | level, above, below                      |
//! | 6 | Near hazard   | no, yes                                  |
//!
//! [`EncoderVariant::Basic`] keeps only the first four components.

pub mod bucket;
pub mod snapshot;
pub mod state;

pub use bucket::{Level, Thresholds, bucket, ratio};
pub use snapshot::{AgentVitals, EnemyKind, EnemyView, Point, TerrainHints};
pub use state::{
    EncoderConfig, EncoderVariant, EnemyClass, HeightAdvantage, StateEncoder, ThreatLevel,
    describe,
};
