//! Training pipeline
//!
//! Headless training runs that drive the decision loop through arena floors,
//! with composable observers for progress, metrics, and trace export.

pub mod observers;
pub mod training;

pub use observers::{
    DecisionRecord, FloorRecord, JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver,
    ProgressObserver,
};
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::Observer;
