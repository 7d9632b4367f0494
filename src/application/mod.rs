//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod exploration;
mod prediction;
pub mod reporting;

pub use exploration::{
    CorrelationPair, CropProfile, DatasetSummary, ExplorationService, FeatureStats, Histogram,
    HISTOGRAM_BINS, PREVIEW_ROWS,
};
pub use prediction::{predict, predict_with, PredictionConfig, PredictionService};
pub use reporting::MetricsError;
