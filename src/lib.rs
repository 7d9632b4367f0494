//! # Cropsense
//!
//! Crop recommendation from soil and climate measurements.
//!
//! This crate provides:
//! - The feature builder that turns seven agronomic readings into the
//!   classifier's eight-feature input
//! - A prediction service producing the top-1 crop and a ranked top-K table
//! - Dataset exploration and model evaluation helpers
//! - Terminal UI for interactive use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (SoilSample, FeatureVector, label encoder, results)
//! - `ports`: Trait definitions for the classifier, encoder and dataset
//! - `adapters`: Concrete implementations (JSON forest artifact, CSV dataset)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Startup settings gathered from the environment
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{build_features, FeatureVector, PredictionResult, SoilSample};

/// Result type for Cropsense operations
pub type Result<T> = std::result::Result<T, CropsenseError>;

/// Main error type for Cropsense
#[derive(Debug, thiserror::Error)]
pub enum CropsenseError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Inconsistent prediction: hard label {predicted} is not the arg-max {argmax}")]
    InconsistentPrediction { predicted: usize, argmax: usize },

    #[error("Dataset error: {0}")]
    Dataset(#[from] ports::DatasetError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] application::MetricsError),

    #[error("Invalid sample: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<domain::ModelError> for CropsenseError {
    fn from(err: domain::ModelError) -> Self {
        use domain::ModelError;
        match err {
            ModelError::Unavailable(reason) => Self::ModelUnavailable(reason),
            e @ (ModelError::UnknownLabel { .. } | ModelError::UnknownClass(_)) => {
                Self::UnknownLabel(e.to_string())
            }
            e @ ModelError::DimensionMismatch { .. } => Self::ModelUnavailable(e.to_string()),
        }
    }
}
