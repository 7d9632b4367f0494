//! Dataset port: Trait for reading labelled observations.
//!
//! Used only for exploration and evaluation; the prediction path never
//! touches the dataset.

use serde::{Deserialize, Serialize};

use crate::domain::SoilSample;

/// Errors that can occur while reading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {message}")]
    Open { path: String, message: String },

    #[error("Malformed row {line}: {message}")]
    Row { line: usize, message: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Dataset is empty")]
    Empty,
}

/// An observation together with its known crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub sample: SoilSample,
    pub label: String,
}

/// Trait for dataset accessors.
pub trait DatasetSource: Send + Sync {
    /// Load every row.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source cannot be read or parsed.
    fn load(&self) -> Result<Vec<LabeledSample>, DatasetError>;

    /// Human-readable description of where rows come from.
    fn describe(&self) -> String;
}
