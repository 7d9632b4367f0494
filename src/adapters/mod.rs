//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `forest`: JSON random-forest pipeline implementing `Classifier`
//! - `bundle`: Model directory loading with SHA-256 manifest checks
//! - `csv_dataset`: `Crop_recommendation.csv` reader implementing `DatasetSource`

pub mod bundle;
pub mod csv_dataset;
pub mod forest;

pub use bundle::{ArtifactConfig, ModelBundle, ModelManifest};
pub use csv_dataset::CsvDataset;
pub use forest::ForestPipeline;
