//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the trained model and dataset.

mod classifier;
mod dataset;

pub use classifier::{Classifier, LabelEncoder};
pub use dataset::{DatasetError, DatasetSource, LabeledSample};
