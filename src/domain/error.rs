//! Errors raised by classifier and label-encoder collaborators.

/// Errors that can occur while using a trained model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Label index {index} outside trained label space of {n_classes} classes")]
    UnknownLabel { index: usize, n_classes: usize },

    #[error("Unknown class name: {0:?}")]
    UnknownClass(String),

    #[error("Feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
