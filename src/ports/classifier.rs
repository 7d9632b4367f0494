//! Classifier port: Traits for trained-model capabilities.
//!
//! Any model that can produce a hard label and a per-class probability
//! vector for a feature vector can back the prediction service.

use crate::domain::{CropLabelEncoder, FeatureVector, ModelError};

/// Trait for a trained multi-class probabilistic classifier.
///
/// Implementations are loaded once and shared read-only across threads.
pub trait Classifier: Send + Sync {
    /// Number of classes the model was trained on.
    fn n_classes(&self) -> usize;

    /// Predict the encoded class index for one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError` if the model cannot evaluate the input.
    fn predict_label(&self, features: &FeatureVector) -> Result<usize, ModelError>;

    /// Estimate per-class probabilities for one feature vector.
    ///
    /// The returned vector has `n_classes()` entries aligned with the label
    /// encoder's index order. Entries lie in `[0, 1]` and sum to 1.
    ///
    /// # Errors
    /// Returns `ModelError` if the model cannot evaluate the input.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError>;

    /// Predict encoded class indices for a batch.
    ///
    /// # Errors
    /// Returns the first error raised by `predict_label`.
    fn predict_labels(&self, batch: &[FeatureVector]) -> Result<Vec<usize>, ModelError> {
        batch.iter().map(|fv| self.predict_label(fv)).collect()
    }
}

/// Trait for the bijective class-name ⇄ index mapping.
pub trait LabelEncoder: Send + Sync {
    /// Index of a class name.
    ///
    /// # Errors
    /// Returns `ModelError::UnknownClass` for names outside the label space.
    fn encode(&self, name: &str) -> Result<usize, ModelError>;

    /// Class name of an index.
    ///
    /// # Errors
    /// Returns `ModelError::UnknownLabel` for indices outside the label space.
    fn decode(&self, index: usize) -> Result<&str, ModelError>;

    /// All class names, in index order.
    fn classes(&self) -> &[String];

    /// Size of the label space.
    fn len(&self) -> usize {
        self.classes().len()
    }

    fn is_empty(&self) -> bool {
        self.classes().is_empty()
    }
}

impl LabelEncoder for CropLabelEncoder {
    fn encode(&self, name: &str) -> Result<usize, ModelError> {
        CropLabelEncoder::encode(self, name)
    }

    fn decode(&self, index: usize) -> Result<&str, ModelError> {
        CropLabelEncoder::decode(self, index)
    }

    fn classes(&self) -> &[String] {
        CropLabelEncoder::classes(self)
    }
}
