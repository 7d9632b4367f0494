//! Prediction result types and top-K ranking.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Number of ranked crops reported by default.
pub const DEFAULT_TOP_K: usize = 5;

/// One entry of the ranked probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCrop {
    /// Crop name
    pub label: String,

    /// Encoded class index
    pub index: usize,

    /// Estimated probability (0.0 to 1.0)
    pub probability: f64,
}

/// Outcome of a single crop recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Top-1 crop, decoded from the classifier's hard-label prediction
    pub crop: String,

    /// Encoded index of `crop`
    pub crop_index: usize,

    /// Probability the classifier assigned to `crop`
    pub crop_probability: f64,

    /// Highest-probability crops, in non-increasing probability order
    pub ranking: Vec<RankedCrop>,

    /// False when the hard label is not an arg-max of the probabilities
    pub consistent: bool,

    /// When the prediction was made
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    /// Confidence of the top-1 crop (0.0 to 1.0).
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.crop_probability
    }

    /// Whether the top-1 crop appears in the ranking.
    #[must_use]
    pub fn top1_in_ranking(&self) -> bool {
        self.ranking.iter().any(|r| r.index == self.crop_index)
    }
}

/// Indices of the `k` largest probabilities.
///
/// Sorted by descending probability; equal probabilities keep ascending
/// index order. NaN entries sort after every number.
#[must_use]
pub fn rank_top_k(probabilities: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    // Stable sort: ties stay in ascending index order.
    indices.sort_by(|&a, &b| descending(probabilities[a], probabilities[b]));
    indices.truncate(k);
    indices
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Whether `probability` sorts strictly after `other` in ranking order.
///
/// NaN sorts after every number and ties with another NaN.
#[must_use]
pub fn ranks_below(probability: f64, other: f64) -> bool {
    descending(probability, other) == Ordering::Greater
}

/// Index of the first maximum probability, if any.
#[must_use]
pub fn argmax(probabilities: &[f64]) -> Option<usize> {
    rank_top_k(probabilities, 1).first().copied()
}
