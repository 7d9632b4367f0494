//! Random-forest adapter: Implementation of `Classifier` over an exported pipeline.
//!
//! The artifact (`model.json`) holds a standard scaler followed by an
//! ensemble of binary decision trees. Probabilities are the mean of each
//! tree's normalised leaf class distribution; the hard label is the first
//! arg-max of that mean. `models/README.md` shows how to export a
//! scikit-learn pipeline into this format; `models/` ships a sealed demo.
//!
//! # Artifact format
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["N", "P", "K", "temperature", "humidity", "ph", "rainfall", "N_over_PK"],
//!   "n_classes": 22,
//!   "scaler": { "mean": [...8], "scale": [...8] },
//!   "trees": [
//!     { "kind": "split", "feature": 6, "threshold": 0.41,
//!       "left": { "kind": "leaf", "value": [...22] },
//!       "right": { "kind": "leaf", "value": [...22] } }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{argmax, FeatureVector, ModelError, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::Classifier;

/// Artifact format version understood by this loader.
pub const FORMAT_VERSION: u32 = 1;

/// Per-feature standardisation: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Scaler that leaves features unchanged.
    #[must_use]
    pub fn identity(n_features: usize) -> Self {
        Self {
            mean: vec![0.0; n_features],
            scale: vec![1.0; n_features],
        }
    }

    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// A node of a classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal node: go left when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    /// Terminal node with per-class training weights.
    Leaf { value: Vec<f64> },
}

impl TreeNode {
    #[must_use]
    pub fn leaf(value: Vec<f64>) -> Self {
        Self::Leaf { value }
    }

    #[must_use]
    pub fn split(feature: usize, threshold: f64, left: TreeNode, right: TreeNode) -> Self {
        Self::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Leaf reached by a (scaled) input.
    fn leaf_for(&self, x: &[f64]) -> &[f64] {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { value } => return value,
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    /// Depth of the tree rooted here (a leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf has {} class weights, expected {n_classes}",
                            value.len()
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err("leaf weights must be finite and non-negative".into());
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err("leaf weights must not all be zero".into());
                    }
                }
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "split on feature {feature}, but only {n_features} features exist"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err("split threshold is NaN".into());
                    }
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        Ok(())
    }
}

/// Scaler + random-forest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPipeline {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub n_classes: usize,
    pub scaler: StandardScaler,
    pub trees: Vec<TreeNode>,
}

impl ForestPipeline {
    /// Assemble and validate a pipeline.
    ///
    /// # Errors
    /// Returns `ModelError::Unavailable` if the parts are inconsistent.
    pub fn new(
        scaler: StandardScaler,
        trees: Vec<TreeNode>,
        n_classes: usize,
    ) -> Result<Self, ModelError> {
        let pipeline = Self {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            n_classes,
            scaler,
            trees,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Parse and validate a pipeline from JSON.
    ///
    /// # Errors
    /// Returns `ModelError::Unavailable` if the JSON is malformed or invalid.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let pipeline: Self = serde_json::from_str(json)
            .map_err(|e| ModelError::Unavailable(format!("Invalid model JSON: {e}")))?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Load a pipeline from a `model.json` file.
    ///
    /// # Errors
    /// Returns `ModelError::Unavailable` if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModelError::Unavailable(format!("Failed to read model {}: {e}", path.display()))
        })?;
        let pipeline = Self::from_json(&content)?;

        tracing::info!(
            "Loaded forest pipeline from {:?} (trees={}, classes={}, max_depth={})",
            path,
            pipeline.trees.len(),
            pipeline.n_classes,
            pipeline.max_depth()
        );

        Ok(pipeline)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    /// Returns `ModelError::Unavailable` describing the first violation.
    pub fn validate(&self) -> Result<(), ModelError> {
        let fail = |msg: String| Err(ModelError::Unavailable(format!("Invalid model: {msg}")));

        if self.format_version != FORMAT_VERSION {
            return fail(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(got, want)| got != want)
        {
            return fail(format!(
                "feature_names {:?} do not match expected order {:?}",
                self.feature_names, FEATURE_NAMES
            ));
        }
        if self.n_classes == 0 {
            return fail("n_classes must be positive".into());
        }
        if self.scaler.mean.len() != FEATURE_COUNT || self.scaler.scale.len() != FEATURE_COUNT {
            return fail(format!("scaler must have {FEATURE_COUNT} entries"));
        }
        if self.scaler.mean.iter().any(|m| !m.is_finite()) {
            return fail("scaler mean must be finite".into());
        }
        if self.scaler.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return fail("scaler scale must be finite and positive".into());
        }
        if self.trees.is_empty() {
            return fail("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if let Err(msg) = tree.validate(FEATURE_COUNT, self.n_classes) {
                return fail(format!("tree {i}: {msg}"));
            }
        }
        Ok(())
    }

    /// Deepest tree in the forest.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    fn proba(&self, features: &FeatureVector) -> Vec<f64> {
        let x = self.scaler.transform(features.as_slice());
        let mut acc = vec![0.0; self.n_classes];

        for tree in &self.trees {
            let leaf = tree.leaf_for(&x);
            let total: f64 = leaf.iter().sum();
            for (a, w) in acc.iter_mut().zip(leaf) {
                *a += w / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n_trees);
        acc
    }
}

impl Classifier for ForestPipeline {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_label(&self, features: &FeatureVector) -> Result<usize, ModelError> {
        argmax(&self.proba(features)).ok_or_else(|| {
            ModelError::Unavailable("Model produced an empty probability vector".into())
        })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        Ok(self.proba(features))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::build_features;

    /// Three-class forest splitting on rainfall (index 6) and the ratio (index 7).
    pub(crate) fn small_forest() -> ForestPipeline {
        let rain_tree = TreeNode::split(
            6,
            100.0,
            TreeNode::leaf(vec![8.0, 2.0, 0.0]),
            TreeNode::leaf(vec![0.0, 1.0, 3.0]),
        );
        let ratio_tree = TreeNode::split(
            7,
            1.0,
            TreeNode::split(
                3,
                25.0,
                TreeNode::leaf(vec![1.0, 0.0, 0.0]),
                TreeNode::leaf(vec![0.0, 0.0, 1.0]),
            ),
            TreeNode::leaf(vec![0.0, 1.0, 0.0]),
        );
        ForestPipeline::new(StandardScaler::identity(8), vec![rain_tree, ratio_tree], 3)
            .expect("valid forest")
    }

    #[test]
    fn test_proba_is_mean_of_normalised_leaves() {
        let forest = small_forest();
        // rain <= 100 -> [0.8, 0.2, 0.0]; ratio 0.5, temp 20 -> [1, 0, 0]
        let fv = build_features(50.0, 50.0, 50.0, 20.0, 70.0, 6.5, 80.0);
        let proba = forest.predict_proba(&fv).expect("proba");
        assert_eq!(proba.len(), 3);
        assert!((proba[0] - 0.9).abs() < 1e-12);
        assert!((proba[1] - 0.1).abs() < 1e-12);
        assert!(proba[2].abs() < 1e-12);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(forest.predict_label(&fv).expect("label"), 0);
    }

    #[test]
    fn test_label_matches_argmax() {
        let forest = small_forest();
        // rain > 100 -> [0, .25, .75]; ratio 2.0 -> [0, 1, 0] => [0, .625, .375]
        let fv = build_features(100.0, 25.0, 25.0, 30.0, 70.0, 6.5, 250.0);
        let proba = forest.predict_proba(&fv).expect("proba");
        assert_eq!(forest.predict_label(&fv).expect("label"), 1);
        assert!((proba[1] - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_applied_before_splits() {
        let tree = TreeNode::split(
            0,
            0.0,
            TreeNode::leaf(vec![1.0, 0.0]),
            TreeNode::leaf(vec![0.0, 1.0]),
        );
        let mut scaler = StandardScaler::identity(8);
        scaler.mean[0] = 50.0;
        scaler.scale[0] = 10.0;
        let forest = ForestPipeline::new(scaler, vec![tree], 2).expect("valid");

        let below = build_features(40.0, 10.0, 10.0, 20.0, 50.0, 6.0, 100.0);
        let above = build_features(60.0, 10.0, 10.0, 20.0, 50.0, 6.0, 100.0);
        assert_eq!(forest.predict_label(&below).expect("label"), 0);
        assert_eq!(forest.predict_label(&above).expect("label"), 1);
    }

    #[test]
    fn test_json_round_trip_and_format() {
        let forest = small_forest();
        let json = serde_json::to_string(&forest).expect("serialize");
        assert!(json.contains(r#""kind":"split""#));
        let parsed = ForestPipeline::from_json(&json).expect("parse");
        assert_eq!(parsed, forest);
        assert_eq!(parsed.max_depth(), 2);
    }

    #[test]
    fn test_rejects_reordered_feature_names() {
        let mut forest = small_forest();
        forest.feature_names.swap(0, 1);
        let err = forest.validate().expect_err("must fail");
        assert!(err.to_string().contains("feature_names"));
    }

    #[test]
    fn test_rejects_bad_structure() {
        let bad_leaf = ForestPipeline::new(
            StandardScaler::identity(8),
            vec![TreeNode::leaf(vec![1.0, 1.0])],
            3,
        );
        assert!(bad_leaf.is_err());

        let bad_feature = ForestPipeline::new(
            StandardScaler::identity(8),
            vec![TreeNode::split(
                8,
                0.0,
                TreeNode::leaf(vec![1.0]),
                TreeNode::leaf(vec![1.0]),
            )],
            1,
        );
        assert!(bad_feature.is_err());

        let no_trees = ForestPipeline::new(StandardScaler::identity(8), vec![], 2);
        assert!(no_trees.is_err());

        let mut zero_scale = StandardScaler::identity(8);
        zero_scale.scale[3] = 0.0;
        let bad_scaler =
            ForestPipeline::new(zero_scale, vec![TreeNode::leaf(vec![1.0, 0.0])], 2);
        assert!(bad_scaler.is_err());

        assert!(ForestPipeline::from_json("{not json").is_err());
    }

    #[test]
    fn test_extreme_inputs_do_not_fail() {
        let forest = small_forest();
        let fv = build_features(40.0, 0.0, 0.0, 25.0, 150.0, 6.5, 100.0);
        let proba = forest.predict_proba(&fv).expect("proba");
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
