//! Prediction service: Turns feature vectors into ranked crop recommendations.
//!
//! The top-1 crop always comes from the classifier's hard-label call. The
//! ranking comes from the probability vector, sorted by descending
//! probability with ties broken by ascending class index.

use std::sync::Arc;

use crate::adapters::{ArtifactConfig, ForestPipeline, ModelBundle};
use crate::domain::{
    argmax, rank_top_k, ranks_below, CropLabelEncoder, FeatureVector, PredictionResult,
    RankedCrop, SoilSample, DEFAULT_TOP_K,
};
use crate::ports::{Classifier, LabelEncoder};
use crate::CropsenseError;

/// Options controlling result shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionConfig {
    /// Number of ranked crops to report
    pub top_k: usize,

    /// Fail instead of warning when the hard label is not an arg-max
    pub strict_consistency: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            strict_consistency: false,
        }
    }
}

/// Predict with the default configuration (top 5, lenient consistency).
///
/// # Errors
/// Returns `ModelUnavailable` if the classifier fails or its output does not
/// match the encoder, and `UnknownLabel` if an index cannot be decoded.
pub fn predict<C, E>(
    features: &FeatureVector,
    classifier: &C,
    encoder: &E,
) -> Result<PredictionResult, CropsenseError>
where
    C: Classifier + ?Sized,
    E: LabelEncoder + ?Sized,
{
    predict_with(features, classifier, encoder, &PredictionConfig::default())
}

/// Predict with an explicit configuration.
///
/// # Errors
/// As [`predict`], plus `InconsistentPrediction` when
/// `config.strict_consistency` is set and the hard label's probability is
/// below the maximum.
pub fn predict_with<C, E>(
    features: &FeatureVector,
    classifier: &C,
    encoder: &E,
    config: &PredictionConfig,
) -> Result<PredictionResult, CropsenseError>
where
    C: Classifier + ?Sized,
    E: LabelEncoder + ?Sized,
{
    let label = classifier.predict_label(features)?;
    let probabilities = classifier.predict_proba(features)?;

    if probabilities.len() != encoder.len() {
        return Err(CropsenseError::ModelUnavailable(format!(
            "Classifier returned {} probabilities for a label space of {}",
            probabilities.len(),
            encoder.len()
        )));
    }

    let crop = encoder.decode(label)?.to_string();
    let crop_probability = probabilities[label];

    let ranking = rank_top_k(&probabilities, config.top_k)
        .into_iter()
        .map(|index| -> Result<RankedCrop, CropsenseError> {
            Ok(RankedCrop {
                label: encoder.decode(index)?.to_string(),
                index,
                probability: probabilities[index],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut consistent = true;
    if let Some(best) = argmax(&probabilities) {
        if ranks_below(crop_probability, probabilities[best]) {
            if config.strict_consistency {
                tracing::error!(
                    "Hard label {} ({:.4}) disagrees with arg-max {} ({:.4})",
                    label,
                    crop_probability,
                    best,
                    probabilities[best]
                );
                return Err(CropsenseError::InconsistentPrediction {
                    predicted: label,
                    argmax: best,
                });
            }
            tracing::warn!(
                "Hard label {} ({:.4}) disagrees with arg-max {} ({:.4}); keeping hard label",
                label,
                crop_probability,
                best,
                probabilities[best]
            );
            consistent = false;
        }
    }

    tracing::debug!(
        "Prediction: crop={}, confidence={:.2}%, ranked={}",
        crop,
        crop_probability * 100.0,
        ranking.len()
    );

    Ok(PredictionResult {
        crop,
        crop_index: label,
        crop_probability,
        ranking,
        consistent,
        created_at: chrono::Utc::now(),
    })
}

enum ModelState<C, E> {
    Ready {
        classifier: Arc<C>,
        encoder: Arc<E>,
    },
    Unavailable(String),
}

impl<C, E> Clone for ModelState<C, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready {
                classifier,
                encoder,
            } => Self::Ready {
                classifier: Arc::clone(classifier),
                encoder: Arc::clone(encoder),
            },
            Self::Unavailable(reason) => Self::Unavailable(reason.clone()),
        }
    }
}

/// Service for crop recommendation over a loaded model.
///
/// The classifier and encoder are loaded once and shared read-only; the
/// service can be cloned across threads. A service built from a failed load
/// stays unavailable and rejects every request.
pub struct PredictionService<C, E>
where
    C: Classifier,
    E: LabelEncoder,
{
    model: ModelState<C, E>,
    config: PredictionConfig,
}

impl<C, E> Clone for PredictionService<C, E>
where
    C: Classifier,
    E: LabelEncoder,
{
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            config: self.config,
        }
    }
}

impl<C, E> PredictionService<C, E>
where
    C: Classifier,
    E: LabelEncoder,
{
    /// Create a service over a loaded classifier and encoder.
    pub fn new(classifier: Arc<C>, encoder: Arc<E>, config: PredictionConfig) -> Self {
        Self {
            model: ModelState::Ready {
                classifier,
                encoder,
            },
            config,
        }
    }

    /// Create a service that reports the model as unavailable.
    pub fn unavailable(reason: impl Into<String>, config: PredictionConfig) -> Self {
        Self {
            model: ModelState::Unavailable(reason.into()),
            config,
        }
    }

    /// Check if a model is loaded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self.model, ModelState::Ready { .. })
    }

    /// Why the model could not be loaded, if it could not.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.model {
            ModelState::Ready { .. } => None,
            ModelState::Unavailable(reason) => Some(reason),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Loaded classifier and encoder.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` if no model is loaded.
    pub fn model(&self) -> Result<(&C, &E), CropsenseError> {
        match &self.model {
            ModelState::Ready {
                classifier,
                encoder,
            } => Ok((classifier.as_ref(), encoder.as_ref())),
            ModelState::Unavailable(reason) => {
                tracing::error!("Prediction requested but model is unavailable: {}", reason);
                Err(CropsenseError::ModelUnavailable(reason.clone()))
            }
        }
    }

    /// Class names of the loaded model, in index order.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` if no model is loaded.
    pub fn label_space(&self) -> Result<&[String], CropsenseError> {
        let (_, encoder) = self.model()?;
        Ok(encoder.classes())
    }

    /// Recommend a crop for one raw observation.
    ///
    /// # Errors
    /// Returns error if the model is unavailable or prediction fails.
    pub fn recommend(&self, sample: &SoilSample) -> Result<PredictionResult, CropsenseError> {
        let warnings = sample.range_warnings();
        if !warnings.is_empty() {
            tracing::info!(
                "Sample outside observed ranges on {} field(s); prediction may extrapolate",
                warnings.len()
            );
        }
        self.predict_features(&sample.features())
    }

    /// Predict for an already-built feature vector.
    ///
    /// # Errors
    /// Returns error if the model is unavailable or prediction fails.
    pub fn predict_features(
        &self,
        features: &FeatureVector,
    ) -> Result<PredictionResult, CropsenseError> {
        let (classifier, encoder) = self.model()?;
        predict_with(features, classifier, encoder, &self.config)
    }

    /// Predict for a batch of feature vectors, in order.
    ///
    /// # Errors
    /// Returns the first failure.
    pub fn predict_many(
        &self,
        batch: &[FeatureVector],
    ) -> Result<Vec<PredictionResult>, CropsenseError> {
        let (classifier, encoder) = self.model()?;
        let results = batch
            .iter()
            .map(|fv| predict_with(fv, classifier, encoder, &self.config))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!("Batch prediction complete: {} rows", results.len());
        Ok(results)
    }
}

impl PredictionService<ForestPipeline, CropLabelEncoder> {
    /// Load the model bundle from `dir`, falling back to an unavailable
    /// service when loading fails.
    pub fn load(
        dir: &std::path::Path,
        artifacts: &ArtifactConfig,
        config: PredictionConfig,
    ) -> Self {
        match ModelBundle::load(dir, artifacts) {
            Ok(bundle) => Self::new(
                Arc::new(bundle.classifier),
                Arc::new(bundle.encoder),
                config,
            ),
            Err(e) => {
                tracing::error!("Failed to load model from {:?}: {}", dir, e);
                Self::unavailable(e.to_string(), config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_features, ModelError};
    use proptest::prelude::*;

    struct FixedClassifier {
        label: usize,
        probabilities: Vec<f64>,
    }

    impl Classifier for FixedClassifier {
        fn n_classes(&self) -> usize {
            self.probabilities.len()
        }

        fn predict_label(&self, _features: &FeatureVector) -> Result<usize, ModelError> {
            Ok(self.label)
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
            Ok(self.probabilities.clone())
        }
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn n_classes(&self) -> usize {
            22
        }

        fn predict_label(&self, _features: &FeatureVector) -> Result<usize, ModelError> {
            Err(ModelError::Unavailable("weights missing".into()))
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
            Err(ModelError::Unavailable("weights missing".into()))
        }
    }

    fn features() -> FeatureVector {
        build_features(90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9)
    }

    fn tied_probabilities() -> Vec<f64> {
        let mut p = vec![0.0; 22];
        p[2] = 0.6;
        p[5] = 0.6;
        p[0] = 0.1;
        p
    }

    #[test]
    fn test_tied_top_band_keeps_hard_label() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 2,
            probabilities: tied_probabilities(),
        };

        let result = predict(&features(), &classifier, &encoder).expect("predict");

        assert_eq!(result.crop, "blackgram");
        assert_eq!(result.crop_index, 2);
        assert!(result.consistent);
        assert_eq!(result.ranking.len(), 5);
        assert_eq!(result.ranking[0].index, 2);
        assert_eq!(result.ranking[1].index, 5);
        assert_eq!(result.ranking[2].index, 0);
        // Remaining zeros fill in by ascending index
        assert_eq!(result.ranking[3].index, 1);
        assert_eq!(result.ranking[4].index, 3);
    }

    #[test]
    fn test_hard_label_wins_over_tie_order() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 5,
            probabilities: tied_probabilities(),
        };

        let result = predict(&features(), &classifier, &encoder).expect("predict");

        assert_eq!(result.crop, "coffee");
        assert!(result.consistent);
        // Ranking order is fixed by index, independent of the hard label
        assert_eq!(result.ranking[0].index, 2);
        assert_eq!(result.ranking[1].index, 5);
        assert!(result.top1_in_ranking());
    }

    #[test]
    fn test_inconsistent_label_is_flagged() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 0,
            probabilities: tied_probabilities(),
        };

        let result = predict(&features(), &classifier, &encoder).expect("predict");
        assert_eq!(result.crop, "apple");
        assert!(!result.consistent);
        assert!((result.confidence() - 0.1).abs() < f64::EPSILON);

        let strict = PredictionConfig {
            strict_consistency: true,
            ..PredictionConfig::default()
        };
        let err = predict_with(&features(), &classifier, &encoder, &strict).expect_err("strict");
        assert!(matches!(
            err,
            CropsenseError::InconsistentPrediction {
                predicted: 0,
                argmax: 2
            }
        ));
    }

    #[test]
    fn test_hard_label_outside_top_k_is_still_reported() {
        let encoder = CropLabelEncoder::standard();
        let mut probabilities = vec![0.0; 22];
        for (i, p) in probabilities.iter_mut().enumerate().take(6) {
            *p = 0.1 + i as f64 * 0.01;
        }
        let classifier = FixedClassifier {
            label: 21,
            probabilities,
        };

        let result = predict(&features(), &classifier, &encoder).expect("predict");
        assert_eq!(result.crop, "watermelon");
        assert!(!result.consistent);
        assert!(!result.top1_in_ranking());
        assert_eq!(result.ranking.len(), 5);
    }

    #[test]
    fn test_wide_tie_keeps_consistent_hard_label_outside_ranking() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 21,
            probabilities: vec![1.0 / 22.0; 22],
        };

        let result = predict(&features(), &classifier, &encoder).expect("predict");
        assert_eq!(result.crop, "watermelon");
        assert!(result.consistent);
        assert!(!result.top1_in_ranking());
        let indices: Vec<usize> = result.ranking.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_nan_hard_label_probability_is_inconsistent() {
        let encoder = CropLabelEncoder::standard();
        let mut probabilities = vec![0.0; 22];
        probabilities[3] = f64::NAN;
        probabilities[7] = 0.9;
        let classifier = FixedClassifier {
            label: 3,
            probabilities,
        };

        let result = predict(&features(), &classifier, &encoder).expect("predict");
        assert_eq!(result.crop, "chickpea");
        assert!(!result.consistent);
        assert!(!result.top1_in_ranking());
        assert_eq!(result.ranking[0].index, 7);

        let strict = PredictionConfig {
            strict_consistency: true,
            ..PredictionConfig::default()
        };
        let err = predict_with(&features(), &classifier, &encoder, &strict).expect_err("strict");
        assert!(matches!(
            err,
            CropsenseError::InconsistentPrediction {
                predicted: 3,
                argmax: 7
            }
        ));
    }

    #[test]
    fn test_unknown_hard_label() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 30,
            probabilities: tied_probabilities(),
        };

        let err = predict(&features(), &classifier, &encoder).expect_err("must fail");
        assert!(matches!(err, CropsenseError::UnknownLabel(_)));
    }

    #[test]
    fn test_mispaired_probability_length() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 0,
            probabilities: vec![0.5, 0.5],
        };

        let err = predict(&features(), &classifier, &encoder).expect_err("must fail");
        assert!(matches!(err, CropsenseError::ModelUnavailable(_)));
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let encoder = CropLabelEncoder::standard();
        let err = predict(&features(), &BrokenClassifier, &encoder).expect_err("must fail");
        assert!(matches!(err, CropsenseError::ModelUnavailable(ref r) if r == "weights missing"));
    }

    #[test]
    fn test_top_k_is_configurable() {
        let encoder = CropLabelEncoder::standard();
        let classifier = FixedClassifier {
            label: 2,
            probabilities: tied_probabilities(),
        };
        let config = PredictionConfig {
            top_k: 3,
            ..PredictionConfig::default()
        };

        let result = predict_with(&features(), &classifier, &encoder, &config).expect("predict");
        assert_eq!(result.ranking.len(), 3);

        let config = PredictionConfig {
            top_k: 50,
            ..PredictionConfig::default()
        };
        let result = predict_with(&features(), &classifier, &encoder, &config).expect("predict");
        assert_eq!(result.ranking.len(), 22);
    }

    #[test]
    fn test_unavailable_service_rejects_requests() {
        let service: PredictionService<FixedClassifier, CropLabelEncoder> =
            PredictionService::unavailable("model.json missing", PredictionConfig::default());

        assert!(!service.is_available());
        assert_eq!(service.unavailable_reason(), Some("model.json missing"));
        assert!(matches!(
            service.recommend(&SoilSample::default()),
            Err(CropsenseError::ModelUnavailable(_))
        ));
        assert!(service.label_space().is_err());
        assert!(service.predict_many(&[features()]).is_err());
    }

    #[test]
    fn test_service_with_forest_bundle() {
        let dir = tempfile::tempdir().expect("tempdir");
        crate::adapters::bundle::tests::write_bundle(dir.path());

        let service = PredictionService::load(
            dir.path(),
            &ArtifactConfig::default(),
            PredictionConfig::default(),
        );
        assert!(service.is_available());
        assert_eq!(service.label_space().expect("labels").len(), 3);

        // Out-of-range humidity must not raise
        let sample = SoilSample::new(50.0, 50.0, 50.0, 25.0, 150.0, 6.5, 100.0);
        let result = service.recommend(&sample).expect("recommend");
        assert!(result.top1_in_ranking());
        assert_eq!(result.ranking.len(), 3);

        let batch = service
            .predict_many(&[sample.features(), SoilSample::default().features()])
            .expect("batch");
        assert_eq!(batch.len(), 2);

        let shared = service.clone();
        let handle = std::thread::spawn(move || shared.recommend(&sample).map(|r| r.crop));
        let crop = handle.join().expect("thread").expect("recommend");
        assert_eq!(crop, result.crop);
    }

    #[test]
    fn test_service_load_failure_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = PredictionService::load(
            dir.path(),
            &ArtifactConfig::default(),
            PredictionConfig::default(),
        );
        assert!(!service.is_available());
        assert!(service.unavailable_reason().is_some());
    }

    #[test]
    fn test_shipped_model_directory_loads_sealed() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let artifacts = ArtifactConfig {
            require_manifest: true,
        };
        let service = PredictionService::load(&dir, &artifacts, PredictionConfig::default());
        assert!(service.is_available(), "{:?}", service.unavailable_reason());
        assert_eq!(
            service.label_space().expect("labels"),
            CropLabelEncoder::standard().classes()
        );

        let rice = SoilSample::new(80.0, 48.0, 40.0, 23.7, 82.3, 6.4, 236.0);
        let result = service.recommend(&rice).expect("recommend");
        assert_eq!(result.crop, "rice");
        assert!(result.consistent);

        let chickpea = SoilSample::new(40.0, 68.0, 80.0, 18.9, 16.9, 7.3, 80.0);
        let result = service.recommend(&chickpea).expect("recommend");
        assert_eq!(result.crop, "chickpea");
        assert_eq!(result.ranking.len(), 5);
    }

    proptest! {
        #[test]
        fn prop_ranking_valid_and_contains_top1(
            weights in proptest::collection::vec(0.0f64..1.0, 22),
        ) {
            let total: f64 = weights.iter().sum::<f64>() + 1e-9;
            let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
            let label = argmax(&probabilities).expect("non-empty");
            let classifier = FixedClassifier { label, probabilities };
            let encoder = CropLabelEncoder::standard();

            let result = predict(&features(), &classifier, &encoder).expect("predict");

            prop_assert!(result.consistent);
            prop_assert!(result.top1_in_ranking());
            prop_assert_eq!(result.ranking.len(), 5);
            for r in &result.ranking {
                prop_assert!((0.0..=1.0).contains(&r.probability));
            }
            for pair in result.ranking.windows(2) {
                prop_assert!(pair[0].probability >= pair[1].probability);
            }
        }
    }
}
