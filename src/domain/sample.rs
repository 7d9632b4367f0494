//! Soil and climate observations, and the feature vector built from them.
//!
//! The feature order is a contract with the trained classifier: the first
//! seven entries are the raw measurements in declaration order, the eighth
//! is the derived nitrogen-to-(phosphorus + potassium) ratio.

use serde::{Deserialize, Serialize};

/// Added to the ratio denominator so `P = K = 0` stays finite.
pub const NUTRIENT_RATIO_EPSILON: f64 = 1e-6;

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 8;

/// Feature names in classifier order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
    "N_over_PK",
];

/// Raw measurement names (dataset columns), in classifier order.
pub const RAW_FEATURE_NAMES: [&str; 7] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Observed domain of each raw measurement in the training data.
///
/// Values outside these ranges are still accepted; the classifier simply
/// extrapolates.
pub const OBSERVED_RANGES: [(&str, f64, f64); 7] = [
    ("N", 0.0, 140.0),
    ("P", 5.0, 145.0),
    ("K", 5.0, 205.0),
    ("temperature", 8.0, 44.0),
    ("humidity", 14.0, 99.0),
    ("ph", 3.5, 9.9),
    ("rainfall", 20.0, 300.0),
];

/// One agronomic observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SoilSample {
    /// Nitrogen content
    #[serde(rename = "N")]
    pub n: f64,

    /// Phosphorus content
    #[serde(rename = "P")]
    pub p: f64,

    /// Potassium content
    #[serde(rename = "K")]
    pub k: f64,

    /// Air temperature in °C
    pub temperature: f64,

    /// Relative humidity in %
    pub humidity: f64,

    /// Soil pH
    pub ph: f64,

    /// Rainfall in mm
    pub rainfall: f64,
}

/// A measurement that falls outside its observed training range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWarning {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl std::fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} outside observed range [{}, {}]",
            self.field, self.value, self.min, self.max
        )
    }
}

impl SoilSample {
    /// Create a sample from the seven raw measurements.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n: f64,
        p: f64,
        k: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Self {
        Self {
            n,
            p,
            k,
            temperature,
            humidity,
            ph,
            rainfall,
        }
    }

    /// Raw measurements in classifier order.
    #[must_use]
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    /// Create a sample from raw measurements in classifier order.
    ///
    /// # Errors
    /// Returns error if the slice does not hold exactly 7 values.
    pub fn from_slice(v: &[f64]) -> Result<Self, String> {
        match v {
            [n, p, k, temperature, humidity, ph, rainfall] => Ok(Self::new(
                *n,
                *p,
                *k,
                *temperature,
                *humidity,
                *ph,
                *rainfall,
            )),
            _ => Err(format!("Expected 7 measurements, got {}", v.len())),
        }
    }

    /// Build the classifier feature vector for this sample.
    #[must_use]
    pub fn features(&self) -> FeatureVector {
        build_features(
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        )
    }

    /// Measurements outside the observed training ranges.
    #[must_use]
    pub fn range_warnings(&self) -> Vec<RangeWarning> {
        OBSERVED_RANGES
            .iter()
            .zip(self.to_array())
            .filter(|((_, min, max), value)| !(*min..=*max).contains(value))
            .map(|((field, min, max), value)| RangeWarning {
                field: *field,
                value,
                min: *min,
                max: *max,
            })
            .collect()
    }

    /// Reject non-finite measurements.
    ///
    /// Out-of-range but finite values pass; see [`SoilSample::range_warnings`].
    ///
    /// # Errors
    /// Returns the names of non-finite fields.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = RAW_FEATURE_NAMES
            .iter()
            .zip(self.to_array())
            .filter(|(_, v)| !v.is_finite())
            .map(|(name, v)| format!("{name} must be a finite number (got {v})"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Ordered features consumed by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap an already ordered feature array.
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Create a feature vector from a slice.
    ///
    /// # Errors
    /// Returns error if the slice length is not 8.
    pub fn from_slice(v: &[f64]) -> Result<Self, String> {
        let values: [f64; FEATURE_COUNT] = v
            .try_into()
            .map_err(|_| format!("Expected {FEATURE_COUNT} features, got {}", v.len()))?;
        Ok(Self(values))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The seven raw measurements.
    #[must_use]
    pub fn raw(&self) -> &[f64] {
        &self.0[..7]
    }

    /// The derived `N_over_PK` feature.
    #[must_use]
    pub fn nutrient_ratio(&self) -> f64 {
        self.0[7]
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Convert seven raw measurements into the 8-feature classifier input.
///
/// Inputs are passed through unchanged; only the ratio is derived, as
/// `N / (P + K + 1e-6)`. Never fails, including for `P = K = 0`.
#[must_use]
#[allow(non_snake_case, clippy::too_many_arguments)]
pub fn build_features(
    N: f64,
    P: f64,
    K: f64,
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
) -> FeatureVector {
    let n_over_pk = N / (P + K + NUTRIENT_RATIO_EPSILON);
    FeatureVector([N, P, K, temperature, humidity, ph, rainfall, n_over_pk])
}
