//! Domain layer: Core agronomic types and logic.
//!
//! Pure Rust types with no I/O. The feature builder lives here because it is
//! a pure function of one observation.

mod catalog;
mod error;
mod labels;
mod prediction;
mod sample;

pub use catalog::{CropCatalog, FALLBACK_ICON};
pub use error::ModelError;
pub use labels::{CropLabelEncoder, STANDARD_CROPS};
pub use prediction::{
    argmax, rank_top_k, ranks_below, PredictionResult, RankedCrop, DEFAULT_TOP_K,
};
pub use sample::{
    build_features, FeatureVector, RangeWarning, SoilSample, FEATURE_COUNT, FEATURE_NAMES,
    NUTRIENT_RATIO_EPSILON, OBSERVED_RANGES, RAW_FEATURE_NAMES,
};
