//! Exploration service: Descriptive statistics over the labelled dataset.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::RAW_FEATURE_NAMES;
use crate::ports::{DatasetError, DatasetSource, LabeledSample};
use crate::CropsenseError;

const RAW_COUNT: usize = RAW_FEATURE_NAMES.len();

/// Number of strongest correlations reported.
pub const TOP_CORRELATIONS: usize = 5;

/// Number of leading rows kept for the dataset preview.
pub const PREVIEW_ROWS: usize = 15;

/// Number of equal-width bins per feature histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// Summary statistics of one feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1)
    pub std: f64,
}

impl FeatureStats {
    fn from_column(name: &str, column: &[f64]) -> Self {
        let n = column.len() as f64;
        let mean = column.iter().sum::<f64>() / n;
        let std = if column.len() > 1 {
            (column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Self {
            name: name.to_string(),
            min: column.iter().copied().fold(f64::INFINITY, f64::min),
            mean,
            median: median(column),
            max: column.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std,
        }
    }
}

/// Equal-width histogram of one feature column over `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    fn from_column(name: &str, column: &[f64], min: f64, max: f64, bins: usize) -> Self {
        let mut counts = vec![0; bins];
        let width = (max - min) / bins as f64;
        for &x in column {
            // The maximum lands in the last bin; a constant column fills the first.
            let bin = if width > 0.0 {
                (((x - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }
        Self {
            name: name.to_string(),
            min,
            max,
            counts,
        }
    }

    /// Lower and upper edge of bin `i`.
    #[must_use]
    pub fn bin_edges(&self, i: usize) -> (f64, f64) {
        let width = (self.max - self.min) / self.counts.len() as f64;
        (
            self.min + width * i as f64,
            self.min + width * (i + 1) as f64,
        )
    }
}

/// A pair of features and their Pearson correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub a: String,
    pub b: String,
    pub r: f64,
}

/// Per-crop median profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub crop: String,
    pub count: usize,
    /// Median of each raw feature, in `RAW_FEATURE_NAMES` order
    pub medians: [f64; RAW_COUNT],
    /// Medians min-max scaled by the whole dataset's feature ranges
    pub normalized: [f64; RAW_COUNT],
}

/// Everything the exploration screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    /// Feature columns plus the label column
    pub columns: usize,
    pub n_crops: usize,
    /// Samples per crop, most frequent first, ties by name
    pub crop_counts: Vec<(String, usize)>,
    pub features: Vec<FeatureStats>,
    /// One histogram per raw feature, in `RAW_FEATURE_NAMES` order
    pub histograms: Vec<Histogram>,
    /// First rows of the dataset, in file order
    pub preview: Vec<LabeledSample>,
    /// Pearson correlation matrix over the raw features
    pub correlation: Vec<Vec<f64>>,
    pub top_correlations: Vec<CorrelationPair>,
    /// Sorted by crop name
    pub profiles: Vec<CropProfile>,
}

impl DatasetSummary {
    /// Compute the summary of a set of rows.
    ///
    /// # Errors
    /// Returns `DatasetError::Empty` when there are no rows.
    pub fn from_rows(rows: &[LabeledSample]) -> Result<Self, DatasetError> {
        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }

        let columns: Vec<Vec<f64>> = (0..RAW_COUNT)
            .map(|j| rows.iter().map(|r| r.sample.to_array()[j]).collect())
            .collect();

        let features: Vec<FeatureStats> = RAW_FEATURE_NAMES
            .iter()
            .zip(&columns)
            .map(|(name, col)| FeatureStats::from_column(name, col))
            .collect();

        let histograms: Vec<Histogram> = features
            .iter()
            .zip(&columns)
            .map(|(stats, col)| {
                Histogram::from_column(&stats.name, col, stats.min, stats.max, HISTOGRAM_BINS)
            })
            .collect();

        let correlation: Vec<Vec<f64>> = (0..RAW_COUNT)
            .map(|i| {
                (0..RAW_COUNT)
                    .map(|j| {
                        if i == j {
                            1.0
                        } else {
                            pearson(&columns[i], &columns[j])
                        }
                    })
                    .collect()
            })
            .collect();

        let mut pairs = Vec::new();
        for i in 0..RAW_COUNT {
            for j in (i + 1)..RAW_COUNT {
                pairs.push(CorrelationPair {
                    a: RAW_FEATURE_NAMES[i].to_string(),
                    b: RAW_FEATURE_NAMES[j].to_string(),
                    r: correlation[i][j],
                });
            }
        }
        // Stable: equal magnitudes keep matrix order
        pairs.sort_by(|x, y| y.r.abs().total_cmp(&x.r.abs()));
        pairs.truncate(TOP_CORRELATIONS);

        let mut by_crop: BTreeMap<&str, Vec<[f64; RAW_COUNT]>> = BTreeMap::new();
        for row in rows {
            by_crop
                .entry(row.label.as_str())
                .or_default()
                .push(row.sample.to_array());
        }

        let mut crop_counts: Vec<(String, usize)> = by_crop
            .iter()
            .map(|(crop, samples)| ((*crop).to_string(), samples.len()))
            .collect();
        crop_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let profiles = by_crop
            .iter()
            .map(|(crop, samples)| {
                let mut medians = [0.0; RAW_COUNT];
                let mut normalized = [0.0; RAW_COUNT];
                for j in 0..RAW_COUNT {
                    let col: Vec<f64> = samples.iter().map(|s| s[j]).collect();
                    medians[j] = median(&col);
                    let range = features[j].max - features[j].min;
                    normalized[j] = if range > 0.0 {
                        (medians[j] - features[j].min) / range
                    } else {
                        0.0
                    };
                }
                CropProfile {
                    crop: (*crop).to_string(),
                    count: samples.len(),
                    medians,
                    normalized,
                }
            })
            .collect();

        Ok(Self {
            rows: rows.len(),
            columns: RAW_COUNT + 1,
            n_crops: by_crop.len(),
            crop_counts,
            features,
            histograms,
            preview: rows.iter().take(PREVIEW_ROWS).cloned().collect(),
            correlation,
            top_correlations: pairs,
            profiles,
        })
    }

    /// Profile of one crop, if present.
    #[must_use]
    pub fn profile(&self, crop: &str) -> Option<&CropProfile> {
        self.profiles.iter().find(|p| p.crop == crop)
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Pearson correlation; 0 when either column is constant.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Service for dataset exploration.
pub struct ExplorationService<D>
where
    D: DatasetSource,
{
    source: Arc<D>,
}

impl<D> ExplorationService<D>
where
    D: DatasetSource,
{
    /// Create a new exploration service.
    pub fn new(source: Arc<D>) -> Self {
        Self { source }
    }

    /// Where the rows come from.
    #[must_use]
    pub fn source(&self) -> String {
        self.source.describe()
    }

    /// Load the dataset and summarise it.
    ///
    /// # Errors
    /// Returns error if the dataset cannot be read or has no rows.
    pub fn summarize(&self) -> Result<DatasetSummary, CropsenseError> {
        let rows = self.source.load()?;
        let summary = DatasetSummary::from_rows(&rows)?;
        tracing::info!(
            "Dataset summary: {} rows, {} crops",
            summary.rows,
            summary.n_crops
        );
        Ok(summary)
    }
}
