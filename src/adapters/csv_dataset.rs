//! CSV dataset adapter for `Crop_recommendation.csv`.
//!
//! Expected header: `N,P,K,temperature,humidity,ph,rainfall,label`.
//! Extra columns are ignored; column order does not matter.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{SoilSample, RAW_FEATURE_NAMES};
use crate::ports::{DatasetError, DatasetSource, LabeledSample};

const LABEL_COLUMN: &str = "label";

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "N")]
    n: f64,
    #[serde(rename = "P")]
    p: f64,
    #[serde(rename = "K")]
    k: f64,
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
    label: String,
}

impl From<CsvRow> for LabeledSample {
    fn from(row: CsvRow) -> Self {
        Self {
            sample: SoilSample::new(
                row.n,
                row.p,
                row.k,
                row.temperature,
                row.humidity,
                row.ph,
                row.rainfall,
            ),
            label: row.label.trim().to_string(),
        }
    }
}

/// Dataset read from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvDataset {
    path: PathBuf,
}

impl CsvDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse labelled rows from any reader.
    ///
    /// # Errors
    /// Returns `DatasetError` on a missing column, malformed row, or no rows.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<LabeledSample>, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DatasetError::Row {
                line: 1,
                message: e.to_string(),
            })?
            .clone();

        for column in RAW_FEATURE_NAMES.iter().chain(std::iter::once(&LABEL_COLUMN)) {
            if !headers.iter().any(|h| h == *column) {
                return Err(DatasetError::MissingColumn((*column).to_string()));
            }
        }

        let mut rows = Vec::new();
        for result in rdr.deserialize::<CsvRow>() {
            let row = result.map_err(|e| DatasetError::Row {
                line: e.position().map_or(0, |p| p.line() as usize),
                message: e.to_string(),
            })?;
            rows.push(LabeledSample::from(row));
        }

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(rows)
    }
}

impl DatasetSource for CsvDataset {
    fn load(&self) -> Result<Vec<LabeledSample>, DatasetError> {
        let file = std::fs::File::open(&self.path).map_err(|e| DatasetError::Open {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let rows = Self::parse(file)?;
        tracing::info!("Loaded {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
