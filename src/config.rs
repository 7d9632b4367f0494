//! Startup settings.
//!
//! Environment variables are read once, in `main`, and the resulting
//! `Settings` value is passed to whatever needs it. Nothing reads the
//! environment after startup.

use std::path::PathBuf;

use crate::adapters::ArtifactConfig;
use crate::application::PredictionConfig;
use crate::domain::DEFAULT_TOP_K;
use crate::CropsenseError;

pub const ENV_MODEL_DIR: &str = "CROPSENSE_MODEL_DIR";
pub const ENV_DATA_PATH: &str = "CROPSENSE_DATA_PATH";
pub const ENV_TOP_K: &str = "CROPSENSE_TOP_K";
pub const ENV_STRICT_CONSISTENCY: &str = "CROPSENSE_STRICT_CONSISTENCY";
pub const ENV_REQUIRE_MANIFEST: &str = "CROPSENSE_REQUIRE_MANIFEST";
pub const ENV_LOG_MODE: &str = "CROPSENSE_LOG_MODE";
pub const ENV_LOG_FILE: &str = "CROPSENSE_LOG_FILE";

pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_DATA_PATH: &str = "data/Crop_recommendation.csv";
pub const DEFAULT_LOG_FILE: &str = "logs/cropsense.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether to log to a file given whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Process-wide settings, gathered once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model_dir: PathBuf,
    pub data_path: PathBuf,
    pub top_k: usize,
    pub strict_consistency: bool,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            top_k: DEFAULT_TOP_K,
            strict_consistency: false,
            require_manifest: false,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Interpret a boolean flag value.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `Validation` if `CROPSENSE_TOP_K` is not a positive integer.
    pub fn from_env() -> Result<Self, CropsenseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `Validation` if the top-K value is not a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CropsenseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            settings.model_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_DATA_PATH) {
            settings.data_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_TOP_K) {
            settings.top_k = match raw.trim().parse::<usize>() {
                Ok(k) if k > 0 => k,
                _ => {
                    return Err(CropsenseError::Validation(format!(
                        "{ENV_TOP_K} must be a positive integer, got {raw:?}"
                    )))
                }
            };
        }
        if let Some(v) = lookup(ENV_STRICT_CONSISTENCY) {
            settings.strict_consistency = parse_bool(&v);
        }
        if let Some(v) = lookup(ENV_REQUIRE_MANIFEST) {
            settings.require_manifest = parse_bool(&v);
        }
        if let Some(v) = lookup(ENV_LOG_MODE) {
            settings.log_mode = LogMode::parse(&v);
        }
        if let Some(path) = lookup(ENV_LOG_FILE) {
            settings.log_file = PathBuf::from(path);
        }

        Ok(settings)
    }

    #[must_use]
    pub fn prediction(&self) -> PredictionConfig {
        PredictionConfig {
            top_k: self.top_k,
            strict_consistency: self.strict_consistency,
        }
    }

    #[must_use]
    pub fn artifacts(&self) -> ArtifactConfig {
        ArtifactConfig {
            require_manifest: self.require_manifest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.prediction(), PredictionConfig::default());
        assert!(!settings.artifacts().require_manifest);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_MODEL_DIR, "/srv/models"),
            (ENV_TOP_K, "3"),
            (ENV_STRICT_CONSISTENCY, "yes"),
            (ENV_REQUIRE_MANIFEST, "1"),
            (ENV_LOG_MODE, "STDOUT"),
        ]))
        .expect("settings");

        assert_eq!(settings.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(settings.top_k, 3);
        assert!(settings.strict_consistency);
        assert!(settings.artifacts().require_manifest);
        assert_eq!(settings.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_invalid_top_k() {
        for bad in ["0", "-1", "five"] {
            let result = Settings::from_lookup(lookup(&[(ENV_TOP_K, bad)]));
            assert!(matches!(result, Err(CropsenseError::Validation(_))));
        }
    }

    #[test]
    fn test_log_mode() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
        assert_eq!(LogMode::parse("whatever"), LogMode::Auto);
        assert!(!parse_bool("no"));
    }
}
