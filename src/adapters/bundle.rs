//! Model bundle: loads the classifier and label encoder artifacts together.
//!
//! # Integrity
//!
//! A model directory may carry a `manifest.json` that binds every artifact
//! to its SHA-256 digest (written by the `seal_model` binary). When present,
//! every listed file must hash to its recorded digest. When
//! `require_manifest` is set, a missing manifest is a load failure.
//!
//! Every failure surfaces as `ModelError::Unavailable`; callers must not
//! fall back to a default model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::forest::ForestPipeline;
use crate::domain::{CropLabelEncoder, ModelError};

pub const MODEL_FILE: &str = "model.json";
pub const ENCODER_FILE: &str = "label_encoder.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Options for loading model artifacts.
#[derive(Debug, Clone, Default)]
pub struct ArtifactConfig {
    /// Refuse to load a directory without `manifest.json`.
    pub require_manifest: bool,
}

/// File digests binding a model directory's artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// Lowercase hex SHA-256 of a byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn unavailable(msg: impl Into<String>) -> ModelError {
    ModelError::Unavailable(msg.into())
}

impl ModelManifest {
    /// Build a manifest over the standard artifacts present in `dir`.
    ///
    /// # Errors
    /// Returns error if neither artifact exists or a file cannot be read.
    pub fn for_dir(dir: &Path) -> Result<Self, ModelError> {
        let mut files = BTreeMap::new();
        for rel in [MODEL_FILE, ENCODER_FILE] {
            let path = dir.join(rel);
            if path.exists() {
                let bytes = std::fs::read(&path)
                    .map_err(|e| unavailable(format!("Failed to read {path:?}: {e}")))?;
                files.insert(rel.to_string(), sha256_hex(&bytes));
            }
        }

        if files.is_empty() {
            return Err(unavailable(format!(
                "No model artifacts found in {dir:?} (expected {MODEL_FILE} and {ENCODER_FILE})"
            )));
        }

        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: Some(chrono::Utc::now().timestamp()),
            files,
        })
    }

    /// Read `manifest.json` from `dir`, if it exists.
    ///
    /// # Errors
    /// Returns error if the manifest exists but cannot be parsed.
    pub fn read(dir: &Path) -> Result<Option<Self>, ModelError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| unavailable(format!("Failed to read manifest: {e}")))?;
        let manifest: Self = serde_json::from_slice(&bytes)
            .map_err(|e| unavailable(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
        Ok(Some(manifest))
    }

    /// Check every bound file against its digest.
    ///
    /// # Errors
    /// Returns error on version mismatch, missing files, or digest mismatch.
    pub fn verify(&self, dir: &Path) -> Result<(), ModelError> {
        if self.version != MANIFEST_VERSION {
            return Err(unavailable(format!(
                "Unsupported manifest version: {}",
                self.version
            )));
        }
        for required in [MODEL_FILE, ENCODER_FILE] {
            if !self.files.contains_key(required) {
                return Err(unavailable(format!(
                    "{MANIFEST_FILE} must include {required}"
                )));
            }
        }

        for (rel, expected_hex) in &self.files {
            let path = dir.join(rel);
            let bytes = std::fs::read(&path).map_err(|e| {
                unavailable(format!(
                    "Manifest references missing/unreadable file {path:?}: {e}"
                ))
            })?;
            if !sha256_hex(&bytes).eq_ignore_ascii_case(expected_hex) {
                return Err(unavailable(format!("File hash mismatch for {rel}")));
            }
        }
        Ok(())
    }
}

/// A classifier paired with the encoder it was trained with.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub classifier: ForestPipeline,
    pub encoder: CropLabelEncoder,
    /// Whether the artifacts were checked against a manifest.
    pub verified: bool,
}

impl ModelBundle {
    /// Load `model.json` and `label_encoder.json` from `dir`.
    ///
    /// # Errors
    /// Returns `ModelError::Unavailable` if any artifact is missing, corrupt,
    /// fails integrity checks, or the pair is mismatched.
    pub fn load(dir: &Path, config: &ArtifactConfig) -> Result<Self, ModelError> {
        if !dir.is_dir() {
            return Err(unavailable(format!("Model directory not found: {dir:?}")));
        }

        let verified = match ModelManifest::read(dir)? {
            Some(manifest) => {
                manifest.verify(dir)?;
                tracing::info!("Verified model artifacts against {MANIFEST_FILE}");
                true
            }
            None if config.require_manifest => {
                tracing::error!("{MANIFEST_FILE} not found in {:?}", dir);
                return Err(unavailable(format!(
                    "{MANIFEST_FILE} required but not found in {dir:?}"
                )));
            }
            None => {
                tracing::warn!(
                    "Loading model artifacts from {:?} without integrity manifest",
                    dir
                );
                false
            }
        };

        let classifier = ForestPipeline::load(&dir.join(MODEL_FILE))?;
        let encoder = Self::load_encoder(&dir.join(ENCODER_FILE))?;

        if encoder.len() != classifier.n_classes {
            return Err(unavailable(format!(
                "Label encoder has {} classes but model predicts {}",
                encoder.len(),
                classifier.n_classes
            )));
        }

        tracing::info!(
            "Model bundle ready: {} crops, {} trees",
            encoder.len(),
            classifier.trees.len()
        );

        Ok(Self {
            classifier,
            encoder,
            verified,
        })
    }

    fn load_encoder(path: &Path) -> Result<CropLabelEncoder, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            unavailable(format!(
                "Failed to read label encoder {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| unavailable(format!("Invalid label encoder JSON: {e}")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::forest::tests::small_forest;
    use tempfile::tempdir;

    pub(crate) fn write_bundle(dir: &Path) {
        let model = serde_json::to_string(&small_forest()).expect("serialize model");
        std::fs::write(dir.join(MODEL_FILE), model).expect("write model");
        std::fs::write(
            dir.join(ENCODER_FILE),
            r#"{"classes":["maize","rice","chickpea"]}"#,
        )
        .expect("write encoder");
    }

    fn write_manifest(dir: &Path) {
        let manifest = ModelManifest::for_dir(dir).expect("manifest");
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        std::fs::write(dir.join(MANIFEST_FILE), bytes).expect("write manifest");
    }

    #[test]
    fn test_load_unsealed_bundle() {
        let temp = tempdir().expect("tempdir");
        write_bundle(temp.path());

        let bundle = ModelBundle::load(temp.path(), &ArtifactConfig::default()).expect("load");
        assert!(!bundle.verified);
        assert_eq!(bundle.encoder.len(), 3);
        assert_eq!(bundle.encoder.decode(0).expect("decode"), "chickpea");
    }

    #[test]
    fn test_require_manifest_fails_closed() {
        let temp = tempdir().expect("tempdir");
        write_bundle(temp.path());

        let config = ArtifactConfig {
            require_manifest: true,
        };
        let err = ModelBundle::load(temp.path(), &config).expect_err("must fail");
        assert!(matches!(err, ModelError::Unavailable(_)));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_sealed_bundle_verifies() {
        let temp = tempdir().expect("tempdir");
        write_bundle(temp.path());
        write_manifest(temp.path());

        let config = ArtifactConfig {
            require_manifest: true,
        };
        let bundle = ModelBundle::load(temp.path(), &config).expect("load");
        assert!(bundle.verified);
    }

    #[test]
    fn test_tampered_artifact_is_rejected() {
        let temp = tempdir().expect("tempdir");
        write_bundle(temp.path());
        write_manifest(temp.path());

        std::fs::write(
            temp.path().join(ENCODER_FILE),
            r#"{"classes":["maize","rice","wheat"]}"#,
        )
        .expect("tamper");

        let err = ModelBundle::load(temp.path(), &ArtifactConfig::default())
            .expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let temp = tempdir().expect("tempdir");
        write_bundle(temp.path());
        std::fs::write(
            temp.path().join(ENCODER_FILE),
            r#"{"classes":["maize","rice"]}"#,
        )
        .expect("write encoder");

        let err = ModelBundle::load(temp.path(), &ArtifactConfig::default())
            .expect_err("must fail");
        assert!(err.to_string().contains("Label encoder has 2 classes"));
    }

    #[test]
    fn test_missing_directory_or_files() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("nope");
        assert!(ModelBundle::load(&missing, &ArtifactConfig::default()).is_err());

        // Empty directory: no model.json
        let err = ModelBundle::load(temp.path(), &ArtifactConfig::default())
            .expect_err("must fail");
        assert!(err.to_string().contains("Failed to read model"));
        assert!(ModelManifest::for_dir(temp.path()).is_err());
    }
}
