//! Model sealing utility for Cropsense model directories.
//!
//! Writes `manifest.json` binding `model.json` and `label_encoder.json` to
//! their SHA-256 digests. The app verifies the digests at load time and,
//! with `CROPSENSE_REQUIRE_MANIFEST=1`, refuses unsealed directories.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin seal_model -- <model_dir>          # seal
//! cargo run --bin seal_model -- <model_dir> --check  # verify only
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use cropsense::adapters::bundle::{ModelManifest, MANIFEST_FILE};
use cropsense::adapters::{ArtifactConfig, ModelBundle};

fn usage() -> String {
    "Usage: seal_model <model_dir> [--check]".to_string()
}

fn parse_args() -> Result<(PathBuf, bool)> {
    let mut model_dir: Option<PathBuf> = None;
    let mut check_only = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--check" => check_only = true,
            "-h" | "--help" => bail!(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => bail!(usage()),
        }
    }

    let model_dir = model_dir.ok_or_else(|| anyhow!(usage()))?;
    Ok((model_dir, check_only))
}

fn main() -> Result<()> {
    let (model_dir, check_only) = parse_args()?;

    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf()
    } else {
        model_dir
    };

    if check_only {
        let config = ArtifactConfig {
            require_manifest: true,
        };
        let bundle = ModelBundle::load(&model_dir, &config)?;
        println!(
            "OK: {} crops, {} trees, digests match",
            bundle.encoder.len(),
            bundle.classifier.trees.len()
        );
        return Ok(());
    }

    let manifest_path = model_dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        fs::remove_file(&manifest_path)
            .with_context(|| format!("Failed to remove stale {manifest_path:?}"))?;
        println!("Replacing existing manifest");
    }

    // Refuse to seal artifacts the app would reject anyway.
    let bundle = ModelBundle::load(&model_dir, &ArtifactConfig::default())
        .context("Model directory does not load")?;

    let manifest = ModelManifest::for_dir(&model_dir)?;
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest.json")?;

    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    println!("Sealed manifest: {manifest_path:?}");
    for (file, digest) in &manifest.files {
        println!("  {file}  sha256={digest}");
    }
    println!(
        "Model: {} crops, {} trees",
        bundle.encoder.len(),
        bundle.classifier.trees.len()
    );

    Ok(())
}
