//! Artifact loader: reads the fitted scaler and model from a model directory.
//!
//! Expected layout:
//!
//! ```text
//! <model_dir>/
//!   scaler.json      fitted StandardScaler
//!   model.json       RegressorArtifact (kind = knn | linear)
//!   manifest.json    SHA-256 digests of the two files above   (signed mode)
//!   artifacts.sig    Ed25519 signature over manifest.json     (signed mode)
//! ```
//!
//! # Security
//!
//! When a trusted public key is configured the manifest must verify and bind
//! both artifacts. Without a key the files are loaded as-is and a warning is
//! logged; set `CARDIOSCORE_MODEL_PUBKEY_B64` to require a signature.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::manifest::{self, ArtifactManifest};
use super::regressor::RegressorArtifact;
use super::scaler::StandardScaler;

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact missing: {}", .0.display())]
    Missing(PathBuf),

    #[error("artifact unreadable: {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact malformed: {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact invalid: {0}")]
    Invalid(String),

    #[error("artifact integrity check failed: {0}")]
    Integrity(String),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where and how to load artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactConfig {
    pub model_dir: PathBuf,
    /// Base64 Ed25519 public key that must have signed the manifest.
    /// `None` loads the artifacts without integrity checks.
    pub trusted_key_b64: Option<String>,
}

impl ArtifactConfig {
    /// Unsigned loading from `dir`.
    #[must_use]
    pub fn unsigned(dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: dir.into(),
            trusted_key_b64: None,
        }
    }
}

/// Scaler and model, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub scaler: StandardScaler,
    pub model: RegressorArtifact,
    /// Present when the artifacts were verified against a signed manifest.
    pub manifest: Option<ArtifactManifest>,
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::Missing(path.to_path_buf())
        } else {
            ArtifactError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn parse<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate the scaler and model.
///
/// # Errors
/// Returns `ArtifactError` if a file is missing, unreadable, malformed,
/// inconsistent, or fails integrity verification.
pub fn load_artifacts(config: &ArtifactConfig) -> Result<LoadedArtifacts, ArtifactError> {
    let dir = config.model_dir.as_path();
    if !dir.is_dir() {
        return Err(ArtifactError::Missing(dir.to_path_buf()));
    }

    let scaler_path = dir.join(SCALER_FILE);
    let model_path = dir.join(MODEL_FILE);
    let scaler_bytes = read_file(&scaler_path)?;
    let model_bytes = read_file(&model_path)?;

    let manifest = match &config.trusted_key_b64 {
        Some(b64) => {
            let key = manifest::verifying_key_from_b64(b64)?;
            Some(manifest::verify(
                dir,
                &key,
                &[
                    (SCALER_FILE, scaler_bytes.as_slice()),
                    (MODEL_FILE, model_bytes.as_slice()),
                ],
            )?)
        }
        None => {
            tracing::warn!(
                "No trusted model key configured; loading unverified artifacts from {:?}",
                dir
            );
            None
        }
    };

    let scaler: StandardScaler = parse(&scaler_path, &scaler_bytes)?;
    scaler.validate()?;
    let model: RegressorArtifact = parse(&model_path, &model_bytes)?;
    model.validate()?;

    tracing::info!(
        "Loaded model artifacts from {:?} (model={}, signed={})",
        dir,
        model.describe(),
        manifest.is_some()
    );

    Ok(LoadedArtifacts {
        scaler,
        model,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::regressor::LinearRegressor;
    use crate::domain::FEATURE_COUNT;
    use base64::Engine;
    use ed25519_dalek::SigningKey;
    use rand::RngCore;
    use tempfile::tempdir;

    fn write_artifacts(dir: &Path, intercept: f64) {
        let scaler = StandardScaler::new([0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT])
            .expect("scaler");
        let model = RegressorArtifact::Linear(LinearRegressor {
            coefficients: [0.0; FEATURE_COUNT],
            intercept,
        });
        std::fs::write(
            dir.join(SCALER_FILE),
            serde_json::to_vec(&scaler).expect("serialize scaler"),
        )
        .expect("write scaler");
        std::fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(&model).expect("serialize model"),
        )
        .expect("write model");
    }

    fn signing_key() -> SigningKey {
        let mut sk = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut sk);
        SigningKey::from_bytes(&sk)
    }

    fn signed_config(dir: &Path, key: &SigningKey) -> ArtifactConfig {
        ArtifactConfig {
            model_dir: dir.to_path_buf(),
            trusted_key_b64: Some(
                base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes()),
            ),
        }
    }

    #[test]
    fn test_load_unsigned() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);

        let loaded = load_artifacts(&ArtifactConfig::unsigned(temp.path())).expect("load");
        assert!(loaded.manifest.is_none());
        assert!(matches!(loaded.model, RegressorArtifact::Linear(_)));
    }

    #[test]
    fn test_unsigned_directory_ignores_stray_manifest() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);
        std::fs::write(temp.path().join(manifest::MANIFEST_FILE), b"{}").expect("write");

        let loaded = load_artifacts(&ArtifactConfig::unsigned(temp.path()))
            .expect("Should load without a trusted key");
        assert!(loaded.manifest.is_none());
    }

    #[test]
    fn test_load_signed() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);
        let key = signing_key();
        manifest::sign(temp.path(), &[SCALER_FILE, MODEL_FILE], &key, Some(3)).expect("sign");

        let loaded = load_artifacts(&signed_config(temp.path(), &key)).expect("load signed");
        assert_eq!(loaded.manifest.expect("manifest").serial, Some(3));
    }

    #[test]
    fn test_swapped_model_after_signing_rejected() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);
        let key = signing_key();
        manifest::sign(temp.path(), &[SCALER_FILE, MODEL_FILE], &key, None).expect("sign");

        // Replace model.json after signing
        write_artifacts(temp.path(), 2.5);
        let err = load_artifacts(&signed_config(temp.path(), &key)).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Integrity(_)));
    }

    #[test]
    fn test_missing_signature_fails_closed() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);
        let key = signing_key();

        let err = load_artifacts(&signed_config(temp.path(), &key)).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_missing_model_file() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);
        std::fs::remove_file(temp.path().join(MODEL_FILE)).expect("remove");

        let err = load_artifacts(&ArtifactConfig::unsigned(temp.path())).expect_err("must fail");
        match err {
            ArtifactError::Missing(path) => assert!(path.ends_with(MODEL_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_directory() {
        let err = load_artifacts(&ArtifactConfig::unsigned("/nonexistent/cardioscore/models"))
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_malformed_model() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), 0.5);
        std::fs::write(temp.path().join(MODEL_FILE), b"{ not json").expect("write");

        let err = load_artifacts(&ArtifactConfig::unsigned(temp.path())).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Malformed { .. }));
    }

    #[test]
    fn test_bundled_models_load() {
        let loaded = load_artifacts(&ArtifactConfig::unsigned(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("models"),
        ))
        .expect("Bundled artifacts should load");
        assert!(matches!(loaded.model, RegressorArtifact::Knn(_)));
        assert!(loaded.model.describe().contains("SYNTHETIC FIXTURE"));
    }
}
