//! Adapters layer: Concrete implementations of ports.
//!
//! - `scaler`: fitted standard scaler (`scaler.json`)
//! - `regressor`: KNN and linear regression models (`model.json`)
//! - `artifacts`: loading the model directory
//! - `manifest`: Ed25519-signed digest manifest for the artifacts
//! - `sanitize`: patient-data redaction for logs

pub mod artifacts;
pub mod manifest;
pub mod regressor;
pub mod sanitize;
pub mod scaler;

pub use artifacts::{load_artifacts, ArtifactConfig, ArtifactError, LoadedArtifacts};
pub use regressor::{KnnRegressor, LinearRegressor, RegressorArtifact};
pub use scaler::StandardScaler;
