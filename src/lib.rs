//! # Cardioscore
//!
//! Cardiac severity scoring from patient biomarkers.
//!
//! This crate provides:
//! - Validation and encoding of the 13 clinical inputs into the model's feature vector
//! - Inference through a pre-fitted scaler and regression model
//! - Deterministic mapping of the severity score into a risk tier with advisory text
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientFeatures, the encoder, SeverityAssessment, RiskTier)
//! - `ports`: Trait definitions for the external scaler and model
//! - `adapters`: Concrete artifact formats, artifact loading/verification, log sanitization
//! - `application`: The risk classifier and the encode-then-classify service
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{AssessmentReport, AssessmentService, RiskClassifier};
pub use domain::{encode, PatientFeatures, RawInputs, RiskTier, SeverityAssessment, ValidationError};

/// Result type for Cardioscore operations
pub type Result<T> = std::result::Result<T, CardioscoreError>;

/// Main error type for Cardioscore
#[derive(Debug, thiserror::Error)]
pub enum CardioscoreError {
    /// Caller supplied a value outside its domain; never reaches the model.
    #[error("Invalid patient data: {0}")]
    Validation(#[from] domain::ValidationError),

    /// Scaler or model artifacts are not loaded.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model returned something that is not a usable score.
    #[error("Model produced an invalid prediction: {0}")]
    InvalidPrediction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<adapters::ArtifactError> for CardioscoreError {
    fn from(err: adapters::ArtifactError) -> Self {
        Self::ModelUnavailable(err.to_string())
    }
}

impl CardioscoreError {
    /// Whether the caller can recover by correcting the input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is the "system offline" condition.
    #[must_use]
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_))
    }
}
