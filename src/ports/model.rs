//! Model ports: Traits for the pre-fitted scaler and regression model.
//!
//! These abstract the persisted artifacts from the classifier so that any
//! implementation (or a test stub) can be injected.

use crate::domain::FEATURE_COUNT;

/// A previously fitted feature standardization.
///
/// Implementations must be pure: no re-fitting, no interior mutation.
pub trait Scaler: Send + Sync {
    /// Standardize a raw feature vector in canonical order.
    fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT];
}

/// A previously fitted regression model producing the severity score.
///
/// Implementations must be deterministic: the same input yields the same output.
pub trait Regressor: Send + Sync {
    /// Predict the raw (unrounded) severity score for a standardized vector.
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> f64;
}
