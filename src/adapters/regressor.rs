//! Regression model artifact (`model.json`).
//!
//! Two exported model kinds are supported, selected by the `kind` tag:
//! - `knn`: k-nearest-neighbours regression over the fitted (scaled) samples
//! - `linear`: a linear model `w · z + b`

use serde::{Deserialize, Serialize};

use crate::domain::FEATURE_COUNT;
use crate::ports::Regressor;

use super::ArtifactError;

/// Neighbour weighting for KNN regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weights {
    #[default]
    Uniform,
    /// Inverse distance
    Distance,
}

/// Distance metric for KNN regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
}

impl Metric {
    fn distance(self, a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            Self::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

/// Fitted k-nearest-neighbours regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnRegressor {
    pub k: usize,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub metric: Metric,
    /// Training samples, already in scaled space
    pub samples: Vec<[f64; FEATURE_COUNT]>,
    pub targets: Vec<f64>,
    /// Provenance note carried into the load log (e.g. a synthetic fixture).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl KnnRegressor {
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the fitted data is inconsistent.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.samples.is_empty() {
            return Err(ArtifactError::Invalid("knn model has no samples".into()));
        }
        if self.samples.len() != self.targets.len() {
            return Err(ArtifactError::Invalid(format!(
                "knn model has {} samples but {} targets",
                self.samples.len(),
                self.targets.len()
            )));
        }
        if self.k == 0 || self.k > self.samples.len() {
            return Err(ArtifactError::Invalid(format!(
                "knn k={} must be in [1, {}]",
                self.k,
                self.samples.len()
            )));
        }
        let all_finite = self.targets.iter().all(|t| t.is_finite())
            && self.samples.iter().flatten().all(|v| v.is_finite());
        if !all_finite {
            return Err(ArtifactError::Invalid(
                "knn model contains non-finite values".into(),
            ));
        }
        Ok(())
    }
}

impl Regressor for KnnRegressor {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> f64 {
        let mut neighbours: Vec<(f64, f64)> = self
            .samples
            .iter()
            .zip(self.targets.iter())
            .map(|(sample, &target)| (self.metric.distance(sample, scaled), target))
            .collect();
        // Stable sort: ties keep training order.
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbours.truncate(self.k);

        match self.weights {
            Weights::Uniform => {
                neighbours.iter().map(|(_, t)| t).sum::<f64>() / neighbours.len() as f64
            }
            Weights::Distance => {
                let exact: Vec<f64> = neighbours
                    .iter()
                    .filter(|(d, _)| *d == 0.0)
                    .map(|(_, t)| *t)
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }
                let (weighted, total) = neighbours
                    .iter()
                    .fold((0.0, 0.0), |(acc, w_sum), (d, t)| {
                        (acc + t / d, w_sum + 1.0 / d)
                    });
                weighted / total
            }
        }
    }
}

/// Fitted linear regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: [f64; FEATURE_COUNT],
    pub intercept: f64,
}

impl LinearRegressor {
    /// # Errors
    /// Returns `ArtifactError::Invalid` on non-finite parameters.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.intercept.is_finite() && self.coefficients.iter().all(|c| c.is_finite()) {
            Ok(())
        } else {
            Err(ArtifactError::Invalid(
                "linear model contains non-finite values".into(),
            ))
        }
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> f64 {
        self.coefficients
            .iter()
            .zip(scaled.iter())
            .map(|(w, z)| w * z)
            .sum::<f64>()
            + self.intercept
    }
}

/// Any supported exported model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Knn(KnnRegressor),
    Linear(LinearRegressor),
}

impl RegressorArtifact {
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the model parameters are unusable.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Self::Knn(m) => m.validate(),
            Self::Linear(m) => m.validate(),
        }
    }

    /// Short description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Knn(m) => {
                let mut out = format!(
                    "knn(k={}, weights={:?}, metric={:?}, samples={})",
                    m.k,
                    m.weights,
                    m.metric,
                    m.samples.len()
                );
                if let Some(note) = &m.description {
                    out.push_str(&format!(" [{note}]"));
                }
                out
            }
            Self::Linear(_) => "linear".to_string(),
        }
    }
}

impl Regressor for RegressorArtifact {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Self::Knn(m) => m.predict(scaled),
            Self::Linear(m) => m.predict(scaled),
        }
    }
}
