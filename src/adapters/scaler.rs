//! Standardization artifact (`scaler.json`).
//!
//! Mirrors a fitted standard scaler: `z = (x - mean) / scale`, per feature.

use serde::{Deserialize, Serialize};

use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::Scaler;

use super::ArtifactError;

/// Fitted per-feature standardization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column order the scaler was fitted with. Checked against the canonical order when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Build a scaler from fitted parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if any parameter is unusable.
    pub fn new(
        mean: [f64; FEATURE_COUNT],
        scale: [f64; FEATURE_COUNT],
    ) -> Result<Self, ArtifactError> {
        let scaler = Self {
            feature_names: None,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Sanity-check loaded parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` on a non-finite mean, a zero or
    /// non-finite scale, or a column order that differs from the canonical one.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if let Some(names) = &self.feature_names {
            let matches = names.len() == FEATURE_COUNT
                && names.iter().zip(FEATURE_NAMES.iter()).all(|(a, b)| a == b);
            if !matches {
                return Err(ArtifactError::Invalid(format!(
                    "scaler feature order {names:?} does not match {FEATURE_NAMES:?}"
                )));
            }
        }
        for (i, (&m, &s)) in self.mean.iter().zip(self.scale.iter()).enumerate() {
            if !m.is_finite() {
                return Err(ArtifactError::Invalid(format!(
                    "scaler mean for {} is not finite",
                    FEATURE_NAMES[i]
                )));
            }
            if !s.is_finite() || s == 0.0 {
                return Err(ArtifactError::Invalid(format!(
                    "scaler scale for {} must be finite and non-zero (got {s})",
                    FEATURE_NAMES[i]
                )));
            }
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, z) in out.iter_mut().enumerate() {
            *z = (features[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_scaler() {
        let scaler = StandardScaler::new([0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT])
            .expect("Should build");
        let x = [3.0; FEATURE_COUNT];
        assert_eq!(scaler.transform(&x), x);
    }

    #[test]
    fn test_standardization() {
        let mut mean = [0.0; FEATURE_COUNT];
        let mut scale = [1.0; FEATURE_COUNT];
        mean[0] = 54.0;
        scale[0] = 9.0;
        let scaler = StandardScaler::new(mean, scale).expect("Should build");

        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 63.0;
        let z = scaler.transform(&x);
        assert!((z[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut scale = [1.0; FEATURE_COUNT];
        scale[4] = 0.0;
        let err = StandardScaler::new([0.0; FEATURE_COUNT], scale).expect_err("must fail");
        assert!(err.to_string().contains("cholesterol"));
    }

    #[test]
    fn test_feature_order_checked() {
        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        names.swap(0, 1);
        let scaler = StandardScaler {
            feature_names: Some(names),
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        };
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_wrong_length_rejected_by_json() {
        let json = r#"{"mean": [0.0, 1.0], "scale": [1.0, 1.0]}"#;
        assert!(serde_json::from_str::<StandardScaler>(json).is_err());
    }
}
