//! Severity assessment types.
//!
//! Represents the output of the severity regression after rounding and tiering.

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the MODERATE tier.
pub const MODERATE_THRESHOLD: f64 = 0.75;

/// Lower bound (inclusive) of the HIGH tier.
pub const HIGH_THRESHOLD: f64 = 1.75;

/// Round a raw model output to the displayed precision (2 decimals).
///
/// Exact halves go to the even neighbour, so `0.745` is `0.74` and stays LOW.
#[must_use]
pub fn round_score(raw: f64) -> f64 {
    (raw * 100.0).round_ties_even() / 100.0
}

/// Risk tier derived from the rounded severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    /// score < 0.75
    Low,
    /// 0.75 <= score < 1.75
    Moderate,
    /// score >= 1.75
    High,
}

impl RiskTier {
    /// Map a rounded score to its tier.
    ///
    /// Bands are half-open `[lower, upper)`, so 0.75 is MODERATE and 1.75 is HIGH.
    /// Anything below 0.75 (including negative scores) is LOW.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Advisory text shown with the result.
    #[must_use]
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Low => "Your heart indicators appear stable. Maintain a healthy lifestyle.",
            Self::Moderate => "Moderate risk detected. Consider regular health checkups.",
            Self::High => "High risk detected. Immediate medical consultation advised.",
        }
    }

    /// Get the associated color for display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (22, 163, 74),     // Green (#16A34A)
            Self::Moderate => (249, 115, 22), // Orange (#F97316)
            Self::High => (220, 38, 38),    // Red (#DC2626)
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Result of one prediction: rounded score, tier and advisory.
///
/// Immutable once built. Two assessments from the same raw score are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    score: f64,
    tier: RiskTier,
    advisory: String,
}

impl SeverityAssessment {
    /// Round the raw model output and classify it.
    ///
    /// The tier is taken from the rounded value, never the raw one.
    #[must_use]
    pub fn from_raw_score(raw: f64) -> Self {
        let score = round_score(raw);
        let tier = RiskTier::from_score(score);
        Self {
            score,
            tier,
            advisory: tier.advisory().to_string(),
        }
    }

    /// Severity score rounded to 2 decimals.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn tier(&self) -> RiskTier {
        self.tier
    }

    #[must_use]
    pub fn advisory(&self) -> &str {
        &self.advisory
    }
}

impl std::fmt::Display for SeverityAssessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} RISK (severity score {:.2})", self.tier, self.score)
    }
}
