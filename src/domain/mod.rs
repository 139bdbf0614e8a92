//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O: the feature encoder, categorical code tables and the
//! score-to-tier policy.

mod assessment;
pub mod category;
mod encoder;
mod patient;

pub use assessment::{round_score, RiskTier, SeverityAssessment, HIGH_THRESHOLD, MODERATE_THRESHOLD};
pub use category::{Categorical, ChestPainType, RestingEcg, Sex, StSlope, Thalassemia, YesNo};
pub use encoder::{encode, RawInputs, RawValue, ValidationError};
pub use patient::{Field, PatientFeatures, ProfileIndicator, FEATURE_COUNT, FEATURE_NAMES};
