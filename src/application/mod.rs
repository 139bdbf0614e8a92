//! Application layer: Use cases and services.
//!
//! Wires the domain encoder and tier policy to the scaler and model ports.

mod assessment;
mod classifier;

pub use assessment::{AssessmentReport, AssessmentService};
pub use classifier::RiskClassifier;
