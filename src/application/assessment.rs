//! Assessment service: raw inputs → validated features → severity report.

use serde::Serialize;

use crate::domain::{encode, PatientFeatures, ProfileIndicator, RawInputs, SeverityAssessment};
use crate::ports::{Regressor, Scaler};
use crate::Result;

use super::RiskClassifier;

/// Everything presentation code needs for one patient.
///
/// Built once per request and never mutated; the result banner, gauge,
/// report and advisory all read the same `assessment`.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub id: String,
    pub assessment: SeverityAssessment,
    /// Normalized indicators for the feature profile view.
    pub profile: Vec<ProfileIndicator>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl AssessmentReport {
    fn new(features: &PatientFeatures, assessment: SeverityAssessment) -> Self {
        Self {
            id: uuid_v4(),
            assessment,
            profile: features.profile(),
            generated_at: chrono::Utc::now(),
        }
    }
}

/// Encode-then-classify use case.
pub struct AssessmentService<S = crate::adapters::StandardScaler, R = crate::adapters::RegressorArtifact>
where
    S: Scaler + ?Sized,
    R: Regressor + ?Sized,
{
    classifier: RiskClassifier<S, R>,
}

impl<S, R> AssessmentService<S, R>
where
    S: Scaler + ?Sized,
    R: Regressor + ?Sized,
{
    pub fn new(classifier: RiskClassifier<S, R>) -> Self {
        Self { classifier }
    }

    #[must_use]
    pub fn classifier(&self) -> &RiskClassifier<S, R> {
        &self.classifier
    }

    /// Validate raw inputs without touching the model.
    ///
    /// # Errors
    /// Returns `Validation` naming the first offending field.
    pub fn validate(&self, inputs: &RawInputs) -> Result<PatientFeatures> {
        Ok(encode(inputs)?)
    }

    /// Validate, encode and classify one patient.
    ///
    /// Validation runs first, so an invalid request is reported as such even
    /// when the model is offline.
    ///
    /// # Errors
    /// Returns `Validation`, `ModelUnavailable` or `InvalidPrediction`.
    pub fn assess(&self, inputs: &RawInputs) -> Result<AssessmentReport> {
        let features = self.validate(inputs)?;
        let assessment = self.classifier.classify(&features)?;
        let report = AssessmentReport::new(&features, assessment);
        tracing::info!(
            "Assessment {} complete: tier={}",
            report.id,
            report.assessment.tier()
        );
        Ok(report)
    }
}

impl<S, R> std::fmt::Debug for AssessmentService<S, R>
where
    S: Scaler + ?Sized,
    R: Regressor + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentService")
            .field("classifier", &self.classifier)
            .finish()
    }
}

/// Random v4 UUID from a CSPRNG seeded with OS entropy.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
