//! Risk classifier: scaler → model → rounded score → tier.

use std::sync::Arc;

use crate::adapters::{ArtifactError, LoadedArtifacts, RegressorArtifact, StandardScaler};
use crate::domain::{PatientFeatures, SeverityAssessment};
use crate::ports::{Regressor, Scaler};
use crate::{CardioscoreError, Result};

/// Scores validated patient features with an injected scaler and model.
///
/// The scaler and model are loaded once, before any classification, and are
/// only read afterwards, so a classifier can be shared across threads.
///
/// When the artifacts could not be loaded the classifier is *offline*: it is
/// still constructible and every [`classify`](Self::classify) call returns
/// [`CardioscoreError::ModelUnavailable`].
pub struct RiskClassifier<S = StandardScaler, R = RegressorArtifact>
where
    S: Scaler + ?Sized,
    R: Regressor + ?Sized,
{
    pipeline: Option<(Arc<S>, Arc<R>)>,
    offline_reason: String,
}

impl<S, R> RiskClassifier<S, R>
where
    S: Scaler + ?Sized,
    R: Regressor + ?Sized,
{
    /// Create a classifier from an already loaded scaler and model.
    pub fn new(scaler: Arc<S>, model: Arc<R>) -> Self {
        Self {
            pipeline: Some((scaler, model)),
            offline_reason: String::new(),
        }
    }

    /// Create a classifier with no model; every classification fails.
    pub fn offline(reason: impl Into<String>) -> Self {
        Self {
            pipeline: None,
            offline_reason: reason.into(),
        }
    }

    /// Whether a scaler and model are loaded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Why the classifier is offline, if it is.
    #[must_use]
    pub fn offline_reason(&self) -> Option<&str> {
        if self.pipeline.is_some() {
            None
        } else {
            Some(self.offline_reason.as_str())
        }
    }

    /// Score a patient.
    ///
    /// Deterministic: the same features and the same artifacts always give the
    /// same assessment.
    ///
    /// # Errors
    /// - `ModelUnavailable` if the classifier is offline, whatever the input
    /// - `Validation` if a feature is out of range (never reaches the model)
    /// - `InvalidPrediction` if the model returns a non-finite score
    pub fn classify(&self, features: &PatientFeatures) -> Result<SeverityAssessment> {
        let (scaler, model) = self
            .pipeline
            .as_ref()
            .ok_or_else(|| CardioscoreError::ModelUnavailable(self.offline_reason.clone()))?;

        features.validate()?;

        let scaled = scaler.transform(&features.to_array());
        let raw = model.predict(&scaled);
        if !raw.is_finite() {
            tracing::error!("Model returned a non-finite severity score");
            return Err(CardioscoreError::InvalidPrediction(format!(
                "model returned {raw}"
            )));
        }

        let assessment = SeverityAssessment::from_raw_score(raw);
        tracing::debug!("Classified patient: {}", assessment);
        Ok(assessment)
    }
}

impl RiskClassifier {
    /// Build from the result of [`load_artifacts`](crate::adapters::load_artifacts).
    ///
    /// A load failure yields an offline classifier instead of an error so the
    /// process can keep serving validation.
    #[must_use]
    pub fn from_artifacts(loaded: std::result::Result<LoadedArtifacts, ArtifactError>) -> Self {
        match loaded {
            Ok(artifacts) => Self::new(Arc::new(artifacts.scaler), Arc::new(artifacts.model)),
            Err(e) => {
                tracing::warn!("Model artifacts unavailable, classifier offline: {}", e);
                Self::offline(e.to_string())
            }
        }
    }
}

impl<S, R> std::fmt::Debug for RiskClassifier<S, R>
where
    S: Scaler + ?Sized,
    R: Regressor + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskClassifier")
            .field("available", &self.is_available())
            .field("offline_reason", &self.offline_reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ChestPainType, RestingEcg, RiskTier, Sex, StSlope, Thalassemia, YesNo, FEATURE_COUNT,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Identity;

    impl Scaler for Identity {
        fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
            *features
        }
    }

    /// Returns a fixed score and counts calls.
    struct Fixed {
        score: f64,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(score: f64) -> Arc<Self> {
            Arc::new(Self {
                score,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Regressor for Fixed {
        fn predict(&self, _scaled: &[f64; FEATURE_COUNT]) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.score
        }
    }

    fn patient() -> PatientFeatures {
        PatientFeatures {
            age: 63,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::Asymptomatic,
            resting_bp: 145,
            cholesterol: 233,
            fasting_blood_sugar: YesNo::Yes,
            resting_ecg: RestingEcg::LeftVentricularHypertrophy,
            max_heart_rate: 150,
            exercise_angina: YesNo::No,
            st_depression: 2.3,
            st_slope: StSlope::Downsloping,
            major_vessels: 0,
            thalassemia: Thalassemia::FixedDefect,
        }
    }

    fn classify_score(score: f64) -> SeverityAssessment {
        RiskClassifier::new(Arc::new(Identity), Fixed::new(score))
            .classify(&patient())
            .expect("Should classify")
    }

    #[test]
    fn test_tiers_from_model_output() {
        let high = classify_score(2.0);
        assert_eq!(high.score(), 2.0);
        assert_eq!(high.tier(), RiskTier::High);
        assert_eq!(
            high.advisory(),
            "High risk detected. Immediate medical consultation advised."
        );

        let moderate = classify_score(1.20);
        assert_eq!(moderate.tier(), RiskTier::Moderate);
        assert_eq!(
            moderate.advisory(),
            "Moderate risk detected. Consider regular health checkups."
        );

        let low = classify_score(0.30);
        assert_eq!(low.tier(), RiskTier::Low);
        assert_eq!(
            low.advisory(),
            "Your heart indicators appear stable. Maintain a healthy lifestyle."
        );
    }

    #[test]
    fn test_rounding_applied_before_tiering() {
        let a = classify_score(1.746);
        assert_eq!(a.score(), 1.75);
        assert_eq!(a.tier(), RiskTier::High);

        let b = classify_score(0.744);
        assert_eq!(b.score(), 0.74);
        assert_eq!(b.tier(), RiskTier::Low);
    }

    #[test]
    fn test_negative_output_is_low() {
        let a = classify_score(-0.4);
        assert_eq!(a.score(), -0.4);
        assert_eq!(a.tier(), RiskTier::Low);
    }

    #[test]
    fn test_deterministic() {
        let classifier = RiskClassifier::new(Arc::new(Identity), Fixed::new(1.337));
        let first = classifier.classify(&patient()).expect("first");
        let second = classifier.classify(&patient()).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn test_offline_classifier() {
        let classifier: RiskClassifier<Identity, Fixed> =
            RiskClassifier::offline("model.json missing");
        assert!(!classifier.is_available());
        assert_eq!(classifier.offline_reason(), Some("model.json missing"));

        let err = classifier.classify(&patient()).expect_err("must fail");
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn test_offline_wins_over_invalid_features() {
        let classifier: RiskClassifier<Identity, Fixed> = RiskClassifier::offline("no model");
        let invalid = PatientFeatures {
            age: 0,
            ..patient()
        };

        let err = classifier.classify(&invalid).expect_err("must fail");
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn test_invalid_features_never_reach_model() {
        let model = Fixed::new(1.0);
        let classifier = RiskClassifier::new(Arc::new(Identity), Arc::clone(&model));
        let invalid = PatientFeatures {
            resting_bp: 250,
            ..patient()
        };

        let err = classifier.classify(&invalid).expect_err("must fail");
        assert!(err.is_validation());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_finite_prediction_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let classifier = RiskClassifier::new(Arc::new(Identity), Fixed::new(bad));
            let err = classifier.classify(&patient()).expect_err("must fail");
            assert!(matches!(err, CardioscoreError::InvalidPrediction(_)));
        }
    }

    #[test]
    fn test_trait_objects_injectable() {
        let scaler: Arc<dyn Scaler> = Arc::new(Identity);
        let model: Arc<dyn Regressor> = Fixed::new(0.5);
        let classifier: RiskClassifier<dyn Scaler, dyn Regressor> =
            RiskClassifier::new(scaler, model);
        assert_eq!(
            classifier.classify(&patient()).expect("classify").tier(),
            RiskTier::Low
        );
    }

    #[test]
    fn test_from_artifacts_failure_goes_offline() {
        let classifier = RiskClassifier::from_artifacts(Err(ArtifactError::Invalid(
            "no samples".into(),
        )));
        assert!(!classifier.is_available());
        assert!(classifier
            .classify(&patient())
            .expect_err("must fail")
            .is_model_unavailable());
    }
}
