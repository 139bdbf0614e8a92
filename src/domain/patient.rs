//! Patient feature vector for cardiac severity scoring.
//!
//! Based on the 13 UCI heart-disease attributes.

use serde::{Deserialize, Serialize};

use super::category::{Categorical, ChestPainType, RestingEcg, Sex, StSlope, Thalassemia, YesNo};
use super::encoder::ValidationError;

/// Number of features the model contract requires.
pub const FEATURE_COUNT: usize = 13;

/// One of the 13 clinical inputs, in canonical model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Sex,
    ChestPainType,
    RestingBp,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    StDepression,
    StSlope,
    MajorVessels,
    Thalassemia,
}

impl Field {
    /// All fields in canonical order.
    ///
    /// This MUST match the column order the scaler and model were fitted on.
    /// Nothing at runtime can detect a reordering.
    pub const ALL: [Field; FEATURE_COUNT] = [
        Field::Age,
        Field::Sex,
        Field::ChestPainType,
        Field::RestingBp,
        Field::Cholesterol,
        Field::FastingBloodSugar,
        Field::RestingEcg,
        Field::MaxHeartRate,
        Field::ExerciseAngina,
        Field::StDepression,
        Field::StSlope,
        Field::MajorVessels,
        Field::Thalassemia,
    ];

    /// Request key for this field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Sex => "sex",
            Self::ChestPainType => "chest_pain_type",
            Self::RestingBp => "resting_bp",
            Self::Cholesterol => "cholesterol",
            Self::FastingBloodSugar => "fasting_blood_sugar",
            Self::RestingEcg => "resting_ecg",
            Self::MaxHeartRate => "max_heart_rate",
            Self::ExerciseAngina => "exercise_angina",
            Self::StDepression => "st_depression",
            Self::StSlope => "st_slope",
            Self::MajorVessels => "major_vessels",
            Self::Thalassemia => "thalassemia",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Position in the feature vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inclusive bounds for numeric fields. Categorical fields return `None`.
    #[must_use]
    pub fn bounds(self) -> Option<(f64, f64)> {
        match self {
            Self::Age => Some((1.0, 120.0)),
            Self::RestingBp => Some((80.0, 200.0)),
            Self::Cholesterol => Some((100.0, 600.0)),
            Self::MaxHeartRate => Some((60.0, 220.0)),
            Self::StDepression => Some((0.0, 10.0)),
            Self::MajorVessels => Some((0.0, 3.0)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated clinical features for one patient.
///
/// Built by [`encode`](super::encode) or [`PatientFeatures::from_array`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatures {
    /// Age in years (1-120)
    pub age: u8,

    pub sex: Sex,

    pub chest_pain_type: ChestPainType,

    /// Resting blood pressure in mmHg (80-200)
    pub resting_bp: u16,

    /// Serum cholesterol in mg/dl (100-600)
    pub cholesterol: u16,

    /// Fasting blood sugar > 120 mg/dl
    pub fasting_blood_sugar: YesNo,

    pub resting_ecg: RestingEcg,

    /// Maximum heart rate achieved (60-220)
    pub max_heart_rate: u16,

    /// Exercise induced angina
    pub exercise_angina: YesNo,

    /// ST depression induced by exercise relative to rest (0.0-10.0)
    pub st_depression: f64,

    pub st_slope: StSlope,

    /// Major vessels colored by fluoroscopy (0-3)
    pub major_vessels: u8,

    pub thalassemia: Thalassemia,
}

/// A normalized indicator for the feature profile view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileIndicator {
    pub label: &'static str,
    /// Value scaled to roughly [0, 1]
    pub value: f64,
}

impl PatientFeatures {
    /// Convert features to the model's input vector, in canonical order.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.age),
            f64::from(self.sex.code()),
            f64::from(self.chest_pain_type.code()),
            f64::from(self.resting_bp),
            f64::from(self.cholesterol),
            f64::from(self.fasting_blood_sugar.code()),
            f64::from(self.resting_ecg.code()),
            f64::from(self.max_heart_rate),
            f64::from(self.exercise_angina.code()),
            self.st_depression,
            f64::from(self.st_slope.code()),
            f64::from(self.major_vessels),
            f64::from(self.thalassemia.code()),
        ]
    }

    /// Re-check numeric ranges.
    ///
    /// Fields are public, so a hand-built value may violate them.
    ///
    /// # Errors
    /// Returns the first out-of-range field in canonical order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let values = self.to_array();
        for field in Field::ALL {
            let Some((min, max)) = field.bounds() else {
                continue;
            };
            let value = values[field.index()];
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field });
            }
            if value < min || value > max {
                return Err(ValidationError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Normalized feature profile (age, cholesterol, blood pressure, heart rate,
    /// ST depression, vessels).
    #[must_use]
    pub fn profile(&self) -> Vec<ProfileIndicator> {
        vec![
            ProfileIndicator {
                label: "Age",
                value: f64::from(self.age) / 100.0,
            },
            ProfileIndicator {
                label: "Cholesterol",
                value: f64::from(self.cholesterol) / 600.0,
            },
            ProfileIndicator {
                label: "Blood Pressure",
                value: f64::from(self.resting_bp) / 200.0,
            },
            ProfileIndicator {
                label: "Heart Rate",
                value: f64::from(self.max_heart_rate) / 220.0,
            },
            ProfileIndicator {
                label: "Oldpeak",
                value: self.st_depression / 10.0,
            },
            ProfileIndicator {
                label: "Vessels",
                value: f64::from(self.major_vessels) / 3.0,
            },
        ]
    }
}

/// Feature names in canonical order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "chest_pain_type",
    "resting_bp",
    "cholesterol",
    "fasting_blood_sugar",
    "resting_ecg",
    "max_heart_rate",
    "exercise_angina",
    "st_depression",
    "st_slope",
    "major_vessels",
    "thalassemia",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatientFeatures {
        PatientFeatures {
            age: 45,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::TypicalAngina,
            resting_bp: 120,
            cholesterol: 200,
            fasting_blood_sugar: YesNo::No,
            resting_ecg: RestingEcg::Normal,
            max_heart_rate: 150,
            exercise_angina: YesNo::No,
            st_depression: 1.0,
            st_slope: StSlope::Upsloping,
            major_vessels: 0,
            thalassemia: Thalassemia::Normal,
        }
    }

    #[test]
    fn test_features_to_array() {
        let v = sample().to_array();
        assert_eq!(v.len(), FEATURE_COUNT);
        assert_eq!(
            v,
            [45.0, 1.0, 0.0, 120.0, 200.0, 0.0, 0.0, 150.0, 0.0, 1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_field_names_match_canonical_order() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(field.name(), FEATURE_NAMES[i]);
            assert_eq!(Field::from_name(field.name()), Some(*field));
        }
        assert_eq!(Field::from_name("trestbps"), None);
    }

    #[test]
    fn test_validation() {
        assert!(sample().validate().is_ok());

        let invalid = PatientFeatures {
            age: 0,
            ..sample()
        };
        let err = invalid.validate().expect_err("age 0 must fail");
        assert_eq!(err.field(), Some(Field::Age));

        let invalid = PatientFeatures {
            st_depression: f64::NAN,
            ..sample()
        };
        assert!(matches!(
            invalid.validate(),
            Err(ValidationError::NonFinite {
                field: Field::StDepression
            })
        ));
    }

    #[test]
    fn test_profile() {
        let profile = sample().profile();
        assert_eq!(profile.len(), 6);
        assert_eq!(profile[0].label, "Age");
        assert!((profile[0].value - 0.45).abs() < 1e-12);
        assert!((profile[1].value - 200.0 / 600.0).abs() < 1e-12);
        assert!((profile[5].value - 0.0).abs() < f64::EPSILON);
    }
}
