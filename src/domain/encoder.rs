//! Feature encoder: raw caller inputs to a validated [`PatientFeatures`].
//!
//! Values outside a field's domain are rejected, never clamped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::{Categorical, ChestPainType, RestingEcg, Sex, StSlope, Thalassemia, YesNo};
use super::patient::{Field, PatientFeatures, FEATURE_COUNT};

/// A raw input value: a number, or a label such as `"Typical Angina"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Label(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Label(v.to_string())
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(s) => write!(f, "{s:?}"),
        }
    }
}

/// Caller request: field name to raw value.
pub type RawInputs = BTreeMap<String, RawValue>;

/// Input validation failure. Always names the offending field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: value is required")]
    Missing { field: Field },

    #[error("{name}: unknown field")]
    UnknownField { name: String },

    #[error("{field}: value must be a finite number")]
    NonFinite { field: Field },

    #[error("{field}: {value} is not a whole number")]
    NotInteger { field: Field, value: f64 },

    #[error("{field}: {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: Field,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field}: {value} is not a valid code (expected one of {allowed})")]
    InvalidCode {
        field: Field,
        value: f64,
        allowed: String,
    },

    #[error("{field}: unrecognized value {label:?}")]
    UnknownLabel { field: Field, label: String },
}

impl ValidationError {
    /// The offending field, when it is one of the canonical fields.
    #[must_use]
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::UnknownField { .. } => None,
            Self::Missing { field }
            | Self::NonFinite { field }
            | Self::NotInteger { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidCode { field, .. }
            | Self::UnknownLabel { field, .. } => Some(*field),
        }
    }

    /// Name of the offending field as supplied by the caller.
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::UnknownField { name } => name.as_str(),
            other => other.field().map_or("", Field::name),
        }
    }
}

/// Encode raw caller inputs into validated features.
///
/// Every canonical field must be present; unknown keys are rejected.
/// Fields are checked in canonical order and the first failure is returned.
///
/// # Errors
/// Returns `ValidationError` naming the offending field.
pub fn encode(inputs: &RawInputs) -> Result<PatientFeatures, ValidationError> {
    if let Some(name) = inputs.keys().find(|k| Field::from_name(k).is_none()) {
        return Err(ValidationError::UnknownField { name: name.clone() });
    }

    let features = decode_with(|field| inputs.get(field.name()))?;
    tracing::debug!("Encoded {} features", FEATURE_COUNT);
    Ok(features)
}

impl PatientFeatures {
    /// Create features from an already-numeric vector in canonical order.
    ///
    /// # Errors
    /// Returns `ValidationError` if any value is outside its domain.
    pub fn from_array(values: &[f64; FEATURE_COUNT]) -> Result<Self, ValidationError> {
        let raw: Vec<RawValue> = values.iter().map(|&v| RawValue::Number(v)).collect();
        decode_with(|field| raw.get(field.index()))
    }
}

fn decode_with<'a, F>(lookup: F) -> Result<PatientFeatures, ValidationError>
where
    F: Fn(Field) -> Option<&'a RawValue>,
{
    let get = |field: Field| lookup(field).ok_or(ValidationError::Missing { field });

    Ok(PatientFeatures {
        age: integer(Field::Age, get(Field::Age)?)? as u8,
        sex: category::<Sex>(Field::Sex, get(Field::Sex)?)?,
        chest_pain_type: category::<ChestPainType>(
            Field::ChestPainType,
            get(Field::ChestPainType)?,
        )?,
        resting_bp: integer(Field::RestingBp, get(Field::RestingBp)?)? as u16,
        cholesterol: integer(Field::Cholesterol, get(Field::Cholesterol)?)? as u16,
        fasting_blood_sugar: category::<YesNo>(
            Field::FastingBloodSugar,
            get(Field::FastingBloodSugar)?,
        )?,
        resting_ecg: category::<RestingEcg>(Field::RestingEcg, get(Field::RestingEcg)?)?,
        max_heart_rate: integer(Field::MaxHeartRate, get(Field::MaxHeartRate)?)? as u16,
        exercise_angina: category::<YesNo>(Field::ExerciseAngina, get(Field::ExerciseAngina)?)?,
        st_depression: bounded(Field::StDepression, get(Field::StDepression)?)?,
        st_slope: category::<StSlope>(Field::StSlope, get(Field::StSlope)?)?,
        major_vessels: integer(Field::MajorVessels, get(Field::MajorVessels)?)? as u8,
        thalassemia: category::<Thalassemia>(Field::Thalassemia, get(Field::Thalassemia)?)?,
    })
}

/// Numeric value of a raw input; numeric strings are accepted.
fn number(field: Field, value: &RawValue) -> Result<f64, ValidationError> {
    let n = match value {
        RawValue::Number(n) => *n,
        RawValue::Label(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::UnknownLabel {
                field,
                label: s.clone(),
            })?,
    };
    if !n.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    Ok(n)
}

fn bounded(field: Field, value: &RawValue) -> Result<f64, ValidationError> {
    let n = number(field, value)?;
    let (min, max) = field.bounds().unwrap_or((f64::MIN, f64::MAX));
    if n < min || n > max {
        return Err(ValidationError::OutOfRange {
            field,
            value: n,
            min,
            max,
        });
    }
    Ok(n)
}

fn integer(field: Field, value: &RawValue) -> Result<i64, ValidationError> {
    let n = number(field, value)?;
    if n.fract() != 0.0 {
        return Err(ValidationError::NotInteger { field, value: n });
    }
    bounded(field, &RawValue::Number(n)).map(|n| n as i64)
}

fn category<C: Categorical>(field: Field, value: &RawValue) -> Result<C, ValidationError> {
    if let RawValue::Label(label) = value {
        if let Some(c) = C::from_label(label) {
            return Ok(c);
        }
    }

    let n = number(field, value)?;
    if n.fract() != 0.0 {
        return Err(ValidationError::NotInteger { field, value: n });
    }
    C::from_code(n).ok_or_else(|| ValidationError::InvalidCode {
        field,
        value: n,
        allowed: C::allowed_codes(),
    })
}
