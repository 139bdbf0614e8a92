//! Categorical clinical inputs and their canonical numeric codes.
//!
//! Every labelled field has exactly one code mapping, shared by all callers.
//! The codes are the ones the deployed scaler/model were fitted on.

use serde::{Deserialize, Serialize};

/// A categorical input with a fixed label-to-code table.
pub trait Categorical: Copy + PartialEq + Sized + 'static {
    /// `(variant, code, accepted labels)`; the first label is the display label.
    const TABLE: &'static [(Self, u8, &'static [&'static str])];

    /// Numeric code fed to the model.
    #[must_use]
    fn code(self) -> u8 {
        Self::TABLE
            .iter()
            .find(|(variant, _, _)| *variant == self)
            .map_or(0, |(_, code, _)| *code)
    }

    /// Human-readable label.
    #[must_use]
    fn label(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(variant, _, _)| *variant == self)
            .and_then(|(_, _, labels)| labels.first().copied())
            .unwrap_or("")
    }

    /// Look up a variant by its numeric code.
    #[must_use]
    fn from_code(code: f64) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, c, _)| f64::from(*c) == code)
            .map(|(variant, _, _)| *variant)
    }

    /// Look up a variant by label. Case, `-`/`_` and surrounding whitespace are ignored.
    #[must_use]
    fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize_label(label);
        Self::TABLE
            .iter()
            .find(|(_, _, labels)| labels.iter().any(|l| normalize_label(l) == wanted))
            .map(|(variant, _, _)| *variant)
    }

    /// Comma-separated list of valid codes, for error messages.
    #[must_use]
    fn allowed_codes() -> String {
        Self::TABLE
            .iter()
            .map(|(_, code, _)| code.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Biological sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Categorical for Sex {
    const TABLE: &'static [(Self, u8, &'static [&'static str])] =
        &[(Self::Female, 0, &["Female", "F"]), (Self::Male, 1, &["Male", "M"])];
}

/// Chest pain type (`cp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChestPainType {
    TypicalAngina,
    AtypicalAngina,
    NonAnginalPain,
    Asymptomatic,
}

impl Categorical for ChestPainType {
    const TABLE: &'static [(Self, u8, &'static [&'static str])] = &[
        (Self::TypicalAngina, 0, &["Typical Angina", "Typical"]),
        (Self::AtypicalAngina, 1, &["Atypical Angina", "Atypical"]),
        (Self::NonAnginalPain, 2, &["Non-Anginal Pain", "Non-Anginal"]),
        (Self::Asymptomatic, 3, &["Asymptomatic"]),
    ];
}

/// Resting electrocardiogram result (`restecg`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestingEcg {
    Normal,
    StTAbnormality,
    LeftVentricularHypertrophy,
}

impl Categorical for RestingEcg {
    const TABLE: &'static [(Self, u8, &'static [&'static str])] = &[
        (Self::Normal, 0, &["Normal"]),
        (
            Self::StTAbnormality,
            1,
            &["ST-T Wave Abnormality", "ST-T Abnormality"],
        ),
        (
            Self::LeftVentricularHypertrophy,
            2,
            &["Left Ventricular Hypertrophy", "LVH"],
        ),
    ];
}

/// Slope of the peak exercise ST segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StSlope {
    Upsloping,
    Flat,
    Downsloping,
}

impl Categorical for StSlope {
    const TABLE: &'static [(Self, u8, &'static [&'static str])] = &[
        (Self::Upsloping, 0, &["Upsloping", "Up"]),
        (Self::Flat, 1, &["Flat"]),
        (Self::Downsloping, 2, &["Downsloping", "Down"]),
    ];
}

/// Thalassemia test result. Canonical domain is {1, 2, 3}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Thalassemia {
    Normal,
    FixedDefect,
    ReversibleDefect,
}

impl Categorical for Thalassemia {
    const TABLE: &'static [(Self, u8, &'static [&'static str])] = &[
        (Self::Normal, 1, &["Normal"]),
        (Self::FixedDefect, 2, &["Fixed Defect", "Fixed"]),
        (
            Self::ReversibleDefect,
            3,
            &["Reversible Defect", "Reversable Defect", "Reversible"],
        ),
    ];
}

/// Binary yes/no input (exercise angina, fasting blood sugar > 120 mg/dl).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    No,
    Yes,
}

impl Categorical for YesNo {
    const TABLE: &'static [(Self, u8, &'static [&'static str])] =
        &[(Self::No, 0, &["No", "False"]), (Self::Yes, 1, &["Yes", "True"])];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::Male.code(), 1);
        assert_eq!(Sex::Female.code(), 0);
        assert_eq!(Sex::from_label("Male"), Some(Sex::Male));
        assert_eq!(Sex::from_label("female"), Some(Sex::Female));
    }

    #[test]
    fn test_label_normalization() {
        assert_eq!(
            ChestPainType::from_label("non_anginal   pain"),
            Some(ChestPainType::NonAnginalPain)
        );
        assert_eq!(
            RestingEcg::from_label(" st-t wave abnormality "),
            Some(RestingEcg::StTAbnormality)
        );
        assert_eq!(ChestPainType::from_label("Angina-ish"), None);
    }

    #[test]
    fn test_thalassemia_domain_excludes_zero() {
        assert_eq!(Thalassemia::from_code(0.0), None);
        assert_eq!(Thalassemia::from_code(1.0), Some(Thalassemia::Normal));
        assert_eq!(Thalassemia::from_code(3.0), Some(Thalassemia::ReversibleDefect));
        assert_eq!(Thalassemia::allowed_codes(), "1, 2, 3");
    }

    #[test]
    fn test_codes_are_unique_per_table() {
        fn unique<C: Categorical>() -> bool {
            let mut codes: Vec<u8> = C::TABLE.iter().map(|(_, c, _)| *c).collect();
            let n = codes.len();
            codes.sort_unstable();
            codes.dedup();
            codes.len() == n
        }
        assert!(unique::<Sex>());
        assert!(unique::<ChestPainType>());
        assert!(unique::<RestingEcg>());
        assert!(unique::<StSlope>());
        assert!(unique::<Thalassemia>());
        assert!(unique::<YesNo>());
    }

    #[test]
    fn test_display_label() {
        assert_eq!(StSlope::Flat.label(), "Flat");
        assert_eq!(YesNo::Yes.label(), "Yes");
    }
}
