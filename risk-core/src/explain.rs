//! Risk explanation from clinical cut-offs
//!
//! Independent of the fitted model: each rule inspects one input against a
//! commonly used clinical threshold. The output is guidance, not attribution.

use serde::{Deserialize, Serialize};

use crate::schema::PatientRecord;

pub const MAX_REASONS: usize = 5;

pub const EXPLANATION_CAPTION: &str =
    "Note: this explanation is based on common clinical cut-offs, not a guaranteed model attribution";

const NO_SIGNAL: &str =
    "No obvious high-risk signals based on typical cut-offs; risk may be driven by combinations of factors.";

/// Coarse band for a predicted probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    LowModerate,
    ModerateHigh,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.2 {
            Self::VeryLow
        } else if probability < 0.4 {
            Self::LowModerate
        } else if probability < 0.6 {
            Self::ModerateHigh
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very low",
            Self::LowModerate => "Low-moderate",
            Self::ModerateHigh => "Moderate-high",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One triggered rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reason {
    /// Wire name of the field, `None` for the fallback line
    pub feature: Option<&'static str>,
    pub message: &'static str,
}

impl Reason {
    fn on(feature: &'static str, message: &'static str) -> Self {
        Self { feature: Some(feature), message }
    }
}

/// Reasons in rule order, at most `MAX_REASONS`; never empty
pub fn explain(record: &PatientRecord) -> Vec<Reason> {
    let mut reasons = Vec::new();

    if record.glucose >= 140.0 {
        reasons.push(Reason::on("Glucose", "Glucose is high (>=140), which strongly increases risk."));
    } else if record.glucose >= 110.0 {
        reasons.push(Reason::on("Glucose", "Glucose is elevated (110-139), which increases risk."));
    }

    if record.bmi >= 30.0 {
        reasons.push(Reason::on("BMI", "BMI is in the obese range (>=30), which increases risk."));
    } else if record.bmi >= 25.0 {
        reasons.push(Reason::on("BMI", "BMI is above the healthy range (>=25), which can increase risk."));
    }

    if record.age >= 35.0 {
        reasons.push(Reason::on("Age", "Age is 35+, which increases baseline risk."));
    }

    if record.diabetes_pedigree_function >= 0.8 {
        reasons.push(Reason::on(
            "DiabetesPedigreeFunction",
            "Family-history proxy (DPF) is relatively high, increasing risk.",
        ));
    }

    if record.blood_pressure >= 90.0 {
        reasons.push(Reason::on(
            "BloodPressure",
            "Blood pressure is high (>=90 diastolic), which can correlate with metabolic risk.",
        ));
    }

    if reasons.is_empty() {
        reasons.push(Reason { feature: None, message: NO_SIGNAL });
    }

    reasons.truncate(MAX_REASONS);
    reasons
}
