//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema shared by training and serving.**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The version and the layout hash are stamped into every model artifact and
//! checked again when the inference engine loads it.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in the exact column order the pipeline is trained on
pub const FEATURE_LAYOUT: &[&str] = &[
    "Pregnancies",              // 0: Number of times pregnant
    "Glucose",                  // 1: Plasma glucose concentration
    "BloodPressure",            // 2: Diastolic blood pressure (mm Hg)
    "SkinThickness",            // 3: Triceps skinfold thickness (mm)
    "Insulin",                  // 4: 2-Hour serum insulin (mu U/ml)
    "BMI",                      // 5: Body mass index
    "DiabetesPedigreeFunction", // 6: Diabetes pedigree function
    "Age",                      // 7: Age in years
];

/// Total number of features
pub const FEATURE_COUNT: usize = 8;

/// Label column of the training table
pub const OUTCOME_COLUMN: &str = "Outcome";

/// Columns where a recorded zero is physiologically impossible and means "not measured"
pub const ZERO_AS_MISSING: &[usize] = &[1, 2, 3, 4, 5];

/// Feature vector in layout order
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

/// Get feature index by name (case-sensitive)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|f| *f == name)
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the version byte and the ordered, NUL-separated feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Layout stamp carried by persisted artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutStamp {
    pub version: u8,
    pub hash: u32,
}

impl LayoutStamp {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
        }
    }

    pub fn is_current(&self) -> bool {
        *self == Self::current()
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// One patient's measurements, named exactly as the training columns.
///
/// `pregnancies` and `age` are counts but stay `f64`, the type the model
/// consumes; the service checks they are whole and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Pregnancies")]
    pub pregnancies: f64,
    #[serde(rename = "Glucose")]
    pub glucose: f64,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: f64,
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: f64,
    #[serde(rename = "Insulin")]
    pub insulin: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree_function: f64,
    #[serde(rename = "Age")]
    pub age: f64,
}

impl PatientRecord {
    /// Feature vector in `FEATURE_LAYOUT` order
    pub fn to_features(&self) -> FeatureRow {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age,
        ]
    }
}

/// Scored output for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub prediction: u8,
}
