//! Patient request model

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use risk_core::schema::{PatientRecord, FEATURE_LAYOUT};

use crate::error::{AppError, AppResult, FieldError};

const INTEGER_FIELDS: [&str; 2] = ["Pregnancies", "Age"];

/// Body of `POST /predict`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PredictRequest {
    #[serde(rename = "Pregnancies")]
    #[validate(range(min = 0.0, message = "must be a whole number >= 0"))]
    pub pregnancies: f64,

    #[serde(rename = "Glucose")]
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub glucose: f64,

    #[serde(rename = "BloodPressure")]
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub blood_pressure: f64,

    #[serde(rename = "SkinThickness")]
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub skin_thickness: f64,

    #[serde(rename = "Insulin")]
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub insulin: f64,

    #[serde(rename = "BMI")]
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub bmi: f64,

    #[serde(rename = "DiabetesPedigreeFunction")]
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub diabetes_pedigree_function: f64,

    #[serde(rename = "Age")]
    #[validate(range(min = 0.0, message = "must be a whole number >= 0"))]
    pub age: f64,
}

/// Wire name for a struct field reported by the validator
pub fn wire_name(field: &str) -> &'static str {
    match field {
        "pregnancies" => "Pregnancies",
        "glucose" => "Glucose",
        "blood_pressure" => "BloodPressure",
        "skin_thickness" => "SkinThickness",
        "insulin" => "Insulin",
        "bmi" => "BMI",
        "diabetes_pedigree_function" => "DiabetesPedigreeFunction",
        "age" => "Age",
        _ => "body",
    }
}

/// Whole-valued JSON number; `35` and `35.0` both qualify
fn is_whole(n: &serde_json::Number) -> bool {
    n.as_f64().is_some_and(|v| v.is_finite() && v.fract() == 0.0)
}

/// Presence and primitive type of every field, in layout order
fn type_errors(body: &Value) -> Vec<FieldError> {
    let Some(object) = body.as_object() else {
        return vec![FieldError::new("body", "expected a JSON object")];
    };

    FEATURE_LAYOUT
        .iter()
        .filter_map(|&name| match object.get(name) {
            None => Some(FieldError::new(name, "field required")),
            Some(Value::Number(n)) if INTEGER_FIELDS.contains(&name) => {
                (!is_whole(n)).then(|| FieldError::new(name, "value is not a valid integer"))
            }
            Some(Value::Number(_)) => None,
            Some(_) => Some(FieldError::new(name, "value is not a valid number")),
        })
        .collect()
}

impl PredictRequest {
    /// Type-check, range-check and convert a raw JSON body.
    /// Unknown fields are ignored.
    pub fn parse(body: Value) -> AppResult<PatientRecord> {
        let errors = type_errors(&body);
        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        let request: PredictRequest = serde_json::from_value(body)
            .map_err(|e| AppError::ValidationError(vec![FieldError::new("body", e.to_string())]))?;
        request.validate()?;
        Ok(request.into_record())
    }

    fn into_record(self) -> PatientRecord {
        PatientRecord {
            pregnancies: self.pregnancies,
            glucose: self.glucose,
            blood_pressure: self.blood_pressure,
            skin_thickness: self.skin_thickness,
            insulin: self.insulin,
            bmi: self.bmi,
            diabetes_pedigree_function: self.diabetes_pedigree_function,
            age: self.age,
        }
    }
}
