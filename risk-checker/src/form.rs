//! Patient input form
//!
//! Advisory ranges are tighter than the service's validation, which only
//! rejects negative values.

use std::io::{BufRead, Write};

use risk_core::schema::FEATURE_COUNT;
use risk_core::PatientRecord;

use crate::error::CheckerError;

/// One prompt of the form
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub integer: bool,
}

/// Prompts in feature layout order
pub const FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec { name: "Pregnancies", label: "Pregnancies", min: 0.0, max: 20.0, default: 2.0, integer: true },
    FieldSpec { name: "Glucose", label: "Glucose", min: 0.0, max: 300.0, default: 120.0, integer: false },
    FieldSpec { name: "BloodPressure", label: "Blood Pressure (mm Hg)", min: 0.0, max: 200.0, default: 70.0, integer: false },
    FieldSpec { name: "SkinThickness", label: "Skin Thickness (mm)", min: 0.0, max: 100.0, default: 25.0, integer: false },
    FieldSpec { name: "Insulin", label: "Insulin (mu U/ml)", min: 0.0, max: 900.0, default: 80.0, integer: false },
    FieldSpec { name: "BMI", label: "BMI", min: 0.0, max: 80.0, default: 28.5, integer: false },
    FieldSpec { name: "DiabetesPedigreeFunction", label: "Diabetes Pedigree Function", min: 0.0, max: 5.0, default: 0.5, integer: false },
    FieldSpec { name: "Age", label: "Age", min: 0.0, max: 120.0, default: 35.0, integer: true },
];

impl FieldSpec {
    /// Blank input keeps the default
    pub fn parse(&self, input: &str) -> Result<f64, CheckerError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(self.default);
        }

        let invalid = |message: String| CheckerError::InvalidInput { field: self.name, message };

        let value: f64 = input
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a number", input)))?;
        if !value.is_finite() {
            return Err(invalid(format!("'{}' is not a number", input)));
        }
        if self.integer && value.fract() != 0.0 {
            return Err(invalid(format!("{} must be a whole number", value)));
        }
        if value < self.min || value > self.max {
            return Err(invalid(format!("{} is outside {}-{}", value, self.min, self.max)));
        }
        Ok(value)
    }

    fn prompt(&self) -> String {
        if self.integer {
            format!("{} [{}-{}] ({}): ", self.label, self.min, self.max, self.default)
        } else {
            format!("{} [{}-{}] ({:.2}): ", self.label, self.min, self.max, self.default)
        }
    }
}

/// Values in layout order
pub fn record_from_values(values: [f64; FEATURE_COUNT]) -> PatientRecord {
    PatientRecord {
        pregnancies: values[0],
        glucose: values[1],
        blood_pressure: values[2],
        skin_thickness: values[3],
        insulin: values[4],
        bmi: values[5],
        diabetes_pedigree_function: values[6],
        age: values[7],
    }
}

pub fn default_record() -> PatientRecord {
    record_from_values(FIELDS.map(|f| f.default))
}

/// Ask for every field, re-prompting on invalid input.
/// Returns `None` when input ends before the form is complete.
pub fn read_record<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<PatientRecord>, CheckerError> {
    let mut values = [0.0; FEATURE_COUNT];

    for (slot, field) in values.iter_mut().zip(FIELDS.iter()) {
        loop {
            write!(output, "{}", field.prompt())?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match field.parse(&line) {
                Ok(value) => {
                    *slot = value;
                    break;
                }
                Err(e) => writeln!(output, "  {}", e)?,
            }
        }
    }

    Ok(Some(record_from_values(values)))
}
