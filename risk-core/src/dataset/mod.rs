//! Dataset Module - training table loading and cleaning
//!
//! Reads the labelled CSV into a feature matrix in `FEATURE_LAYOUT` order plus
//! a binary outcome vector, and masks physiologically impossible zeros as
//! missing (NaN) so the imputer replaces them instead of learning from them.

pub mod split;


use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayViewMut2, Axis};
use serde::Deserialize;

use crate::error::{TrainingError, TrainingResult};
use crate::schema::{feature_name, FEATURE_COUNT, ZERO_AS_MISSING};

pub use split::{stratified_kfold, stratified_split, Fold, Partition};

/// One CSV row as written by the data source
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Pregnancies")]
    pregnancies: f64,
    #[serde(rename = "Glucose")]
    glucose: f64,
    #[serde(rename = "BloodPressure")]
    blood_pressure: f64,
    #[serde(rename = "SkinThickness")]
    skin_thickness: f64,
    #[serde(rename = "Insulin")]
    insulin: f64,
    #[serde(rename = "BMI")]
    bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    diabetes_pedigree_function: f64,
    #[serde(rename = "Age")]
    age: f64,
    #[serde(rename = "Outcome")]
    outcome: f64,
}

impl RawRow {
    fn features(&self) -> [f64; FEATURE_COUNT] {
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

/// Feature matrix plus binary labels, row-aligned
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    pub features: Array2<f64>,
    pub outcome: Array1<u8>,
}

impl TrainingDataset {
    pub fn new(features: Array2<f64>, outcome: Array1<u8>) -> Self {
        debug_assert_eq!(features.nrows(), outcome.len());
        debug_assert_eq!(features.ncols(), FEATURE_COUNT);
        Self { features, outcome }
    }

    /// Load the labelled CSV from disk
    pub fn from_csv_path(path: &Path) -> TrainingResult<Self> {
        let file = File::open(path).map_err(|source| TrainingError::DatasetIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    /// Load the labelled CSV from any reader (header row required)
    pub fn from_csv_reader<R: Read>(reader: R) -> TrainingResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut values = Vec::new();
        let mut outcome = Vec::new();

        for (row, result) in rdr.deserialize::<RawRow>().enumerate() {
            let raw = result?;
            let label = match raw.outcome {
                v if v == 0.0 => 0u8,
                v if v == 1.0 => 1u8,
                value => return Err(TrainingError::InvalidOutcome { row: row + 1, value }),
            };
            values.extend_from_slice(&raw.features());
            outcome.push(label);
        }

        if outcome.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let rows = outcome.len();
        let features = Array2::from_shape_vec((rows, FEATURE_COUNT), values)
            .map_err(|e| TrainingError::InvalidConfig(format!("feature matrix shape: {}", e)))?;

        Ok(Self::new(features, Array1::from(outcome)))
    }

    pub fn len(&self) -> usize {
        self.outcome.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }

    /// Number of positive rows
    pub fn positives(&self) -> usize {
        self.outcome.iter().filter(|&&y| y == 1).count()
    }

    /// Rows at the given indices, in the given order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            outcome: self.outcome.select(Axis(0), indices),
        }
    }

    /// Replace impossible zeros with NaN; returns the per-column count masked
    pub fn clean(&mut self) -> [usize; FEATURE_COUNT] {
        let masked = mask_impossible_zeros(self.features.view_mut());
        for (col, &count) in masked.iter().enumerate() {
            if count > 0 {
                log::info!(
                    "Marked {} zero values as missing in {}",
                    count,
                    feature_name(col).unwrap_or("unknown")
                );
            }
        }
        masked
    }
}

/// Set zeros in the `ZERO_AS_MISSING` columns to NaN, in place
pub fn mask_impossible_zeros(mut features: ArrayViewMut2<f64>) -> [usize; FEATURE_COUNT] {
    let mut masked = [0usize; FEATURE_COUNT];
    for &col in ZERO_AS_MISSING {
        for value in features.column_mut(col).iter_mut() {
            if *value == 0.0 {
                *value = f64::NAN;
                masked[col] += 1;
            }
        }
    }
    masked
}
