//! Training configuration

use std::env;
use std::path::PathBuf;

use crate::artifact::{ArtifactPaths, REPORT_FILE};
use crate::error::{TrainingError, TrainingResult};

/// Training run configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Labelled CSV with the eight features plus Outcome
    pub data_path: PathBuf,

    /// Directory receiving the model/threshold pair and the report
    pub artifact_dir: PathBuf,

    /// Seed for the split and the CV folds
    pub seed: u64,

    /// Fraction of rows held out for the final comparison
    pub test_size: f64,

    /// Number of cross-validation folds
    pub cv_folds: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/diabetes.csv"),
            artifact_dir: PathBuf::from("train/artifacts"),
            seed: 42,
            test_size: 0.2,
            cv_folds: 5,
        }
    }
}

impl TrainingConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_path: env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),

            artifact_dir: env::var("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),

            seed: env::var("RANDOM_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seed),

            test_size: env::var("TEST_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.test_size),

            cv_folds: env::var("CV_FOLDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cv_folds),
        }
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(TrainingError::InvalidConfig(format!(
                "TEST_SIZE must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(TrainingError::InvalidConfig(format!(
                "CV_FOLDS must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.artifact_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.artifact_dir.join(REPORT_FILE)
    }
}
