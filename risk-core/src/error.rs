//! Error types for training, metrics and artifact I/O

use std::path::PathBuf;

use thiserror::Error;

/// Failures computing ranking metrics
#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("only one class present in labels; ROC AUC is undefined")]
    SingleClass,

    #[error("labels and scores differ in length ({labels} vs {scores})")]
    LengthMismatch { labels: usize, scores: usize },

    #[error("no finite, non-degenerate cutoff on the ROC curve")]
    NoValidCutoff,
}

/// Failures that abort a training run before anything is written
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to read dataset {path}: {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid outcome {value} on data row {row}; expected 0 or 1")]
    InvalidOutcome { row: usize, value: f64 },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("feature '{0}' has no observed values to impute from")]
    EmptyFeature(&'static str),

    #[error("class {class} has {count} samples, fewer than the {required} required")]
    TooFewSamples { class: u8, count: usize, required: usize },

    #[error("hyperparameter grid is empty")]
    EmptyGrid,

    #[error("degenerate validation fold {fold}: {source}")]
    DegenerateFold {
        fold: usize,
        #[source]
        source: MetricsError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Failures reading or writing the persisted model/threshold pair
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt artifact {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact layout mismatch: expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})")]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("model artifact is inconsistent: {0}")]
    Inconsistent(String),
}

pub type TrainingResult<T> = Result<T, TrainingError>;
