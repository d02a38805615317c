//! Diabetes Risk Core
//!
//! Everything shared by the training program, the HTTP service and the
//! terminal front end:
//! - `schema` / `dataset` - feature layout, wire record, CSV loading and splits
//! - `preprocess` / `model` / `pipeline` - estimators and the fitted chain
//! - `metrics` / `search` / `threshold` / `selection` - evaluation and tuning
//! - `artifact` / `training` - persisted pair and the batch run
//! - `inference` / `explain` - online scoring and cut-off explanations

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod explain;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod schema;
pub mod search;
pub mod selection;
pub mod threshold;
pub mod training;

pub use error::{ArtifactError, MetricsError, TrainingError, TrainingResult};
pub use explain::{explain, Reason, RiskLevel};
pub use inference::InferenceEngine;
pub use schema::{PatientRecord, PredictionResult, FEATURE_LAYOUT};
pub use threshold::DecisionThreshold;
