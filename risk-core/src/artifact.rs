//! Artifact storage - the persisted model/threshold pair
//!
//! Training writes both files through temporary siblings and renames them
//! only after both are fully on disk. The previous model is kept as a
//! `.bak` sibling until both renames succeed. Loading validates the layout stamp,
//! the pipeline structure and the threshold range.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::model::ModelFamily;
use crate::pipeline::FittedPipeline;
use crate::schema::{LayoutStamp, FEATURE_LAYOUT};
use crate::threshold::{DecisionThreshold, ThresholdFile, ThresholdSource};

pub const MODEL_FILE: &str = "diabetes_model.json";
pub const THRESHOLD_FILE: &str = "diabetes_threshold.json";
pub const REPORT_FILE: &str = "training_report.json";

/// Persisted pipeline plus the metadata needed to trust it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub layout: LayoutStamp,
    pub feature_names: Vec<String>,
    pub family: ModelFamily,
    pub threshold_source: ThresholdSource,
    pub trained_at: DateTime<Utc>,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    pub fn new(pipeline: FittedPipeline, threshold_source: ThresholdSource) -> Self {
        Self {
            layout: LayoutStamp::current(),
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            family: pipeline.family(),
            threshold_source,
            trained_at: Utc::now(),
            pipeline,
        }
    }

    /// Layout, family tag and pipeline structure all agree
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let current = LayoutStamp::current();
        if self.layout != current {
            return Err(ArtifactError::LayoutMismatch {
                expected_version: current.version,
                expected_hash: current.hash,
                actual_version: self.layout.version,
                actual_hash: self.layout.hash,
            });
        }
        if self.family != self.pipeline.family() {
            return Err(ArtifactError::Inconsistent(format!(
                "artifact tagged {} but holds a {} pipeline",
                self.family,
                self.pipeline.family()
            )));
        }
        self.pipeline.validate()
    }
}

/// Locations of the artifact pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub threshold: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE),
            threshold: dir.join(THRESHOLD_FILE),
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err(path))
}

/// Write both artifacts; neither final path changes unless both temp files were written
pub fn save_pair(paths: &ArtifactPaths, model: &ModelArtifact, threshold: DecisionThreshold) -> Result<(), ArtifactError> {
    model.validate()?;

    for path in [&paths.model, &paths.threshold] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
    }

    let model_tmp = sibling(&paths.model, ".tmp");
    let threshold_tmp = sibling(&paths.threshold, ".tmp");
    let model_bak = sibling(&paths.model, ".bak");

    let staged = write_json(&model_tmp, model)
        .and_then(|_| write_json(&threshold_tmp, &ThresholdFile { threshold }));
    if let Err(e) = staged {
        let _ = fs::remove_file(&model_tmp);
        let _ = fs::remove_file(&threshold_tmp);
        return Err(e);
    }

    let had_previous = paths.model.exists();
    if had_previous {
        if let Err(e) = fs::copy(&paths.model, &model_bak) {
            let _ = fs::remove_file(&model_tmp);
            let _ = fs::remove_file(&threshold_tmp);
            return Err(io_err(&model_bak)(e));
        }
    }

    if let Err(e) = fs::rename(&model_tmp, &paths.model) {
        let _ = fs::remove_file(&model_tmp);
        let _ = fs::remove_file(&threshold_tmp);
        let _ = fs::remove_file(&model_bak);
        return Err(io_err(&paths.model)(e));
    }

    if let Err(e) = fs::rename(&threshold_tmp, &paths.threshold) {
        let _ = fs::remove_file(&threshold_tmp);
        restore_model(&paths.model, &model_bak, had_previous);
        return Err(io_err(&paths.threshold)(e));
    }

    if had_previous {
        if let Err(e) = fs::remove_file(&model_bak) {
            log::warn!("Could not remove {}: {}", model_bak.display(), e);
        }
    }

    log::info!(
        "Saved {} model to {} (threshold {:.4} -> {})",
        model.family,
        paths.model.display(),
        threshold.value(),
        paths.threshold.display()
    );
    Ok(())
}

/// Put the previous model back after a failed threshold rename
fn restore_model(model: &Path, backup: &Path, had_previous: bool) {
    let restored = if had_previous {
        fs::rename(backup, model)
    } else {
        fs::remove_file(model)
    };
    match restored {
        Ok(()) => log::error!("Threshold write failed; restored previous model at {}", model.display()),
        Err(e) => log::error!(
            "Threshold write failed and {} could not be restored ({}); model and threshold no longer match",
            model.display(),
            e
        ),
    }
}

/// Write any serializable summary next to the artifacts
pub fn save_report<T: Serialize>(path: &Path, report: &T) -> Result<(), ArtifactError> {
    write_json(path, report)
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(io_err(path))
}

/// Load and validate the model artifact
pub fn load_model(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let data = read(path)?;
    let artifact: ModelArtifact = serde_json::from_slice(&data).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    artifact.validate()?;
    Ok(artifact)
}

#[derive(Deserialize)]
struct RawThreshold {
    threshold: f64,
}

/// Load the `{"threshold": <float>}` document
pub fn load_threshold(path: &Path) -> Result<DecisionThreshold, ArtifactError> {
    let data = read(path)?;
    let raw: RawThreshold = serde_json::from_slice(&data).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    DecisionThreshold::new(raw.threshold)
}
