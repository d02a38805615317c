//! Inference Engine
//!
//! Loads the persisted pipeline and threshold once, then scores records.
//! Nothing is mutated after load, so the engine can be shared freely.

use std::path::Path;

use crate::artifact::{load_model, load_threshold, ModelArtifact};
use crate::error::ArtifactError;
use crate::model::ModelFamily;
use crate::schema::{PatientRecord, PredictionResult};
use crate::threshold::DecisionThreshold;

#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifact: ModelArtifact,
    threshold: DecisionThreshold,
}

impl InferenceEngine {
    pub fn new(artifact: ModelArtifact, threshold: DecisionThreshold) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self { artifact, threshold })
    }

    /// Load both artifacts; any problem with either is fatal
    pub fn load(model_path: &Path, threshold_path: &Path) -> Result<Self, ArtifactError> {
        log::info!("Loading model from: {}", model_path.display());
        let artifact = load_model(model_path)?;
        let threshold = load_threshold(threshold_path)?;

        log::info!(
            "Model loaded: {} (trained {}), threshold {:.4} ({:?})",
            artifact.family,
            artifact.trained_at,
            threshold.value(),
            artifact.threshold_source
        );
        Ok(Self { artifact, threshold })
    }

    pub fn predict(&self, record: &PatientRecord) -> PredictionResult {
        let raw = self.artifact.pipeline.score_record(record);
        let probability = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        PredictionResult {
            probability,
            prediction: self.threshold.classify(probability),
        }
    }

    pub fn family(&self) -> ModelFamily {
        self.artifact.family
    }

    pub fn threshold(&self) -> DecisionThreshold {
        self.threshold
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{save_pair, ArtifactPaths};
    use crate::model::{Classifier, LogisticModel};
    use crate::pipeline::FittedPipeline;
    use crate::preprocess::{MedianImputer, StandardScaler};
    use crate::schema::FEATURE_COUNT;
    use crate::threshold::ThresholdSource;

    /// Logit = (glucose - 160) / 8, everything else ignored
    fn glucose_engine(threshold: f64) -> InferenceEngine {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[1] = 0.125;
        let pipeline = FittedPipeline {
            imputer: MedianImputer { statistics: vec![1.0, 160.0, 70.0, 25.0, 100.0, 30.0, 0.4, 30.0] },
            scaler: Some(StandardScaler { mean: vec![0.0; FEATURE_COUNT], scale: vec![1.0; FEATURE_COUNT] }),
            classifier: Classifier::Linear(LogisticModel { coefficients, intercept: -20.0 }),
        };
        let artifact = ModelArtifact::new(pipeline, ThresholdSource::Youden);
        InferenceEngine::new(artifact, DecisionThreshold::new(threshold).unwrap()).unwrap()
    }

    fn record(glucose: f64) -> PatientRecord {
        PatientRecord {
            pregnancies: 2.0,
            glucose,
            blood_pressure: 70.0,
            skin_thickness: 25.0,
            insulin: 80.0,
            bmi: 28.5,
            diabetes_pedigree_function: 0.5,
            age: 35.0,
        }
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let engine = glucose_engine(0.5);
        let at = engine.predict(&record(160.0));
        assert_eq!(at.probability, 0.5);
        assert_eq!(at.prediction, 1);

        let below = engine.predict(&record(159.0));
        assert_eq!(below.prediction, 0);
    }

    #[test]
    fn test_predict_is_idempotent() {
        let engine = glucose_engine(0.42);
        let r = record(133.0);
        assert_eq!(engine.predict(&r), engine.predict(&r));
    }

    #[test]
    fn test_probability_monotonic_in_glucose() {
        let engine = glucose_engine(0.5);
        let mut last = 0.0;
        for g in [60.0, 90.0, 120.0, 150.0, 180.0, 250.0] {
            let p = engine.predict(&record(g)).probability;
            assert!((0.0..=1.0).contains(&p));
            assert!(p > last);
            last = p;
        }
    }

    #[test]
    fn test_default_form_record_below_tuned_threshold() {
        // Logit -5 for the default form values
        let engine = glucose_engine(0.42);
        let result = engine.predict(&record(120.0));
        assert!(result.probability < 0.42);
        assert_eq!(result.prediction, 0);
    }

    #[test]
    fn test_zero_glucose_is_imputed() {
        let engine = glucose_engine(0.5);
        let result = engine.predict(&record(0.0));
        assert_eq!(result.probability, 0.5);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let engine = glucose_engine(0.42);
        save_pair(&paths, engine.artifact(), engine.threshold()).unwrap();

        let loaded = InferenceEngine::load(&paths.model, &paths.threshold).unwrap();
        assert_eq!(loaded.family(), ModelFamily::Linear);
        assert_eq!(loaded.threshold().value(), 0.42);
        assert_eq!(loaded.predict(&record(170.0)), engine.predict(&record(170.0)));
    }

    #[test]
    fn test_load_fails_without_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let engine = glucose_engine(0.42);
        save_pair(&paths, engine.artifact(), engine.threshold()).unwrap();
        std::fs::remove_file(&paths.threshold).unwrap();

        assert!(matches!(
            InferenceEngine::load(&paths.model, &paths.threshold),
            Err(ArtifactError::NotFound(_))
        ));
    }
}
