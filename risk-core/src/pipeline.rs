//! Fitted pipeline: zero-masking -> median imputer -> optional scaler -> classifier
//!
//! The whole chain is fitted on the rows it is given, so cross-validation
//! folds never leak imputation or scaling statistics across the split.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::dataset::mask_impossible_zeros;
use crate::error::{ArtifactError, TrainingResult};
use crate::model::boosting::TreeNode;
use crate::model::{Classifier, ModelFamily, ModelParams, ProbabilityScorer};
use crate::preprocess::{MedianImputer, StandardScaler};
use crate::schema::{PatientRecord, FEATURE_COUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub imputer: MedianImputer,
    pub scaler: Option<StandardScaler>,
    pub classifier: Classifier,
}

impl FittedPipeline {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<u8>, params: &ModelParams) -> TrainingResult<Self> {
        let mut masked = x.to_owned();
        mask_impossible_zeros(masked.view_mut());

        let imputer = MedianImputer::fit(masked.view())?;
        let imputed = imputer.transform(masked.view());

        let (scaler, prepared) = if params.family().needs_scaling() {
            let scaler = StandardScaler::fit(imputed.view());
            let scaled = scaler.transform(imputed.view());
            (Some(scaler), scaled)
        } else {
            (None, imputed)
        };

        let classifier = params.fit(prepared.view(), y);
        Ok(Self { imputer, scaler, classifier })
    }

    pub fn family(&self) -> ModelFamily {
        self.classifier.family()
    }

    /// Apply every fitted step before the classifier
    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut masked = x.to_owned();
        mask_impossible_zeros(masked.view_mut());
        let imputed = self.imputer.transform(masked.view());
        match &self.scaler {
            Some(scaler) => scaler.transform(imputed.view()),
            None => imputed,
        }
    }

    /// P(Outcome = 1) for a single record
    pub fn score_record(&self, record: &PatientRecord) -> f64 {
        let row = ndarray::arr2(&[record.to_features()]);
        self.predict_proba(row.view())[0]
    }

    /// Structural checks for a deserialized pipeline
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.imputer.statistics.len() != FEATURE_COUNT {
            return Err(ArtifactError::Inconsistent(format!(
                "imputer has {} statistics, expected {}",
                self.imputer.statistics.len(),
                FEATURE_COUNT
            )));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
                return Err(ArtifactError::Inconsistent("scaler width mismatch".to_string()));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err(ArtifactError::Inconsistent("scaler has a zero or non-finite scale".to_string()));
            }
        }
        if self.family().needs_scaling() != self.scaler.is_some() {
            return Err(ArtifactError::Inconsistent(format!(
                "{} pipeline {} a scaler",
                self.family(),
                if self.scaler.is_some() { "must not carry" } else { "requires" }
            )));
        }

        match &self.classifier {
            Classifier::Linear(m) if m.coefficients.len() != FEATURE_COUNT => {
                Err(ArtifactError::Inconsistent(format!(
                    "linear model has {} coefficients, expected {}",
                    m.coefficients.len(),
                    FEATURE_COUNT
                )))
            }
            Classifier::TreeEnsemble(m) => {
                for (t, tree) in m.trees.iter().enumerate() {
                    let n = tree.nodes.len();
                    let broken = n == 0
                        || tree.nodes.iter().any(|node| match node {
                            TreeNode::Split { feature, left, right, .. } => {
                                *feature >= FEATURE_COUNT || *left >= n || *right >= n
                            }
                            TreeNode::Leaf { .. } => false,
                        });
                    if broken {
                        return Err(ArtifactError::Inconsistent(format!("tree {} is malformed", t)));
                    }
                }
                Ok(())
            }
            Classifier::Linear(_) => Ok(()),
        }
    }
}

impl ProbabilityScorer for FittedPipeline {
    fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        self.classifier.decision_function(self.transform(x).view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoostingParams, LogisticModel, LogisticParams};
    use ndarray::array;

    fn toy() -> (Array2<f64>, Array1<u8>) {
        let x = Array2::from_shape_fn((40, FEATURE_COUNT), |(i, j)| match j {
            1 => 80.0 + 3.0 * i as f64,
            4 if i % 4 == 0 => 0.0,
            _ => (i % 5 + j) as f64 + 1.0,
        });
        let y = (0..40).map(|i| u8::from(i >= 24)).collect();
        (x, y)
    }

    #[test]
    fn test_linear_pipeline_has_scaler() {
        let (x, y) = toy();
        let pipe = FittedPipeline::fit(x.view(), y.view(), &ModelParams::Linear(LogisticParams::default())).unwrap();
        assert_eq!(pipe.family(), ModelFamily::Linear);
        assert!(pipe.scaler.is_some());
        assert!(pipe.validate().is_ok());
    }

    #[test]
    fn test_tree_pipeline_skips_scaler() {
        let (x, y) = toy();
        let params = ModelParams::TreeEnsemble(BoostingParams { max_iter: 5, min_samples_leaf: 4, ..Default::default() });
        let pipe = FittedPipeline::fit(x.view(), y.view(), &params).unwrap();
        assert!(pipe.scaler.is_none());
        assert!(pipe.validate().is_ok());
    }

    #[test]
    fn test_zero_insulin_is_imputed_not_used() {
        let (x, y) = toy();
        let pipe = FittedPipeline::fit(x.view(), y.view(), &ModelParams::Linear(LogisticParams::default())).unwrap();

        // Zeros were excluded from the median; observed insulin values are all >= 5
        assert!(pipe.imputer.statistics[4] >= 5.0);

        // A zero at scoring time behaves exactly like the imputed median
        let mut zero = x.row(1).to_owned();
        zero[4] = 0.0;
        let mut median = zero.clone();
        median[4] = pipe.imputer.statistics[4];
        let both = ndarray::stack![ndarray::Axis(0), zero, median];
        let proba = pipe.predict_proba(both.view());
        assert_eq!(proba[0], proba[1]);
    }

    #[test]
    fn test_validate_rejects_scaler_mismatch() {
        let pipe = FittedPipeline {
            imputer: MedianImputer { statistics: vec![1.0; FEATURE_COUNT] },
            scaler: None,
            classifier: Classifier::Linear(LogisticModel { coefficients: vec![0.1; FEATURE_COUNT], intercept: 0.0 }),
        };
        assert!(matches!(pipe.validate(), Err(ArtifactError::Inconsistent(_))));
    }

    #[test]
    fn test_validate_rejects_short_coefficients() {
        let pipe = FittedPipeline {
            imputer: MedianImputer { statistics: vec![1.0; FEATURE_COUNT] },
            scaler: Some(StandardScaler { mean: vec![0.0; FEATURE_COUNT], scale: vec![1.0; FEATURE_COUNT] }),
            classifier: Classifier::Linear(LogisticModel { coefficients: array![1.0, 2.0].to_vec(), intercept: 0.0 }),
        };
        assert!(pipe.validate().is_err());
    }
}
