//! Model Module - candidate classifier families
//!
//! Two families compete during training:
//! - Linear: regularized logistic regression (expects standardized input)
//! - TreeEnsemble: histogram gradient-boosted trees (scale-free)
//!
//! Both produce a raw margin whose sigmoid is P(Outcome = 1).

pub mod boosting;
pub mod logistic;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub use boosting::{BoostedTrees, BoostingParams};
pub use logistic::{ClassWeight, LogisticModel, LogisticParams, Penalty};

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Common capability of every fitted classifier
pub trait ProbabilityScorer {
    /// Raw margin per row
    fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64>;

    /// P(Outcome = 1) per row
    fn predict_proba(&self, x: ArrayView2<f64>) -> Array1<f64> {
        self.decision_function(x).mapv(sigmoid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Linear,
    TreeEnsemble,
}

impl ModelFamily {
    /// Linear models need standardized features; trees split on raw values
    pub fn needs_scaling(&self) -> bool {
        matches!(self, ModelFamily::Linear)
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFamily::Linear => write!(f, "linear"),
            ModelFamily::TreeEnsemble => write!(f, "tree_ensemble"),
        }
    }
}

/// Hyperparameters for one candidate of either family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelParams {
    Linear(LogisticParams),
    TreeEnsemble(BoostingParams),
}

impl ModelParams {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelParams::Linear(_) => ModelFamily::Linear,
            ModelParams::TreeEnsemble(_) => ModelFamily::TreeEnsemble,
        }
    }

    pub fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Classifier {
        match self {
            ModelParams::Linear(p) => Classifier::Linear(LogisticModel::fit(x, y, p)),
            ModelParams::TreeEnsemble(p) => Classifier::TreeEnsemble(BoostedTrees::fit(x, y, p)),
        }
    }
}

impl std::fmt::Display for ModelParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelParams::Linear(p) => write!(f, "{}", p),
            ModelParams::TreeEnsemble(p) => write!(f, "{}", p),
        }
    }
}

/// Fitted classifier, tagged with its family when persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Classifier {
    Linear(LogisticModel),
    TreeEnsemble(BoostedTrees),
}

impl Classifier {
    pub fn family(&self) -> ModelFamily {
        match self {
            Classifier::Linear(_) => ModelFamily::Linear,
            Classifier::TreeEnsemble(_) => ModelFamily::TreeEnsemble,
        }
    }
}

impl ProbabilityScorer for Classifier {
    fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        match self {
            Classifier::Linear(m) => m.decision_function(x),
            Classifier::TreeEnsemble(m) => m.decision_function(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_classifier_tag_round_trip() {
        let clf = Classifier::Linear(LogisticModel { coefficients: vec![0.5; 8], intercept: -1.0 });
        let json = serde_json::to_value(&clf).unwrap();
        assert_eq!(json["family"], "linear");
        let back: Classifier = serde_json::from_value(json).unwrap();
        assert_eq!(back.family(), ModelFamily::Linear);
    }
}
