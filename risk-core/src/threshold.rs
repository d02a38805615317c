//! Decision Threshold
//!
//! Probability cutoff used to binarize a score into a label. The tuned value
//! comes from maximizing Youden's J (TPR - FPR) over the training-partition
//! ROC curve; tree ensembles keep the fixed default.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, MetricsError};
use crate::metrics::RocCurve;

/// Cutoff used when no tuned value applies
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Validated probability cutoff in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DecisionThreshold(f64);

impl DecisionThreshold {
    pub fn new(value: f64) -> Result<Self, ArtifactError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ArtifactError::ThresholdOutOfRange(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// 1 when `probability >= threshold` (boundary inclusive), else 0
    pub fn classify(&self, probability: f64) -> u8 {
        u8::from(probability >= self.0)
    }
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for DecisionThreshold {
    type Error = ArtifactError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DecisionThreshold> for f64 {
    fn from(t: DecisionThreshold) -> Self {
        t.0
    }
}

/// On-disk threshold document: `{"threshold": <float>}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFile {
    pub threshold: DecisionThreshold,
}

/// How the persisted threshold was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    /// Youden's J on the training partition
    Youden,
    /// Fixed default cutoff
    Default,
}

/// Operating point picked from a ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoudenPoint {
    pub threshold: f64,
    pub tpr: f64,
    pub fpr: f64,
    pub j: f64,
}

/// Cutoff maximizing TPR - FPR
///
/// The all-positive point (TPR = FPR = 1) and non-finite cutoffs are never
/// chosen. The first maximum wins, i.e. the highest cutoff among ties.
pub fn select_youden(curve: &RocCurve) -> Result<YoudenPoint, MetricsError> {
    let mut best: Option<YoudenPoint> = None;

    for ((&threshold, &tpr), &fpr) in curve.thresholds.iter().zip(&curve.tpr).zip(&curve.fpr) {
        if !threshold.is_finite() || (tpr >= 1.0 && fpr >= 1.0) {
            continue;
        }
        let j = tpr - fpr;
        if best.map_or(true, |b| j > b.j) {
            best = Some(YoudenPoint { threshold, tpr, fpr, j });
        }
    }

    best.ok_or(MetricsError::NoValidCutoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(fpr: &[f64], tpr: &[f64], thresholds: &[f64]) -> RocCurve {
        RocCurve {
            fpr: fpr.to_vec(),
            tpr: tpr.to_vec(),
            thresholds: thresholds.to_vec(),
        }
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(DecisionThreshold::new(0.0).is_ok());
        assert!(DecisionThreshold::new(1.0).is_ok());
        assert!(matches!(
            DecisionThreshold::new(1.2),
            Err(ArtifactError::ThresholdOutOfRange(_))
        ));
        assert!(DecisionThreshold::new(f64::NAN).is_err());
        assert_eq!(DecisionThreshold::default().value(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_classify_is_inclusive() {
        let t = DecisionThreshold::new(0.42).unwrap();
        assert_eq!(t.classify(0.42), 1);
        assert_eq!(t.classify(0.4199999), 0);
        assert_eq!(t.classify(0.9), 1);
    }

    #[test]
    fn test_threshold_file_format() {
        let file: ThresholdFile = serde_json::from_str(r#"{"threshold": 0.37}"#).unwrap();
        assert_eq!(file.threshold.value(), 0.37);
        assert_eq!(serde_json::to_string(&file).unwrap(), r#"{"threshold":0.37}"#);
        assert!(serde_json::from_str::<ThresholdFile>(r#"{"threshold": -0.1}"#).is_err());
    }

    #[test]
    fn test_youden_picks_max_j() {
        let c = curve(
            &[0.0, 0.0, 0.1, 0.3, 0.6, 1.0],
            &[0.0, 0.2, 0.6, 0.9, 0.95, 1.0],
            &[f64::INFINITY, 0.9, 0.7, 0.4, 0.2, 0.05],
        );
        let point = select_youden(&c).unwrap();
        assert_eq!(point.threshold, 0.4);
        assert!((point.j - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_youden_excludes_all_positive_point() {
        // Every real cutoff has negative J; the all-positive point (J = 0) must not win
        let c = curve(
            &[0.0, 0.5, 1.0],
            &[0.0, 0.25, 1.0],
            &[f64::INFINITY, 0.6, 0.1],
        );
        let point = select_youden(&c).unwrap();
        assert_eq!(point.threshold, 0.6);
    }

    #[test]
    fn test_youden_tie_prefers_higher_cutoff() {
        let c = curve(
            &[0.0, 0.25, 0.375, 1.0],
            &[0.0, 0.75, 0.875, 1.0],
            &[f64::INFINITY, 0.8, 0.5, 0.1],
        );
        assert_eq!(select_youden(&c).unwrap().threshold, 0.8);
    }

    #[test]
    fn test_youden_without_candidates() {
        let c = curve(&[0.0, 1.0], &[0.0, 1.0], &[f64::INFINITY, 0.3]);
        assert_eq!(select_youden(&c), Err(MetricsError::NoValidCutoff));
    }
}
