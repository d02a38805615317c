//! Ranking and classification metrics
//!
//! `roc_curve` follows the usual conventions: cutoffs are the distinct scores
//! in descending order, collinear intermediate points are dropped, and a
//! leading sentinel point (cutoff = +inf, nothing predicted positive) anchors
//! the curve at the origin.

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// ROC curve points, aligned by index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

fn check_inputs(labels: &[u8], scores: &[f64]) -> Result<(usize, usize), MetricsError> {
    if labels.len() != scores.len() {
        return Err(MetricsError::LengthMismatch {
            labels: labels.len(),
            scores: scores.len(),
        });
    }
    let positives = labels.iter().filter(|&&y| y == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(MetricsError::SingleClass);
    }
    Ok((positives, negatives))
}

/// Area under the ROC curve via the rank-sum statistic (ties get average rank)
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Result<f64, MetricsError> {
    let (positives, negatives) = check_inputs(labels, scores)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1..=end share their mean
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let tied_pos = order[start..end].iter().filter(|&&i| labels[i] == 1).count();
        rank_sum_pos += avg_rank * tied_pos as f64;
        start = end;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Ok((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * n))
}

/// Receiver operating characteristic over all distinct score cutoffs
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> Result<RocCurve, MetricsError> {
    check_inputs(labels, scores)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // Cumulative counts at the last index of each distinct score
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut cutoffs = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);
    for (pos, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_run = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_run {
            tps.push(tp);
            fps.push(fp);
            cutoffs.push(scores[i]);
        }
    }

    // Drop points collinear with both neighbours
    let keep: Vec<usize> = (0..tps.len())
        .filter(|&k| {
            if k == 0 || k + 1 == tps.len() {
                return true;
            }
            let d2_fp = fps[k + 1] - 2.0 * fps[k] + fps[k - 1];
            let d2_tp = tps[k + 1] - 2.0 * tps[k] + tps[k - 1];
            d2_fp != 0.0 || d2_tp != 0.0
        })
        .collect();

    let total_tp = tp;
    let total_fp = fp;
    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    for k in keep {
        curve.fpr.push(fps[k] / total_fp);
        curve.tpr.push(tps[k] / total_tp);
        curve.thresholds.push(cutoffs[k]);
    }
    Ok(curve)
}

/// Precision / recall / F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Binary classification summary at a fixed cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub threshold: f64,
    pub negative: ClassMetrics,
    pub positive: ClassMetrics,
    pub accuracy: f64,
    /// `[[tn, fp], [fn, tp]]`
    pub confusion: [[usize; 2]; 2],
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn class_metrics(tp: usize, fp: usize, fn_: usize) -> ClassMetrics {
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

impl ClassificationReport {
    /// Score >= threshold counts as a positive prediction
    pub fn compute(labels: &[u8], scores: &[f64], threshold: f64) -> Result<Self, MetricsError> {
        if labels.len() != scores.len() {
            return Err(MetricsError::LengthMismatch {
                labels: labels.len(),
                scores: scores.len(),
            });
        }

        let mut confusion = [[0usize; 2]; 2];
        for (&y, &s) in labels.iter().zip(scores) {
            let predicted = usize::from(s >= threshold);
            confusion[usize::from(y == 1)][predicted] += 1;
        }
        let [[tn, fp], [fn_, tp]] = confusion;

        Ok(Self {
            threshold,
            negative: class_metrics(tn, fn_, fp),
            positive: class_metrics(tp, fp, fn_),
            accuracy: ratio(tn + tp, labels.len()),
            confusion,
        })
    }
}

impl std::fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "              precision    recall  f1-score   support")?;
        for (name, m) in [("0", &self.negative), ("1", &self.positive)] {
            writeln!(
                f,
                "{:>12} {:>11.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(
            f,
            "    accuracy {:>31.2} {:>9}",
            self.accuracy,
            self.negative.support + self.positive.support
        )
    }
}
