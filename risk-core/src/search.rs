//! Cross-validated hyperparameter search
//!
//! Candidates are enumerated with parameter names in sorted order and the
//! last parameter varying fastest. Every (candidate, fold) fit runs in
//! parallel; scores are gathered back in grid order, and the winner is the
//! first candidate with the highest mean validation AUC.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::{Fold, TrainingDataset};
use crate::error::{TrainingError, TrainingResult};
use crate::metrics::roc_auc;
use crate::model::{BoostingParams, ClassWeight, LogisticParams, ModelFamily, ModelParams, Penalty, ProbabilityScorer};
use crate::pipeline::FittedPipeline;

/// Regularization strengths, log-spaced from 1e-3 to 1e3
pub const LINEAR_C_VALUES: [f64; 7] = [1e-3, 1e-2, 1e-1, 1.0, 10.0, 100.0, 1000.0];

/// Family A grid: C x class_weight x penalty
pub fn linear_grid() -> Vec<ModelParams> {
    let mut grid = Vec::new();
    for c in LINEAR_C_VALUES {
        for class_weight in [ClassWeight::None, ClassWeight::Balanced] {
            for penalty in [Penalty::L1, Penalty::L2] {
                grid.push(ModelParams::Linear(LogisticParams {
                    c,
                    class_weight,
                    penalty,
                    ..Default::default()
                }));
            }
        }
    }
    grid
}

/// Family B grid: learning_rate x max_depth x max_iter x min_samples_leaf
pub fn tree_grid() -> Vec<ModelParams> {
    let mut grid = Vec::new();
    for learning_rate in [0.05, 0.1] {
        for max_depth in [None, Some(3), Some(5)] {
            for max_iter in [100, 300] {
                for min_samples_leaf in [20, 50] {
                    grid.push(ModelParams::TreeEnsemble(BoostingParams {
                        learning_rate,
                        max_depth,
                        max_iter,
                        min_samples_leaf,
                        ..Default::default()
                    }));
                }
            }
        }
    }
    grid
}

/// Cross-validated score of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: ModelParams,
    pub fold_auc: Vec<f64>,
    pub mean_auc: f64,
    pub std_auc: f64,
}

impl CandidateScore {
    fn new(params: ModelParams, fold_auc: Vec<f64>) -> Self {
        let n = fold_auc.len().max(1) as f64;
        let mean_auc = fold_auc.iter().sum::<f64>() / n;
        let std_auc = (fold_auc.iter().map(|a| (a - mean_auc).powi(2)).sum::<f64>() / n).sqrt();
        Self { params, fold_auc, mean_auc, std_auc }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub family: ModelFamily,
    pub candidates: Vec<CandidateScore>,
    pub best_index: usize,
}

impl SearchResult {
    pub fn best(&self) -> &CandidateScore {
        &self.candidates[self.best_index]
    }
}

/// Index of the first maximum; `None` for an empty slice
pub fn first_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        if best.map_or(true, |b| s > scores[b]) {
            best = Some(i);
        }
    }
    best
}

fn fold_auc(data: &TrainingDataset, params: &ModelParams, fold: &Fold, fold_index: usize) -> TrainingResult<f64> {
    let train = data.subset(&fold.train);
    let validation = data.subset(&fold.validation);

    let pipeline = FittedPipeline::fit(train.features.view(), train.outcome.view(), params)?;
    let scores = pipeline.predict_proba(validation.features.view());

    let labels = validation.outcome.to_vec();
    roc_auc(&labels, &scores.to_vec()).map_err(|source| TrainingError::DegenerateFold {
        fold: fold_index,
        source,
    })
}

/// Score every candidate on every fold and pick the best mean AUC
pub fn grid_search(data: &TrainingDataset, grid: &[ModelParams], folds: &[Fold]) -> TrainingResult<SearchResult> {
    let family = match grid.first() {
        Some(p) => p.family(),
        None => return Err(TrainingError::EmptyGrid),
    };
    if grid.iter().any(|p| p.family() != family) {
        return Err(TrainingError::InvalidConfig("grid mixes model families".to_string()));
    }
    if folds.is_empty() {
        return Err(TrainingError::InvalidConfig("no cross-validation folds".to_string()));
    }

    log::info!(
        "Searching {} {} candidates x {} folds",
        grid.len(),
        family,
        folds.len()
    );

    let jobs: Vec<(usize, usize)> = (0..grid.len())
        .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
        .collect();

    let results: Vec<TrainingResult<f64>> = jobs
        .par_iter()
        .map(|&(c, f)| fold_auc(data, &grid[c], &folds[f], f))
        .collect();

    let mut scores = results.into_iter();
    let mut candidates = Vec::with_capacity(grid.len());
    for params in grid {
        let fold_auc = scores
            .by_ref()
            .take(folds.len())
            .collect::<TrainingResult<Vec<f64>>>()?;
        let score = CandidateScore::new(*params, fold_auc);
        log::debug!("{} -> mean AUC {:.4} (+/- {:.4})", params, score.mean_auc, score.std_auc);
        candidates.push(score);
    }

    let means: Vec<f64> = candidates.iter().map(|c| c.mean_auc).collect();
    let best_index = first_best(&means).ok_or(TrainingError::EmptyGrid)?;

    log::info!(
        "Best {} candidate: {} (CV AUC {:.4})",
        family,
        candidates[best_index].params,
        candidates[best_index].mean_auc
    );

    Ok(SearchResult { family, candidates, best_index })
}
