//! Training run orchestration
//!
//! clean -> stratified split -> CV search (linear) -> Youden threshold on the
//! training partition -> CV search (trees) -> test-partition comparison ->
//! atomic artifact write -> report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{self, ModelArtifact};
use crate::config::TrainingConfig;
use crate::dataset::{stratified_kfold, stratified_split, TrainingDataset};
use crate::error::TrainingResult;
use crate::metrics::{roc_auc, roc_curve, ClassificationReport};
use crate::model::{ModelFamily, ModelParams, ProbabilityScorer};
use crate::pipeline::FittedPipeline;
use crate::schema::FEATURE_LAYOUT;
use crate::search::{grid_search, linear_grid, tree_grid, SearchResult};
use crate::selection::{operating_threshold, select_family, FamilyEvaluation};
use crate::threshold::{select_youden, DecisionThreshold, ThresholdSource, YoudenPoint};

/// Summary written next to the artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub missing_counts: BTreeMap<String, usize>,
    pub linear_search: SearchResult,
    pub tree_search: SearchResult,
    pub tuned_threshold: YoudenPoint,
    pub linear: FamilyEvaluation,
    pub tree: FamilyEvaluation,
    pub winner: ModelFamily,
    pub persisted_threshold: DecisionThreshold,
}

/// Everything a run produces before it touches the filesystem
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub threshold: DecisionThreshold,
    pub report: TrainingReport,
}

fn evaluate(
    pipeline: &FittedPipeline,
    test: &TrainingDataset,
    threshold: DecisionThreshold,
    threshold_source: ThresholdSource,
) -> TrainingResult<FamilyEvaluation> {
    let scores = pipeline.predict_proba(test.features.view()).to_vec();
    let labels = test.outcome.to_vec();
    let test_auc = roc_auc(&labels, &scores)?;
    let report = ClassificationReport::compute(&labels, &scores, threshold.value())?;

    log::info!(
        "{} on test: AUC {:.4} at threshold {:.4}\n{}",
        pipeline.family(),
        test_auc,
        threshold.value(),
        report
    );

    Ok(FamilyEvaluation {
        family: pipeline.family(),
        test_auc,
        threshold,
        threshold_source,
        report,
    })
}

/// Fit, tune and compare both families on an already cleaned dataset
pub fn train_with_grids(
    data: &TrainingDataset,
    config: &TrainingConfig,
    linear: &[ModelParams],
    trees: &[ModelParams],
) -> TrainingResult<TrainingOutcome> {
    config.validate()?;

    let partition = stratified_split(data.outcome.view(), config.test_size, config.seed)?;
    let train = data.subset(&partition.train);
    let test = data.subset(&partition.test);
    log::info!(
        "Split {} rows into {} train / {} test ({} / {} positive)",
        data.len(),
        train.len(),
        test.len(),
        train.positives(),
        test.positives()
    );

    let folds = stratified_kfold(train.outcome.view(), config.cv_folds, config.seed)?;

    // Family A: search, refit, tune the threshold on training rows only
    let linear_search = grid_search(&train, linear, &folds)?;
    let linear_pipeline = FittedPipeline::fit(
        train.features.view(),
        train.outcome.view(),
        &linear_search.best().params,
    )?;
    let train_scores = linear_pipeline.predict_proba(train.features.view()).to_vec();
    let curve = roc_curve(&train.outcome.to_vec(), &train_scores)?;
    let tuned_threshold = select_youden(&curve)?;
    let tuned = DecisionThreshold::new(tuned_threshold.threshold)?;
    log::info!(
        "Youden threshold {:.4} (TPR {:.3}, FPR {:.3}, J {:.3})",
        tuned_threshold.threshold,
        tuned_threshold.tpr,
        tuned_threshold.fpr,
        tuned_threshold.j
    );

    // Family B
    let tree_search = grid_search(&train, trees, &folds)?;
    let tree_pipeline = FittedPipeline::fit(
        train.features.view(),
        train.outcome.view(),
        &tree_search.best().params,
    )?;

    let (linear_t, linear_src) = operating_threshold(ModelFamily::Linear, tuned);
    let (tree_t, tree_src) = operating_threshold(ModelFamily::TreeEnsemble, tuned);
    let linear_eval = evaluate(&linear_pipeline, &test, linear_t, linear_src)?;
    let tree_eval = evaluate(&tree_pipeline, &test, tree_t, tree_src)?;

    let winner = select_family(linear_eval.test_auc, tree_eval.test_auc);
    let (threshold, source, pipeline) = match winner {
        ModelFamily::Linear => (linear_t, linear_src, linear_pipeline),
        ModelFamily::TreeEnsemble => (tree_t, tree_src, tree_pipeline),
    };
    log::info!(
        "Selected {} (test AUC linear {:.4} vs trees {:.4})",
        winner,
        linear_eval.test_auc,
        tree_eval.test_auc
    );

    let missing_counts = FEATURE_LAYOUT
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let count = data.features.column(col).iter().filter(|v| v.is_nan()).count();
            (name.to_string(), count)
        })
        .collect();

    let artifact = ModelArtifact::new(pipeline, source);
    let report = TrainingReport {
        trained_at: artifact.trained_at,
        rows: data.len(),
        train_rows: train.len(),
        test_rows: test.len(),
        missing_counts,
        linear_search,
        tree_search,
        tuned_threshold,
        linear: linear_eval,
        tree: tree_eval,
        winner,
        persisted_threshold: threshold,
    };

    Ok(TrainingOutcome { artifact, threshold, report })
}

/// Full run: load, clean, train, persist
pub fn run(config: &TrainingConfig) -> TrainingResult<TrainingReport> {
    config.validate()?;

    log::info!("Loading dataset from {}", config.data_path.display());
    let mut data = TrainingDataset::from_csv_path(&config.data_path)?;
    log::info!("Loaded {} rows ({} positive)", data.len(), data.positives());
    data.clean();

    let outcome = train_with_grids(&data, config, &linear_grid(), &tree_grid())?;

    artifact::save_pair(&config.artifact_paths(), &outcome.artifact, outcome.threshold)?;
    artifact::save_report(&config.report_path(), &outcome.report)?;

    Ok(outcome.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{load_model, load_threshold};
    use crate::model::{BoostingParams, LogisticParams};
    use crate::schema::FEATURE_COUNT;
    use crate::threshold::DEFAULT_THRESHOLD;
    use ndarray::{Array1, Array2};
    use std::io::Write;

    /// Glucose and BMI drive the label; a few clinical zeros are sprinkled in
    fn synthetic(n: usize) -> TrainingDataset {
        let features = Array2::from_shape_fn((n, FEATURE_COUNT), |(i, j)| {
            let wobble = ((i * 31 + j * 17) % 13) as f64;
            match j {
                0 => (i % 9) as f64,
                1 if i % 17 == 0 => 0.0,
                1 => 85.0 + (i % 40) as f64 * 2.5 + wobble,
                4 if i % 5 == 0 => 0.0,
                5 => 22.0 + (i % 40) as f64 * 0.4 + wobble * 0.3,
                6 => 0.1 + wobble * 0.05,
                7 => 21.0 + (i % 30) as f64,
                _ => 20.0 + wobble * 3.0,
            }
        });
        let outcome: Array1<u8> = (0..n).map(|i| u8::from(i % 40 >= 26)).collect();
        let mut data = TrainingDataset::new(features, outcome);
        data.clean();
        data
    }

    fn small_grids() -> (Vec<ModelParams>, Vec<ModelParams>) {
        let linear = vec![
            ModelParams::Linear(LogisticParams { c: 0.1, ..Default::default() }),
            ModelParams::Linear(LogisticParams { c: 1.0, ..Default::default() }),
        ];
        let trees = vec![ModelParams::TreeEnsemble(BoostingParams {
            max_iter: 20,
            max_depth: Some(3),
            ..Default::default()
        })];
        (linear, trees)
    }

    #[test]
    fn test_train_selects_and_reports() {
        let data = synthetic(400);
        let (linear, trees) = small_grids();
        let outcome = train_with_grids(&data, &TrainingConfig::default(), &linear, &trees).unwrap();
        let report = &outcome.report;

        assert_eq!(report.train_rows + report.test_rows, 400);
        assert_eq!(report.linear_search.candidates.len(), 2);
        assert_eq!(report.tree_search.candidates.len(), 1);
        assert_eq!(report.missing_counts["Glucose"], 24);
        assert_eq!(report.missing_counts["Pregnancies"], 0);

        assert_eq!(report.winner, select_family(report.linear.test_auc, report.tree.test_auc));
        assert_eq!(outcome.artifact.family, report.winner);
        assert_eq!(report.tree.threshold.value(), DEFAULT_THRESHOLD);
        assert_eq!(report.linear.threshold.value(), report.tuned_threshold.threshold);

        match report.winner {
            ModelFamily::Linear => assert_eq!(outcome.threshold.value(), report.tuned_threshold.threshold),
            ModelFamily::TreeEnsemble => assert_eq!(outcome.threshold.value(), DEFAULT_THRESHOLD),
        }
        assert!(report.linear.test_auc > 0.8);
    }

    #[test]
    fn test_train_is_reproducible() {
        let data = synthetic(300);
        let (linear, trees) = small_grids();
        let config = TrainingConfig::default();
        let a = train_with_grids(&data, &config, &linear, &trees).unwrap();
        let b = train_with_grids(&data, &config, &linear, &trees).unwrap();
        assert_eq!(a.artifact.pipeline, b.artifact.pipeline);
        assert_eq!(a.threshold, b.threshold);
    }

    #[test]
    fn test_empty_grid_aborts_before_writing() {
        let data = synthetic(200);
        let (linear, _) = small_grids();
        assert!(train_with_grids(&data, &TrainingConfig::default(), &linear, &[]).is_err());
    }

    #[test]
    fn test_run_writes_artifact_pair() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("diabetes.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome").unwrap();
        for i in 0..120usize {
            let positive = i % 3 == 0;
            let glucose = if positive { 150 + i % 30 } else { 90 + i % 30 };
            let bmi = if positive { 33.0 } else { 25.0 } + (i % 7) as f64;
            writeln!(file, "{},{},{},{},{},{:.1},{:.3},{},{}",
                i % 6, glucose, 60 + i % 20, if i % 4 == 0 { 0 } else { 20 + i % 10 },
                if i % 2 == 0 { 0 } else { 80 + i % 50 }, bmi, 0.2 + (i % 9) as f64 * 0.05,
                21 + i % 40, u8::from(positive)).unwrap();
        }
        drop(file);

        let config = TrainingConfig {
            data_path: csv_path,
            artifact_dir: dir.path().join("artifacts"),
            ..Default::default()
        };

        // Full grids on a tiny table keep the test honest about the real run
        let report = run(&config).unwrap();

        let paths = config.artifact_paths();
        let artifact = load_model(&paths.model).unwrap();
        let threshold = load_threshold(&paths.threshold).unwrap();
        assert_eq!(artifact.family, report.winner);
        assert_eq!(threshold, report.persisted_threshold);
        assert!(config.report_path().exists());
        assert_eq!(report.linear_search.candidates.len(), 28);
        assert_eq!(report.tree_search.candidates.len(), 24);
    }
}
