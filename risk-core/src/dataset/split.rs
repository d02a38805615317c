//! Stratified partitioning: the hold-out split and the CV folds

use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{TrainingError, TrainingResult};

/// Train/test row indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// One cross-validation fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Row indices grouped by class label, class 0 first
fn indices_by_class(labels: ArrayView1<u8>) -> [Vec<usize>; 2] {
    let mut groups = [Vec::new(), Vec::new()];
    for (i, &y) in labels.iter().enumerate() {
        groups[usize::from(y != 0)].push(i);
    }
    groups
}

/// Split rows so each class keeps its proportion in both partitions
pub fn stratified_split(labels: ArrayView1<u8>, test_size: f64, seed: u64) -> TrainingResult<Partition> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (class, mut group) in indices_by_class(labels).into_iter().enumerate() {
        let n_test = (group.len() as f64 * test_size).round() as usize;
        if n_test == 0 || n_test == group.len() {
            return Err(TrainingError::TooFewSamples {
                class: class as u8,
                count: group.len(),
                required: 2,
            });
        }
        group.shuffle(&mut rng);
        test.extend_from_slice(&group[..n_test]);
        train.extend_from_slice(&group[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Partition { train, test })
}

/// Stratified, shuffled k-fold assignment
///
/// Each class is shuffled and dealt round-robin across the folds, so every
/// validation fold holds both classes in near-identical proportion.
pub fn stratified_kfold(labels: ArrayView1<u8>, k: usize, seed: u64) -> TrainingResult<Vec<Fold>> {
    if k < 2 {
        return Err(TrainingError::InvalidConfig(format!("need at least 2 folds, got {}", k)));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; labels.len()];

    for (class, mut group) in indices_by_class(labels).into_iter().enumerate() {
        if group.len() < k {
            return Err(TrainingError::TooFewSamples {
                class: class as u8,
                count: group.len(),
                required: k,
            });
        }
        group.shuffle(&mut rng);
        for (position, &row) in group.iter().enumerate() {
            assignment[row] = position % k;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&row| assignment[row] == fold);
            Fold { train, validation }
        })
        .collect())
}
