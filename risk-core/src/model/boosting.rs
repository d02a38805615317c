//! Histogram-based gradient-boosted trees for binary log-loss
//!
//! Features are bucketed into at most `max_bins` bins once per fit. Each
//! boosting round grows one tree leaf-wise (best-gain leaf first) from
//! per-bin gradient/hessian histograms. Leaf values are shrunk by the
//! learning rate, so prediction is a plain sum of leaf values on top of the
//! prior log-odds.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{sigmoid, ProbabilityScorer};

const MIN_CHILD_HESSIAN: f64 = 1e-3;
const PROBA_EPS: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub learning_rate: f64,
    /// `None` grows until another limit stops it
    pub max_depth: Option<usize>,
    pub max_iter: usize,
    pub min_samples_leaf: usize,
    pub max_leaf_nodes: usize,
    pub l2_regularization: f64,
    pub max_bins: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: None,
            max_iter: 100,
            min_samples_leaf: 20,
            max_leaf_nodes: 31,
            l2_regularization: 0.0,
            max_bins: 255,
        }
    }
}

impl std::fmt::Display for BoostingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "none".to_string(), |d| d.to_string());
        write!(
            f,
            "learning_rate={} max_depth={} max_iter={} min_samples_leaf={}",
            self.learning_rate, depth, self.max_iter, self.min_samples_leaf
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    // NaN compares false and follows the right branch, like the top bin
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, TreeNode::Leaf { .. })).count()
    }
}

/// Fitted ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    /// Prior log-odds of the positive class
    pub baseline: f64,
    pub trees: Vec<Tree>,
}

// ============================================================================
// BINNING
// ============================================================================

/// Per-feature bin edges; bin `b` holds values in `(edges[b-1], edges[b]]`
struct BinMapper {
    edges: Vec<Vec<f64>>,
}

impl BinMapper {
    fn fit(x: ArrayView2<f64>, max_bins: usize) -> Self {
        let edges = x
            .axis_iter(Axis(1))
            .map(|column| {
                let mut values: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
                values.sort_by(|a, b| a.total_cmp(b));
                let mut distinct = values.clone();
                distinct.dedup();

                if distinct.len() <= max_bins {
                    distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
                } else {
                    let last = (values.len() - 1) as f64;
                    let mut qs: Vec<f64> = (1..max_bins)
                        .map(|k| {
                            let pos = last * k as f64 / max_bins as f64;
                            let lo = pos.floor() as usize;
                            let hi = pos.ceil() as usize;
                            values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
                        })
                        .collect();
                    qs.dedup();
                    qs
                }
            })
            .collect();
        Self { edges }
    }

    fn n_bins(&self, feature: usize) -> usize {
        self.edges[feature].len() + 1
    }

    fn bin(&self, feature: usize, value: f64) -> u8 {
        let edges = &self.edges[feature];
        let b = if value.is_nan() {
            edges.len()
        } else {
            edges.partition_point(|&e| e < value)
        };
        b as u8
    }

    fn transform(&self, x: ArrayView2<f64>) -> Array2<u8> {
        let mut binned = Array2::<u8>::zeros(x.dim());
        for ((row, col), value) in x.indexed_iter() {
            binned[[row, col]] = self.bin(col, *value);
        }
        binned
    }
}

// ============================================================================
// TREE GROWING
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct SplitInfo {
    feature: usize,
    bin: u8,
    threshold: f64,
    gain: f64,
}

struct LeafCandidate {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
    split: Option<SplitInfo>,
}

struct Grower<'a> {
    binned: &'a Array2<u8>,
    mapper: &'a BinMapper,
    gradients: &'a [f64],
    hessians: &'a [f64],
    params: &'a BoostingParams,
}

impl Grower<'_> {
    fn sums(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(g, h), &i| (g + self.gradients[i], h + self.hessians[i]))
    }

    fn leaf_value(&self, samples: &[usize]) -> f64 {
        let (g, h) = self.sums(samples);
        -self.params.learning_rate * g / (h + self.params.l2_regularization).max(PROBA_EPS)
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.l2_regularization)
    }

    fn find_split(&self, samples: &[usize], depth: usize) -> Option<SplitInfo> {
        let msl = self.params.min_samples_leaf.max(1);
        if samples.len() < 2 * msl {
            return None;
        }
        if self.params.max_depth.is_some_and(|max| depth >= max) {
            return None;
        }

        let (g_total, h_total) = self.sums(samples);
        let parent = self.score(g_total, h_total);
        let mut best: Option<SplitInfo> = None;

        for feature in 0..self.binned.ncols() {
            let n_bins = self.mapper.n_bins(feature);
            if n_bins < 2 {
                continue;
            }
            let mut hist = vec![(0.0f64, 0.0f64, 0usize); n_bins];
            for &i in samples {
                let slot = &mut hist[self.binned[[i, feature]] as usize];
                slot.0 += self.gradients[i];
                slot.1 += self.hessians[i];
                slot.2 += 1;
            }

            let (mut gl, mut hl, mut cl) = (0.0, 0.0, 0usize);
            for (bin, &(g, h, c)) in hist.iter().enumerate().take(n_bins - 1) {
                gl += g;
                hl += h;
                cl += c;
                let cr = samples.len() - cl;
                let hr = h_total - hl;
                if cl < msl || cr < msl || hl < MIN_CHILD_HESSIAN || hr < MIN_CHILD_HESSIAN {
                    continue;
                }
                let gain = self.score(gl, hl) + self.score(g_total - gl, hr) - parent;
                if gain > best.map_or(0.0, |b| b.gain) {
                    best = Some(SplitInfo {
                        feature,
                        bin: bin as u8,
                        threshold: self.mapper.edges[feature][bin],
                        gain,
                    });
                }
            }
        }
        best
    }

    fn candidate(&self, node: usize, samples: Vec<usize>, depth: usize) -> LeafCandidate {
        let split = self.find_split(&samples, depth);
        LeafCandidate { node, samples, depth, split }
    }

    /// Grow one tree; adds each row's leaf value into `raw`
    fn grow(&self, raw: &mut [f64]) -> Tree {
        let all: Vec<usize> = (0..self.binned.nrows()).collect();
        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let mut open = vec![self.candidate(0, all, 0)];
        let mut leaves = 1;

        while leaves < self.params.max_leaf_nodes {
            // First candidate with the strictly highest gain
            let mut pick: Option<(usize, f64)> = None;
            for (pos, cand) in open.iter().enumerate() {
                if let Some(split) = cand.split {
                    if pick.map_or(true, |(_, g)| split.gain > g) {
                        pick = Some((pos, split.gain));
                    }
                }
            }
            let Some((pos, _)) = pick else { break };

            let cand = open.remove(pos);
            let Some(split) = cand.split else { break };
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = cand
                .samples
                .iter()
                .partition(|&&i| self.binned[[i, split.feature]] <= split.bin);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes[cand.node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            open.push(self.candidate(left, left_rows, cand.depth + 1));
            open.push(self.candidate(right, right_rows, cand.depth + 1));
            leaves += 1;
        }

        for cand in open {
            let value = self.leaf_value(&cand.samples);
            nodes[cand.node] = TreeNode::Leaf { value };
            for &i in &cand.samples {
                raw[i] += value;
            }
        }

        Tree { nodes }
    }
}

impl BoostedTrees {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<u8>, params: &BoostingParams) -> Self {
        let n = y.len();
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(v)).collect();

        let prior = (targets.iter().sum::<f64>() / n.max(1) as f64).clamp(PROBA_EPS, 1.0 - PROBA_EPS);
        let baseline = (prior / (1.0 - prior)).ln();

        let mapper = BinMapper::fit(x, params.max_bins.clamp(2, 255));
        let binned = mapper.transform(x);

        let mut raw = vec![baseline; n];
        let mut gradients = vec![0.0; n];
        let mut hessians = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.max_iter);

        for _ in 0..params.max_iter {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                gradients[i] = p - targets[i];
                hessians[i] = (p * (1.0 - p)).max(PROBA_EPS);
            }
            let grower = Grower {
                binned: &binned,
                mapper: &mapper,
                gradients: &gradients,
                hessians: &hessians,
                params,
            };
            let tree = grower.grow(&mut raw);
            trees.push(tree);
        }

        log::trace!(
            "boosting fit: {} trees, {} leaves on the last",
            trees.len(),
            trees.last().map_or(0, Tree::leaf_count)
        );

        Self { baseline, trees }
    }
}

impl ProbabilityScorer for BoostedTrees {
    fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.axis_iter(Axis(0))
            .map(|row| self.baseline + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bin_edges_are_midpoints() {
        let x = array![[1.0], [2.0], [2.0], [4.0]];
        let mapper = BinMapper::fit(x.view(), 255);
        assert_eq!(mapper.edges[0], vec![1.5, 3.0]);
        assert_eq!(mapper.bin(0, 1.0), 0);
        assert_eq!(mapper.bin(0, 1.5), 0);
        assert_eq!(mapper.bin(0, 2.0), 1);
        assert_eq!(mapper.bin(0, 9.0), 2);
        assert_eq!(mapper.bin(0, f64::NAN), 2);
    }

    #[test]
    fn test_bin_edges_capped_by_max_bins() {
        let x = Array2::from_shape_fn((1000, 1), |(i, _)| i as f64);
        let mapper = BinMapper::fit(x.view(), 16);
        assert!(mapper.n_bins(0) <= 16);
        let binned = mapper.transform(x.view());
        assert_eq!(binned[[0, 0]], 0);
        assert_eq!(binned[[999, 0]] as usize, mapper.n_bins(0) - 1);
    }

    #[test]
    fn test_baseline_is_prior_log_odds() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0u8, 0, 0, 1];
        let params = BoostingParams { max_iter: 0, ..Default::default() };
        let model = BoostedTrees::fit(x.view(), y.view(), &params);
        assert!((model.baseline - (1.0f64 / 3.0).ln()).abs() < 1e-12);
        assert!((model.predict_proba(x.view())[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_learns_step_function() {
        let x = Array2::from_shape_fn((200, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y: Array1<u8> = (0..200).map(|i| u8::from(i >= 120)).collect();
        let params = BoostingParams { max_iter: 50, min_samples_leaf: 5, ..Default::default() };
        let model = BoostedTrees::fit(x.view(), y.view(), &params);

        let proba = model.predict_proba(x.view());
        assert!(proba[10] < 0.1);
        assert!(proba[190] > 0.9);

        // The first tree splits on the informative feature
        match &model.trees[0].nodes[0] {
            TreeNode::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 0);
                assert!((*threshold - 119.5).abs() < 1e-9);
            }
            other => panic!("Expected root split, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_and_leaf_limits() {
        let x = Array2::from_shape_fn((300, 3), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y: Array1<u8> = (0..300).map(|i| u8::from(i % 3 == 0)).collect();

        let stump = BoostingParams { max_iter: 3, max_depth: Some(1), min_samples_leaf: 1, ..Default::default() };
        let model = BoostedTrees::fit(x.view(), y.view(), &stump);
        assert!(model.trees.iter().all(|t| t.leaf_count() <= 2));

        let bushy = BoostingParams { max_iter: 3, min_samples_leaf: 1, max_leaf_nodes: 8, ..Default::default() };
        let model = BoostedTrees::fit(x.view(), y.view(), &bushy);
        assert!(model.trees.iter().all(|t| t.leaf_count() <= 8));
    }

    #[test]
    fn test_min_samples_leaf_blocks_small_splits() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0u8, 1, 0, 1];
        let params = BoostingParams { max_iter: 2, min_samples_leaf: 3, ..Default::default() };
        let model = BoostedTrees::fit(x.view(), y.view(), &params);
        assert!(model.trees.iter().all(|t| t.nodes.len() == 1));
    }
}
