//! Regularized logistic regression
//!
//! Minimizes `C * sum_i s_i * logloss_i + R(w)` with `R = 0.5*|w|^2` (l2) or
//! `|w|_1` (l1); the intercept is never penalized. Solved with accelerated
//! proximal gradient (FISTA with adaptive restart). The objective is divided
//! by `C * n` internally, which leaves the minimizer unchanged.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{sigmoid, ProbabilityScorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    L1,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    None,
    /// Weight each class by `n / (2 * n_class)`
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
    pub class_weight: ClassWeight,
    pub penalty: Penalty,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            class_weight: ClassWeight::None,
            penalty: Penalty::L2,
            max_iter: 5000,
            tol: 1e-7,
        }
    }
}

impl std::fmt::Display for LogisticParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "C={} class_weight={:?} penalty={:?}",
            self.c, self.class_weight, self.penalty
        )
    }
}

/// Fitted linear scorer: `sigmoid(x . coefficients + intercept)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn sample_weights(y: ArrayView1<u8>, class_weight: ClassWeight) -> Array1<f64> {
    match class_weight {
        ClassWeight::None => Array1::ones(y.len()),
        ClassWeight::Balanced => {
            let n = y.len() as f64;
            let pos = y.iter().filter(|&&v| v == 1).count().max(1) as f64;
            let neg = (y.len() - y.iter().filter(|&&v| v == 1).count()).max(1) as f64;
            y.mapv(|v| if v == 1 { n / (2.0 * pos) } else { n / (2.0 * neg) })
        }
    }
}

/// Largest eigenvalue of `(1/n) X~' S X~` where `X~` has an intercept column
fn lipschitz_bound(x: ArrayView2<f64>, s: &Array1<f64>) -> f64 {
    let (n, d) = x.dim();
    let mut gram = Array2::<f64>::zeros((d + 1, d + 1));
    for (row, &w) in x.rows().into_iter().zip(s.iter()) {
        for i in 0..=d {
            let xi = if i < d { row[i] } else { 1.0 };
            for j in 0..=d {
                let xj = if j < d { row[j] } else { 1.0 };
                gram[[i, j]] += w * xi * xj;
            }
        }
    }
    gram /= n.max(1) as f64;

    let mut v = Array1::<f64>::from_elem(d + 1, 1.0);
    let mut eigen = 0.0;
    for _ in 0..100 {
        let next = gram.dot(&v);
        let norm = next.dot(&next).sqrt();
        if norm <= f64::EPSILON {
            return 0.0;
        }
        eigen = norm / v.dot(&v).sqrt();
        v = next / norm;
    }
    eigen
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

impl LogisticModel {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<u8>, params: &LogisticParams) -> Self {
        let (n, d) = x.dim();
        let nf = n.max(1) as f64;
        let targets = y.mapv(f64::from);
        let s = sample_weights(y, params.class_weight);
        let lambda = 1.0 / (params.c * nf);

        let smooth = 0.25 * lipschitz_bound(x, &s) * 1.05;
        let lipschitz = match params.penalty {
            Penalty::L2 => smooth + lambda,
            Penalty::L1 => smooth,
        };
        let step = if lipschitz > 0.0 { 1.0 / lipschitz } else { 1.0 };

        // theta = [w..., b]
        let mut theta = Array1::<f64>::zeros(d + 1);
        let mut momentum = theta.clone();
        let mut t = 1.0f64;

        for iter in 0..params.max_iter {
            let w = momentum.slice(ndarray::s![..d]);
            let b = momentum[d];
            let z = x.dot(&w) + b;
            let residual = (z.mapv(sigmoid) - &targets) * &s / nf;

            let mut grad = Array1::<f64>::zeros(d + 1);
            grad.slice_mut(ndarray::s![..d]).assign(&x.t().dot(&residual));
            grad[d] = residual.sum();
            if params.penalty == Penalty::L2 {
                let mut gw = grad.slice_mut(ndarray::s![..d]);
                gw.scaled_add(lambda, &w);
            }

            let mut next = &momentum - &(grad * step);
            if params.penalty == Penalty::L1 {
                for coef in next.slice_mut(ndarray::s![..d]).iter_mut() {
                    *coef = soft_threshold(*coef, step * lambda);
                }
            }

            let delta = &next - &theta;
            let change = delta.iter().fold(0.0f64, |m, v| m.max(v.abs()));

            // Restart momentum when it points against the last step
            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            if (&momentum - &next).dot(&delta) > 0.0 {
                t = 1.0;
                momentum = next.clone();
            } else {
                momentum = &next + &(&delta * ((t - 1.0) / t_next));
                t = t_next;
            }
            theta = next;

            if change < params.tol {
                log::trace!("logistic regression converged after {} iterations", iter + 1);
                break;
            }
        }

        Self {
            coefficients: theta.slice(ndarray::s![..d]).to_vec(),
            intercept: theta[d],
        }
    }
}

impl ProbabilityScorer for LogisticModel {
    fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        let w = ArrayView1::from(&self.coefficients[..]);
        x.dot(&w) + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<u8>) {
        let x = array![
            [-2.0, 0.1],
            [-1.5, -0.3],
            [-1.0, 0.2],
            [-0.5, -0.1],
            [0.4, 0.0],
            [1.0, 0.3],
            [1.5, -0.2],
            [2.0, 0.1],
            [-0.2, 0.05],
            [0.3, -0.05]
        ];
        let y = array![0u8, 0, 0, 0, 1, 1, 1, 1, 1, 0];
        (x, y)
    }

    #[test]
    fn test_fit_learns_direction() {
        let (x, y) = separable();
        let model = LogisticModel::fit(x.view(), y.view(), &LogisticParams::default());
        assert!(model.coefficients[0] > 0.5);

        let proba = model.predict_proba(x.view());
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(proba[7] > 0.8);
        assert!(proba[0] < 0.2);
    }

    #[test]
    fn test_strong_l1_zeroes_coefficients() {
        let (x, y) = separable();
        let params = LogisticParams { c: 1e-3, penalty: Penalty::L1, ..Default::default() };
        let model = LogisticModel::fit(x.view(), y.view(), &params);
        assert!(model.coefficients.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_stronger_l2_shrinks() {
        let (x, y) = separable();
        let loose = LogisticModel::fit(x.view(), y.view(), &LogisticParams { c: 10.0, ..Default::default() });
        let tight = LogisticModel::fit(x.view(), y.view(), &LogisticParams { c: 0.01, ..Default::default() });
        assert!(tight.coefficients[0].abs() < loose.coefficients[0].abs());
    }

    #[test]
    fn test_balanced_weights() {
        let y = array![0u8, 0, 0, 1];
        let s = sample_weights(y.view(), ClassWeight::Balanced);
        assert!((s[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((s[3] - 2.0).abs() < 1e-12);
        // Both classes carry equal total weight
        assert!((s.slice(ndarray::s![..3]).sum() - s[3]).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weights_raise_minority_scores() {
        let x = array![[-1.0], [-0.5], [0.0], [0.2], [0.5], [1.0], [0.8], [1.5]];
        let y = array![0u8, 0, 0, 0, 0, 0, 1, 1];
        let plain = LogisticModel::fit(x.view(), y.view(), &LogisticParams::default());
        let balanced = LogisticModel::fit(
            x.view(),
            y.view(),
            &LogisticParams { class_weight: ClassWeight::Balanced, ..Default::default() },
        );
        assert!(balanced.intercept > plain.intercept);
    }
}
