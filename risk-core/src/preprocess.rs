//! Preprocessing steps fitted on training rows only
//!
//! - [`MedianImputer`]: per-column median of observed (non-NaN) values
//! - [`StandardScaler`]: per-column population mean and standard deviation

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{TrainingError, TrainingResult};
use crate::schema::feature_name;

/// Median of a slice of finite values; `None` when empty
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Replaces NaN cells with the column median learned at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    pub statistics: Vec<f64>,
}

impl MedianImputer {
    pub fn fit(x: ArrayView2<f64>) -> TrainingResult<Self> {
        let mut statistics = Vec::with_capacity(x.ncols());
        for (col, column) in x.axis_iter(Axis(1)).enumerate() {
            let mut observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            let stat = median(&mut observed)
                .ok_or_else(|| TrainingError::EmptyFeature(feature_name(col).unwrap_or("unknown")))?;
            statistics.push(stat);
        }
        Ok(Self { statistics })
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for (mut column, &fill) in out.axis_iter_mut(Axis(1)).zip(&self.statistics) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        out
    }
}

/// Centers each column and scales it to unit variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: ArrayView2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mean: Array1<f64> = x.sum_axis(Axis(0)) / n;
        let mut variance = Array1::<f64>::zeros(x.ncols());
        for row in x.axis_iter(Axis(0)) {
            Zip::from(&mut variance)
                .and(&row)
                .and(&mean)
                .for_each(|var, &v, &m| *var += (v - m).powi(2));
        }
        // Constant columns keep unit scale
        let scale = variance
            .iter()
            .map(|&ss| {
                let std = (ss / n).sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();

        Self {
            mean: mean.to_vec(),
            scale,
        }
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for ((mut column, &m), &s) in out.axis_iter_mut(Axis(1)).zip(&self.mean).zip(&self.scale) {
            column.mapv_inplace(|v| (v - m) / s);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_imputer_ignores_missing_when_fitting() {
        let nan = f64::NAN;
        let x = array![[1.0, nan], [nan, 10.0], [3.0, 30.0], [5.0, nan]];
        let imp = MedianImputer::fit(x.view()).unwrap();
        assert_eq!(imp.statistics, vec![3.0, 20.0]);

        let filled = imp.transform(x.view());
        assert_eq!(filled, array![[1.0, 20.0], [3.0, 10.0], [3.0, 30.0], [5.0, 20.0]]);
    }

    #[test]
    fn test_imputer_uses_fit_statistics_on_new_rows() {
        let train = array![[1.0], [2.0], [9.0]];
        let imp = MedianImputer::fit(train.view()).unwrap();
        let new_rows = array![[f64::NAN], [100.0]];
        assert_eq!(imp.transform(new_rows.view()), array![[2.0], [100.0]]);
    }

    #[test]
    fn test_imputer_rejects_all_missing_column() {
        let x = array![[1.0, f64::NAN], [2.0, f64::NAN]];
        assert!(matches!(
            MedianImputer::fit(x.view()),
            Err(TrainingError::EmptyFeature("Glucose"))
        ));
    }

    #[test]
    fn test_scaler_standardizes() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(x.view());
        assert_eq!(scaler.mean, vec![2.0, 5.0]);
        assert_eq!(scaler.scale, vec![1.0, 1.0]);
        assert_eq!(scaler.transform(x.view()), array![[-1.0, 0.0], [1.0, 0.0]]);

        let y = array![[0.0], [4.0]];
        let s = StandardScaler::fit(y.view());
        assert_eq!(s.scale, vec![2.0]);
    }
}
