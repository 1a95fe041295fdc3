//! Imputation and normalization shared by every model.
//!
//! All statistics are fitted on the training rows only and then applied
//! unchanged to the test rows, so a held-out sample never influences the
//! transform it is evaluated with.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Feature normalization applied before fitting a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    /// Natural log elementwise. Inputs must be positive; this is not checked.
    Log,
    /// Zero mean, unit variance per feature using training statistics.
    Scaled,
}

/// Per-column mean imputer.
#[derive(Clone, Debug)]
pub struct Imputer {
    pub fill: Vec<f64>,
}

impl Imputer {
    /// Fill value for a column with no observed training value.
    const EMPTY_COLUMN_FILL: f64 = 0.0;

    pub fn fit(x: ArrayView2<f64>) -> Self {
        let fill = x
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(c, col)| {
                let (sum, count) = col
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
                if count == 0 {
                    log::warn!("Feature column {} has no observed training values; imputing {}", c, Self::EMPTY_COLUMN_FILL);
                    Self::EMPTY_COLUMN_FILL
                } else {
                    sum / count as f64
                }
            })
            .collect();
        Imputer { fill }
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for (mut col, &fill) in out.axis_iter_mut(Axis(1)).zip(self.fill.iter()) {
            col.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        out
    }
}

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Columns whose spread falls below this are left unscaled (std = 1).
    const MIN_STD: f64 = 1e-12;

    /// Fit from a matrix where rows are samples and columns are features.
    /// Uses the population standard deviation.
    pub fn fit(x: ArrayView2<f64>) -> Self {
        let nrows = x.nrows().max(1) as f64;
        let mut mean = Vec::with_capacity(x.ncols());
        let mut std = Vec::with_capacity(x.ncols());
        for col in x.axis_iter(Axis(1)) {
            let m = col.sum() / nrows;
            let var = col.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / nrows;
            let s = var.sqrt();
            mean.push(m);
            std.push(if s < Self::MIN_STD { 1.0 } else { s });
        }
        Scaler { mean, std }
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for ((mut col, &m), &s) in out
            .axis_iter_mut(Axis(1))
            .zip(self.mean.iter())
            .zip(self.std.iter())
        {
            col.mapv_inplace(|v| (v - m) / s);
        }
        out
    }
}

/// Output of [`normalize`]; `test` is present when test rows were supplied.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub train: Array2<f64>,
    pub test: Option<Array2<f64>>,
}

/// Impute (optionally) and normalize `train`, applying the identical
/// transform to `test`.
pub fn normalize(
    train: ArrayView2<f64>,
    test: Option<ArrayView2<f64>>,
    mode: Normalization,
    impute_missing: bool,
) -> Normalized {
    let (train, test) = if impute_missing {
        let imputer = Imputer::fit(train);
        (imputer.transform(train), test.map(|t| imputer.transform(t)))
    } else {
        (train.to_owned(), test.map(|t| t.to_owned()))
    };

    match mode {
        Normalization::None => Normalized { train, test },
        Normalization::Log => Normalized {
            train: train.mapv(f64::ln),
            test: test.map(|t| t.mapv(f64::ln)),
        },
        Normalization::Scaled => {
            let scaler = Scaler::fit(train.view());
            Normalized {
                train: scaler.transform(train.view()),
                test: test.map(|t| scaler.transform(t.view())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn imputes_with_training_mean_only() {
        let train = array![[1.0, 2.0], [3.0, f64::NAN], [5.0, 4.0]];
        let test = array![[f64::NAN, f64::NAN]];
        let out = normalize(train.view(), Some(test.view()), Normalization::None, true);
        assert_eq!(out.train[(1, 1)], 3.0);
        let t = out.test.unwrap();
        assert_eq!(t[(0, 0)], 3.0);
        assert_eq!(t[(0, 1)], 3.0);
    }

    #[test]
    fn scaled_uses_train_statistics_for_test() {
        let train = array![[1.0], [3.0]];
        let test = array![[100.0]];
        let out = normalize(train.view(), Some(test.view()), Normalization::Scaled, false);
        assert!((out.train[(0, 0)] + 1.0).abs() < 1e-12);
        assert!((out.train[(1, 0)] - 1.0).abs() < 1e-12);
        assert!((out.test.unwrap()[(0, 0)] - 98.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_is_centered_not_divided() {
        let train = array![[5.0], [5.0], [5.0]];
        let out = normalize(train.view(), None, Normalization::Scaled, false);
        assert!(out.train.iter().all(|&v| v == 0.0));
        assert!(out.test.is_none());
    }

    #[test]
    fn log_applies_to_train_and_test() {
        let train = array![[1.0, std::f64::consts::E]];
        let test = array![[std::f64::consts::E]];
        let out = normalize(train.view(), Some(test.view()), Normalization::Log, false);
        assert!((out.train[(0, 1)] - 1.0).abs() < 1e-12);
        assert!((out.test.unwrap()[(0, 0)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_missing_column_falls_back() {
        let train = array![[f64::NAN], [f64::NAN]];
        let imputer = Imputer::fit(train.view());
        assert_eq!(imputer.fill, vec![0.0]);
    }
}
