//! L1-regularized linear selectors swept along a regularization path.
//!
//! Each selector minimizes
//!
//! ```text
//! |w|_1 + C * sum_i loss(y_i, w . x_i + b)
//! ```
//!
//! with an unpenalized intercept `b`, solved by FISTA (accelerated proximal
//! gradient with soft thresholding). Consecutive values of `C` are
//! warm-started from the previous solution, so sweeping a fine grid costs
//! little more than a single fit.

use ndarray::{Array1, ArrayView2};

use crate::models::utils::sigmoid;

/// Coefficients with absolute value at or below this are treated as zero.
pub const SUPPORT_TOLERANCE: f64 = 1e-5;

/// Data-fit term of a sparse selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseLoss {
    /// `max(0, 1 - y z)^2`, the L1 linear SVC loss.
    SquaredHinge,
    /// `log(1 + exp(-y z))`, L1 logistic regression.
    Logistic,
    /// `(y - z)^2` against +/-1 targets.
    LeastSquares,
}

impl SparseLoss {
    pub fn name(&self) -> &'static str {
        match self {
            SparseLoss::SquaredHinge => "l1_linear_svc",
            SparseLoss::Logistic => "l1_logistic",
            SparseLoss::LeastSquares => "l1_least_squares",
        }
    }

    /// Derivative of the loss with respect to the decision value `z`.
    fn derivative(&self, y: f64, z: f64) -> f64 {
        match self {
            SparseLoss::SquaredHinge => -2.0 * y * (1.0 - y * z).max(0.0),
            SparseLoss::Logistic => -y * sigmoid(-y * z),
            SparseLoss::LeastSquares => 2.0 * (z - y),
        }
    }

    /// Upper bound on the second derivative with respect to `z`.
    fn curvature(&self) -> f64 {
        match self {
            SparseLoss::SquaredHinge | SparseLoss::LeastSquares => 2.0,
            SparseLoss::Logistic => 0.25,
        }
    }
}

/// Largest squared singular value of `[x, 1]`, by power iteration on the
/// Gram matrix.
fn spectral_norm_sq(x: ArrayView2<f64>) -> f64 {
    const ITERATIONS: usize = 100;
    let (n, p) = x.dim();
    let mut v = Array1::<f64>::from_elem(p + 1, 1.0 / ((p + 1) as f64).sqrt());
    let mut estimate = 0.0;
    for _ in 0..ITERATIONS {
        // u = [x, 1] v
        let u: Vec<f64> = (0..n)
            .map(|i| x.row(i).dot(&v.slice(ndarray::s![..p])) + v[p])
            .collect();
        // v' = [x, 1]^T u
        let mut next = Array1::<f64>::zeros(p + 1);
        for (i, &ui) in u.iter().enumerate() {
            for j in 0..p {
                next[j] += x[(i, j)] * ui;
            }
            next[p] += ui;
        }
        let norm = next.dot(&next).sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        estimate = norm;
        v = next / norm;
    }
    estimate
}

/// A sparse selector bound to one training matrix.
pub struct SparsePath<'a> {
    x: ArrayView2<'a, f64>,
    /// Labels as +/-1.
    y: Vec<f64>,
    loss: SparseLoss,
    /// Lipschitz constant of the gradient for `C = 1`.
    unit_lipschitz: f64,
    w: Array1<f64>,
    b: f64,
}

impl<'a> SparsePath<'a> {
    const MAX_ITER: usize = 1000;
    const TOL: f64 = 1e-6;

    /// Prepare a path over already normalized features.
    ///
    /// # Parameters
    ///
    /// * `x` - Matrix of shape (n_samples, n_features), imputed and scaled.
    /// * `labels` - `true` for the positive class.
    /// * `loss` - Which data-fit term to minimize.
    pub fn new(x: ArrayView2<'a, f64>, labels: &[bool], loss: SparseLoss) -> Self {
        let y = labels.iter().map(|&l| if l { 1.0 } else { -1.0 }).collect();
        let unit_lipschitz = loss.curvature() * spectral_norm_sq(x);
        SparsePath {
            x,
            y,
            loss,
            unit_lipschitz,
            w: Array1::zeros(x.ncols()),
            b: 0.0,
        }
    }

    fn gradient(&self, w: &Array1<f64>, b: f64, c: f64) -> (Array1<f64>, f64) {
        let mut gw = Array1::<f64>::zeros(w.len());
        let mut gb = 0.0;
        for (row, &yi) in self.x.outer_iter().zip(self.y.iter()) {
            let d = c * self.loss.derivative(yi, row.dot(w) + b);
            if d != 0.0 {
                gw.scaled_add(d, &row);
                gb += d;
            }
        }
        (gw, gb)
    }

    /// Fit at regularization strength `c`, starting from the previous
    /// solution, and return the coefficient vector.
    pub fn fit(&mut self, c: f64) -> &Array1<f64> {
        let lipschitz = c * self.unit_lipschitz;
        if lipschitz <= 0.0 {
            return &self.w;
        }
        let step = 1.0 / lipschitz;

        let (mut w, mut b) = (self.w.clone(), self.b);
        let (mut zw, mut zb) = (w.clone(), b);
        let mut t = 1.0f64;
        for iter in 0..Self::MAX_ITER {
            let (gw, gb) = self.gradient(&zw, zb, c);
            let mut next_w = &zw - &(gw * step);
            next_w.mapv_inplace(|v| v.signum() * (v.abs() - step).max(0.0));
            let next_b = zb - step * gb;

            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let momentum = (t - 1.0) / t_next;
            zw = &next_w + &((&next_w - &w) * momentum);
            zb = next_b + momentum * (next_b - b);

            let change = next_w
                .iter()
                .zip(w.iter())
                .map(|(a, b)| (a - b).abs())
                .fold((next_b - b).abs(), f64::max);
            w = next_w;
            b = next_b;
            t = t_next;
            if change < Self::TOL {
                log::trace!("{} converged at C={} after {} iterations", self.loss.name(), c, iter + 1);
                break;
            }
        }
        self.w = w;
        self.b = b;
        &self.w
    }

    /// Indices of the features with non-negligible weight in the last fit.
    pub fn support(&self) -> Vec<usize> {
        self.w
            .iter()
            .enumerate()
            .filter(|(_, w)| w.abs() > SUPPORT_TOLERANCE)
            .map(|(j, _)| j)
            .collect()
    }
}

/// Sweep `c_values` in order and return the support found at every step.
///
/// # Parameters
///
/// * `x` - Normalized training features of shape (n_samples, n_features).
/// * `labels` - Training labels.
/// * `loss` - Selector family.
/// * `c_values` - Regularization strengths, typically increasing.
///
/// # Returns
///
/// One support (sorted feature indices) per entry of `c_values`.
pub fn support_path(
    x: ArrayView2<f64>,
    labels: &[bool],
    loss: SparseLoss,
    c_values: &[f64],
) -> Vec<Vec<usize>> {
    let mut path = SparsePath::new(x, labels, loss);
    c_values
        .iter()
        .map(|&c| {
            path.fit(c);
            path.support()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn informative() -> (Array2<f64>, Vec<bool>) {
        // column 0 separates, column 1 is weakly related, column 2 is noise
        let x = array![
            [-1.5, -0.2, 0.3],
            [-1.2, 0.4, -0.9],
            [-0.9, -0.6, 1.1],
            [-1.1, 0.1, -0.4],
            [1.0, 0.5, 0.2],
            [1.3, -0.1, -1.0],
            [0.8, 0.7, 0.9],
            [1.6, 0.2, -0.2]
        ];
        (x, vec![false, false, false, false, true, true, true, true])
    }

    #[test]
    fn strong_penalty_selects_nothing() {
        let (x, y) = informative();
        for loss in [SparseLoss::SquaredHinge, SparseLoss::Logistic, SparseLoss::LeastSquares] {
            let supports = support_path(x.view(), &y, loss, &[1e-4]);
            assert!(supports[0].is_empty(), "{:?} selected {:?}", loss, supports[0]);
        }
    }

    #[test]
    fn support_grows_with_c_and_starts_with_informative_feature() {
        let (x, y) = informative();
        for loss in [SparseLoss::SquaredHinge, SparseLoss::Logistic, SparseLoss::LeastSquares] {
            let c_values: Vec<f64> = (1..=200).map(|i| i as f64 * 0.01).collect();
            let supports = support_path(x.view(), &y, loss, &c_values);
            let first = supports
                .iter()
                .find(|s| !s.is_empty())
                .unwrap_or_else(|| panic!("{:?} never selected a feature", loss));
            assert_eq!(first, &vec![0], "{:?}", loss);
        }
    }

    #[test]
    fn spectral_norm_of_identity_block() {
        // [I, 1] for 2x2 identity: Gram eigenvalues are 3 and 1 and 0
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        assert!((spectral_norm_sq(x.view()) - 3.0).abs() < 1e-6);
    }
}
