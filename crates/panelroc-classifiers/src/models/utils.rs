//! Numeric helpers shared by the model implementations.
use ndarray::ArrayView2;

use crate::error::{PanelError, Result};

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(exp(a) + exp(b)) without overflow; handles -inf operands.
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}

/// Shared sanity checks before fitting.
pub fn check_training_data(x: ArrayView2<f64>, y: &[bool], model: &'static str) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(PanelError::EmptyDataset);
    }
    if x.nrows() != y.len() {
        return Err(PanelError::LengthMismatch {
            what: "training labels",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if y.iter().all(|&l| l) || y.iter().all(|&l| !l) {
        return Err(PanelError::SingleClass(model));
    }
    Ok(())
}

pub fn check_predict_width(x: ArrayView2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(PanelError::LengthMismatch {
            what: "prediction feature columns",
            expected: n_features,
            found: x.ncols(),
        });
    }
    Ok(())
}
