use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{PanelError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{check_predict_width, check_training_data};

/// Kernel used by [`SvmClassifier`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    Linear,
    /// Gaussian kernel `exp(-gamma * |a - b|^2)`. `gamma = None` picks
    /// `1 / (n_features * Var(X))` at fit time.
    Rbf { gamma: Option<f64> },
}

/// Soft-margin support vector classifier backed by `linfa-svm`.
///
/// Probabilities are the Platt-calibrated positive-class estimates that
/// `Svm<f64, Pr>` produces from its training decision values.
pub struct SvmClassifier {
    kernel: Kernel,
    c: f64,
    model: Option<Svm<f64, Pr>>,
    n_features: usize,
}

impl SvmClassifier {
    pub fn new(kernel: Kernel, c: f64) -> Self {
        SvmClassifier {
            kernel,
            c,
            model: None,
            n_features: 0,
        }
    }

    pub fn linear() -> Self {
        Self::new(Kernel::Linear, 1.0)
    }

    pub fn rbf() -> Self {
        Self::new(Kernel::Rbf { gamma: None }, 1.0)
    }

    /// Kernel width for the training matrix; `0.0` for the linear kernel.
    pub fn resolve_gamma(&self, x: ArrayView2<f64>) -> f64 {
        match self.kernel {
            Kernel::Linear => 0.0,
            Kernel::Rbf { gamma: Some(g) } => g,
            Kernel::Rbf { gamma: None } => {
                let n = x.len() as f64;
                let mean = x.sum() / n;
                let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                if var > 0.0 {
                    1.0 / (x.ncols() as f64 * var)
                } else {
                    1.0
                }
            }
        }
    }

    fn params(&self, x: ArrayView2<f64>) -> SvmParams<f64, Pr> {
        let params: SvmParams<f64, Pr> = Svm::<f64, Pr>::params().pos_neg_weights(self.c, self.c);
        match self.kernel {
            Kernel::Linear => params.linear_kernel(),
            // linfa parameterizes the Gaussian kernel as exp(-|a - b|^2 / eps)
            Kernel::Rbf { .. } => params.gaussian_kernel(1.0 / self.resolve_gamma(x)),
        }
    }
}

impl ClassifierModel for SvmClassifier {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[bool]) -> Result<()> {
        check_training_data(x, y, self.name())?;
        let params = self.params(x);
        let dataset = Dataset::new(x.to_owned(), Array1::from_vec(y.to_vec()));

        let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
            .map_err(|e| PanelError::ModelFit {
                model: self.name(),
                message: e.to_string(),
            })?;
        self.model = Some(model);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(PanelError::NotFitted(self.name()))?;
        check_predict_width(x, self.n_features)?;
        let records: Array2<f64> = x.to_owned();
        let predictions: Array1<Pr> = model.predict(&records);
        Ok(predictions.iter().map(|&p| f64::from(*p)).collect())
    }

    fn name(&self) -> &'static str {
        match self.kernel {
            Kernel::Linear => "linear_svc",
            Kernel::Rbf { .. } => "rbf_svc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Vec<bool>) {
        let x = array![
            [0.1, 1.0],
            [0.4, 0.8],
            [0.2, 1.2],
            [0.3, 0.9],
            [2.1, -1.0],
            [2.4, -0.7],
            [1.9, -1.2],
            [2.2, -0.9]
        ];
        (x, vec![false, false, false, false, true, true, true, true])
    }

    #[test]
    fn linear_svc_ranks_positives_above_negatives() {
        let (x, y) = blobs();
        let mut model = SvmClassifier::linear();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(x.view()).unwrap();
        let min_pos = p[4..].iter().cloned().fold(f64::INFINITY, f64::min);
        let max_neg = p[..4].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min_pos > max_neg, "probabilities: {:?}", p);
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn rbf_svc_ranks_positives_above_negatives() {
        let (x, y) = blobs();
        let mut model = SvmClassifier::rbf();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(array![[0.2, 1.0], [2.2, -1.0]].view()).unwrap();
        assert!(p[1] > p[0], "probabilities: {:?}", p);
    }

    #[test]
    fn default_gamma_scales_with_feature_count_and_variance() {
        let x = array![[0.0, 2.0], [2.0, 0.0]];
        // pooled variance of {0, 2, 2, 0} is 1
        assert!((SvmClassifier::rbf().resolve_gamma(x.view()) - 0.5).abs() < 1e-12);
        let flat = array![[1.0, 1.0], [1.0, 1.0]];
        assert_eq!(SvmClassifier::rbf().resolve_gamma(flat.view()), 1.0);
    }

    #[test]
    fn width_mismatch_is_reported() {
        let (x, y) = blobs();
        let mut model = SvmClassifier::linear();
        model.fit(x.view(), &y).unwrap();
        assert!(model.predict_proba(array![[1.0]].view()).is_err());
    }

    #[test]
    fn predict_before_fit_errors() {
        let model = SvmClassifier::rbf();
        assert!(matches!(
            model.predict_proba(array![[1.0, 2.0]].view()),
            Err(PanelError::NotFitted("rbf_svc"))
        ));
    }
}
