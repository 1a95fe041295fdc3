use linfa::traits::Fit;
use linfa::Dataset;
use linfa_bayes::{GaussianNb, NaiveBayes};
use ndarray::{Array1, ArrayView2, Axis};

use crate::error::{PanelError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{check_predict_width, check_training_data, sigmoid};

enum FittedNb {
    Gaussian(GaussianNb<f64, bool>),
    /// Every training column was constant, so only the class prior is known.
    PriorOnly(f64),
}

/// Gaussian naive Bayes backed by `linfa-bayes`.
///
/// Variances are inflated by `var_smoothing * max(feature variance)`.
pub struct GaussianNaiveBayes {
    var_smoothing: f64,
    fitted: Option<FittedNb>,
    n_features: usize,
}

impl GaussianNaiveBayes {
    pub fn new(var_smoothing: f64) -> Self {
        GaussianNaiveBayes {
            var_smoothing,
            fitted: None,
            n_features: 0,
        }
    }
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

impl ClassifierModel for GaussianNaiveBayes {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[bool]) -> Result<()> {
        check_training_data(x, y, self.name())?;
        self.n_features = x.ncols();

        let informative = x
            .axis_iter(Axis(1))
            .any(|col| col.iter().any(|v| *v != col[0]));
        if !informative {
            let prior = y.iter().filter(|&&l| l).count() as f64 / y.len() as f64;
            log::trace!("All naive Bayes training columns are constant; predicting the prior {prior}");
            self.fitted = Some(FittedNb::PriorOnly(prior));
            return Ok(());
        }

        let dataset = Dataset::new(x.to_owned(), Array1::from_vec(y.to_vec()));
        let model = GaussianNb::<f64, bool>::params()
            .var_smoothing(self.var_smoothing)
            .fit(&dataset)
            .map_err(|e| PanelError::ModelFit {
                model: self.name(),
                message: e.to_string(),
            })?;
        self.fitted = Some(FittedNb::Gaussian(model));
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(PanelError::NotFitted(self.name()))?;
        check_predict_width(x, self.n_features)?;
        match fitted {
            FittedNb::PriorOnly(prior) => Ok(vec![*prior; x.nrows()]),
            FittedNb::Gaussian(model) => {
                let jll = model.joint_log_likelihood(x);
                let (Some(pos), Some(neg)) = (jll.get(&true), jll.get(&false)) else {
                    return Err(PanelError::SingleClass(self.name()));
                };
                Ok(pos
                    .iter()
                    .zip(neg.iter())
                    .map(|(p, n)| sigmoid(p - n))
                    .collect())
            }
        }
    }

    fn name(&self) -> &'static str {
        "gaussian_nb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn prefers_the_closer_class_mean() {
        let x = array![[1.0, 10.0], [1.2, 11.0], [0.8, 9.5], [3.0, 20.0], [3.3, 21.0], [2.9, 19.0]];
        let y = [false, false, false, true, true, true];
        let mut model = GaussianNaiveBayes::default();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(array![[1.0, 10.0], [3.1, 20.5]].view()).unwrap();
        assert!(p[0] < 0.5);
        assert!(p[1] > 0.5);
    }

    #[test]
    fn constant_feature_gives_finite_probabilities() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let y = [false, false, true, true];
        let mut model = GaussianNaiveBayes::default();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(x.view()).unwrap();
        assert!(p.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn all_constant_columns_fall_back_to_the_prior() {
        let x = array![[2.0], [2.0], [2.0], [2.0]];
        let y = [false, true, true, true];
        let mut model = GaussianNaiveBayes::default();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(array![[2.0], [9.0]].view()).unwrap();
        assert_eq!(p, vec![0.75, 0.75]);
    }
}
