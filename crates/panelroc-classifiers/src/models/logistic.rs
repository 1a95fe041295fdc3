use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::FittedLogisticRegression;
use ndarray::{Array1, ArrayView2};

use crate::error::{PanelError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{check_predict_width, check_training_data};

/// L2-penalized logistic regression backed by `linfa-logistic`.
///
/// `alpha` is the ridge strength on the coefficients, `1 / C` in the
/// liblinear parameterization. linfa maps the larger label (`true`) to the
/// positive class, so `predict_probabilities` is already `P(true)`.
pub struct LogisticRegression {
    alpha: f64,
    max_iterations: u64,
    model: Option<FittedLogisticRegression<f64, bool>>,
}

impl LogisticRegression {
    pub fn new(c: f64) -> Self {
        LogisticRegression {
            alpha: 1.0 / c,
            max_iterations: 100,
            model: None,
        }
    }

    /// Fitted `(coefficients, intercept)`.
    pub fn coefficients(&self) -> Option<(&Array1<f64>, f64)> {
        self.model.as_ref().map(|m| (m.params(), m.intercept()))
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ClassifierModel for LogisticRegression {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[bool]) -> Result<()> {
        check_training_data(x, y, self.name())?;
        let dataset = Dataset::new(x.to_owned(), Array1::from_vec(y.to_vec()));
        let model = linfa_logistic::LogisticRegression::default()
            .alpha(self.alpha)
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| PanelError::ModelFit {
                model: self.name(),
                message: e.to_string(),
            })?;
        self.model = Some(model);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(PanelError::NotFitted(self.name()))?;
        check_predict_width(x, model.params().len())?;
        Ok(model.predict_probabilities(&x).to_vec())
    }

    fn name(&self) -> &'static str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn separates_one_dimensional_classes() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [false, false, false, true, true, true];
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(x.view()).unwrap();
        assert!(p[0] < 0.5 && p[5] > 0.5, "probabilities: {:?}", p);
        assert!(p.windows(2).all(|w| w[0] <= w[1]));
        let (coef, _) = model.coefficients().unwrap();
        assert!(coef[0] > 0.0);
    }

    #[test]
    fn positive_class_follows_true_labels() {
        // positives on the left this time
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [true, true, true, false, false, false];
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        let p = model.predict_proba(x.view()).unwrap();
        assert!(p[0] > p[5], "probabilities: {:?}", p);
    }

    #[test]
    fn predict_before_fit_errors() {
        let model = LogisticRegression::default();
        assert!(matches!(
            model.predict_proba(array![[1.0]].view()),
            Err(PanelError::NotFitted(_))
        ));
    }

    #[test]
    fn single_class_is_rejected() {
        let mut model = LogisticRegression::default();
        let err = model.fit(array![[1.0], [2.0]].view(), &[true, true]);
        assert!(matches!(err, Err(PanelError::SingleClass(_))));
    }
}
