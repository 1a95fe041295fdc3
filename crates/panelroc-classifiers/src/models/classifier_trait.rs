use ndarray::ArrayView2;

use crate::error::Result;

/// Contract shared by every classifier in the catalog.
///
/// Labels are `true` for the positive (disease) class. Models are always
/// created unfit by the catalog and fit exactly once per use, so `fit`
/// replaces any previous state.
pub trait ClassifierModel: Send {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[bool]) -> Result<()>;

    /// Probability of the positive class for every row of `x`.
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>>;

    /// Short human readable name for the model
    fn name(&self) -> &'static str;
}

/// Models that rank features after fitting (tree ensembles).
pub trait FeatureImportance {
    /// Importances normalized to sum to one, or all zeros when the fitted
    /// model never split.
    fn feature_importances(&self) -> Result<Vec<f64>>;
}

/// A classifier that also exposes feature importances.
pub trait ImportanceModel: ClassifierModel + FeatureImportance {}

impl<T: ClassifierModel + FeatureImportance> ImportanceModel for T {}
