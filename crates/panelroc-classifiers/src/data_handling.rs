//! Dataset container and row/column selection helpers.
//!
//! `Dataset` holds the feature matrix (missing values as `NaN`), the binary
//! labels and the feature names, and provides the leave-one-out splits used
//! by both the outer driver and the inner search.
use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{PanelError, Result};

/// Minimum number of samples per class for nested leave-one-out: removing the
/// outer and the inner test sample must still leave both classes present.
pub const MIN_CLASS_MEMBERS: usize = 3;

#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Vec<bool>,
    feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<bool>, feature_names: Vec<String>) -> Result<Self> {
        if features.nrows() == 0 || features.ncols() == 0 {
            return Err(PanelError::EmptyDataset);
        }
        if labels.len() != features.nrows() {
            return Err(PanelError::LengthMismatch {
                what: "labels",
                expected: features.nrows(),
                found: labels.len(),
            });
        }
        if feature_names.len() != features.ncols() {
            return Err(PanelError::LengthMismatch {
                what: "feature names",
                expected: features.ncols(),
                found: feature_names.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// (positives, negatives)
    pub fn class_counts(&self) -> (usize, usize) {
        class_counts(&self.labels)
    }

    pub fn n_missing(&self) -> usize {
        self.features.iter().filter(|v| v.is_nan()).count()
    }

    /// Nested leave-one-out needs both classes in every inner training set.
    pub fn check_class_balance(&self) -> Result<()> {
        let (positives, negatives) = self.class_counts();
        if positives < MIN_CLASS_MEMBERS || negatives < MIN_CLASS_MEMBERS {
            return Err(PanelError::InsufficientClassMembers {
                required: MIN_CLASS_MEMBERS,
                positives,
                negatives,
            });
        }
        Ok(())
    }

    /// Fail when `other` does not describe the same features in the same order.
    pub fn check_same_features(&self, other: &Dataset) -> Result<()> {
        if self.n_features() != other.n_features() {
            return Err(PanelError::LengthMismatch {
                what: "validation feature columns",
                expected: self.n_features(),
                found: other.n_features(),
            });
        }
        if let Some((column, (train, validation))) = self
            .feature_names
            .iter()
            .zip(other.feature_names.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(PanelError::FeatureNameMismatch {
                column,
                train: train.clone(),
                validation: validation.clone(),
            });
        }
        Ok(())
    }

    /// Split into (train, test) with `test_index` held out.
    pub fn leave_one_out(&self, test_index: usize) -> (Fold, Fold) {
        let (train, test) = loo_indices(self.n_samples(), test_index);
        (self.take_rows(&train), self.take_rows(&test))
    }

    pub fn take_rows(&self, rows: &[usize]) -> Fold {
        Fold {
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&r| self.labels[r]).collect(),
        }
    }

    pub fn log_input_data_summary(&self) {
        let (positives, negatives) = self.class_counts();
        log::info!("----- Input Data Summary -----");
        log::info!("{} positive and {} negative samples", positives, negatives);
        log::info!("{} feature columns, {} missing values", self.n_features(), self.n_missing());
        log::info!("-------------------------------");
    }
}

/// Rows of a dataset materialized for one side of a split.
#[derive(Debug, Clone)]
pub struct Fold {
    pub features: Array2<f64>,
    pub labels: Vec<bool>,
}

/// (positives, negatives)
pub fn class_counts(labels: &[bool]) -> (usize, usize) {
    let positives = labels.iter().filter(|&&l| l).count();
    (positives, labels.len() - positives)
}

/// Indices of the training rows and the single held-out row.
pub fn loo_indices(n: usize, test_index: usize) -> (Vec<usize>, Vec<usize>) {
    let train = (0..n).filter(|&i| i != test_index).collect();
    (train, vec![test_index])
}
