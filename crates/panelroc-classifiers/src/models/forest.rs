use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{PanelError, Result};
use crate::models::classifier_trait::{ClassifierModel, FeatureImportance};
use crate::models::tree::{DecisionTree, MaxFeatures, SplitStrategy};
use crate::models::utils::{check_predict_width, check_training_data};

/// Ensemble flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestKind {
    /// Bootstrapped rows, best splits.
    Random,
    /// All rows, random thresholds.
    ExtraTrees,
}

/// Averaging ensemble of [`DecisionTree`]s using `sqrt(p)` features per
/// split. Probabilities are the mean of the per-tree leaf fractions.
pub struct Forest {
    kind: ForestKind,
    n_estimators: usize,
    seed: u64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl Forest {
    pub fn new(kind: ForestKind, n_estimators: usize, seed: u64) -> Self {
        Forest {
            kind,
            n_estimators,
            seed,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn random_forest(n_estimators: usize, seed: u64) -> Self {
        Self::new(ForestKind::Random, n_estimators, seed)
    }

    pub fn extra_trees(n_estimators: usize, seed: u64) -> Self {
        Self::new(ForestKind::ExtraTrees, n_estimators, seed)
    }
}

impl ClassifierModel for Forest {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[bool]) -> Result<()> {
        check_training_data(x, y, self.name())?;
        let n = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let strategy = match self.kind {
            ForestKind::Random => SplitStrategy::Best,
            ForestKind::ExtraTrees => SplitStrategy::Random,
        };

        self.n_features = x.ncols();
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let tree_seed: u64 = rng.gen();
                let rows: Vec<usize> = match self.kind {
                    ForestKind::Random => (0..n).map(|_| rng.gen_range(0..n)).collect(),
                    ForestKind::ExtraTrees => (0..n).collect(),
                };
                let mut tree = DecisionTree::new(strategy, MaxFeatures::Sqrt, tree_seed);
                tree.grow(x, y, rows);
                tree
            })
            .collect();
        log::trace!("Fitted {} with {} trees", self.name(), self.trees.len());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(PanelError::NotFitted(self.name()));
        }
        check_predict_width(x, self.n_features)?;
        let mut sum = vec![0.0; x.nrows()];
        for tree in &self.trees {
            for (s, p) in sum.iter_mut().zip(tree.predict_proba(x)?) {
                *s += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(sum.into_iter().map(|s| s / n_trees).collect())
    }

    fn name(&self) -> &'static str {
        match self.kind {
            ForestKind::Random => "random_forest",
            ForestKind::ExtraTrees => "extra_trees",
        }
    }
}

impl FeatureImportance for Forest {
    /// Mean of the per-tree normalized importances over trees that split at
    /// least once, renormalized to sum to one.
    fn feature_importances(&self) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(PanelError::NotFitted(self.name()));
        }
        let mut mean = vec![0.0; self.n_features];
        let mut used = 0usize;
        for tree in self.trees.iter().filter(|t| t.n_leaves() > 1) {
            for (m, v) in mean.iter_mut().zip(tree.feature_importances()?) {
                *m += v;
            }
            used += 1;
        }
        if used == 0 {
            return Ok(mean);
        }
        let total: f64 = mean.iter().sum();
        if total > 0.0 {
            mean.iter_mut().for_each(|m| *m /= total);
        }
        Ok(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn separable(n: usize) -> (Array2<f64>, Vec<bool>) {
        // column 2 carries the label, the others are deterministic noise
        let x = Array2::from_shape_fn((n, 4), |(i, j)| {
            let label = (i % 2) as f64;
            match j {
                2 => label * 3.0 + (i as f64) * 0.01,
                _ => ((i * 7 + j * 13) % 11) as f64,
            }
        });
        let y = (0..n).map(|i| i % 2 == 1).collect();
        (x, y)
    }

    #[test]
    fn random_forest_ranks_informative_feature_first() {
        let (x, y) = separable(20);
        let mut forest = Forest::random_forest(50, 3);
        forest.fit(x.view(), &y).unwrap();
        let imp = forest.feature_importances().unwrap();
        let top = (0..4).max_by(|&a, &b| imp[a].total_cmp(&imp[b])).unwrap();
        assert_eq!(top, 2);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn extra_trees_probabilities_follow_labels() {
        let (x, y) = separable(20);
        let mut forest = Forest::extra_trees(30, 5);
        forest.fit(x.view(), &y).unwrap();
        let p = forest.predict_proba(x.view()).unwrap();
        // extra trees use every row, so fully grown trees fit the training set
        for (pi, &yi) in p.iter().zip(y.iter()) {
            assert_eq!(*pi > 0.5, yi);
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable(12);
        let mut a = Forest::random_forest(10, 42);
        let mut b = Forest::random_forest(10, 42);
        a.fit(x.view(), &y).unwrap();
        b.fit(x.view(), &y).unwrap();
        assert_eq!(a.predict_proba(x.view()).unwrap(), b.predict_proba(x.view()).unwrap());
    }
}
