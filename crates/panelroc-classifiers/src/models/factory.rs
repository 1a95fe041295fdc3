use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::PanelError;
use crate::feature_selection::sparse_path::SparseLoss;
use crate::models::classifier_trait::{ClassifierModel, ImportanceModel};
use crate::models::forest::Forest;
use crate::models::logistic::LogisticRegression;
use crate::models::naive_bayes::GaussianNaiveBayes;
use crate::models::svm::SvmClassifier;
use crate::models::tree::DecisionTree;
use crate::preprocessing::Normalization;

/// Identifier of a classifier family in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodId {
    Lr,
    Lsvc,
    Rbfsvc,
    Nb,
    Dt,
    Rf,
    Et,
}

impl MethodId {
    /// Every method, in catalog order.
    pub const ALL: [MethodId; 7] = [
        MethodId::Lr,
        MethodId::Lsvc,
        MethodId::Rbfsvc,
        MethodId::Nb,
        MethodId::Dt,
        MethodId::Rf,
        MethodId::Et,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodId::Lr => "lr",
            MethodId::Lsvc => "lsvc",
            MethodId::Rbfsvc => "rbfsvc",
            MethodId::Nb => "nb",
            MethodId::Dt => "dt",
            MethodId::Rf => "rf",
            MethodId::Et => "et",
        }
    }

    /// Name used in plot titles and reports.
    pub fn long_name(&self) -> &'static str {
        match self {
            MethodId::Lr => "Logistic regression",
            MethodId::Lsvc => "SVC with linear kernel",
            MethodId::Rbfsvc => "SVC with RBF kernel",
            MethodId::Nb => "Naive Bayes",
            MethodId::Dt => "Decision tree",
            MethodId::Rf => "Random forest",
            MethodId::Et => "Extremely randomized trees",
        }
    }

    pub fn default_normalization(&self) -> Normalization {
        match self {
            MethodId::Lr | MethodId::Lsvc | MethodId::Rbfsvc => Normalization::Scaled,
            MethodId::Nb => Normalization::Log,
            MethodId::Dt | MethodId::Rf | MethodId::Et => Normalization::None,
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodId {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodId::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PanelError::UnknownMethod(s.to_string()))
    }
}

/// Immutable registry of classifier families and panel selectors.
///
/// Built once per run and shared by reference across worker threads; every
/// call to [`Catalog::instantiate`] hands out a fresh, unfit model.
#[derive(Debug, Clone)]
pub struct Catalog {
    methods: Vec<MethodId>,
    n_estimators: usize,
}

impl Catalog {
    /// All seven methods with 100-tree forests.
    pub fn standard() -> Self {
        Self::from_config(&CatalogConfig::default())
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        let mut methods: Vec<MethodId> = Vec::with_capacity(config.methods.len());
        for &m in &config.methods {
            if !methods.contains(&m) {
                methods.push(m);
            }
        }
        Catalog {
            methods,
            n_estimators: config.n_estimators,
        }
    }

    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Build a fresh, unfit model. `seed` is only consumed by the tree
    /// families.
    pub fn instantiate(&self, method: MethodId, seed: u64) -> Box<dyn ClassifierModel> {
        match method {
            MethodId::Lr => Box::new(LogisticRegression::default()),
            MethodId::Lsvc => Box::new(SvmClassifier::linear()),
            MethodId::Rbfsvc => Box::new(SvmClassifier::rbf()),
            MethodId::Nb => Box::new(GaussianNaiveBayes::default()),
            MethodId::Dt => Box::new(DecisionTree::cart(seed)),
            MethodId::Rf => Box::new(Forest::random_forest(self.n_estimators, seed)),
            MethodId::Et => Box::new(Forest::extra_trees(self.n_estimators, seed)),
        }
    }

    pub fn normalization_for(&self, method: MethodId) -> Normalization {
        method.default_normalization()
    }

    /// Regularization-path selectors, in the order their panels are emitted.
    pub fn sparse_selectors(&self) -> [SparseLoss; 3] {
        [
            SparseLoss::SquaredHinge,
            SparseLoss::Logistic,
            SparseLoss::LeastSquares,
        ]
    }

    /// Tree families used for importance panels: decision tree, random forest
    /// and extra trees, each seeded from `seeds` in that order.
    pub fn importance_models(&self, seeds: [u64; 3]) -> Vec<Box<dyn ImportanceModel>> {
        vec![
            Box::new(DecisionTree::cart(seeds[0])),
            Box::new(Forest::random_forest(self.n_estimators, seeds[1])),
            Box::new(Forest::extra_trees(self.n_estimators, seeds[2])),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_ids_parse_case_insensitively() {
        assert_eq!("RbfSvc".parse::<MethodId>().unwrap(), MethodId::Rbfsvc);
        assert!(matches!(
            "svm".parse::<MethodId>(),
            Err(PanelError::UnknownMethod(_))
        ));
    }

    #[test]
    fn serde_uses_short_ids() {
        let json = serde_json::to_string(&[MethodId::Lr, MethodId::Et]).unwrap();
        assert_eq!(json, r#"["lr","et"]"#);
    }

    #[test]
    fn catalog_keeps_config_order_without_duplicates() {
        let catalog = Catalog::from_config(&CatalogConfig {
            methods: vec![MethodId::Nb, MethodId::Lr, MethodId::Nb],
            n_estimators: 5,
        });
        assert_eq!(catalog.methods(), &[MethodId::Nb, MethodId::Lr]);
        assert_eq!(catalog.normalization_for(MethodId::Nb), Normalization::Log);
        assert_eq!(catalog.instantiate(MethodId::Rf, 1).name(), "random_forest");
    }

    #[test]
    fn standard_catalog_order() {
        assert_eq!(Catalog::standard().methods(), &MethodId::ALL);
    }
}
