//! Nested model selection for one outer split.
//!
//! Every (panel, method) candidate is scored by leave-one-out over the outer
//! training rows; the candidate with the highest TPR at the configured FPR
//! ceiling is refit on all outer training rows and used to score the outer
//! test rows.

use ndarray::{ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::data_handling::loo_indices;
use crate::error::{PanelError, Result};
use crate::feature_selection::panels::{panels_for, Panel};
use crate::models::factory::{Catalog, MethodId};
use crate::preprocessing::normalize;
use crate::stats::roc_stats;

/// Reproducible generator state.
///
/// A fold generator is `ChaCha8Rng` seeded with `seed` and switched to
/// `stream`, so folds sharing a base seed draw independent sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomState {
    pub seed: u64,
    pub stream: u64,
}

impl RandomState {
    pub fn new(seed: u64, stream: u64) -> Self {
        RandomState { seed, stream }
    }

    /// Fresh state from the thread-local entropy source.
    pub fn capture() -> Self {
        RandomState {
            seed: rand::thread_rng().gen(),
            stream: 0,
        }
    }

    pub fn for_fold(base_seed: u64, fold: usize) -> Self {
        RandomState {
            seed: base_seed,
            stream: fold as u64,
        }
    }

    pub fn rng(&self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(self.stream);
        rng
    }
}

/// Everything recorded about one outer split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    /// Held-out sample index, `None` for a train/validation run.
    pub fold: Option<usize>,
    pub panel: Vec<String>,
    pub panel_indices: Vec<usize>,
    pub method: MethodId,
    /// Selection criterion of the winning candidate.
    pub score: f64,
    pub test_scores: Vec<f64>,
    pub test_labels: Vec<bool>,
    pub inner_scores: Vec<f64>,
    pub inner_labels: Vec<bool>,
    pub random_state: RandomState,
}

/// Held-out scores collected by an inner leave-one-out run.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerScores {
    pub scores: Vec<f64>,
    pub labels: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub panel: Panel,
    pub method: MethodId,
    pub criterion: f64,
    pub inner: InnerScores,
}

/// Keeps the first candidate with the highest criterion.
#[derive(Debug, Default)]
pub struct BestCandidate {
    best: Option<Candidate>,
}

impl BestCandidate {
    /// Returns true when `candidate` becomes the new best. Only a strictly
    /// higher criterion replaces the current best.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let better = match &self.best {
            None => true,
            Some(current) => candidate.criterion > current.criterion,
        };
        if better {
            self.best = Some(candidate);
        }
        better
    }

    pub fn into_inner(self) -> Option<Candidate> {
        self.best
    }
}

/// Select from an ordered sequence of candidates; ties keep the earliest.
pub fn pick_best<I: IntoIterator<Item = Candidate>>(candidates: I) -> Option<Candidate> {
    let mut best = BestCandidate::default();
    for candidate in candidates {
        best.offer(candidate);
    }
    best.into_inner()
}

/// Highest TPR over operating points with FPR at or below `max_fpr`.
pub fn selection_criterion(scores: &[f64], labels: &[bool], max_fpr: f64) -> Result<f64> {
    Ok(roc_stats(scores, labels)?.max_tpr_at_fpr(max_fpr))
}

/// Fit `method` on the panel columns of the training rows and return the
/// positive-class probability of every test row.
///
/// Normalization uses the method's preferred mode and is fitted on the
/// training rows only.
#[allow(clippy::too_many_arguments)]
pub fn fit_and_score(
    train: ArrayView2<f64>,
    train_labels: &[bool],
    test: ArrayView2<f64>,
    panel: &Panel,
    method: MethodId,
    catalog: &Catalog,
    impute_missing: bool,
    seed: u64,
) -> Result<Vec<f64>> {
    let train = train.select(Axis(1), panel.indices());
    let test = test.select(Axis(1), panel.indices());
    let normalized = normalize(
        train.view(),
        Some(test.view()),
        catalog.normalization_for(method),
        impute_missing,
    );
    let Some(test) = normalized.test else {
        return Ok(Vec::new());
    };
    let mut model = catalog.instantiate(method, seed);
    model.fit(normalized.train.view(), train_labels)?;
    model.predict_proba(test.view())
}

/// Leave-one-out over `features` for one (panel, method) pair.
///
/// Model seeds are drawn from `rng`, one per held-out row, in row order.
pub fn inner_loocv(
    features: ArrayView2<f64>,
    labels: &[bool],
    panel: &Panel,
    method: MethodId,
    catalog: &Catalog,
    impute_missing: bool,
    rng: &mut ChaCha8Rng,
) -> Result<InnerScores> {
    let n = features.nrows();
    let mut scores = Vec::with_capacity(n);
    for i in 0..n {
        let (train_rows, test_rows) = loo_indices(n, i);
        let train = features.select(Axis(0), &train_rows);
        let test = features.select(Axis(0), &test_rows);
        let train_labels: Vec<bool> = train_rows.iter().map(|&r| labels[r]).collect();
        let seed: u64 = rng.gen();
        let score = fit_and_score(
            train.view(),
            &train_labels,
            test.view(),
            panel,
            method,
            catalog,
            impute_missing,
            seed,
        )?;
        scores.extend(score);
    }
    Ok(InnerScores {
        scores,
        labels: labels.to_vec(),
    })
}

/// Run the whole nested search for one outer split.
///
/// # Arguments
///
/// * `train_features`, `train_labels` - Outer training rows.
/// * `test_features`, `test_labels` - Outer test rows (one row under LOOCV).
/// * `feature_names` - Names of all feature columns.
/// * `config` - Panel size, FPR ceiling, C grid and imputation flag.
/// * `catalog` - Methods to search.
/// * `random_state` - Fold generator state; captured fresh when `None`.
///
/// # Returns
///
/// The winning candidate and its outer-test scores. `fold` is left as
/// `None`; the caller fills it in.
#[allow(clippy::too_many_arguments)]
pub fn select_and_score(
    train_features: ArrayView2<f64>,
    train_labels: &[bool],
    test_features: ArrayView2<f64>,
    test_labels: &[bool],
    feature_names: &[String],
    config: &PipelineConfig,
    catalog: &Catalog,
    random_state: Option<RandomState>,
) -> Result<FoldResult> {
    config.validate(train_features.ncols())?;
    if feature_names.len() != train_features.ncols() {
        return Err(PanelError::LengthMismatch {
            what: "feature names",
            expected: train_features.ncols(),
            found: feature_names.len(),
        });
    }
    if train_features.nrows() != train_labels.len() {
        return Err(PanelError::LengthMismatch {
            what: "outer training labels",
            expected: train_features.nrows(),
            found: train_labels.len(),
        });
    }
    if test_features.nrows() != test_labels.len() {
        return Err(PanelError::LengthMismatch {
            what: "outer test labels",
            expected: test_features.nrows(),
            found: test_labels.len(),
        });
    }

    let random_state = random_state.unwrap_or_else(RandomState::capture);
    let mut rng = random_state.rng();

    let panels = panels_for(
        train_features,
        train_labels,
        config.panel_size,
        &config.c_grid,
        catalog,
        &mut rng,
        config.impute_missing,
    )?;
    if panels.is_empty() {
        return Err(PanelError::NoCandidatePanels {
            panel_size: config.panel_size,
        });
    }
    log::debug!(
        "Scoring {} panels x {} methods",
        panels.len(),
        catalog.methods().len()
    );

    let mut best = BestCandidate::default();
    for panel in &panels {
        for &method in catalog.methods() {
            let inner = inner_loocv(
                train_features,
                train_labels,
                panel,
                method,
                catalog,
                config.impute_missing,
                &mut rng,
            )?;
            let criterion = selection_criterion(&inner.scores, &inner.labels, config.max_fpr)?;
            log::debug!("panel {:?} method {}: {:.4}", panel.indices(), method, criterion);
            best.offer(Candidate {
                panel: panel.clone(),
                method,
                criterion,
                inner,
            });
        }
    }
    let winner = best.into_inner().ok_or(PanelError::NoCandidatePanels {
        panel_size: config.panel_size,
    })?;

    let seed: u64 = rng.gen();
    let test_scores = fit_and_score(
        train_features,
        train_labels,
        test_features,
        &winner.panel,
        winner.method,
        catalog,
        config.impute_missing,
        seed,
    )?;

    Ok(FoldResult {
        fold: None,
        panel: winner.panel.names(feature_names),
        panel_indices: winner.panel.indices().to_vec(),
        method: winner.method,
        score: winner.criterion,
        test_scores,
        test_labels: test_labels.to_vec(),
        inner_scores: winner.inner.scores,
        inner_labels: winner.inner.labels,
        random_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(indices: Vec<usize>, method: MethodId, criterion: f64) -> Candidate {
        Candidate {
            panel: Panel::new(indices),
            method,
            criterion,
            inner: InnerScores {
                scores: Vec::new(),
                labels: Vec::new(),
            },
        }
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let best = pick_best(vec![
            candidate(vec![0], MethodId::Lr, 0.5),
            candidate(vec![1], MethodId::Nb, 0.75),
            candidate(vec![2], MethodId::Dt, 0.75),
        ])
        .unwrap();
        assert_eq!(best.panel, Panel::new(vec![1]));
        assert_eq!(best.method, MethodId::Nb);
    }

    #[test]
    fn all_zero_search_still_has_a_winner() {
        let best = pick_best(vec![
            candidate(vec![3], MethodId::Rf, 0.0),
            candidate(vec![4], MethodId::Et, 0.0),
        ])
        .unwrap();
        assert_eq!(best.method, MethodId::Rf);
        assert!(pick_best(Vec::new()).is_none());
    }

    #[test]
    fn criterion_reads_tpr_under_fpr_ceiling() {
        let scores = [0.1, 0.2, 0.7, 0.4, 0.5, 0.8, 0.7, 0.9];
        let labels = [false, false, false, false, true, true, true, true];
        assert_eq!(selection_criterion(&scores, &labels, 0.2).unwrap(), 0.5);
        assert_eq!(selection_criterion(&scores, &labels, 0.0).unwrap(), 0.5);
    }

    #[test]
    fn fold_streams_differ() {
        let a: u64 = RandomState::for_fold(7, 0).rng().gen();
        let b: u64 = RandomState::for_fold(7, 1).rng().gen();
        let again: u64 = RandomState::for_fold(7, 0).rng().gen();
        assert_ne!(a, b);
        assert_eq!(a, again);
    }
}
