//! Outer leave-one-out driver.
//!
//! Each outer fold holds out one sample and runs the full nested search on
//! the rest. Folds are independent and run on a bounded rayon pool; each
//! fold's generator is derived from the base seed and the fold index, so the
//! results do not depend on scheduling.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::data_handling::Dataset;
use crate::error::{PanelError, Result};
use crate::models::factory::Catalog;
use crate::selection::{select_and_score, FoldResult, RandomState};

/// Thread-safe completion counter that logs as folds finish.
struct Progress {
    total: usize,
    count: AtomicUsize,
    description: String,
}

impl Progress {
    fn new(total: usize, description: &str) -> Self {
        Self {
            total,
            count: AtomicUsize::new(0),
            description: description.to_string(),
        }
    }

    fn inc(&self) {
        let done = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        log::info!("{}: {}/{} folds done", self.description, done, self.total);
    }
}

/// Run the nested search for a single held-out sample.
pub fn outer_fold(
    dataset: &Dataset,
    fold: usize,
    config: &PipelineConfig,
    catalog: &Catalog,
    random_state: RandomState,
) -> Result<FoldResult> {
    let (train, test) = dataset.leave_one_out(fold);
    let mut result = select_and_score(
        train.features.view(),
        &train.labels,
        test.features.view(),
        &test.labels,
        dataset.feature_names(),
        config,
        catalog,
        Some(random_state),
    )?;
    result.fold = Some(fold);
    Ok(result)
}

/// Leave-one-out cross-validation of the whole selection procedure.
///
/// Returns one [`FoldResult`] per sample, in sample order. The first failing
/// fold aborts the run and is reported with its index.
pub fn run_cross_validation(
    dataset: &Dataset,
    config: &PipelineConfig,
    catalog: &Catalog,
) -> Result<Vec<FoldResult>> {
    config.validate(dataset.n_features())?;
    dataset.check_class_balance()?;

    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let n = dataset.n_samples();
    log::info!(
        "Running {} outer folds for panel size {} on {} workers (seed {})",
        n,
        config.panel_size,
        config.n_workers,
        base_seed
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_workers)
        .build()
        .map_err(|e| PanelError::WorkerPool(e.to_string()))?;
    let progress = Progress::new(n, &format!("Panel size {}", config.panel_size));

    pool.install(|| {
        (0..n)
            .into_par_iter()
            .map(|fold| {
                let result = outer_fold(
                    dataset,
                    fold,
                    config,
                    catalog,
                    RandomState::for_fold(base_seed, fold),
                )
                .map_err(|source| PanelError::FoldFailed {
                    fold,
                    panel_size: config.panel_size,
                    source: Box::new(source),
                });
                progress.inc();
                result
            })
            .collect::<Result<Vec<FoldResult>>>()
    })
}

/// Train on the whole of `train` and score every row of `validation`.
pub fn run_validation(
    train: &Dataset,
    validation: &Dataset,
    config: &PipelineConfig,
    catalog: &Catalog,
) -> Result<FoldResult> {
    train.check_same_features(validation)?;
    config.validate(train.n_features())?;
    train.check_class_balance()?;

    let random_state = match config.seed {
        Some(seed) => RandomState::new(seed, 0),
        None => RandomState::capture(),
    };
    log::info!(
        "Training on {} samples, validating on {} samples",
        train.n_samples(),
        validation.n_samples()
    );
    select_and_score(
        train.features(),
        train.labels(),
        validation.features(),
        validation.labels(),
        train.feature_names(),
        config,
        catalog,
        Some(random_state),
    )
}

/// Outer-test scores and labels of all folds, concatenated in fold order.
pub fn pooled_scores(results: &[FoldResult]) -> (Vec<f64>, Vec<bool>) {
    let scores = results
        .iter()
        .flat_map(|r| r.test_scores.iter().copied())
        .collect();
    let labels = results
        .iter()
        .flat_map(|r| r.test_labels.iter().copied())
        .collect();
    (scores, labels)
}
