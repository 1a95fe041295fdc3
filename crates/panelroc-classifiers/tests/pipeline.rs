use ndarray::Array2;

use panelroc_classifiers::config::{CGrid, CatalogConfig, PipelineConfig};
use panelroc_classifiers::cross_validation::{pooled_scores, run_cross_validation, run_validation};
use panelroc_classifiers::data_handling::Dataset;
use panelroc_classifiers::error::PanelError;
use panelroc_classifiers::feature_selection::panels::panels_for;
use panelroc_classifiers::models::factory::{Catalog, MethodId};
use panelroc_classifiers::selection::{select_and_score, RandomState};
use panelroc_classifiers::stats::roc_stats;

/// Twelve samples: feature 0 separates the classes, features 1 and 2 do not.
/// All values are positive so the log transform stays finite.
fn toy_dataset(offset: f64) -> Dataset {
    let n = 12;
    let features = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 => {
            let base = if i < n / 2 { 1.0 } else { 5.0 };
            base + 0.1 * (i % 6) as f64 + offset
        }
        1 => ((i * 7) % 5) as f64 + 1.0,
        _ => ((i * 3) % 4) as f64 + 0.5,
    });
    let labels = (0..n).map(|i| i >= n / 2).collect();
    let names = ["informative", "noise_a", "noise_b"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Dataset::new(features, labels, names).unwrap()
}

fn small_config(panel_size: usize) -> PipelineConfig {
    PipelineConfig {
        panel_size,
        c_grid: CGrid::new(0.05, 1.0, 0.05),
        n_workers: 2,
        seed: Some(42),
        catalog: CatalogConfig {
            methods: vec![MethodId::Lr, MethodId::Nb],
            n_estimators: 5,
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn separable_data_selects_the_informative_feature() {
    let dataset = toy_dataset(0.0);
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);
    let (train, test) = dataset.leave_one_out(0);

    let result = select_and_score(
        train.features.view(),
        &train.labels,
        test.features.view(),
        &test.labels,
        dataset.feature_names(),
        &config,
        &catalog,
        Some(RandomState::new(1, 0)),
    )
    .unwrap();

    assert_eq!(result.panel, vec!["informative".to_string()]);
    assert_eq!(result.panel_indices, vec![0]);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.fold, None);
    assert_eq!(result.test_scores.len(), 1);
    assert!(result.test_scores[0] < 0.5);
    assert_eq!(result.inner_scores.len(), 11);
    assert_eq!(result.random_state, RandomState::new(1, 0));
}

#[test]
fn duplicated_separating_columns_resolve_to_the_first_generated_panel() {
    let base = toy_dataset(0.0);
    let n = base.n_samples();
    // "a" and "b" are identical copies of the separating column
    let features = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 | 1 => base.features()[(i, 0)],
        _ => base.features()[(i, 1)],
    });
    let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let dataset = Dataset::new(features, base.labels().to_vec(), names).unwrap();
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);
    let (train, test) = dataset.leave_one_out(0);
    let state = RandomState::new(3, 0);

    let run = || {
        select_and_score(
            train.features.view(),
            &train.labels,
            test.features.view(),
            &test.labels,
            dataset.feature_names(),
            &config,
            &catalog,
            Some(state),
        )
        .unwrap()
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(first.score, 1.0);

    // candidate generation is the first consumer of the fold generator
    let panels = panels_for(
        train.features.view(),
        &train.labels,
        config.panel_size,
        &config.c_grid,
        &catalog,
        &mut state.rng(),
        config.impute_missing,
    )
    .unwrap();
    let first_separating = panels
        .iter()
        .find(|p| p.indices() == [0] || p.indices() == [1])
        .unwrap();
    assert_eq!(first.panel_indices, first_separating.indices().to_vec());
}

#[test]
fn select_and_score_validates_panel_size() {
    let dataset = toy_dataset(0.0);
    let config = small_config(5);
    let catalog = Catalog::from_config(&config.catalog);
    let (train, test) = dataset.leave_one_out(0);
    let err = select_and_score(
        train.features.view(),
        &train.labels,
        test.features.view(),
        &test.labels,
        dataset.feature_names(),
        &config,
        &catalog,
        Some(RandomState::new(1, 0)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PanelError::InvalidPanelSize {
            panel_size: 5,
            n_features: 3
        }
    ));
}

#[test]
fn select_and_score_checks_feature_name_count() {
    let dataset = toy_dataset(0.0);
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);
    let (train, test) = dataset.leave_one_out(0);
    let names = &dataset.feature_names()[..2];
    let err = select_and_score(
        train.features.view(),
        &train.labels,
        test.features.view(),
        &test.labels,
        names,
        &config,
        &catalog,
        Some(RandomState::new(1, 0)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PanelError::LengthMismatch {
            what: "feature names",
            expected: 3,
            found: 2
        }
    ));
}

#[test]
fn cross_validation_covers_every_sample_in_order() {
    let dataset = toy_dataset(0.0);
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);

    let results = run_cross_validation(&dataset, &config, &catalog).unwrap();
    assert_eq!(results.len(), dataset.n_samples());
    for (i, r) in results.iter().enumerate() {
        assert_eq!(r.fold, Some(i));
        assert_eq!(r.test_labels, vec![dataset.labels()[i]]);
        assert_eq!(r.random_state, RandomState::for_fold(42, i));
    }

    let (scores, labels) = pooled_scores(&results);
    let auc = roc_stats(&scores, &labels).unwrap().auc();
    assert!(auc > 0.9, "pooled AUC {}", auc);
}

#[test]
fn seeded_runs_are_reproducible_across_pool_sizes() {
    let dataset = toy_dataset(0.0);
    let mut config = small_config(2);
    config.catalog.methods = vec![MethodId::Nb, MethodId::Rf];
    let catalog = Catalog::from_config(&config.catalog);

    let first = run_cross_validation(&dataset, &config, &catalog).unwrap();
    config.n_workers = 1;
    let second = run_cross_validation(&dataset, &config, &catalog).unwrap();
    assert_eq!(first, second);
}

#[test]
fn validation_scores_every_validation_row() {
    let train = toy_dataset(0.0);
    let validation = toy_dataset(0.05);
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);

    let result = run_validation(&train, &validation, &config, &catalog).unwrap();
    assert_eq!(result.fold, None);
    assert_eq!(result.test_scores.len(), validation.n_samples());
    assert_eq!(result.test_labels, validation.labels());
    let auc = roc_stats(&result.test_scores, &result.test_labels)
        .unwrap()
        .auc();
    assert_eq!(auc, 1.0);
}

#[test]
fn oversized_panel_is_rejected_before_fitting() {
    let dataset = toy_dataset(0.0);
    let config = small_config(4);
    let catalog = Catalog::from_config(&config.catalog);
    let err = run_cross_validation(&dataset, &config, &catalog).unwrap_err();
    assert!(matches!(
        err,
        PanelError::InvalidPanelSize {
            panel_size: 4,
            n_features: 3
        }
    ));
}

#[test]
fn too_few_positives_are_rejected() {
    let features = Array2::from_shape_fn((6, 2), |(i, j)| (i + j) as f64);
    let labels = vec![false, false, false, false, true, true];
    let names = vec!["a".to_string(), "b".to_string()];
    let dataset = Dataset::new(features, labels, names).unwrap();
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);
    let err = run_cross_validation(&dataset, &config, &catalog).unwrap_err();
    assert!(matches!(
        err,
        PanelError::InsufficientClassMembers {
            positives: 2,
            negatives: 4,
            ..
        }
    ));
}

#[test]
fn mismatched_validation_columns_are_rejected() {
    let train = toy_dataset(0.0);
    let features = Array2::from_shape_fn((6, 3), |(i, j)| (i * j) as f64);
    let labels = vec![false, false, false, true, true, true];
    let names = ["informative", "noise_b", "noise_a"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let validation = Dataset::new(features, labels, names).unwrap();
    let config = small_config(1);
    let catalog = Catalog::from_config(&config.catalog);
    let err = run_validation(&train, &validation, &config, &catalog).unwrap_err();
    assert!(matches!(err, PanelError::FeatureNameMismatch { column: 1, .. }));
}
