//! panelroc-classifiers: nested leave-one-out biomarker panel selection.
//!
//! This crate provides a fixed catalog of small binary classifiers, panel
//! generation from sparse regularization paths and tree importances, the
//! nested selection engine that picks a (panel, method) pair per outer fold,
//! the outer cross-validation driver, and ROC confidence regions following
//! Tilbury et al. (2000).
//!
//! Reading tables, persisting fold results and rendering reports live in
//! `io` and `report` so the modeling modules stay free of file handling.
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod roc_ci;
pub mod selection;
pub mod stats;
