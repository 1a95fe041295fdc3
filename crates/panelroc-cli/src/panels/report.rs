use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use maud::{html, PreEscaped};
use serde::Serialize;

use panelroc_classifiers::config::ReportConfig;
use panelroc_classifiers::io::results::load_results;
use panelroc_classifiers::report::report::{
    cross_validation_report, validation_report, Report, ReportSection,
};
use panelroc_classifiers::selection::FoldResult;

use crate::panels::input::apply_report_overrides;

/// Section showing the run configuration as pretty JSON.
pub fn config_section<T: Serialize>(config: &T) -> Result<ReportSection> {
    let mut config_section = ReportSection::new("Configuration");
    config_section.add_content(html! {
        style {
            ".code-container {
                background-color: #f5f5f5;
                padding: 10px;
                border-radius: 5px;
                overflow-x: auto;
                font-family: monospace;
                white-space: pre-wrap;
            }"
        }
        div class="code-container" {
            pre {
                code { (PreEscaped(serde_json::to_string_pretty(config)?)) }
            }
        }
    });
    Ok(config_section)
}

/// Pick the report flavour from the shape of the saved results: a single
/// result without a fold index comes from `validate`.
pub fn report_for(results: &[FoldResult], config: &ReportConfig) -> Result<Report> {
    match results {
        [] => anyhow::bail!("Results file holds no folds"),
        [single] if single.fold.is_none() => Ok(validation_report(single, config)?),
        _ => Ok(cross_validation_report(results, config)?),
    }
}

fn default_report_path(results_path: &Path) -> PathBuf {
    results_path.with_extension("html")
}

pub fn run_report(matches: &ArgMatches) -> Result<()> {
    let results_path = matches
        .get_one::<PathBuf>("results")
        .context("Missing results path")?;
    let output_path = matches
        .get_one::<PathBuf>("output_file")
        .cloned()
        .unwrap_or_else(|| default_report_path(results_path));

    let mut config = ReportConfig::default();
    apply_report_overrides(&mut config, matches);
    config.validate()?;

    let results = load_results(results_path)?;
    log::info!(
        "Loaded {} fold results from {}",
        results.len(),
        results_path.display()
    );
    let mut report = report_for(&results, &config)?;
    report.add_section(config_section(&config)?);
    report.save_to_file(&output_path)
}
