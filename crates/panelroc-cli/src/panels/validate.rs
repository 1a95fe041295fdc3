use std::fs;

use anyhow::{Context, Result};

use panelroc_classifiers::cross_validation::run_validation;
use panelroc_classifiers::io::results::save_results;
use panelroc_classifiers::io::table::read_table;
use panelroc_classifiers::models::factory::Catalog;
use panelroc_classifiers::report::report::validation_report;
use panelroc_classifiers::stats::roc_stats;

use crate::panels::input::PanelRunConfig;
use crate::panels::report::config_section;
use crate::panels::util::write_bytes_to_file;

pub fn run_validate(config: &PanelRunConfig) -> Result<()> {
    let validation_path = config
        .validation_data
        .as_deref()
        .context("A validation table is required, pass --validation_data or set validation_data")?;

    let train = read_table(&config.train_data)?;
    train.log_input_data_summary();
    let validation = read_table(validation_path)?;
    validation.log_input_data_summary();

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let catalog = Catalog::from_config(&config.pipeline.catalog);
    let result = run_validation(&train, &validation, &config.pipeline, &catalog)?;

    log::info!(
        "Selected {} on panel {:?} (inner criterion {:.3})",
        result.method.long_name(),
        result.panel,
        result.score
    );
    match roc_stats(&result.test_scores, &result.test_labels) {
        Ok(stats) => log::info!("Validation AUC {:.3}", stats.auc()),
        Err(e) => log::warn!("Validation AUC not available: {}", e),
    }

    let stem = format!("panel_size_{}_validation", config.pipeline.panel_size);
    save_results(
        output_dir.join(format!("{}.json", stem)),
        std::slice::from_ref(&result),
    )?;

    if !config.no_report {
        let mut report = validation_report(&result, &config.report)?;
        report.add_section(config_section(config)?);
        report.save_to_file(output_dir.join(format!("{}_report.html", stem)))?;
    }

    let bytes = serde_json::to_vec_pretty(config)?;
    write_bytes_to_file(output_dir.join(format!("{}_config.json", stem)), &bytes)?;

    Ok(())
}
