use std::fs;

use anyhow::{Context, Result};

use panelroc_classifiers::cross_validation::{pooled_scores, run_cross_validation};
use panelroc_classifiers::io::results::save_results;
use panelroc_classifiers::io::table::read_table;
use panelroc_classifiers::models::factory::Catalog;
use panelroc_classifiers::report::report::cross_validation_report;
use panelroc_classifiers::stats::roc_stats;

use crate::panels::input::PanelRunConfig;
use crate::panels::report::config_section;
use crate::panels::util::write_bytes_to_file;

pub fn run_cv(config: &PanelRunConfig) -> Result<()> {
    let dataset = read_table(&config.train_data)?;
    dataset.log_input_data_summary();

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let catalog = Catalog::from_config(&config.pipeline.catalog);
    let results = run_cross_validation(&dataset, &config.pipeline, &catalog)?;

    let (scores, labels) = pooled_scores(&results);
    let auc = roc_stats(&scores, &labels)?.auc();
    log::info!(
        "Panel size {}: pooled outer AUC {:.3} over {} folds",
        config.pipeline.panel_size,
        auc,
        results.len()
    );

    let stem = format!("panel_size_{}_cv", config.pipeline.panel_size);
    save_results(output_dir.join(format!("{}.json", stem)), &results)?;

    if !config.no_report {
        let mut report = cross_validation_report(&results, &config.report)?;
        report.add_section(config_section(config)?);
        report.save_to_file(output_dir.join(format!("{}_report.html", stem)))?;
    }

    // Save configuration to JSON file
    let bytes = serde_json::to_vec_pretty(config)?;
    write_bytes_to_file(output_dir.join(format!("{}_config.json", stem)), &bytes)?;

    Ok(())
}
