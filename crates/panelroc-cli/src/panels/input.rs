use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use panelroc_classifiers::config::{HullMode, PipelineConfig, ReportConfig};
use panelroc_classifiers::models::factory::MethodId;

use crate::panels::util::validate_tsv_or_csv_file;

/// Settings for one `cv` or `validate` run, read from JSON and patched by
/// command line flags.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PanelRunConfig {
    pub version: String,
    pub train_data: String,
    pub validation_data: Option<String>,
    pub output_dir: String,
    /// Skip the HTML report.
    pub no_report: bool,
    pub pipeline: PipelineConfig,
    pub report: ReportConfig,
}

impl Default for PanelRunConfig {
    fn default() -> Self {
        PanelRunConfig {
            version: clap::crate_version!().to_string(),
            train_data: String::new(),
            validation_data: None,
            output_dir: String::from("panelroc_out"),
            no_report: false,
            pipeline: PipelineConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Parse a comma separated method list such as `lr,rf,nb`.
pub fn parse_methods(value: &str) -> Result<Vec<MethodId>> {
    let methods = value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<MethodId>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if methods.is_empty() {
        anyhow::bail!("No methods given in '{}'", value);
    }
    Ok(methods)
}

fn arg<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}

/// Read a run configuration file. A missing path yields the defaults.
pub fn load_config(config_path: Option<&PathBuf>) -> Result<PanelRunConfig> {
    match config_path {
        Some(path) => {
            let config_json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str(&config_json)
                .with_context(|| format!("Failed to parse config file: {:?}", path))
        }
        None => Ok(PanelRunConfig::default()),
    }
}

impl PanelRunConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = load_config(config_path)?;
        config.version = clap::crate_version!().to_string();

        // Apply CLI overrides
        if let Some(train_data) = arg::<String>(matches, "train_data") {
            config.train_data = train_data.clone();
        }
        validate_tsv_or_csv_file(&config.train_data)?;

        if let Some(validation_data) = arg::<String>(matches, "validation_data") {
            config.validation_data = Some(validation_data.clone());
        }
        if let Some(val_data) = &config.validation_data {
            validate_tsv_or_csv_file(val_data)?;
        }

        if let Some(output_dir) = arg::<String>(matches, "output_dir") {
            config.output_dir = output_dir.clone();
        }
        if let Some(&panel_size) = arg::<usize>(matches, "panel_size") {
            config.pipeline.panel_size = panel_size;
        }
        if let Some(&n_workers) = arg::<usize>(matches, "workers") {
            config.pipeline.n_workers = n_workers;
        }
        if let Some(&seed) = arg::<u64>(matches, "seed") {
            config.pipeline.seed = Some(seed);
        }
        if let Some(methods) = arg::<String>(matches, "methods") {
            config.pipeline.catalog.methods = parse_methods(methods)?;
        }
        if arg::<bool>(matches, "no_report").copied().unwrap_or(false) {
            config.no_report = true;
        }
        apply_report_overrides(&mut config.report, matches);

        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

/// Patch plotting settings from `--grid_size`, `--confidence`,
/// `--hull_mode` and `--no_title`.
pub fn apply_report_overrides(report: &mut ReportConfig, matches: &ArgMatches) {
    if let Some(&grid_size) = arg::<usize>(matches, "grid_size") {
        report.grid_size = grid_size;
    }
    if let Some(&confidence) = arg::<f64>(matches, "confidence") {
        report.confidence = confidence;
    }
    if let Some(hull_mode) = arg::<String>(matches, "hull_mode") {
        report.hull_mode = match hull_mode.as_str() {
            "band" => HullMode::Band,
            _ => HullMode::PerPoint,
        };
    }
    if arg::<bool>(matches, "no_title").copied().unwrap_or(false) {
        report.with_title = false;
    }
}
