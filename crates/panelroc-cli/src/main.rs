use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;

use panelroc_cli::cli::build_cli;
use panelroc_cli::panels::input::PanelRunConfig;
use panelroc_cli::panels::{cv, report, validate};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(
            "PANELROC_LOG",
            "error,panelroc=info,panelroc_cli=info,panelroc_classifiers=info",
        ))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("cv", sub_m)) => handle_cv(sub_m),
        Some(("validate", sub_m)) => handle_validate(sub_m),
        Some(("report", sub_m)) => handle_report(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn run_config(matches: &ArgMatches) -> Result<PanelRunConfig> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    let params = PanelRunConfig::from_arguments(config_path, matches)?;
    match config_path {
        Some(path) => log::info!("[panelroc] Using config: {:?}", path),
        None => {
            log::info!("[panelroc] No config file given, running with:");
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
    }
    Ok(params)
}

fn handle_cv(matches: &ArgMatches) -> Result<()> {
    let params = run_config(matches)?;
    log::debug!("{}", serde_json::to_string_pretty(&params)?);

    match cv::run_cv(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Cross-validation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_validate(matches: &ArgMatches) -> Result<()> {
    let params = run_config(matches)?;
    log::debug!("{}", serde_json::to_string_pretty(&params)?);

    match validate::run_validate(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Validation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_report(matches: &ArgMatches) -> Result<()> {
    match report::run_report(matches) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Report failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
