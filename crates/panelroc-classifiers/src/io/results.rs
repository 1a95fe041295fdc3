//! JSON persistence of fold results.
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};

use crate::selection::FoldResult;

/// Write `results` as a pretty-printed JSON array.
pub fn save_results<P: AsRef<Path>>(path: P, results: &[FoldResult]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create results file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), results)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    log::info!("Saved {} fold results to {}", results.len(), path.display());
    Ok(())
}

pub fn load_results<P: AsRef<Path>>(path: P) -> Result<Vec<FoldResult>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open results file: {}", path.display()))?;
    let results: Vec<FoldResult> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse results in {}", path.display()))?;
    Ok(results)
}
