//! CSV/TSV feature table reader.
//!
//! The first row is a header. The last column holds the class label (0 or
//! 1); every other column is a numeric feature. Empty cells, `NA` and `NaN`
//! are read as missing values.
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;

use crate::data_handling::Dataset;

/// Field delimiter implied by the file extension: tab for `.tsv`/`.txt`,
/// comma otherwise.
pub fn delimiter_for<P: AsRef<Path>>(path: P) -> u8 {
    match path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    }
}

fn parse_feature(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    value.parse::<f64>().ok()
}

fn parse_label(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "1.0" => Some(true),
        "0" | "0.0" => Some(false),
        _ => None,
    }
}

/// Read a feature table into a [`Dataset`].
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    if headers.len() < 2 {
        bail!(
            "{} needs at least one feature column and a label column, found {} columns",
            path.display(),
            headers.len()
        );
    }
    let n_features = headers.len() - 1;
    let feature_names: Vec<String> = headers
        .iter()
        .take(n_features)
        .map(|h| h.trim().to_string())
        .collect();

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        // header is line 1
        let line = row_idx + 2;
        let record = record.with_context(|| format!("Failed to read line {} of {}", line, path.display()))?;
        if record.len() != headers.len() {
            bail!(
                "Line {} of {} has {} fields, expected {}",
                line,
                path.display(),
                record.len(),
                headers.len()
            );
        }
        for (col, value) in record.iter().take(n_features).enumerate() {
            let parsed = parse_feature(value).ok_or_else(|| {
                anyhow!(
                    "Invalid numeric value '{}' in column '{}' at line {}",
                    value,
                    feature_names[col],
                    line
                )
            })?;
            values.push(parsed);
        }
        let label = record.get(n_features).unwrap_or_default();
        labels.push(parse_label(label).ok_or_else(|| {
            anyhow!(
                "Invalid label '{}' at line {}: expected 0 or 1",
                label,
                line
            )
        })?);
    }

    let features = Array2::from_shape_vec((labels.len(), n_features), values)
        .context("Failed to assemble feature matrix")?;
    let dataset = Dataset::new(features, labels, feature_names)
        .with_context(|| format!("Invalid dataset in {}", path.display()))?;
    log::info!(
        "Loaded {} samples x {} features from {}",
        dataset.n_samples(),
        dataset.n_features(),
        path.display()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_picks_delimiter() {
        assert_eq!(delimiter_for("data/x.TSV"), b'\t');
        assert_eq!(delimiter_for("x.csv"), b',');
        assert_eq!(delimiter_for("noext"), b',');
    }

    #[test]
    fn missing_markers_parse_as_nan() {
        assert!(parse_feature("").unwrap().is_nan());
        assert!(parse_feature(" NA ").unwrap().is_nan());
        assert!(parse_feature("nan").unwrap().is_nan());
        assert_eq!(parse_feature("2.5"), Some(2.5));
        assert_eq!(parse_feature("abc"), None);
    }

    #[test]
    fn labels_must_be_binary() {
        assert_eq!(parse_label("1"), Some(true));
        assert_eq!(parse_label(" 0 "), Some(false));
        assert_eq!(parse_label("2"), None);
        assert_eq!(parse_label("yes"), None);
    }
}
