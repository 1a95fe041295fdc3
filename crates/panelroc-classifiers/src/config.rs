use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::models::factory::MethodId;

/// Regularization strengths swept by the sparse-path selectors.
///
/// The grid is `start, start + step, ...` and excludes `stop`, so the default
/// covers 0.001 through 0.999.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CGrid {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for CGrid {
    fn default() -> Self {
        Self {
            start: 0.001,
            stop: 1.0,
            step: 0.001,
        }
    }
}

impl CGrid {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Materialize the grid. Values are computed from the index rather than
    /// accumulated so rounding does not drift along the path.
    pub fn values(&self) -> Vec<f64> {
        if !(self.step > 0.0) || !(self.stop > self.start) {
            return Vec::new();
        }
        let count = ((self.stop - self.start) / self.step - 1e-9).ceil().max(0.0) as usize;
        (0..count)
            .map(|i| self.start + i as f64 * self.step)
            .filter(|&c| c > 0.0)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if !(self.start > 0.0 && self.step > 0.0 && self.stop > self.start) {
            return Err(PanelError::InvalidConfig(format!(
                "C grid must satisfy 0 < start < stop and step > 0, got start={} stop={} step={}",
                self.start, self.stop, self.step
            )));
        }
        Ok(())
    }
}

/// Which classifier families take part in the search, and the ensemble size
/// used by the forest models.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub methods: Vec<MethodId>,
    pub n_estimators: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            methods: MethodId::ALL.to_vec(),
            n_estimators: 100,
        }
    }
}

/// Central configuration for one panel-size analysis.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of features in every candidate panel.
    pub panel_size: usize,
    /// Only operating points with FPR at or below this ceiling count toward
    /// the selection criterion.
    pub max_fpr: f64,
    pub c_grid: CGrid,
    /// Worker threads for the outer folds.
    pub n_workers: usize,
    pub impute_missing: bool,
    /// Base seed for every fold generator. A fresh one is drawn when absent.
    pub seed: Option<u64>,
    pub catalog: CatalogConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            panel_size: 5,
            max_fpr: 0.2,
            c_grid: CGrid::default(),
            n_workers: 10,
            impute_missing: true,
            seed: None,
            catalog: CatalogConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(panel_size: usize) -> Self {
        Self {
            panel_size,
            ..Self::default()
        }
    }

    /// Check everything that can be checked before a model is fit.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.panel_size == 0 || self.panel_size > n_features {
            return Err(PanelError::InvalidPanelSize {
                panel_size: self.panel_size,
                n_features,
            });
        }
        if !(0.0..=1.0).contains(&self.max_fpr) {
            return Err(PanelError::InvalidConfig(format!(
                "max_fpr must lie in [0, 1], got {}",
                self.max_fpr
            )));
        }
        if self.n_workers == 0 {
            return Err(PanelError::InvalidConfig(
                "n_workers must be at least 1".to_string(),
            ));
        }
        if self.catalog.methods.is_empty() {
            return Err(PanelError::InvalidConfig(
                "catalog must contain at least one method".to_string(),
            ));
        }
        if self.catalog.n_estimators == 0 {
            return Err(PanelError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        self.c_grid.validate()
    }
}

/// How confidence regions are drawn around the ROC curve.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HullMode {
    /// One convex hull per operating point.
    #[default]
    PerPoint,
    /// The connected band across consecutive operating points.
    Band,
}

/// Settings for ROC plots and HTML reports.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Bins per axis of the confidence surfaces.
    pub grid_size: usize,
    pub confidence: f64,
    pub hull_mode: HullMode,
    /// Add the panel size / model title to plots.
    pub with_title: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            grid_size: 300,
            confidence: 0.95,
            hull_mode: HullMode::PerPoint,
            with_title: true,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(PanelError::InvalidConfig(
                "grid_size must be at least 1".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            return Err(PanelError::InvalidConfig(format!(
                "confidence must lie in (0, 1], got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}
