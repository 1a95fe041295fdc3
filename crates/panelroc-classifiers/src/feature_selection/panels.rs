use std::collections::HashSet;

use ndarray::ArrayView2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::CGrid;
use crate::error::Result;
use crate::feature_selection::importance::importance_panel;
use crate::feature_selection::sparse_path::support_path;
use crate::models::factory::Catalog;
use crate::preprocessing::{normalize, Normalization};

/// A set of feature indices, stored in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Panel(Vec<usize>);

impl Panel {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Panel(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self, feature_names: &[String]) -> Vec<String> {
        self.0.iter().map(|&i| feature_names[i].clone()).collect()
    }
}

/// Insertion-ordered set of panels.
#[derive(Debug, Default)]
pub struct PanelSet {
    order: Vec<Panel>,
    seen: HashSet<Panel>,
}

impl PanelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `panel` unless an equal one is already present.
    pub fn insert(&mut self, panel: Panel) -> bool {
        if self.seen.contains(&panel) {
            return false;
        }
        self.seen.insert(panel.clone());
        self.order.push(panel);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<Panel> {
        self.order
    }
}

/// Generate every candidate panel of exactly `panel_size` features from one
/// training set.
///
/// Sparse-path panels come first (selectors in catalog order, C ascending),
/// then the decision tree, random forest and extra trees importance panels.
/// Seeds for the tree models are drawn from `rng`.
pub fn panels_for(
    features: ArrayView2<f64>,
    labels: &[bool],
    panel_size: usize,
    c_grid: &CGrid,
    catalog: &Catalog,
    rng: &mut ChaCha8Rng,
    impute_missing: bool,
) -> Result<Vec<Panel>> {
    let mut set = PanelSet::new();
    let c_values = c_grid.values();

    let scaled = normalize(features, None, Normalization::Scaled, impute_missing).train;
    for loss in catalog.sparse_selectors() {
        let before = set.len();
        for support in support_path(scaled.view(), labels, loss, &c_values) {
            if support.len() == panel_size {
                set.insert(Panel::new(support));
            }
        }
        log::debug!("{} contributed {} new panels", loss.name(), set.len() - before);
    }

    let raw = normalize(features, None, Normalization::None, impute_missing).train;
    let seeds: [u64; 3] = [rng.gen(), rng.gen(), rng.gen()];
    for mut model in catalog.importance_models(seeds) {
        if let Some(panel) = importance_panel(model.as_mut(), raw.view(), labels, panel_size)? {
            let added = set.insert(panel);
            log::debug!("{} importance panel new: {}", model.name(), added);
        }
    }

    Ok(set.into_vec())
}
