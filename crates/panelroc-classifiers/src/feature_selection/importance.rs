use crate::error::Result;
use crate::feature_selection::panels::Panel;
use crate::models::classifier_trait::ImportanceModel;
use ndarray::ArrayView2;

/// Feature indices ordered by importance, highest first. Equal importances
/// keep ascending index order.
pub fn rank_by_importance(importances: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..importances.len()).collect();
    // stable sort keeps ascending index among ties
    order.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]));
    order
}

/// Fit `model` and take its `panel_size` most important features.
///
/// Returns `None` when there are fewer features than `panel_size`.
pub fn importance_panel(
    model: &mut dyn ImportanceModel,
    x: ArrayView2<f64>,
    labels: &[bool],
    panel_size: usize,
) -> Result<Option<Panel>> {
    if panel_size == 0 || panel_size > x.ncols() {
        return Ok(None);
    }
    model.fit(x, labels)?;
    let importances = model.feature_importances()?;
    let ranked = rank_by_importance(&importances);
    log::trace!(
        "{} importance ranking: {:?}",
        model.name(),
        &ranked[..panel_size]
    );
    Ok(Some(Panel::new(ranked[..panel_size].to_vec())))
}
