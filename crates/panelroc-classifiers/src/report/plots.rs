use itertools_num::linspace;
use ndarray::Array2;
use plotly::common::{DashType, Fill, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::config::{HullMode, ReportConfig};
use crate::error::Result;
use crate::roc_ci::{confidence_band, confidence_blob, hull, roc_surfaces};
use crate::stats::roc_stats;

const REGION_COLOR: &str = "rgba(160, 160, 160, 0.35)";

/// Rectangles covering the true cells of `mask`, one per horizontal run,
/// in unit ROC coordinates. Rectangles are separated by `None` so a single
/// trace draws them as independent filled shapes.
pub fn band_outline(mask: &Array2<bool>) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let (rows, cols) = mask.dim();
    let (w, h) = (1.0 / cols as f64, 1.0 / rows as f64);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for r in 0..rows {
        let mut c = 0;
        while c < cols {
            if !mask[(r, c)] {
                c += 1;
                continue;
            }
            let start = c;
            while c < cols && mask[(r, c)] {
                c += 1;
            }
            let (x0, x1) = (start as f64 * w, c as f64 * w);
            let (y0, y1) = (r as f64 * h, (r + 1) as f64 * h);
            for (x, y) in [(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)] {
                xs.push(Some(x));
                ys.push(Some(y));
            }
            xs.push(None);
            ys.push(None);
        }
    }
    (xs, ys)
}

fn specificity(fpr: f64) -> f64 {
    1.0 - fpr
}

/// ROC curve of `scores` with Tilbury confidence regions.
///
/// The x axis shows specificity running from 1 to 0, the y axis
/// sensitivity. Regions are drawn per operating point or as the connected
/// band depending on `config.hull_mode`.
pub fn plot_roc_with_confidence(
    scores: &[f64],
    labels: &[bool],
    title: &str,
    config: &ReportConfig,
) -> Result<Plot> {
    config.validate()?;
    let stats = roc_stats(scores, labels)?;
    let tpr = stats.tpr();
    let fpr = stats.fpr();
    let auc = stats.auc();
    let surfaces = roc_surfaces(&stats, config.grid_size)?;

    let mut plot = Plot::new();
    match config.hull_mode {
        HullMode::PerPoint => {
            for surface in &surfaces {
                let polygon = hull(&confidence_blob(surface, config.confidence))?;
                let (x, y) = polygon.closed();
                let x: Vec<f64> = x.into_iter().map(specificity).collect();
                plot.add_trace(
                    Scatter::new(x, y)
                        .mode(Mode::Lines)
                        .fill(Fill::ToSelf)
                        .fill_color(REGION_COLOR)
                        .line(Line::new().color(REGION_COLOR).width(0.5))
                        .show_legend(false),
                );
            }
        }
        HullMode::Band => {
            let band = confidence_band(&surfaces, config.confidence)?;
            let (x, y) = band_outline(&band);
            let x: Vec<Option<f64>> = x.into_iter().map(|v| v.map(specificity)).collect();
            plot.add_trace(
                Scatter::new(x, y)
                    .mode(Mode::Lines)
                    .fill(Fill::ToSelf)
                    .fill_color(REGION_COLOR)
                    .line(Line::new().color(REGION_COLOR).width(0.0))
                    .name(&format!("{:.0}% confidence band", config.confidence * 100.0)),
            );
        }
    }

    let chance: Vec<f64> = linspace(0.0, 1.0, 50).collect();
    plot.add_trace(
        Scatter::new(chance.clone(), chance.iter().map(|s| 1.0 - s).collect())
            .mode(Mode::Lines)
            .name("Chance")
            .line(Line::new().color("rgb(153, 153, 153)").dash(DashType::Dash)),
    );
    plot.add_trace(
        Scatter::new(fpr.iter().map(|&f| specificity(f)).collect(), tpr)
            .mode(Mode::LinesMarkers)
            .name(&format!("AUC = {:.2}", auc))
            .line(Line::new().width(2.0)),
    );

    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Specificity").range(vec![1.05, -0.05]))
            .y_axis(Axis::new().title("Sensitivity").range(vec![-0.05, 1.05])),
    );
    Ok(plot)
}

/// Title used for a cross-validation ROC.
pub fn cv_title(panel_size: usize) -> String {
    format!("Panel size {}", panel_size)
}

/// Title used for a validation ROC.
pub fn validation_title(method_long_name: &str, panel: &[String]) -> String {
    format!("Model: {}<br>Panel: {}", method_long_name, panel.join(", "))
}
