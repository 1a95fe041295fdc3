use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::config::ReportConfig;
use crate::cross_validation::pooled_scores;
use crate::report::plots::{cv_title, plot_roc_with_confidence, validation_title};
use crate::report::tally::{summarize, SelectionSummary};
use crate::selection::FoldResult;
use crate::stats::roc_stats;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// One titled block of a report: free markup interleaved with plots.
pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
    n_plots: usize,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
            n_plots: 0,
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let id = format!(
            "{}-plot-{}",
            self.title.to_lowercase().replace(' ', "-"),
            self.n_plots
        );
        self.n_plots += 1;
        self.blocks
            .push(PreEscaped(plot.to_inline_html(Some(id.as_str()))));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.blocks {
                    div class="block" { (block) }
                }
            }
        }
    }
}

/// Standalone HTML page.
pub struct Report {
    title: String,
    version: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_JS) {}
                    style { (PreEscaped("body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:2px 8px}")) }
                }
                body {
                    h1 { (self.title) }
                    p class="meta" { "panelroc " (self.version) ", generated " (generated.to_string()) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render().into_string())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report saved to {}", path.display());
        Ok(())
    }
}

fn tally_tables(summary: &SelectionSummary) -> Markup {
    html! {
        @if summary.method_disagrees {
            p class="warning" {
                "Best pair's method (" (summary.best_pair().0.long_name())
                ") is different from best individual method ("
                (summary.best_method().long_name()) ")"
            }
        }
        @if summary.panel_disagrees {
            p class="warning" { "Best pair's panel is different from best individual panel" }
        }
        h3 { "Method and panel" }
        table {
            tr { th { "Count" } th { "Method" } th { "Panel" } }
            @for ((method, panel), count) in &summary.pairs {
                tr { td { (count) } td { (method.long_name()) } td { (panel.join(", ")) } }
            }
        }
        h3 { "Methods" }
        table {
            tr { th { "Count" } th { "Method" } }
            @for (method, count) in &summary.methods {
                tr { td { (count) } td { (method.long_name()) } }
            }
        }
        h3 { "Panels" }
        table {
            tr { th { "Count" } th { "Panel" } }
            @for (panel, count) in &summary.panels {
                tr { td { (count) } td { (panel.join(", ")) } }
            }
        }
    }
}

/// Report for a cross-validation run: pooled ROC with confidence regions
/// and the selection count tables.
pub fn cross_validation_report(results: &[FoldResult], config: &ReportConfig) -> Result<Report> {
    let (scores, labels) = pooled_scores(results);
    let panel_size = results.first().map(|r| r.panel.len()).unwrap_or(0);
    let title = if config.with_title {
        cv_title(panel_size)
    } else {
        String::new()
    };
    let auc = roc_stats(&scores, &labels)?.auc();

    let mut report = Report::new("panelroc cross-validation", env!("CARGO_PKG_VERSION"));

    let mut overview = ReportSection::new("Overview");
    overview.add_content(html! {
        p { (results.len()) " outer folds, panel size " (panel_size) ", pooled AUC " (format!("{:.3}", auc)) }
    });
    overview.add_plot(plot_roc_with_confidence(&scores, &labels, &title, config)?);
    report.add_section(overview);

    if let Some(summary) = summarize(results) {
        summary.log();
        let mut tallies = ReportSection::new("Selection counts");
        tallies.add_content(tally_tables(&summary));
        report.add_section(tallies);
    }
    Ok(report)
}

/// Report for a train/validation run.
pub fn validation_report(result: &FoldResult, config: &ReportConfig) -> Result<Report> {
    let title = if config.with_title {
        validation_title(result.method.long_name(), &result.panel)
    } else {
        String::new()
    };
    log::debug!(
        "Making report, model {}, panel {:?}",
        result.method.long_name(),
        result.panel
    );

    let mut report = Report::new("panelroc validation", env!("CARGO_PKG_VERSION"));
    let mut overview = ReportSection::new("Validation");
    overview.add_content(html! {
        p { "Model: " (result.method.long_name()) }
        p { "Panel: " (result.panel.join(", ")) }
        p { "Inner selection criterion: " (format!("{:.3}", result.score)) }
    });
    overview.add_plot(plot_roc_with_confidence(
        &result.test_scores,
        &result.test_labels,
        &title,
        config,
    )?);
    report.add_section(overview);
    Ok(report)
}
