//! Selection frequencies across outer folds.
use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::models::factory::MethodId;
use crate::selection::FoldResult;

/// Count occurrences, most frequent first. Equal counts keep the order in
/// which the keys were first seen.
pub fn count_by_first_seen<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut position: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for item in items {
        match position.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Panel identity for counting: sorted feature names.
fn panel_key(result: &FoldResult) -> Vec<String> {
    let mut panel = result.panel.clone();
    panel.sort();
    panel
}

/// How often each method, panel and (method, panel) pair won a fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub pairs: Vec<((MethodId, Vec<String>), usize)>,
    pub methods: Vec<(MethodId, usize)>,
    pub panels: Vec<(Vec<String>, usize)>,
    /// The most frequent pair uses a different method than the most frequent
    /// method.
    pub method_disagrees: bool,
    /// The most frequent pair uses a different panel than the most frequent
    /// panel.
    pub panel_disagrees: bool,
}

impl SelectionSummary {
    pub fn best_method(&self) -> MethodId {
        self.methods[0].0
    }

    pub fn best_panel(&self) -> &[String] {
        &self.panels[0].0
    }

    pub fn best_pair(&self) -> (MethodId, &[String]) {
        let (method, panel) = &self.pairs[0].0;
        (*method, panel)
    }

    /// Log the three count tables and any disagreement.
    pub fn log(&self) {
        log::info!("Count tables");
        for ((method, panel), count) in &self.pairs {
            log::info!(" {:3} {:7} {:?}", count, method.as_str(), panel);
        }
        for (method, count) in &self.methods {
            log::info!(" {:3} {:7}", count, method.as_str());
        }
        for (panel, count) in &self.panels {
            log::info!(" {:3} {:?}", count, panel);
        }
        let (pair_method, pair_panel) = self.best_pair();
        if self.method_disagrees {
            log::warn!(
                "Best pair's method ({}) is different from best individual method ({})",
                pair_method,
                self.best_method()
            );
        }
        if self.panel_disagrees {
            log::warn!(
                "Best pair's panel ({:?}) is different from best individual panel ({:?})",
                pair_panel,
                self.best_panel()
            );
        }
    }
}

/// Tally the winners of `results`. Returns `None` for an empty slice.
pub fn summarize(results: &[FoldResult]) -> Option<SelectionSummary> {
    if results.is_empty() {
        return None;
    }
    let pairs = count_by_first_seen(results.iter().map(|r| (r.method, panel_key(r))));
    let methods = count_by_first_seen(results.iter().map(|r| r.method));
    let panels = count_by_first_seen(results.iter().map(panel_key));

    let method_disagrees = pairs[0].0 .0 != methods[0].0;
    let panel_disagrees = pairs[0].0 .1 != panels[0].0;
    Some(SelectionSummary {
        pairs,
        methods,
        panels,
        method_disagrees,
        panel_disagrees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_descending_with_first_seen_ties() {
        let counts = count_by_first_seen(vec!["b", "a", "c", "a", "c"]);
        assert_eq!(counts, vec![("a", 2), ("c", 2), ("b", 1)]);
    }
}
