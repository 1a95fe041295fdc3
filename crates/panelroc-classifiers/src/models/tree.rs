//! CART decision trees with Gini impurity.
//!
//! One implementation serves the single decision tree (`dt`), the trees of
//! the random forest (`rf`) and the extremely randomized trees (`et`); the
//! variants differ only in how split thresholds are chosen and how many
//! features are examined per node.
use ndarray::ArrayView2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{PanelError, Result};
use crate::models::classifier_trait::{ClassifierModel, FeatureImportance};
use crate::models::utils::{check_predict_width, check_training_data};

/// How a node chooses the threshold for a candidate feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Exhaustive search over midpoints between consecutive distinct values.
    Best,
    /// One threshold drawn uniformly between the node's min and max value.
    Random,
}

/// Number of features examined at every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    All,
    Sqrt,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        positive_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

/// Binary Gini impurity `1 - p^2 - (1 - p)^2`.
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Fully grown classification tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    strategy: SplitStrategy,
    max_features: MaxFeatures,
    seed: u64,
    nodes: Vec<Node>,
    n_features: usize,
    /// Unnormalized impurity decrease accumulated per feature.
    impurity_decrease: Vec<f64>,
}

impl DecisionTree {
    pub fn new(strategy: SplitStrategy, max_features: MaxFeatures, seed: u64) -> Self {
        DecisionTree {
            strategy,
            max_features,
            seed,
            nodes: Vec::new(),
            n_features: 0,
            impurity_decrease: Vec::new(),
        }
    }

    /// The `dt` catalog entry: best splits over all features.
    pub fn cart(seed: u64) -> Self {
        Self::new(SplitStrategy::Best, MaxFeatures::All, seed)
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Grow the tree on the given training rows. Rows may repeat (bootstrap
    /// samples) and may all share one label, in which case the tree is a
    /// single leaf.
    pub(crate) fn grow(&mut self, x: ArrayView2<f64>, y: &[bool], rows: Vec<usize>) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n_features = x.ncols();
        let max_features = self.max_features.resolve(n_features);
        self.n_features = n_features;
        self.nodes = vec![Node::Leaf {
            positive_fraction: 0.0,
        }];
        self.impurity_decrease = vec![0.0; n_features];

        let mut pending = vec![(0usize, rows)];
        while let Some((node_id, rows)) = pending.pop() {
            let n = rows.len();
            let positives = rows.iter().filter(|&&r| y[r]).count();
            let impurity = gini(positives, n);

            let split = if impurity > 0.0 && n > 1 {
                self.find_split(x, y, &rows, positives, impurity, max_features, &mut rng)
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                        .iter()
                        .partition(|&&r| x[(r, split.feature)] <= split.threshold);
                    self.impurity_decrease[split.feature] += n as f64 * split.improvement;

                    let left = self.nodes.len();
                    let right = left + 1;
                    let placeholder = Node::Leaf {
                        positive_fraction: 0.0,
                    };
                    self.nodes.push(placeholder.clone());
                    self.nodes.push(placeholder);
                    self.nodes[node_id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    pending.push((right, right_rows));
                    pending.push((left, left_rows));
                }
                None => {
                    self.nodes[node_id] = Node::Leaf {
                        positive_fraction: if n == 0 {
                            0.0
                        } else {
                            positives as f64 / n as f64
                        },
                    };
                }
            }
        }
    }

    /// Features are visited in a random order; constant features are skipped
    /// and do not count toward `max_features`.
    #[allow(clippy::too_many_arguments)]
    fn find_split(
        &self,
        x: ArrayView2<f64>,
        y: &[bool],
        rows: &[usize],
        positives: usize,
        impurity: f64,
        max_features: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;
        for feature in features {
            if visited >= max_features {
                break;
            }
            let candidate = match self.strategy {
                SplitStrategy::Best => best_threshold(x, y, rows, feature, positives, impurity),
                SplitStrategy::Random => {
                    random_threshold(x, y, rows, feature, positives, impurity, rng)
                }
            };
            let Some(candidate) = candidate else {
                continue;
            };
            visited += 1;
            if best
                .as_ref()
                .map_or(true, |b| candidate.improvement > b.improvement)
            {
                best = Some(candidate);
            }
        }
        best
    }

    fn leaf_for(&self, row: ndarray::ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { positive_fraction } => return *positive_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

fn weighted_child_impurity(left_pos: usize, left_n: usize, positives: usize, n: usize) -> f64 {
    let right_n = n - left_n;
    let right_pos = positives - left_pos;
    (left_n as f64 * gini(left_pos, left_n) + right_n as f64 * gini(right_pos, right_n)) / n as f64
}

fn best_threshold(
    x: ArrayView2<f64>,
    y: &[bool],
    rows: &[usize],
    feature: usize,
    positives: usize,
    impurity: f64,
) -> Option<SplitCandidate> {
    let mut values: Vec<(f64, bool)> = rows.iter().map(|&r| (x[(r, feature)], y[r])).collect();
    values.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = values.len();
    if values[0].0 >= values[n - 1].0 {
        return None;
    }

    let mut best: Option<SplitCandidate> = None;
    let mut left_pos = 0;
    for k in 0..n - 1 {
        if values[k].1 {
            left_pos += 1;
        }
        let (lo, hi) = (values[k].0, values[k + 1].0);
        if lo >= hi {
            continue;
        }
        let improvement = impurity - weighted_child_impurity(left_pos, k + 1, positives, n);
        if best.as_ref().map_or(true, |b| improvement > b.improvement) {
            let mid = lo / 2.0 + hi / 2.0;
            best = Some(SplitCandidate {
                feature,
                threshold: if mid >= hi { lo } else { mid },
                improvement,
            });
        }
    }
    best
}

fn random_threshold(
    x: ArrayView2<f64>,
    y: &[bool],
    rows: &[usize],
    feature: usize,
    positives: usize,
    impurity: f64,
    rng: &mut ChaCha8Rng,
) -> Option<SplitCandidate> {
    let (min, max) = rows
        .iter()
        .map(|&r| x[(r, feature)])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !(min < max) {
        return None;
    }
    let threshold = rng.gen_range(min..max);
    let (left_n, left_pos) = rows
        .iter()
        .filter(|&&r| x[(r, feature)] <= threshold)
        .fold((0usize, 0usize), |(n, p), &r| (n + 1, p + y[r] as usize));
    Some(SplitCandidate {
        feature,
        threshold,
        improvement: impurity - weighted_child_impurity(left_pos, left_n, positives, rows.len()),
    })
}

impl ClassifierModel for DecisionTree {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[bool]) -> Result<()> {
        check_training_data(x, y, self.name())?;
        self.grow(x, y, (0..x.nrows()).collect());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        if self.nodes.is_empty() {
            return Err(PanelError::NotFitted(self.name()));
        }
        check_predict_width(x, self.n_features)?;
        Ok(x.outer_iter().map(|row| self.leaf_for(row)).collect())
    }

    fn name(&self) -> &'static str {
        match self.strategy {
            SplitStrategy::Best => "decision_tree",
            SplitStrategy::Random => "extra_tree",
        }
    }
}

impl FeatureImportance for DecisionTree {
    fn feature_importances(&self) -> Result<Vec<f64>> {
        if self.nodes.is_empty() {
            return Err(PanelError::NotFitted(self.name()));
        }
        let total: f64 = self.impurity_decrease.iter().sum();
        if total > 0.0 {
            Ok(self.impurity_decrease.iter().map(|v| v / total).collect())
        } else {
            Ok(vec![0.0; self.n_features])
        }
    }
}
