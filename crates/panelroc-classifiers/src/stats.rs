use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};

/// Contingency counts of an ROC curve, one entry per operating point.
///
/// Entries are ordered by increasing threshold, so the first operating point
/// calls every sample positive and the last calls none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocStats {
    pub thresholds: Vec<f64>,
    pub tp: Vec<usize>,
    pub fp: Vec<usize>,
    pub fn_: Vec<usize>,
    pub tn: Vec<usize>,
}

impl RocStats {
    pub fn len(&self) -> usize {
        self.tp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tp.is_empty()
    }

    /// True positive rate per operating point; 0 when there are no positives.
    pub fn tpr(&self) -> Vec<f64> {
        self.tp
            .iter()
            .zip(self.fn_.iter())
            .map(|(&tp, &fn_)| rate(tp, tp + fn_))
            .collect()
    }

    /// False positive rate per operating point; 0 when there are no negatives.
    pub fn fpr(&self) -> Vec<f64> {
        self.fp
            .iter()
            .zip(self.tn.iter())
            .map(|(&fp, &tn)| rate(fp, fp + tn))
            .collect()
    }

    /// Area under the curve by the trapezoidal rule.
    pub fn auc(&self) -> f64 {
        let tpr = self.tpr();
        let fpr = self.fpr();
        (1..tpr.len())
            .map(|i| (fpr[i - 1] - fpr[i]).abs() * (tpr[i - 1] + tpr[i]) / 2.0)
            .sum()
    }

    /// Highest TPR among operating points whose FPR does not exceed
    /// `max_fpr`.
    pub fn max_tpr_at_fpr(&self, max_fpr: f64) -> f64 {
        self.tpr()
            .into_iter()
            .zip(self.fpr())
            .filter(|&(_, fpr)| fpr <= max_fpr)
            .map(|(tpr, _)| tpr)
            .fold(0.0, f64::max)
    }
}

fn rate(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Compute the ROC contingency table of `scores` against `labels`.
///
/// Thresholds are negative infinity followed by every distinct score in
/// ascending order; a sample counts as a positive call when its score is
/// strictly greater than the threshold.
///
/// # Arguments
///
/// * `scores` - Classifier output, higher means more likely positive.
/// * `labels` - `true` for positive samples.
///
/// # Returns
///
/// The operating points, or `NaNFound` if any score is NaN.
pub fn roc_stats(scores: &[f64], labels: &[bool]) -> Result<RocStats> {
    if scores.len() != labels.len() {
        return Err(PanelError::LengthMismatch {
            what: "ROC labels",
            expected: scores.len(),
            found: labels.len(),
        });
    }
    let nan_count = scores.iter().filter(|s| s.is_nan()).count();
    if nan_count > 0 {
        return Err(PanelError::NaNFound(nan_count));
    }

    let mut thresholds = scores.to_vec();
    thresholds.push(f64::NEG_INFINITY);
    thresholds.sort_by(|a, b| a.total_cmp(b));
    thresholds.dedup();

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;

    let mut stats = RocStats {
        thresholds: Vec::with_capacity(thresholds.len()),
        tp: Vec::with_capacity(thresholds.len()),
        fp: Vec::with_capacity(thresholds.len()),
        fn_: Vec::with_capacity(thresholds.len()),
        tn: Vec::with_capacity(thresholds.len()),
    };
    for &threshold in &thresholds {
        let (tp, fp) = scores
            .iter()
            .zip(labels.iter())
            .filter(|(s, _)| **s > threshold)
            .fold((0, 0), |(tp, fp), (_, &l)| if l { (tp + 1, fp) } else { (tp, fp + 1) });
        stats.thresholds.push(threshold);
        stats.tp.push(tp);
        stats.fp.push(fp);
        stats.fn_.push(positives - tp);
        stats.tn.push(negatives - fp);
    }
    Ok(stats)
}

/// Operating points from a rating-scale table (Swets-style).
///
/// `positives[i]` and `negatives[i]` count the samples falling in rating bin
/// `i`, bin 0 being the most confident positive rating. Entry `i` of the
/// result calls the first `bins - i` bins positive, so there are `bins + 1`
/// operating points running from everything positive down to nothing.
/// Thresholds are the entry indices.
pub fn roc_stats_from_counts(positives: &[usize], negatives: &[usize]) -> Result<RocStats> {
    if positives.len() != negatives.len() {
        return Err(PanelError::LengthMismatch {
            what: "rating bins",
            expected: positives.len(),
            found: negatives.len(),
        });
    }
    let bins = positives.len();
    let total_pos: usize = positives.iter().sum();
    let total_neg: usize = negatives.iter().sum();
    let mut stats = RocStats {
        thresholds: Vec::with_capacity(bins + 1),
        tp: Vec::with_capacity(bins + 1),
        fp: Vec::with_capacity(bins + 1),
        fn_: Vec::with_capacity(bins + 1),
        tn: Vec::with_capacity(bins + 1),
    };
    for i in 0..=bins {
        let called = bins - i;
        let tp: usize = positives[..called].iter().sum();
        let fp: usize = negatives[..called].iter().sum();
        stats.thresholds.push(i as f64);
        stats.tp.push(tp);
        stats.fp.push(fp);
        stats.fn_.push(total_pos - tp);
        stats.tn.push(total_neg - fp);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_counts_and_auc() {
        let scores = [0.1, 0.2, 0.7, 0.4, 0.5, 0.8, 0.7, 0.9];
        let labels = [false, false, false, false, true, true, true, true];
        let stats = roc_stats(&scores, &labels).unwrap();
        assert_eq!(stats.thresholds[0], f64::NEG_INFINITY);
        assert_eq!(stats.len(), 8);
        assert_eq!(stats.tp, vec![4, 4, 4, 4, 3, 2, 1, 0]);
        assert_eq!(stats.fp, vec![4, 3, 2, 1, 1, 0, 0, 0]);
        assert_eq!(stats.tp[7] + stats.fn_[7], 4);
        assert!((stats.auc() - 14.5 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn fixture_partial_criterion() {
        let scores = [0.1, 0.2, 0.7, 0.4, 0.5, 0.8, 0.7, 0.9];
        let labels = [false, false, false, false, true, true, true, true];
        let stats = roc_stats(&scores, &labels).unwrap();
        // the negative scored 0.7 caps TPR at 0.5 until FPR reaches 0.25
        assert_eq!(stats.max_tpr_at_fpr(0.2), 0.5);
        assert_eq!(stats.max_tpr_at_fpr(0.25), 1.0);
    }

    #[test]
    fn nan_scores_are_rejected() {
        let err = roc_stats(&[0.1, f64::NAN], &[true, false]);
        assert!(matches!(err, Err(PanelError::NaNFound(1))));
    }

    #[test]
    fn single_class_rates_are_zero() {
        let stats = roc_stats(&[0.3, 0.6], &[true, true]).unwrap();
        assert!(stats.fpr().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn counts_table_runs_from_all_positive_to_none() {
        let stats = roc_stats_from_counts(&[132, 85, 63, 53, 15], &[19, 50, 48, 151, 92]).unwrap();
        assert_eq!(stats.len(), 6);
        assert_eq!(stats.tp, vec![348, 333, 280, 217, 132, 0]);
        assert_eq!(stats.fp, vec![360, 268, 117, 69, 19, 0]);
        assert_eq!(stats.tn[5], 360);

        let (tpr, fpr) = (stats.tpr(), stats.fpr());
        assert_eq!((tpr[0], fpr[0]), (1.0, 1.0));
        assert_eq!((tpr[5], fpr[5]), (0.0, 0.0));
        assert!(tpr.windows(2).all(|w| w[0] >= w[1]));
        assert!(fpr.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn counts_table_orientation_matches_scored_samples() {
        // one sample per bin: bin 0 is the most positive rating
        let from_counts = roc_stats_from_counts(&[1, 1, 0], &[0, 1, 1]).unwrap();
        let from_scores = roc_stats(&[0.9, 0.6, 0.6, 0.3], &[true, true, false, false]).unwrap();
        assert_eq!(from_counts.tp, vec![2, 2, 1, 0]);
        assert_eq!(from_counts.fp, vec![2, 1, 0, 0]);
        assert_eq!(from_counts.tpr()[0], from_scores.tpr()[0]);
        assert_eq!(from_counts.fpr()[0], from_scores.fpr()[0]);
    }
}
