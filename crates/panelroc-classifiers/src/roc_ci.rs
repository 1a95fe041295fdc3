//! Confidence regions for ROC curves following Tilbury et al. (2000).
//!
//! For one operating point with counts (TP, FP, FN, TN) the posterior of the
//! false positive rate is Beta(FP + 1, TN + 1) and that of the true positive
//! rate is Beta(TP + 1, FN + 1). Both axes of the unit square are cut into
//! `grid_size` bins; the probability of each bin is the difference of the
//! cumulative distribution at its edges, computed in log space, and the joint
//! surface is the outer product of the two marginals.
//!
//! Surfaces are reduced to boolean blobs (smallest set of cells holding the
//! requested mass), blobs are joined into a band, and blobs can be turned
//! into convex polygons for plotting.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

use crate::error::{PanelError, Result};
use crate::models::utils::log_add_exp;
use crate::stats::RocStats;

/// Natural log of the Beta(a0 + 1, a1 + 1) cumulative distribution at `p`.
///
/// Expanded as a binomial tail sum so only log-gamma values are needed:
///
/// ```text
/// lnG(a0+a1+2) + logsumexp_k [ (a0+a1+1-k) ln p + k ln(1-p) - lnG(k+1) - lnG(a0+a1+2-k) ]
/// ```
///
/// for k in 0..=a1. Returns negative infinity for `p <= 0` and 0 for `p >= 1`.
pub fn ln_boundary_value(a0: usize, a1: usize, p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return 0.0;
    }
    let n = (a0 + a1) as f64;
    let (ln_p, ln_q) = (p.ln(), (-p).ln_1p());
    let tail = (0..=a1).fold(f64::NEG_INFINITY, |acc, k| {
        let k = k as f64;
        let term = (n + 1.0 - k) * ln_p + k * ln_q - ln_gamma(k + 1.0) - ln_gamma(n + 2.0 - k);
        log_add_exp(acc, term)
    });
    ln_gamma(n + 2.0) + tail
}

/// `exp(ln_x) - exp(ln_y)` without leaving log space until the end.
pub fn sub_exp(ln_x: f64, ln_y: f64) -> f64 {
    if ln_x < ln_y {
        return -sub_exp(ln_y, ln_x);
    }
    if ln_x == ln_y {
        return 0.0;
    }
    if ln_y == f64::NEG_INFINITY {
        return ln_x.exp();
    }
    ((-(ln_y - ln_x).exp()).ln_1p() + ln_x).exp()
}

/// Probability mass of each of the `grid_size` bins along one axis.
fn bin_probabilities(a0: usize, a1: usize, grid_size: usize) -> Vec<f64> {
    let mut edges: Vec<f64> = (0..=grid_size)
        .map(|i| ln_boundary_value(a0, a1, i as f64 / grid_size as f64))
        .collect();
    // rounding can leave neighbouring edges out of order
    edges.sort_by(|a, b| a.total_cmp(b));
    edges.windows(2).map(|w| sub_exp(w[1], w[0])).collect()
}

/// Joint probability surface for one operating point.
///
/// Rows index TPR bins and columns index FPR bins, both from 0 upward, so
/// cell `(i, j)` is `P(TPR in bin i) * P(FPR in bin j)`.
pub fn confidence_surface(
    tp: usize,
    fp: usize,
    fn_: usize,
    tn: usize,
    grid_size: usize,
) -> Result<Array2<f64>> {
    if grid_size == 0 {
        return Err(PanelError::InvalidConfig(
            "grid size must be at least 1".to_string(),
        ));
    }
    let x = bin_probabilities(fp, tn, grid_size);
    let y = bin_probabilities(tp, fn_, grid_size);
    Ok(Array2::from_shape_fn((grid_size, grid_size), |(i, j)| {
        y[i] * x[j]
    }))
}

/// One surface per operating point of `stats`.
pub fn roc_surfaces(stats: &RocStats, grid_size: usize) -> Result<Vec<Array2<f64>>> {
    (0..stats.len())
        .map(|i| {
            confidence_surface(
                stats.tp[i],
                stats.fp[i],
                stats.fn_[i],
                stats.tn[i],
                grid_size,
            )
        })
        .collect()
}

/// Smallest set of highest-probability cells whose total mass reaches
/// `confidence`.
///
/// Cells are taken in descending probability, ties in row-major order, and
/// accumulation stops as soon as the running total reaches `confidence`.
pub fn confidence_blob(surface: &Array2<f64>, confidence: f64) -> Array2<bool> {
    let (rows, cols) = surface.dim();
    let flat: Vec<f64> = surface.iter().copied().collect();
    let mut order: Vec<usize> = (0..flat.len()).collect();
    order.sort_by(|&a, &b| flat[b].total_cmp(&flat[a]));

    let ln_confidence = confidence.ln();
    let mut ln_sum = f64::NEG_INFINITY;
    let mut blob = Array2::from_elem((rows, cols), false);
    for idx in order {
        blob[(idx / cols, idx % cols)] = true;
        ln_sum = log_add_exp(ln_sum, flat[idx].ln());
        if ln_sum >= ln_confidence {
            break;
        }
    }
    blob
}

/// Confidence band across consecutive operating points.
///
/// A single surface yields its own blob. Otherwise the blobs of each
/// adjacent pair are merged and filled to their convex hull, and the band is
/// the union of those segments.
pub fn confidence_band(surfaces: &[Array2<f64>], confidence: f64) -> Result<Array2<bool>> {
    let Some(first) = surfaces.first() else {
        return Err(PanelError::EmptySurfaceList);
    };
    if surfaces.len() == 1 {
        return Ok(confidence_blob(first, confidence));
    }

    let blobs: Vec<Array2<bool>> = surfaces
        .iter()
        .map(|s| confidence_blob(s, confidence))
        .collect();
    let mut band = Array2::from_elem(first.dim(), false);
    for pair in blobs.windows(2) {
        let mut joined = pair[0].clone();
        joined.zip_mut_with(&pair[1], |a, &b| *a = *a || b);
        let segment = convex_fill(&joined);
        band.zip_mut_with(&segment, |a, &b| *a = *a || b);
    }
    Ok(band)
}

/// Convex hull image of a mask: every cell whose centre lies inside (or on)
/// the convex hull of the corners of all true cells.
pub fn convex_fill(mask: &Array2<bool>) -> Array2<bool> {
    const EPS: f64 = 1e-9;
    let (rows, cols) = mask.dim();
    // cell (r, c) has centre (c, r) and corners at +/- 0.5
    let corners: Vec<Point> = mask
        .indexed_iter()
        .filter(|(_, &on)| on)
        .flat_map(|((r, c), _)| {
            let (x, y) = (c as f64, r as f64);
            [
                (x - 0.5, y - 0.5),
                (x + 0.5, y - 0.5),
                (x - 0.5, y + 0.5),
                (x + 0.5, y + 0.5),
            ]
        })
        .collect();

    let mut filled = Array2::from_elem((rows, cols), false);
    if corners.is_empty() {
        return filled;
    }
    let polygon = monotone_chain(corners);
    let (y_min, y_max) = polygon
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.1), hi.max(p.1))
        });

    for r in 0..rows {
        let y = r as f64;
        if y < y_min - EPS || y > y_max + EPS {
            continue;
        }
        let Some((x_lo, x_hi)) = horizontal_extent(&polygon, y) else {
            continue;
        };
        for c in 0..cols {
            let x = c as f64;
            if x >= x_lo - EPS && x <= x_hi + EPS {
                filled[(r, c)] = true;
            }
        }
    }
    filled
}

type Point = (f64, f64);

/// Horizontal extent of a convex polygon along the line at height `y`.
fn horizontal_extent(polygon: &[Point], y: f64) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for i in 0..polygon.len() {
        let p = polygon[i];
        let q = polygon[(i + 1) % polygon.len()];
        if y < p.1.min(q.1) || y > p.1.max(q.1) {
            continue;
        }
        if p.1 == q.1 {
            lo = lo.min(p.0.min(q.0));
            hi = hi.max(p.0.max(q.0));
        } else {
            let x = p.0 + (y - p.1) * (q.0 - p.0) / (q.1 - p.1);
            lo = lo.min(x);
            hi = hi.max(x);
        }
    }
    (lo <= hi).then_some((lo, hi))
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Andrew's monotone chain. Returns the hull counter-clockwise without
/// collinear points, starting from the lowest-leftmost vertex.
fn monotone_chain(mut points: Vec<Point>) -> Vec<Point> {
    points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<Point> = Vec::new();
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::new();
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Convex polygon in unit ROC coordinates (x = FPR, y = TPR), vertices in
/// counter-clockwise order without repeating the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon {
    pub vertices: Vec<(f64, f64)>,
}

impl ConvexPolygon {
    /// Vertex coordinates with the first vertex appended, ready for a line
    /// trace.
    pub fn closed(&self) -> (Vec<f64>, Vec<f64>) {
        let mut xs: Vec<f64> = self.vertices.iter().map(|v| v.0).collect();
        let mut ys: Vec<f64> = self.vertices.iter().map(|v| v.1).collect();
        if let Some(&(x, y)) = self.vertices.first() {
            xs.push(x);
            ys.push(y);
        }
        (xs, ys)
    }

    /// Shoelace area.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| {
                let (a, b) = (self.vertices[i], self.vertices[(i + 1) % n]);
                a.0 * b.1 - b.0 * a.1
            })
            .sum::<f64>()
            / 2.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        n >= 3
            && (0..n).all(|i| cross(self.vertices[i], self.vertices[(i + 1) % n], (x, y)) >= -1e-12)
    }
}

/// Convex polygon around every true cell of `blob`, in unit coordinates.
pub fn hull(blob: &Array2<bool>) -> Result<ConvexPolygon> {
    let (rows, cols) = blob.dim();
    let (w, h) = (1.0 / cols as f64, 1.0 / rows as f64);
    let corners: Vec<Point> = blob
        .indexed_iter()
        .filter(|(_, &on)| on)
        .flat_map(|((r, c), _)| {
            let (x, y) = (c as f64 * w, r as f64 * h);
            [(x, y), (x + w, y), (x, y + h), (x + w, y + h)]
        })
        .collect();
    if corners.is_empty() {
        return Err(PanelError::EmptyBlob);
    }
    Ok(ConvexPolygon {
        vertices: monotone_chain(corners),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn boundary_extremes() {
        assert_eq!(ln_boundary_value(3, 2, 0.0), f64::NEG_INFINITY);
        assert_eq!(ln_boundary_value(3, 2, 1.0), 0.0);
        // Beta(1, 1) is uniform
        assert!((ln_boundary_value(0, 0, 0.3) - 0.3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn boundary_matches_beta_cdf() {
        // Beta(2, 3) CDF at 0.4 is 1 - (0.6^4 + 4 * 0.4 * 0.6^3) = 0.5248
        let v = ln_boundary_value(1, 2, 0.4).exp();
        assert!((v - 0.5248).abs() < 1e-10, "{}", v);
    }

    #[test]
    fn sub_exp_is_signed_difference() {
        assert!((sub_exp(0.5f64.ln(), 0.2f64.ln()) - 0.3).abs() < 1e-12);
        assert!((sub_exp(0.2f64.ln(), 0.5f64.ln()) + 0.3).abs() < 1e-12);
        assert_eq!(sub_exp(f64::NEG_INFINITY, f64::NEG_INFINITY), 0.0);
        assert!((sub_exp(0.25f64.ln(), f64::NEG_INFINITY) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn surface_is_a_probability_grid() {
        let s = confidence_surface(4, 1, 0, 3, 40).unwrap();
        assert_eq!(s.dim(), (40, 40));
        assert!(s.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!((s.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn blob_reaches_confidence_minimally() {
        let s = confidence_surface(6, 2, 2, 6, 25).unwrap();
        let blob = confidence_blob(&s, 0.9);
        let mut kept: Vec<f64> = s
            .iter()
            .zip(blob.iter())
            .filter(|(_, &b)| b)
            .map(|(&p, _)| p)
            .collect();
        let mass: f64 = kept.iter().sum();
        assert!(mass >= 0.9 - 1e-12);
        kept.sort_by(|a, b| a.total_cmp(b));
        assert!(mass - kept[0] < 0.9);
    }

    #[test]
    fn blob_stops_when_mass_equals_confidence() {
        // ln(0.5) (+) ln(0.5) is exactly ln(1.0), so no zero cell is added
        let s = array![[0.5, 0.0], [0.0, 0.5]];
        let blob = confidence_blob(&s, 1.0);
        assert_eq!(blob, array![[true, false], [false, true]]);
    }

    #[test]
    fn blob_ties_prefer_row_major_order() {
        let s = Array2::from_elem((2, 2), 0.25);
        let blob = confidence_blob(&s, 0.45);
        assert_eq!(blob, array![[true, true], [false, false]]);
    }

    #[test]
    fn convex_fill_closes_a_corner_shape() {
        let mask = array![
            [true, false, false],
            [false, false, false],
            [true, false, true]
        ];
        // the centre of (0, 1) lies on the hull edge and is included
        let filled = convex_fill(&mask);
        assert_eq!(
            filled,
            array![[true, true, false], [true, true, true], [true, true, true]]
        );
    }

    #[test]
    fn band_of_one_surface_is_its_blob() {
        let s = confidence_surface(2, 1, 1, 2, 10).unwrap();
        let band = confidence_band(&[s.clone()], 0.95).unwrap();
        assert_eq!(band, confidence_blob(&s, 0.95));
        assert!(matches!(confidence_band(&[], 0.95), Err(PanelError::EmptySurfaceList)));
    }

    #[test]
    fn fixture_surfaces_stay_finite() {
        let scores = [0.1, 0.2, 0.7, 0.4, 0.5, 0.8, 0.7, 0.9];
        let labels = [false, false, false, false, true, true, true, true];
        let stats = crate::stats::roc_stats(&scores, &labels).unwrap();
        assert!(stats.auc() > 0.9);

        let first = confidence_surface(stats.tp[0], stats.fp[0], stats.fn_[0], stats.tn[0], 500)
            .unwrap();
        assert!(first.iter().all(|p| p.is_finite()));
        assert!((first.sum() - 1.0).abs() < 1e-6);

        let surfaces = roc_surfaces(&stats, 40).unwrap();
        let band = confidence_band(&surfaces, 0.95).unwrap();
        for s in &surfaces {
            let blob = confidence_blob(s, 0.95);
            assert!(blob.iter().zip(band.iter()).all(|(&b, &in_band)| !b || in_band));
        }
    }

    #[test]
    fn hull_of_single_cell_is_its_square() {
        let mut blob = Array2::from_elem((4, 5), false);
        blob[(1, 2)] = true;
        let polygon = hull(&blob).unwrap();
        assert_eq!(polygon.vertices.len(), 4);
        assert!((polygon.area() - 0.05).abs() < 1e-12);
        assert!(polygon.contains(0.5, 0.3));
        assert!(!polygon.contains(0.1, 0.1));
        assert!(matches!(
            hull(&Array2::from_elem((2, 2), false)),
            Err(PanelError::EmptyBlob)
        ));
    }
}
