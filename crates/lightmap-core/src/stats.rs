//! Small robust-statistics helpers for distance distributions.
//!
//! `percentile` uses linear interpolation between the two closest ranks,
//! i.e. rank `p / 100 * (n - 1)` on the sorted sample. Non-finite values are
//! ignored.
use serde::{Deserialize, Serialize};

/// Equal-width histogram for debug/visualization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceHistogram {
    pub bin_centers: Vec<f64>,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// The `pct`-th percentile of `values`, `pct` in `[0, 100]`.
///
/// Returns `None` for an empty sample.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return None;
    }

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Bin `values` into `num_bins` equal-width bins spanning `[min, max]`.
///
/// The last bin is closed on the right. Returns `None` for an empty sample
/// or zero bins; a degenerate sample (all equal) lands in a single unit-width
/// bin.
pub fn histogram(values: &[f64], num_bins: usize) -> Option<DistanceHistogram> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() || num_bins == 0 {
        return None;
    }

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let span = max - min;
    if span <= 0.0 {
        return Some(DistanceHistogram {
            bin_centers: vec![min],
            bin_width: 1.0,
            counts: vec![sorted.len()],
        });
    }

    let bin_width = span / num_bins as f64;
    let mut counts = vec![0usize; num_bins];
    for v in &sorted {
        let idx = (((v - min) / bin_width) as usize).min(num_bins - 1);
        counts[idx] += 1;
    }
    let bin_centers = (0..num_bins)
        .map(|i| min + (i as f64 + 0.5) * bin_width)
        .collect();

    Some(DistanceHistogram {
        bin_centers,
        bin_width,
        counts,
    })
}
