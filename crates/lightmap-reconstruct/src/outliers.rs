//! Outlier filter based on winding adjacency.
//!
//! Lights with consecutive ids sit next to each other on the strip, so a
//! reliable position far from both of its reliable id-neighbors is taken to be
//! a misdetection. "Far" is measured against a percentile of the distances
//! between reliable lights and their next reliable neighbor, scaled by the id
//! gap.
//!
//! ## Steps
//!
//! 1. Collect the distance from every reliable light to its nearest reliable
//!    higher-id neighbor.
//! 2. Take the configured percentile of those distances as the per-step
//!    threshold.
//! 3. Mark unreliable entries, and reliable ones whose distance to both the
//!    previous and the next reliable light exceeds `id_gap * threshold`. At the
//!    ends of the string the light compares against itself, so it is never
//!    marked.
//! 4. Delete every marked light. The filter runs once; deleted lights are
//!    refilled by the neighbor interpolator.
//!
//! An empty distance set leaves the map untouched.

use lightmap_core::{histogram, percentile, CoordinateMap, DistanceHistogram, LightRange};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::ReconstructionParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Distance from one reliable light to its next reliable neighbor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborDistance {
    pub light_id: u32,
    pub next_id: u32,
    pub distance: f64,
}

/// What the outlier filter measured and removed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub distances: Vec<NeighborDistance>,
    /// Per-step threshold, `None` when no two reliable lights were found.
    pub threshold: Option<f64>,
    pub percentile: f64,
    /// Entries deleted because an axis was still unresolved.
    pub deleted_unreliable: Vec<u32>,
    /// Reliable entries deleted as inconsistent with both neighbors.
    pub deleted_inconsistent: Vec<u32>,
    pub histogram: Option<DistanceHistogram>,
}

impl OutlierReport {
    pub fn distance_values(&self) -> Vec<f64> {
        self.distances.iter().map(|d| d.distance).collect()
    }

    /// All deleted ids in increasing order.
    pub fn deleted(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .deleted_unreliable
            .iter()
            .chain(&self.deleted_inconsistent)
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Distances from each reliable light to its next reliable neighbor.
pub fn neighbor_distances(coords: &CoordinateMap, range: LightRange) -> Vec<NeighborDistance> {
    coords
        .values()
        .filter(|c| c.is_reliable())
        .filter_map(|c| {
            let next_id = coords.next_reliable(c.light_id, range)?;
            let next = coords.get(next_id)?;
            Some(NeighborDistance {
                light_id: c.light_id,
                next_id,
                distance: c.distance(next),
            })
        })
        .collect()
}

/// Ids a one-shot pass would delete, given a per-step `threshold`.
///
/// Returns `(unreliable, inconsistent)`.
pub fn mark_outliers(
    coords: &CoordinateMap,
    range: LightRange,
    threshold: f64,
) -> (Vec<u32>, Vec<u32>) {
    let mut unreliable = Vec::new();
    let mut inconsistent = Vec::new();

    for curr in coords.values() {
        let id = curr.light_id;
        if !curr.is_reliable() {
            unreliable.push(id);
            continue;
        }

        let prev_id = coords.prev_reliable(id).unwrap_or(id);
        let next_id = coords.next_reliable(id, range).unwrap_or(id);
        let (Some(prev), Some(next)) = (coords.get(prev_id), coords.get(next_id)) else {
            continue;
        };

        let prev_too_far = curr.distance(prev) > f64::from(id - prev_id) * threshold;
        let next_too_far = curr.distance(next) > f64::from(next_id - id) * threshold;
        if prev_too_far && next_too_far {
            debug!(
                "light {id}: {:.1} from {prev_id} and {:.1} from {next_id} (threshold {threshold:.2}/step)",
                curr.distance(prev),
                curr.distance(next)
            );
            inconsistent.push(id);
        }
    }

    (unreliable, inconsistent)
}

/// Delete lights inconsistent with winding adjacency from `coords`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(lights = coords.len()))
)]
pub fn filter_outliers(
    coords: &mut CoordinateMap,
    range: LightRange,
    params: &ReconstructionParams,
) -> OutlierReport {
    let distances = neighbor_distances(coords, range);
    let values: Vec<f64> = distances.iter().map(|d| d.distance).collect();
    let threshold = percentile(&values, params.outlier_percentile);
    let mut report = OutlierReport {
        histogram: histogram(&values, params.histogram_bins),
        distances,
        threshold,
        percentile: params.outlier_percentile,
        ..OutlierReport::default()
    };

    let Some(threshold) = threshold else {
        warn!("no adjacent reliable lights, outliers cannot be identified");
        return report;
    };

    let (unreliable, inconsistent) = mark_outliers(coords, range, threshold);
    for id in unreliable.iter().chain(&inconsistent) {
        coords.remove(*id);
    }

    info!(
        "outlier filter: P{} = {threshold:.2}, deleted {} inconsistent and {} unresolved",
        params.outlier_percentile,
        inconsistent.len(),
        unreliable.len()
    );
    report.deleted_unreliable = unreliable;
    report.deleted_inconsistent = inconsistent;
    report
}
