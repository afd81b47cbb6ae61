//! Neighbor interpolator: fill unresolved lights from the nearest reliable
//! lights on either side of them along the string.

use lightmap_core::{Coord3d, CoordinateMap, LightRange, MissingSet};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A light no stage could place. It is absent from the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedLight {
    pub light_id: u32,
    /// No reliable light below this id.
    pub missing_prev: bool,
    /// No reliable light above this id inside the range.
    pub missing_next: bool,
}

/// Lights filled by [`interpolate_neighbors`] and the ones left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpolationOutcome {
    pub filled: Vec<u32>,
    pub unresolved: Vec<UnresolvedLight>,
}

/// One step from `a` toward `b`, biased toward `a`: `trunc(a + floor((b - a) / gap))`.
#[inline]
pub fn biased_average(a: f64, b: f64, gap: u32) -> f64 {
    (a + ((b - a) / f64::from(gap)).floor()).trunc()
}

/// Coordinate for `light_id` given its reliable neighbors `gap` ids apart.
pub fn interpolate_between(light_id: u32, prev: &Coord3d, next: &Coord3d, gap: u32) -> Coord3d {
    Coord3d::new(
        light_id,
        biased_average(prev.x, next.x, gap),
        biased_average(prev.y, next.y, gap),
        biased_average(prev.z, next.z, gap),
    )
}

/// Fill every light of `range` that is not reliable in `coords`.
///
/// Ids are visited in increasing order and each filled light is written back
/// at once, so a run of missing lights is walked from its lower end. Lights
/// without a reliable neighbor on both sides are dropped from `coords` and
/// reported.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(lights = range.end()))
)]
pub fn interpolate_neighbors(
    coords: &mut CoordinateMap,
    missing: &MissingSet,
    range: LightRange,
) -> InterpolationOutcome {
    let mut outcome = InterpolationOutcome::default();

    for light_id in range.ids() {
        if coords.is_reliable(light_id) && !missing.contains(light_id) {
            continue;
        }

        let prev_id = coords.prev_reliable(light_id);
        let next_id = coords.next_reliable(light_id, range);
        let neighbors = prev_id
            .zip(next_id)
            .and_then(|(p, n)| Some((p, *coords.get(p)?, n, *coords.get(n)?)));

        match neighbors {
            Some((prev_id, prev, next_id, next)) => {
                let coord = interpolate_between(light_id, &prev, &next, next_id - prev_id);
                debug!("light {light_id}: interpolated between {prev_id} and {next_id}");
                coords.insert(coord);
                outcome.filled.push(light_id);
            }
            None => {
                coords.remove(light_id);
                outcome.unresolved.push(UnresolvedLight {
                    light_id,
                    missing_prev: prev_id.is_none(),
                    missing_next: next_id.is_none(),
                });
            }
        }
    }

    info!(
        "neighbor pass: filled {}, unresolved {}",
        outcome.filled.len(),
        outcome.unresolved.len()
    );
    outcome
}
