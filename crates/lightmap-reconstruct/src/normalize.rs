//! Normalizer: map pixel coordinates into a resolution-independent space.
//!
//! The cloud is centered on the frame center in x/y, z is inverted so that it
//! grows upward, and every axis is divided by the largest horizontal
//! magnitude. Afterwards `max(|x|, |y|) == 1` and `min(z) == 0`.

use lightmap_core::{Coord3d, CoordinateMap, CoordinateSpace};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::ReconstructionParams;

/// A fitted pixel-to-canonical transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Pixel position mapped to the x/y origin.
    pub center: [f64; 2],
    /// Largest pixel z before inversion.
    pub max_z: f64,
    pub scale: f64,
    /// The horizontal extent was zero or non-finite; `scale` fell back to 1.
    pub degenerate: bool,
}

impl Normalization {
    /// Fit the transform on a pixel-space map. `None` for an empty map.
    pub fn fit(coords: &CoordinateMap, params: &ReconstructionParams) -> Option<Self> {
        let center = params.frame_center();
        let max_z = coords.values().map(|c| c.z).reduce(f64::max)?;

        let extent = coords
            .values()
            .flat_map(|c| [c.x - center[0], c.y - center[1]])
            .map(f64::abs)
            .fold(0.0, f64::max);

        let degenerate = !(extent.is_finite() && extent > 0.0);
        if degenerate {
            warn!("degenerate horizontal extent {extent}, normalizing without scaling");
        }

        Some(Self {
            center,
            max_z,
            scale: if degenerate { 1.0 } else { extent },
            degenerate,
        })
    }

    pub fn apply_to(&self, c: &Coord3d) -> Coord3d {
        Coord3d::new(
            c.light_id,
            (c.x - self.center[0]) / self.scale,
            (c.y - self.center[1]) / self.scale,
            (self.max_z - c.z) / self.scale,
        )
    }

    /// Transform every coordinate of a pixel-space map in place.
    ///
    /// Canonical maps are left untouched.
    pub fn apply(&self, coords: &mut CoordinateMap) {
        if coords.space() == CoordinateSpace::Canonical {
            return;
        }
        for c in coords.values_mut() {
            *c = self.apply_to(c);
        }
        coords.set_space(CoordinateSpace::Canonical);
    }
}

/// Fit and apply the normalization. A no-op on empty or canonical maps.
///
/// Repeated calls are idempotent through the map's [`CoordinateSpace`] tag
/// alone: canonical values in a map tagged `Pixel` are normalized again.
pub fn normalize(coords: &mut CoordinateMap, params: &ReconstructionParams) -> Option<Normalization> {
    if coords.space() == CoordinateSpace::Canonical {
        debug!("map already canonical, skipping normalization");
        return None;
    }
    let norm = Normalization::fit(coords, params)?;
    norm.apply(coords);
    debug!(
        "normalized {} lights: center {:?}, scale {:.2}",
        coords.len(),
        norm.center,
        norm.scale
    );
    Some(norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cloud() -> CoordinateMap {
        [
            Coord3d::new(0, 540.0, 340.0, 1500.0),
            Coord3d::new(1, 740.0, 540.0, 1200.0),
            Coord3d::new(2, 440.0, 640.0, 900.0),
            Coord3d::new(3, 600.0, 600.0, 300.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn extent_is_one_and_floor_is_zero() {
        let mut coords = cloud();
        let norm = normalize(&mut coords, &ReconstructionParams::default()).unwrap();

        assert_relative_eq!(norm.scale, 200.0);
        assert!(!norm.degenerate);
        assert_eq!(coords.space(), CoordinateSpace::Canonical);

        let extent = coords
            .values()
            .flat_map(|c| [c.x.abs(), c.y.abs()])
            .fold(0.0, f64::max);
        let floor = coords.values().map(|c| c.z).fold(f64::INFINITY, f64::min);
        assert_relative_eq!(extent, 1.0);
        assert_relative_eq!(floor, 0.0);

        let top = coords.get(3).unwrap();
        assert_relative_eq!(top.z, 6.0);
        assert_relative_eq!(coords.get(0).unwrap().y, -1.0);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut coords = cloud();
        let params = ReconstructionParams::default();
        normalize(&mut coords, &params);
        let once = coords.clone();

        assert!(normalize(&mut coords, &params).is_none());
        assert_eq!(coords, once);
    }

    #[test]
    fn collected_canonical_values_need_the_space_tag() {
        let params = ReconstructionParams::default();
        let canonical = || {
            [
                Coord3d::new(0, 0.5, -0.25, 0.0),
                Coord3d::new(1, -1.0, 0.75, 2.0),
            ]
            .into_iter()
            .collect::<CoordinateMap>()
        };

        let mut tagged = canonical();
        tagged.set_space(CoordinateSpace::Canonical);
        let before = tagged.clone();
        assert!(normalize(&mut tagged, &params).is_none());
        assert_eq!(tagged, before);

        let mut untagged = canonical();
        assert!(normalize(&mut untagged, &params).is_some());
        assert!(untagged.get(0).unwrap().x < 0.0);
    }

    #[test]
    fn degenerate_extent_keeps_unit_scale() {
        let mut coords: CoordinateMap = [
            Coord3d::new(0, 540.0, 540.0, 100.0),
            Coord3d::new(1, 540.0, 540.0, 50.0),
        ]
        .into_iter()
        .collect();
        let norm = normalize(&mut coords, &ReconstructionParams::default()).unwrap();
        assert!(norm.degenerate);
        assert_eq!(norm.scale, 1.0);
        assert_eq!(coords.get(1).unwrap().z, 50.0);
    }

    #[test]
    fn empty_map_is_left_alone() {
        let mut coords = CoordinateMap::new();
        assert!(normalize(&mut coords, &ReconstructionParams::default()).is_none());
        assert_eq!(coords.space(), CoordinateSpace::Pixel);
    }

    #[test]
    fn pivot_offset_shifts_the_origin() {
        let params = ReconstructionParams {
            pivot_offset_px: [-5.0, 5.0],
            ..Default::default()
        };
        let norm = Normalization::fit(&cloud(), &params).unwrap();
        assert_eq!(norm.center, [535.0, 545.0]);
        let c = norm.apply_to(&Coord3d::new(9, 535.0, 545.0, norm.max_z));
        assert_eq!((c.x, c.y, c.z), (0.0, 0.0, 0.0));
    }
}
