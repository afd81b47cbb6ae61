//! Orthogonal resolver: x/y from the cardinal captures, z from the shot
//! nearest the image's horizontal center.
//!
//! The camera (or the array) turns 180° between opposite captures, which
//! mirrors the horizontal image axis. Readings from the mirrored angle of a
//! pair are flipped back as `image_width - image_x`.

use lightmap_core::{Coord3d, CoordinateMap, MissingSet, Shot, ShotAngle, ShotTable};
use log::{debug, info};

use crate::ReconstructionParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Which pair of opposite captures feeds one horizontal axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AxisRule {
    /// Used when present.
    pub preferred: ShotAngle,
    pub fallback: ShotAngle,
    /// The member of the pair whose horizontal axis is flipped.
    pub mirrored: ShotAngle,
}

pub(crate) const CARDINAL_X: AxisRule = AxisRule {
    preferred: ShotAngle::Deg180,
    fallback: ShotAngle::Deg0,
    mirrored: ShotAngle::Deg180,
};

pub(crate) const CARDINAL_Y: AxisRule = AxisRule {
    preferred: ShotAngle::Deg270,
    fallback: ShotAngle::Deg90,
    mirrored: ShotAngle::Deg90,
};

/// Reading of one horizontal axis, in unmirrored pixels.
///
/// `None` when neither angle of the pair has a usable shot.
pub(crate) fn axis_reading(shots: &[Shot], rule: AxisRule, image_width: u32) -> Option<f64> {
    let pick = |angle: ShotAngle| {
        shots
            .iter()
            .find(|s| s.angle == angle && !s.is_failed_detection())
    };
    let shot = pick(rule.preferred).or_else(|| pick(rule.fallback))?;
    let x = if shot.angle == rule.mirrored {
        f64::from(image_width) - f64::from(shot.image_x)
    } else {
        f64::from(shot.image_x)
    };
    Some(x)
}

/// Vertical pixel of the shot whose `image_x` is nearest `center_x`.
///
/// Lens parallax distorts the vertical axis least near the optical center.
/// Ties go to the earlier shot.
pub fn middle_z(shots: &[Shot], center_x: f64) -> Option<f64> {
    shots
        .iter()
        .filter(|s| !s.is_failed_detection())
        .min_by(|a, b| {
            let da = (f64::from(a.image_x) - center_x).abs();
            let db = (f64::from(b.image_x) - center_x).abs();
            da.total_cmp(&db)
        })
        .map(|s| f64::from(s.image_y))
}

/// Resolve every light of `table` from its cardinal shots.
///
/// Writes one coordinate per light into `coords` (unresolved axes stay `0`)
/// and returns the lights missing x or y together with their shots.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(lights = table.len()))
)]
pub fn resolve_orthogonal(
    table: &ShotTable,
    params: &ReconstructionParams,
    coords: &mut CoordinateMap,
) -> MissingSet {
    let mut missing = MissingSet::new();
    let mut missing_x = 0usize;
    let mut missing_y = 0usize;

    for (light_id, shots) in table.iter() {
        let x = axis_reading(shots, CARDINAL_X, params.image_width).unwrap_or(0.0);
        let y = axis_reading(shots, CARDINAL_Y, params.image_width).unwrap_or(0.0);
        let z = middle_z(shots, params.horizontal_center()).unwrap_or(0.0);

        if x == 0.0 {
            missing_x += 1;
        }
        if y == 0.0 {
            missing_y += 1;
        }
        if x == 0.0 || y == 0.0 {
            debug!("light {light_id}: cardinal shots leave x={x} y={y}");
            missing.insert(light_id, shots.to_vec());
        }

        coords.insert(Coord3d::new(light_id, x, y, z));
    }

    info!(
        "orthogonal pass: {} lights, missing x {missing_x}, missing y {missing_y}, unresolved {}",
        table.len(),
        missing.len()
    );
    missing
}
