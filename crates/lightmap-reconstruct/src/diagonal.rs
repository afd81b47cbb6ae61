//! Diagonal resolver: fallback for lights the cardinal captures could not
//! place, using the 45°/135°/225°/315° captures.
//!
//! Readings are taken exactly like the cardinal ones, but they live in a frame
//! rotated about the array axis. They are rotated back with
//! [`ReconstructionParams::diagonal_rotation`] before use, and any axis the
//! orthogonal pass already resolved keeps its orthogonal value.

use lightmap_core::{Coord3d, CoordinateMap, MissingSet, ShotAngle};
use log::{debug, info};

use crate::orthogonal::{axis_reading, middle_z, AxisRule};
use crate::ReconstructionParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub(crate) const DIAGONAL_X: AxisRule = AxisRule {
    preferred: ShotAngle::Deg225,
    fallback: ShotAngle::Deg45,
    mirrored: ShotAngle::Deg225,
};

pub(crate) const DIAGONAL_Y: AxisRule = AxisRule {
    preferred: ShotAngle::Deg315,
    fallback: ShotAngle::Deg135,
    mirrored: ShotAngle::Deg135,
};

/// Resolve lights of `missing` from their diagonal shots.
///
/// Fixed lights are removed from `missing` and updated in `coords`; their ids
/// are returned in increasing order. Lights lacking either diagonal axis keep
/// their orthogonal partial coordinate and stay in `missing`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(missing = missing.len()))
)]
pub fn resolve_diagonal(
    missing: &mut MissingSet,
    params: &ReconstructionParams,
    coords: &mut CoordinateMap,
) -> Vec<u32> {
    let rotation = params.diagonal_rotation();
    let mut fixed = Vec::new();

    for (light_id, shots) in missing.iter() {
        let raw_x = axis_reading(shots, DIAGONAL_X, params.image_width);
        let raw_y = axis_reading(shots, DIAGONAL_Y, params.image_width);
        let (Some(raw_x), Some(raw_y)) = (raw_x, raw_y) else {
            debug!("light {light_id}: diagonal shots leave x={raw_x:?} y={raw_y:?}");
            continue;
        };

        let stored = coords.get(light_id).copied().unwrap_or_else(|| {
            let z = middle_z(shots, params.horizontal_center()).unwrap_or(0.0);
            Coord3d::new(light_id, 0.0, 0.0, z)
        });

        let [rx, ry] = rotation.apply(raw_x, raw_y);
        let coord = Coord3d::new(
            light_id,
            if stored.x != 0.0 { stored.x } else { rx },
            if stored.y != 0.0 { stored.y } else { ry },
            stored.z,
        );

        if !coord.is_reliable() {
            debug!("light {light_id}: rotated diagonal reading ({rx:.1}, {ry:.1}) left the frame");
            continue;
        }

        coords.insert(coord);
        fixed.push(light_id);
    }

    for &light_id in &fixed {
        missing.remove(light_id);
    }

    info!(
        "diagonal pass: fixed {}, still missing {}",
        fixed.len(),
        missing.len()
    );
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orthogonal::resolve_orthogonal;
    use approx::assert_abs_diff_eq;
    use lightmap_core::{PlanarRotation, Shot, ShotTable};

    const WIDTH: u32 = 1080;

    fn shot(light_id: u32, angle: ShotAngle, image_x: u32, image_y: u32) -> Shot {
        Shot {
            light_id,
            angle,
            image_x,
            image_y,
            confidence: 200,
        }
    }

    /// Diagonal-camera readings of a light at `(x, y)` for a rig turned 45°.
    fn diagonal_shots(light_id: u32, x: f64, y: f64, z: u32) -> Vec<Shot> {
        let c = f64::from(WIDTH) / 2.0;
        let [dx, dy] = PlanarRotation::new(45.0, [c, c]).apply(x, y);
        vec![
            shot(light_id, ShotAngle::Deg45, dx.round() as u32, z),
            shot(light_id, ShotAngle::Deg315, dy.round() as u32, z),
        ]
    }

    fn params_for_45() -> ReconstructionParams {
        ReconstructionParams {
            diagonal_rotation_deg: -45.0,
            ..Default::default()
        }
    }

    #[test]
    fn rotates_diagonal_readings_onto_axes() {
        let table: ShotTable = diagonal_shots(5, 700.0, 400.0, 900).into_iter().collect();
        let params = params_for_45();
        let mut coords = CoordinateMap::new();
        let mut missing = resolve_orthogonal(&table, &params, &mut coords);
        assert!(missing.contains(5));

        let fixed = resolve_diagonal(&mut missing, &params, &mut coords);
        assert_eq!(fixed, vec![5]);
        assert!(missing.is_empty());

        let c = coords.get(5).unwrap();
        assert_abs_diff_eq!(c.x, 700.0, epsilon = 1.0);
        assert_abs_diff_eq!(c.y, 400.0, epsilon = 1.0);
        assert_eq!(c.z, 900.0);
    }

    #[test]
    fn orthogonal_axis_overrides_diagonal_value() {
        let mut shots = diagonal_shots(2, 700.0, 400.0, 900);
        shots.push(shot(2, ShotAngle::Deg0, 710, 900));
        let table: ShotTable = shots.into_iter().collect();
        let params = params_for_45();
        let mut coords = CoordinateMap::new();
        let mut missing = resolve_orthogonal(&table, &params, &mut coords);

        resolve_diagonal(&mut missing, &params, &mut coords);
        let c = coords.get(2).unwrap();
        assert_eq!(c.x, 710.0);
        assert_abs_diff_eq!(c.y, 400.0, epsilon = 1.0);
    }

    #[test]
    fn single_diagonal_axis_stays_missing() {
        let table: ShotTable = [
            shot(9, ShotAngle::Deg0, 300, 800),
            shot(9, ShotAngle::Deg135, 500, 800),
        ]
        .into_iter()
        .collect();
        let params = ReconstructionParams::default();
        let mut coords = CoordinateMap::new();
        let mut missing = resolve_orthogonal(&table, &params, &mut coords);

        let fixed = resolve_diagonal(&mut missing, &params, &mut coords);
        assert!(fixed.is_empty());
        assert!(missing.contains(9));
        let c = coords.get(9).unwrap();
        assert_eq!((c.x, c.y), (300.0, 0.0));
    }
}
