use nalgebra::{Point2, Rotation2};
use serde::{Deserialize, Serialize};

/// Rotation of the horizontal (x, y) plane about a vertical axis through
/// `pivot`.
///
/// Applying it translates the pivot to the origin, rotates counter-clockwise
/// by `angle_deg` and translates back: `p' = R(angle) * (p - pivot) + pivot`.
/// The vertical axis is untouched, so callers pass only x and y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarRotation {
    pub angle_deg: f64,
    pub pivot: [f64; 2],
}

impl PlanarRotation {
    pub fn new(angle_deg: f64, pivot: [f64; 2]) -> Self {
        Self { angle_deg, pivot }
    }

    /// Rotation about the origin.
    pub fn about_origin(angle_deg: f64) -> Self {
        Self::new(angle_deg, [0.0, 0.0])
    }

    /// Apply the rotation to `(x, y)`.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        let pivot = Point2::from(self.pivot);
        let rot = Rotation2::new(self.angle_deg.to_radians());
        let p = pivot + rot * (Point2::new(x, y) - pivot);
        [p.x, p.y]
    }

    /// Rotation by the opposite angle about the same pivot.
    pub fn inverse(&self) -> PlanarRotation {
        PlanarRotation {
            angle_deg: -self.angle_deg,
            pivot: self.pivot,
        }
    }
}
