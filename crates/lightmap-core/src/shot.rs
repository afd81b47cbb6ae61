use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the eight canonical capture angles.
///
/// Serialized as its value in degrees (`0`, `45`, ..., `315`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum ShotAngle {
    Deg0,
    Deg45,
    Deg90,
    Deg135,
    Deg180,
    Deg225,
    Deg270,
    Deg315,
}

/// An angle that is not one of the eight canonical capture angles.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
#[error("angle {0} is not a canonical capture angle (0, 45, ..., 315)")]
pub struct InvalidAngle(pub u16);

impl ShotAngle {
    /// All capture angles in increasing order.
    pub const ALL: [ShotAngle; 8] = [
        ShotAngle::Deg0,
        ShotAngle::Deg45,
        ShotAngle::Deg90,
        ShotAngle::Deg135,
        ShotAngle::Deg180,
        ShotAngle::Deg225,
        ShotAngle::Deg270,
        ShotAngle::Deg315,
    ];

    #[inline]
    pub fn degrees(self) -> u16 {
        match self {
            ShotAngle::Deg0 => 0,
            ShotAngle::Deg45 => 45,
            ShotAngle::Deg90 => 90,
            ShotAngle::Deg135 => 135,
            ShotAngle::Deg180 => 180,
            ShotAngle::Deg225 => 225,
            ShotAngle::Deg270 => 270,
            ShotAngle::Deg315 => 315,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.degrees() == degrees)
    }

    /// `true` for 0°, 90°, 180° and 270°.
    #[inline]
    pub fn is_cardinal(self) -> bool {
        self.degrees() % 90 == 0
    }

    /// The capture taken from the opposite side of the array.
    pub fn opposite(self) -> Self {
        let deg = (self.degrees() + 180) % 360;
        // Canonical angles are closed under a half turn.
        Self::from_degrees(deg).unwrap_or(self)
    }
}

impl TryFrom<u16> for ShotAngle {
    type Error = InvalidAngle;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_degrees(value).ok_or(InvalidAngle(value))
    }
}

impl From<ShotAngle> for u16 {
    fn from(angle: ShotAngle) -> Self {
        angle.degrees()
    }
}

/// One per-angle brightness-peak detection for one light.
///
/// Pixel coordinates have their origin at the top-left image corner; `0` on
/// either axis is the detector's "nothing found" sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub light_id: u32,
    pub angle: ShotAngle,
    pub image_x: u32,
    pub image_y: u32,
    /// Peak brightness reported by the detector, 0–255.
    pub confidence: u8,
}

impl Shot {
    /// The detector found no peak for this shot.
    #[inline]
    pub fn is_failed_detection(&self) -> bool {
        self.image_x == 0 || self.image_y == 0
    }
}

/// Filtered shots grouped by light id.
///
/// Iteration is in increasing id order; shots of one light keep their input
/// order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotTable {
    shots: BTreeMap<u32, Vec<Shot>>,
}

impl ShotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shot: Shot) {
        self.shots.entry(shot.light_id).or_default().push(shot);
    }

    pub fn get(&self, light_id: u32) -> Option<&[Shot]> {
        self.shots.get(&light_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Shot])> + '_ {
        self.shots.iter().map(|(&id, shots)| (id, shots.as_slice()))
    }

    /// Number of lights with at least one shot.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn shot_count(&self) -> usize {
        self.shots.values().map(Vec::len).sum()
    }

    pub fn max_light_id(&self) -> Option<u32> {
        self.shots.keys().next_back().copied()
    }
}

impl FromIterator<Shot> for ShotTable {
    fn from_iter<I: IntoIterator<Item = Shot>>(iter: I) -> Self {
        let mut table = ShotTable::new();
        for shot in iter {
            table.insert(shot);
        }
        table
    }
}
