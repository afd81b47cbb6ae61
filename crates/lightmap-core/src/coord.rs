use crate::Shot;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 3D position of one light.
///
/// In [`CoordinateSpace::Pixel`] the axes are capture pixels and `0` on x or
/// y marks an axis that has not been resolved yet. In
/// [`CoordinateSpace::Canonical`] values are centered, z-up and scaled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord3d {
    pub light_id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord3d {
    pub fn new(light_id: u32, x: f64, y: f64, z: f64) -> Self {
        Self { light_id, x, y, z }
    }

    /// Placeholder with every axis unresolved.
    pub fn unresolved(light_id: u32) -> Self {
        Self::new(light_id, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn distance(&self, other: &Coord3d) -> f64 {
        nalgebra::distance(&self.position(), &other.position())
    }

    /// All axes resolved to positive pixel values.
    ///
    /// Only meaningful before normalization.
    #[inline]
    pub fn is_reliable(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.z > 0.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Units of the values held by a [`CoordinateMap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Capture pixels, origin at the frame corner, z growing downwards.
    #[default]
    Pixel,
    /// Centered on the array axis, z up, unit horizontal radius.
    Canonical,
}

/// Mapping `light_id -> Coord3d` threaded through every pipeline stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMap {
    space: CoordinateSpace,
    coords: BTreeMap<u32, Coord3d>,
}

impl CoordinateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_space(space: CoordinateSpace) -> Self {
        Self {
            space,
            coords: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn set_space(&mut self, space: CoordinateSpace) {
        self.space = space;
    }

    /// Insert or replace the coordinate keyed by its own `light_id`.
    pub fn insert(&mut self, coord: Coord3d) -> Option<Coord3d> {
        self.coords.insert(coord.light_id, coord)
    }

    pub fn get(&self, light_id: u32) -> Option<&Coord3d> {
        self.coords.get(&light_id)
    }

    pub fn get_mut(&mut self, light_id: u32) -> Option<&mut Coord3d> {
        self.coords.get_mut(&light_id)
    }

    pub fn remove(&mut self, light_id: u32) -> Option<Coord3d> {
        self.coords.remove(&light_id)
    }

    pub fn contains(&self, light_id: u32) -> bool {
        self.coords.contains_key(&light_id)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates in increasing id order.
    pub fn values(&self) -> impl Iterator<Item = &Coord3d> + '_ {
        self.coords.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Coord3d> + '_ {
        self.coords.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.coords.keys().copied()
    }

    pub fn is_reliable(&self, light_id: u32) -> bool {
        self.get(light_id).is_some_and(Coord3d::is_reliable)
    }

    /// Nearest reliable id strictly below `light_id`.
    pub fn prev_reliable(&self, light_id: u32) -> Option<u32> {
        self.coords
            .range(..light_id)
            .rev()
            .find(|(_, c)| c.is_reliable())
            .map(|(&id, _)| id)
    }

    /// Nearest reliable id strictly above `light_id` and inside `range`.
    pub fn next_reliable(&self, light_id: u32, range: LightRange) -> Option<u32> {
        let start = light_id.checked_add(1)?;
        if start >= range.end() {
            return None;
        }
        self.coords
            .range(start..range.end())
            .find(|(_, c)| c.is_reliable())
            .map(|(&id, _)| id)
    }

    /// Copy of the coordinates whose ids appear in `ids`.
    pub fn subset<I: IntoIterator<Item = u32>>(&self, ids: I) -> CoordinateMap {
        let mut out = CoordinateMap::with_space(self.space);
        for id in ids {
            if let Some(c) = self.get(id) {
                out.insert(*c);
            }
        }
        out
    }
}

impl Extend<Coord3d> for CoordinateMap {
    fn extend<I: IntoIterator<Item = Coord3d>>(&mut self, iter: I) {
        for c in iter {
            self.insert(c);
        }
    }
}

/// Collected maps are tagged [`CoordinateSpace::Pixel`]; call
/// [`CoordinateMap::set_space`] when collecting canonical coordinates.
impl FromIterator<Coord3d> for CoordinateMap {
    fn from_iter<I: IntoIterator<Item = Coord3d>>(iter: I) -> Self {
        let mut map = CoordinateMap::new();
        map.extend(iter);
        map
    }
}

/// Lights the orthogonal pass could not resolve, with their filtered shots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingSet {
    lights: BTreeMap<u32, Vec<Shot>>,
}

impl MissingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, light_id: u32, shots: Vec<Shot>) {
        self.lights.insert(light_id, shots);
    }

    pub fn remove(&mut self, light_id: u32) -> Option<Vec<Shot>> {
        self.lights.remove(&light_id)
    }

    pub fn contains(&self, light_id: u32) -> bool {
        self.lights.contains_key(&light_id)
    }

    pub fn get(&self, light_id: u32) -> Option<&[Shot]> {
        self.lights.get(&light_id).map(Vec::as_slice)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.lights.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Shot])> + '_ {
        self.lights.iter().map(|(&id, s)| (id, s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

/// The id universe `[0, count)` of one light string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightRange {
    count: u32,
}

impl LightRange {
    pub fn new(count: u32) -> Self {
        Self { count }
    }

    /// Exclusive upper bound.
    #[inline]
    pub fn end(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn contains(&self, light_id: u32) -> bool {
        light_id < self.count
    }

    pub fn ids(&self) -> std::ops::Range<u32> {
        0..self.count
    }
}
