//! Core types and utilities for light-array reconstruction.
//!
//! This crate is intentionally small and purely geometric. It knows what a
//! shot and a coordinate are, how to rotate a planar frame and how to
//! summarize a distance distribution; the reconstruction stages themselves
//! live in `lightmap-reconstruct`.

mod coord;
mod logger;
mod rotation;
mod shot;
mod stats;

pub use coord::{Coord3d, CoordinateMap, CoordinateSpace, LightRange, MissingSet};
pub use rotation::PlanarRotation;
pub use shot::{InvalidAngle, Shot, ShotAngle, ShotTable};
pub use stats::{histogram, percentile, DistanceHistogram};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
