//! High-level facade crate for the `lightmap-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the core types and the reconstruction pipeline,
//! - file-level helpers that read a shot log, reconstruct, and write the CSV
//!   and diagnostic report,
//! - a seeded synthetic rig (a light string wound on a helix) for tests,
//!   benchmarks and the `lightmap simulate` command.
//!
//! ## Quickstart
//!
//! ```no_run
//! use lightmap::reconstruct::ReconstructionParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = lightmap::reconstruct_file("shots.jsonl", ReconstructionParams::default())?;
//! lightmap::reconstruct::write_csv_file(&result.coordinates, "coordinates.csv")?;
//! println!("placed {} lights", result.counts.resolved);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `lightmap::core`: shots, coordinates, planar rotation, distance statistics, logging.
//! - `lightmap::reconstruct`: pipeline stages, `Reconstructor`, CSV and JSON I/O.
//! - `lightmap::synthetic`: ground-truth helix rig and its simulated captures.
//! - `lightmap::run`: one-call runs from files or a JSON config.

pub use lightmap_core as core;
pub use lightmap_reconstruct as reconstruct;

pub use lightmap_core::{Coord3d, CoordinateMap, CoordinateSpace, Shot, ShotAngle, ShotTable};
pub use lightmap_reconstruct::{
    ReconstructionParams, ReconstructionResult, Reconstructor, UnresolvedLight,
};

pub mod run;
pub mod synthetic;

pub use run::{reconstruct_file, run_config, RunError};
