//! Reconstruction of a light string's 3D layout from multi-angle captures.
//!
//! Stages, in the order [`Reconstructor::reconstruct`] runs them:
//! - shot table builder: parse records, drop failed and dim detections,
//! - orthogonal resolver: x/y from the 0°/90°/180°/270° captures,
//! - diagonal resolver: rotated fallback from the 45°/135°/225°/315° captures,
//! - outlier filter: drop lights far from both id-neighbors,
//! - neighbor interpolator: fill the gaps from the nearest reliable lights,
//! - normalizer: center, invert z and scale into canonical space.
//!
//! Each stage is also exposed as a free function operating on the explicit
//! [`CoordinateMap`](lightmap_core::CoordinateMap) / [`MissingSet`](lightmap_core::MissingSet)
//! state.

mod diagonal;
mod error;
mod interpolate;
mod io;
mod normalize;
mod orthogonal;
mod outliers;
mod params;
mod pipeline;
mod result;
mod shot_table;

pub use diagonal::resolve_diagonal;
pub use error::{ParamsError, ReconstructError, ShotParseError};
pub use interpolate::{
    biased_average, interpolate_between, interpolate_neighbors, InterpolationOutcome,
    UnresolvedLight,
};
pub use io::{
    read_csv, read_csv_file, write_csv, write_csv_file, LightmapIoError, OverlayPoint,
    OverlaySubset, ReconstructConfig, ReconstructionReport, CSV_HEADER,
};
pub use normalize::{normalize, Normalization};
pub use orthogonal::{middle_z, resolve_orthogonal};
pub use outliers::{
    filter_outliers, mark_outliers, neighbor_distances, NeighborDistance, OutlierReport,
};
pub use params::ReconstructionParams;
pub use pipeline::Reconstructor;
pub use result::{PipelineWarning, ReconstructionResult, StageCounts};
pub use shot_table::{
    build_shot_table, filter_shots, parse_shot_line, read_shot_table, ShotTableStats,
};
