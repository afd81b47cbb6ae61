use lightmap_core::CoordinateMap;
use serde::{Deserialize, Serialize};

use crate::{Normalization, OutlierReport, ShotTableStats, UnresolvedLight};

/// Number of lights leaving each stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    /// Lights with at least one kept shot.
    pub observed: usize,
    /// Lights the cardinal captures left unresolved.
    pub orthogonal_missing: usize,
    pub diagonal_fixed: usize,
    pub outliers_deleted: usize,
    pub neighbor_fixed: usize,
    pub unresolved: usize,
    /// Lights written to the output.
    pub resolved: usize,
}

/// Non-fatal conditions met while reconstructing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// No two reliable lights were adjacent, so the outlier filter was skipped.
    EmptyDistribution,
    /// The horizontal extent was zero, so the cloud was not rescaled.
    DegenerateScale,
}

/// Output of a reconstruction run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionResult {
    /// Resolved lights in canonical space.
    pub coordinates: CoordinateMap,
    /// `None` when nothing was resolved.
    pub normalization: Option<Normalization>,
    /// Positions the diagonal resolver produced, before outlier filtering,
    /// in canonical space.
    pub diagonal_fixed: CoordinateMap,
    /// Lights placed by the neighbor interpolator, in canonical space.
    pub neighbor_fixed: CoordinateMap,
    pub outliers: OutlierReport,
    pub unresolved: Vec<UnresolvedLight>,
    pub counts: StageCounts,
    pub warnings: Vec<PipelineWarning>,
    /// Parser counters, set when the run started from raw records.
    #[serde(default)]
    pub input: Option<ShotTableStats>,
}

impl ReconstructionResult {
    pub fn unresolved_ids(&self) -> Vec<u32> {
        self.unresolved.iter().map(|u| u.light_id).collect()
    }
}
