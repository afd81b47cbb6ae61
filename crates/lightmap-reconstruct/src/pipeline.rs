use std::io::BufRead;

use lightmap_core::{CoordinateMap, LightRange, ShotTable};
use log::{info, warn};

use crate::diagonal::resolve_diagonal;
use crate::interpolate::interpolate_neighbors;
use crate::normalize::Normalization;
use crate::orthogonal::resolve_orthogonal;
use crate::outliers::filter_outliers;
use crate::shot_table::{build_shot_table, read_shot_table};
use crate::{
    PipelineWarning, ReconstructError, ReconstructionParams, ReconstructionResult, StageCounts,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Runs the reconstruction stages in order on one capture session.
#[derive(Clone, Debug)]
pub struct Reconstructor {
    params: ReconstructionParams,
}

impl Reconstructor {
    /// Create a reconstructor, rejecting invalid parameters.
    pub fn new(params: ReconstructionParams) -> Result<Self, ReconstructError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &ReconstructionParams {
        &self.params
    }

    /// Light ids covered by a run over `table`.
    pub fn light_range(&self, table: &ShotTable) -> LightRange {
        let count = self
            .params
            .light_count
            .or_else(|| table.max_light_id().map(|id| id.saturating_add(1)))
            .unwrap_or(0);
        LightRange::new(count)
    }

    /// Reconstruct from an already-built shot table.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(lights = table.len(), shots = table.shot_count()))
    )]
    pub fn reconstruct(&self, table: &ShotTable) -> ReconstructionResult {
        let params = &self.params;
        let range = self.light_range(table);
        info!(
            "reconstructing {} lights from {} shots (range 0..{})",
            table.len(),
            table.shot_count(),
            range.end()
        );

        let mut coords = CoordinateMap::new();
        let mut missing = resolve_orthogonal(table, params, &mut coords);
        let orthogonal_missing = missing.len();

        let diagonal_ids = resolve_diagonal(&mut missing, params, &mut coords);
        let mut diagonal_fixed = coords.subset(diagonal_ids.iter().copied());

        let outliers = filter_outliers(&mut coords, range, params);
        let mut warnings = Vec::new();
        if outliers.threshold.is_none() {
            warnings.push(PipelineWarning::EmptyDistribution);
        }

        let interpolation = interpolate_neighbors(&mut coords, &missing, range);
        let mut neighbor_fixed = coords.subset(interpolation.filled.iter().copied());

        let normalization = Normalization::fit(&coords, params);
        if let Some(norm) = &normalization {
            if norm.degenerate {
                warnings.push(PipelineWarning::DegenerateScale);
            }
            norm.apply(&mut coords);
            norm.apply(&mut diagonal_fixed);
            norm.apply(&mut neighbor_fixed);
        }

        let counts = StageCounts {
            observed: table.len(),
            orthogonal_missing,
            diagonal_fixed: diagonal_ids.len(),
            outliers_deleted: outliers.deleted_inconsistent.len(),
            neighbor_fixed: interpolation.filled.len(),
            unresolved: interpolation.unresolved.len(),
            resolved: coords.len(),
        };
        if counts.unresolved > 0 {
            warn!("{} lights could not be placed", counts.unresolved);
        }
        info!(
            "resolved {} lights ({} diagonal, {} interpolated, {} outliers removed)",
            counts.resolved, counts.diagonal_fixed, counts.neighbor_fixed, counts.outliers_deleted
        );

        ReconstructionResult {
            coordinates: coords,
            normalization,
            diagonal_fixed,
            neighbor_fixed,
            outliers,
            unresolved: interpolation.unresolved,
            counts,
            warnings,
            input: None,
        }
    }

    /// Parse record lines and reconstruct. Any malformed line aborts the run.
    pub fn reconstruct_lines<I, S>(&self, lines: I) -> Result<ReconstructionResult, ReconstructError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (table, stats) = build_shot_table(lines, &self.params)?;
        let mut result = self.reconstruct(&table);
        result.input = Some(stats);
        Ok(result)
    }

    /// Read records from `reader` and reconstruct.
    pub fn reconstruct_reader<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<ReconstructionResult, ReconstructError> {
        let (table, stats) = read_shot_table(reader, &self.params)?;
        let mut result = self.reconstruct(&table);
        result.input = Some(stats);
        Ok(result)
    }
}
