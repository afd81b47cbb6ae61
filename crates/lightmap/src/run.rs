//! One-call runs over files.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use lightmap_reconstruct::{
    write_csv_file, LightmapIoError, ReconstructConfig, ReconstructError, ReconstructionParams,
    ReconstructionReport, ReconstructionResult, Reconstructor,
};
use log::info;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
    #[error(transparent)]
    Io(#[from] LightmapIoError),
}

/// Read a shot log from `path` and reconstruct it.
pub fn reconstruct_file(
    path: impl AsRef<Path>,
    params: ReconstructionParams,
) -> Result<ReconstructionResult, RunError> {
    let path = path.as_ref();
    let reconstructor = Reconstructor::new(params)?;
    let file = File::open(path).map_err(|source| RunError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    info!("reading shots from {}", path.display());
    Ok(reconstructor.reconstruct_reader(BufReader::new(file))?)
}

/// Run the reconstruction described by `cfg`.
///
/// Writes the coordinate CSV and, when configured, the diagnostic report. A
/// failed run still writes the report with its error before returning it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(input = %cfg.input_path))
)]
pub fn run_config(
    cfg: &ReconstructConfig,
    config_path: Option<&Path>,
) -> Result<ReconstructionResult, RunError> {
    let mut report = ReconstructionReport::new(cfg, config_path);
    let outcome = reconstruct_file(&cfg.input_path, cfg.params.clone());

    let result = match outcome {
        Ok(result) => result,
        Err(RunError::Reconstruct(err)) => {
            if let Some(report_path) = cfg.report_path() {
                report.set_error(&err);
                report.write_json(report_path)?;
            }
            return Err(err.into());
        }
        Err(err) => return Err(err),
    };

    let output = cfg.output_path();
    write_csv_file(&result.coordinates, &output)?;
    info!(
        "wrote {} coordinates to {}",
        result.coordinates.len(),
        output.display()
    );

    if let Some(report_path) = cfg.report_path() {
        report.set_result(&result);
        report.write_json(&report_path)?;
        info!("report written to {}", report_path.display());
    }
    Ok(result)
}
