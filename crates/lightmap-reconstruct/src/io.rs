//! CSV output, JSON configuration and diagnostic report helpers.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lightmap_core::{Coord3d, CoordinateMap, CoordinateSpace, DistanceHistogram};
use serde::{Deserialize, Serialize};

use crate::{
    PipelineWarning, ReconstructError, ReconstructionParams, ReconstructionResult, Reconstructor,
    ShotTableStats, StageCounts, UnresolvedLight,
};

#[derive(thiserror::Error, Debug)]
pub enum LightmapIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("line {line}: invalid coordinate row `{text}`")]
    Csv { line: usize, text: String },
}

pub const CSV_HEADER: &str = "id,x,y,z";

/// Write `coords` as `id,x,y,z` rows in increasing id order.
pub fn write_csv<W: Write>(coords: &CoordinateMap, mut out: W) -> Result<(), LightmapIoError> {
    writeln!(out, "{CSV_HEADER}")?;
    for c in coords.values() {
        writeln!(out, "{},{},{},{}", c.light_id, c.x, c.y, c.z)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_file(
    coords: &CoordinateMap,
    path: impl AsRef<Path>,
) -> Result<(), LightmapIoError> {
    let file = fs::File::create(path)?;
    write_csv(coords, BufWriter::new(file))
}

fn parse_row(text: &str) -> Option<Coord3d> {
    let mut fields = text.split(',').map(str::trim);
    let light_id = fields.next()?.parse().ok()?;
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    let z = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Coord3d::new(light_id, x, y, z))
}

/// Load a coordinate CSV written by [`write_csv`] as a canonical map.
///
/// The header row is optional; blank lines are skipped.
pub fn read_csv<R: BufRead>(reader: R) -> Result<CoordinateMap, LightmapIoError> {
    let mut coords = CoordinateMap::with_space(CoordinateSpace::Canonical);
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || (idx == 0 && text == CSV_HEADER) {
            continue;
        }
        let coord = parse_row(text).ok_or_else(|| LightmapIoError::Csv {
            line: idx + 1,
            text: text.to_string(),
        })?;
        coords.insert(coord);
    }
    Ok(coords)
}

pub fn read_csv_file(path: impl AsRef<Path>) -> Result<CoordinateMap, LightmapIoError> {
    read_csv(BufReader::new(fs::File::open(path)?))
}

/// Configuration of one reconstruction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructConfig {
    /// Shot records, one per line.
    pub input_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub params: ReconstructionParams,
}

impl ReconstructConfig {
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            report_path: None,
            params: ReconstructionParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LightmapIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LightmapIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output CSV path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("coordinates.csv"))
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.report_path.as_ref().map(PathBuf::from)
    }

    /// Build a reconstructor from the configured parameters.
    pub fn build_reconstructor(&self) -> Result<Reconstructor, ReconstructError> {
        Reconstructor::new(self.params.clone())
    }
}

/// Which stage placed an overlay point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySubset {
    Primary,
    DiagonalFixed,
    NeighborFixed,
}

/// One point of the diagnostic overlay, in canonical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub light_id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub subset: OverlaySubset,
}

/// Diagnostic report of one run. Not part of the output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionReport {
    pub input_path: String,
    pub config_path: Option<String>,
    pub params: ReconstructionParams,
    #[serde(default)]
    pub input: Option<ShotTableStats>,
    #[serde(default)]
    pub counts: Option<StageCounts>,
    #[serde(default)]
    pub overlay: Vec<OverlayPoint>,
    #[serde(default)]
    pub histogram: Option<DistanceHistogram>,
    #[serde(default)]
    pub outlier_threshold: Option<f64>,
    #[serde(default)]
    pub deleted: Vec<u32>,
    #[serde(default)]
    pub unresolved: Vec<UnresolvedLight>,
    #[serde(default)]
    pub warnings: Vec<PipelineWarning>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ReconstructionReport {
    /// Build a base report from the run configuration.
    pub fn new(cfg: &ReconstructConfig, config_path: Option<&Path>) -> Self {
        Self {
            input_path: cfg.input_path.clone(),
            config_path: config_path.map(|p| p.to_string_lossy().into_owned()),
            params: cfg.params.clone(),
            input: None,
            counts: None,
            overlay: Vec::new(),
            histogram: None,
            outlier_threshold: None,
            deleted: Vec::new(),
            unresolved: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Populate report fields from a finished run.
    pub fn set_result(&mut self, res: &ReconstructionResult) {
        let subsets = [
            (&res.coordinates, OverlaySubset::Primary),
            (&res.diagonal_fixed, OverlaySubset::DiagonalFixed),
            (&res.neighbor_fixed, OverlaySubset::NeighborFixed),
        ];
        self.overlay = subsets
            .into_iter()
            .flat_map(|(map, subset)| {
                map.values().map(move |c| OverlayPoint {
                    light_id: c.light_id,
                    x: c.x,
                    y: c.y,
                    z: c.z,
                    subset,
                })
            })
            .collect();
        self.input = res.input;
        self.counts = Some(res.counts);
        self.histogram = res.outliers.histogram.clone();
        self.outlier_threshold = res.outliers.threshold;
        self.deleted = res.outliers.deleted();
        self.unresolved = res.unresolved.clone();
        self.warnings = res.warnings.clone();
        self.error = None;
    }

    /// Record a failed run.
    pub fn set_error(&mut self, err: &ReconstructError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LightmapIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LightmapIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
