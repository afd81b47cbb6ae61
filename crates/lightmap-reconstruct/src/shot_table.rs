//! Shot table builder: parse detector records and group them by light id.
//!
//! Two line formats are accepted, detected per line:
//!
//! - JSON lines `{"id": 12, "angle": 90, "x": 413, "y": 1022, "v": 187}`
//!   (`led_id` / `b` are accepted as aliases written by older detectors),
//! - the legacy fixed layout `id012,angle090-x0413-y1022`, which carries no
//!   confidence and is kept at full confidence.
//!
//! Failed detections (a `0` pixel on either axis) and shots below the
//! confidence floor are discarded. Any malformed line aborts the build.

use std::io::BufRead;

use lightmap_core::{InvalidAngle, Shot, ShotAngle, ShotTable};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{ReconstructionParams, ShotParseError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Counters collected while building a [`ShotTable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotTableStats {
    /// Non-blank records parsed.
    pub records: usize,
    pub failed_detections: usize,
    pub low_confidence: usize,
    pub kept: usize,
}

#[derive(Deserialize)]
struct RawShotRecord {
    #[serde(alias = "led_id")]
    id: i64,
    angle: i64,
    x: i64,
    y: i64,
    #[serde(alias = "b")]
    v: f64,
}

fn check_range(
    line: usize,
    field: &'static str,
    value: f64,
    max: f64,
) -> Result<(), ShotParseError> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ShotParseError::OutOfRange {
            line,
            field,
            value,
            max,
        })
    }
}

fn parse_legacy(text: &str) -> Option<RawShotRecord> {
    let rest = text.strip_prefix("id")?;
    let (id, rest) = rest.split_once(",angle")?;
    let (angle, rest) = rest.split_once("-x")?;
    let (x, y) = rest.split_once(['-', ','])?;
    let y = y.strip_prefix('y')?;
    Some(RawShotRecord {
        id: id.trim().parse().ok()?,
        angle: angle.trim().parse().ok()?,
        x: x.trim().parse().ok()?,
        y: y.trim().parse().ok()?,
        v: f64::from(u8::MAX),
    })
}

/// Parse one record. Blank lines yield `Ok(None)`.
///
/// `line` is the 1-based line number used in error messages.
pub fn parse_shot_line(
    text: &str,
    line: usize,
    params: &ReconstructionParams,
) -> Result<Option<Shot>, ShotParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let raw = if text.starts_with('{') {
        serde_json::from_str::<RawShotRecord>(text)
            .map_err(|source| ShotParseError::Json { line, source })?
    } else {
        parse_legacy(text).ok_or_else(|| ShotParseError::Syntax {
            line,
            text: text.to_string(),
        })?
    };

    let max_id = params
        .light_count
        .map_or(f64::from(u32::MAX), |n| f64::from(n.saturating_sub(1)));
    check_range(line, "id", raw.id as f64, max_id)?;
    check_range(line, "x", raw.x as f64, f64::from(params.image_width))?;
    check_range(line, "y", raw.y as f64, f64::from(params.image_height))?;
    check_range(line, "v", raw.v, f64::from(u8::MAX))?;
    let angle = u16::try_from(raw.angle)
        .ok()
        .and_then(ShotAngle::from_degrees)
        .ok_or(ShotParseError::Angle {
            line,
            source: InvalidAngle(raw.angle.clamp(0, i64::from(u16::MAX)) as u16),
        })?;

    Ok(Some(Shot {
        light_id: raw.id as u32,
        angle,
        image_x: raw.x as u32,
        image_y: raw.y as u32,
        confidence: raw.v as u8,
    }))
}

/// Group already-parsed shots, dropping failed and low-confidence detections.
pub fn filter_shots<I>(shots: I, params: &ReconstructionParams) -> (ShotTable, ShotTableStats)
where
    I: IntoIterator<Item = Shot>,
{
    let mut table = ShotTable::new();
    let mut stats = ShotTableStats::default();
    for shot in shots {
        stats.records += 1;
        if shot.is_failed_detection() {
            stats.failed_detections += 1;
            continue;
        }
        if shot.confidence < params.confidence_floor {
            stats.low_confidence += 1;
            continue;
        }
        stats.kept += 1;
        table.insert(shot);
    }
    (table, stats)
}

/// Parse and group a sequence of record lines.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn build_shot_table<I, S>(
    lines: I,
    params: &ReconstructionParams,
) -> Result<(ShotTable, ShotTableStats), ShotParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut shots = Vec::new();
    for (idx, text) in lines.into_iter().enumerate() {
        if let Some(shot) = parse_shot_line(text.as_ref(), idx + 1, params)? {
            shots.push(shot);
        }
    }

    let (table, stats) = filter_shots(shots, params);
    info!(
        "{} records: kept {}, failed detections {}, below confidence {} ({} lights)",
        stats.records,
        stats.kept,
        stats.failed_detections,
        stats.low_confidence,
        table.len()
    );
    debug!("confidence floor {}", params.confidence_floor);
    Ok((table, stats))
}

/// Read records from a buffered reader, one per line.
pub fn read_shot_table<R: BufRead>(
    reader: R,
    params: &ReconstructionParams,
) -> Result<(ShotTable, ShotTableStats), ShotParseError> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    build_shot_table(lines, params)
}
