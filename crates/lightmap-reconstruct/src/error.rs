use lightmap_core::InvalidAngle;

/// Invalid reconstruction parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("invalid image size {width}x{height}")]
    ImageSize { width: u32, height: u32 },
    #[error("outlier percentile {0} outside [0, 100]")]
    Percentile(f64),
    #[error("diagonal rotation {0} is not finite")]
    Rotation(f64),
    #[error("pivot offset {0:?} is not finite")]
    PivotOffset([f64; 2]),
    #[error("light count must be at least 1")]
    EmptyLightCount,
}

/// A shot record that could not be parsed. Aborts the run.
#[derive(thiserror::Error, Debug)]
pub enum ShotParseError {
    #[error("line {line}: invalid shot record: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: unrecognized shot record `{text}`")]
    Syntax { line: usize, text: String },
    #[error("line {line}: {source}")]
    Angle {
        line: usize,
        #[source]
        source: InvalidAngle,
    },
    #[error("line {line}: {field}={value} outside [0, {max}]")]
    OutOfRange {
        line: usize,
        field: &'static str,
        value: f64,
        max: f64,
    },
    #[error("failed to read shot records: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the reconstruction pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ReconstructError {
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ShotParseError),
}
