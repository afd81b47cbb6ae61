use lightmap_core::PlanarRotation;
use serde::{Deserialize, Serialize};

use crate::ParamsError;

/// Configuration for the reconstruction pipeline.
///
/// Every threshold the stages use lives here. Historical capture sessions
/// used different values (60/70/80 percentile, 50/100 confidence floor,
/// ±40° diagonal rotation); the defaults follow the most complete of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionParams {
    /// Capture width in pixels. Mirrored readings are `image_width - x`.
    pub image_width: u32,
    /// Capture height in pixels. Only used to bounds-check input records.
    pub image_height: u32,
    /// Shots with a detector confidence below this value are discarded.
    pub confidence_floor: u8,
    /// Percentile of the neighbor-distance distribution used as the
    /// per-step outlier threshold, in `[0, 100]`.
    pub outlier_percentile: f64,
    /// Rotation (degrees, counter-clockwise about the vertical axis) that
    /// maps the diagonal cameras' frame onto the cardinal axes.
    pub diagonal_rotation_deg: f64,
    /// Number of lights on the string. Inferred as `max id + 1` when unset.
    pub light_count: Option<u32>,
    /// Extra x/y shift of the frame center the cloud is rotated about and
    /// recentered on. Some rigs were calibrated with `[-5.0, 5.0]`.
    pub pivot_offset_px: [f64; 2],
    /// Bins of the diagnostic neighbor-distance histogram.
    pub histogram_bins: usize,
}

impl ReconstructionParams {
    pub const DEFAULT_IMAGE_WIDTH: u32 = 1080;
    pub const DEFAULT_IMAGE_HEIGHT: u32 = 1920;
    pub const DEFAULT_CONFIDENCE_FLOOR: u8 = 100;
    pub const DEFAULT_OUTLIER_PERCENTILE: f64 = 70.0;
    pub const DEFAULT_DIAGONAL_ROTATION_DEG: f64 = -40.0;
    pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

    /// Reject parameter sets no stage can run with.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ParamsError::ImageSize {
                width: self.image_width,
                height: self.image_height,
            });
        }
        if !(0.0..=100.0).contains(&self.outlier_percentile) {
            return Err(ParamsError::Percentile(self.outlier_percentile));
        }
        if !self.diagonal_rotation_deg.is_finite() {
            return Err(ParamsError::Rotation(self.diagonal_rotation_deg));
        }
        if !self.pivot_offset_px.iter().all(|v| v.is_finite()) {
            return Err(ParamsError::PivotOffset(self.pivot_offset_px));
        }
        if self.light_count == Some(0) {
            return Err(ParamsError::EmptyLightCount);
        }
        Ok(())
    }

    /// Horizontal center of a capture, used to pick the least distorted shot.
    #[inline]
    pub fn horizontal_center(&self) -> f64 {
        self.image_width as f64 / 2.0
    }

    /// Point of the x/y plane on the array's vertical axis, in pixels.
    ///
    /// Both horizontal axes are read from image columns, so both use the
    /// image width.
    pub fn frame_center(&self) -> [f64; 2] {
        let c = self.horizontal_center();
        [c + self.pivot_offset_px[0], c + self.pivot_offset_px[1]]
    }

    /// Rotation taking diagonal-frame readings onto the cardinal axes.
    pub fn diagonal_rotation(&self) -> PlanarRotation {
        PlanarRotation::new(self.diagonal_rotation_deg, self.frame_center())
    }
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            image_width: Self::DEFAULT_IMAGE_WIDTH,
            image_height: Self::DEFAULT_IMAGE_HEIGHT,
            confidence_floor: Self::DEFAULT_CONFIDENCE_FLOOR,
            outlier_percentile: Self::DEFAULT_OUTLIER_PERCENTILE,
            diagonal_rotation_deg: Self::DEFAULT_DIAGONAL_ROTATION_DEG,
            light_count: None,
            pivot_offset_px: [0.0, 0.0],
            histogram_bins: Self::DEFAULT_HISTOGRAM_BINS,
        }
    }
}
