//! Seeded synthetic captures of a light string wound on a helix.
//!
//! The rig stands on the frame's vertical axis. A camera at angle `a` sees a
//! light at centered position `(X, Y)` in column `c + X cos a - Y sin a`, so
//! the 180° and 90° views (and the 225° and 135° ones) are mirrored the way
//! the resolvers expect, and the diagonal views live in a frame turned by
//! +45°. Rows carry the light's height without parallax.

use std::io::Write;

use lightmap_core::{Coord3d, CoordinateMap, Shot, ShotAngle};
use lightmap_reconstruct::{Normalization, ReconstructionParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

/// Ground-truth rig and capture settings.
#[derive(Clone, Debug, PartialEq)]
pub struct HelixRig {
    pub light_count: u32,
    pub radius_px: f64,
    pub turns: f64,
    /// Image row of the highest light.
    pub top_px: f64,
    /// Image row of light 0.
    pub bottom_px: f64,
    /// Half-width of the uniform pixel noise added to every reading.
    pub noise_px: f64,
    /// Probability that a single shot comes back as a failed detection.
    pub dropout: f64,
    pub seed: u64,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for HelixRig {
    fn default() -> Self {
        Self {
            light_count: 500,
            radius_px: 400.0,
            turns: 5.0,
            top_px: 300.0,
            bottom_px: 1500.0,
            noise_px: 0.5,
            dropout: 0.05,
            seed: 7,
            image_width: ReconstructionParams::DEFAULT_IMAGE_WIDTH,
            image_height: ReconstructionParams::DEFAULT_IMAGE_HEIGHT,
        }
    }
}

/// Shots of one simulated session with the positions they were taken from.
#[derive(Clone, Debug)]
pub struct SyntheticCapture {
    pub shots: Vec<Shot>,
    /// Pixel-space ground truth.
    pub truth: CoordinateMap,
    pub failed_shots: usize,
}

impl HelixRig {
    fn center(&self) -> f64 {
        f64::from(self.image_width) / 2.0
    }

    /// True pixel position of `light_id`.
    pub fn position(&self, light_id: u32) -> Coord3d {
        let span = f64::from(self.light_count.saturating_sub(1).max(1));
        let t = f64::from(light_id) / span;
        let theta = std::f64::consts::TAU * self.turns * t;
        let c = self.center();
        Coord3d::new(
            light_id,
            c + self.radius_px * theta.cos(),
            c + self.radius_px * theta.sin(),
            self.bottom_px - t * (self.bottom_px - self.top_px),
        )
    }

    pub fn ground_truth(&self) -> CoordinateMap {
        (0..self.light_count).map(|id| self.position(id)).collect()
    }

    /// Noise-free image column of `light` seen from `angle`.
    pub fn image_x(&self, light: &Coord3d, angle: ShotAngle) -> f64 {
        let c = self.center();
        let a = f64::from(angle.degrees()).to_radians();
        c + (light.x - c) * a.cos() - (light.y - c) * a.sin()
    }

    /// Parameters matching this rig's camera layout.
    pub fn params(&self) -> ReconstructionParams {
        ReconstructionParams {
            image_width: self.image_width,
            image_height: self.image_height,
            diagonal_rotation_deg: -45.0,
            light_count: Some(self.light_count),
            ..ReconstructionParams::default()
        }
    }

    /// Simulate one session: every light shot from all eight angles.
    pub fn capture(&self) -> SyntheticCapture {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let truth = self.ground_truth();
        let dropout = self.dropout.clamp(0.0, 1.0);
        let noise = self.noise_px.abs();
        let mut shots = Vec::with_capacity(truth.len() * ShotAngle::ALL.len());
        let mut failed_shots = 0;

        for angle in ShotAngle::ALL {
            for light in truth.values() {
                if rng.random_bool(dropout) {
                    failed_shots += 1;
                    shots.push(Shot {
                        light_id: light.light_id,
                        angle,
                        image_x: 0,
                        image_y: 0,
                        confidence: 0,
                    });
                    continue;
                }

                let x = self.image_x(light, angle) + rng.random_range(-noise..=noise);
                let y = light.z + rng.random_range(-noise..=noise);
                shots.push(Shot {
                    light_id: light.light_id,
                    angle,
                    image_x: x.round().clamp(1.0, f64::from(self.image_width)) as u32,
                    image_y: y.round().clamp(1.0, f64::from(self.image_height)) as u32,
                    confidence: rng.random_range(180..=u8::MAX),
                });
            }
        }

        SyntheticCapture {
            shots,
            truth,
            failed_shots,
        }
    }
}

/// Ground truth mapped the same way the normalizer maps a reconstruction.
pub fn canonical_truth(truth: &CoordinateMap, params: &ReconstructionParams) -> CoordinateMap {
    let mut canonical = truth.clone();
    if let Some(norm) = Normalization::fit(truth, params) {
        norm.apply(&mut canonical);
    }
    canonical
}

/// One shot as a JSON record line.
pub fn shot_record(shot: &Shot) -> String {
    json!({
        "id": shot.light_id,
        "angle": shot.angle.degrees(),
        "x": shot.image_x,
        "y": shot.image_y,
        "v": shot.confidence,
    })
    .to_string()
}

pub fn write_shot_records<W: Write>(shots: &[Shot], mut out: W) -> std::io::Result<()> {
    for shot in shots {
        writeln!(out, "{}", shot_record(shot))?;
    }
    out.flush()
}
