//! Pupil location inside an isolated eye image.
//!
//! The pupil is taken to be the largest dark blob left after thresholding
//! and speckle removal. Ties between equally sized blobs go to the one whose
//! centroid lies closest to the crop center.

mod binarize;
mod regions;

use image::GrayImage;

pub use binarize::{binarize, smooth_eye, threshold_smoothed};
pub use regions::{count_dark_regions, dark_regions, DarkRegion};

/// Binarization parameters shared by pupil location and calibration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PupilConfig {
    /// Gaussian sigma applied before thresholding (`0` disables smoothing).
    pub blur_sigma: f32,
    /// L∞ radius of the opening that removes speckle (`0` disables it).
    pub open_radius: u8,
}

impl Default for PupilConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.0,
            open_radius: 1,
        }
    }
}

/// Pupil centroid in eye-crop pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pupil {
    /// Centroid x, relative to the eye crop.
    pub x: f64,
    /// Centroid y, relative to the eye crop.
    pub y: f64,
    /// Blob area in pixels.
    pub area: u32,
}

impl Pupil {
    /// Translate to frame coordinates given the crop origin.
    pub fn absolute(&self, origin: [u32; 2]) -> [f64; 2] {
        [self.x + origin[0] as f64, self.y + origin[1] as f64]
    }
}

/// Locate the pupil in an eye image at a given threshold.
///
/// Returns `None` when the image is empty, uniform at this threshold, or no
/// dark region survives the cleanup.
pub fn locate(eye: &GrayImage, threshold: u8, config: &PupilConfig) -> Option<Pupil> {
    let (w, h) = eye.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let mask = binarize(eye, threshold, config);
    let center = [w as f64 / 2.0, h as f64 / 2.0];

    let best = dark_regions(&mask)
        .into_iter()
        .filter_map(|r| {
            let c = r.centroid()?;
            let d2 = (c[0] - center[0]).powi(2) + (c[1] - center[1]).powi(2);
            Some((r.area, d2, c))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.total_cmp(&a.1)))?;

    let (area, _, [x, y]) = best;
    tracing::trace!(threshold, area, x, y, "pupil located");
    Some(Pupil { x, y, area })
}
