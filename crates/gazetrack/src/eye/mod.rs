//! Per-eye analysis: blink ratio, isolation, calibration feed, pupil location.

mod blink;
mod isolate;

use image::GrayImage;

use crate::calibration::Calibration;
use crate::landmarks::{EyeSide, LandmarkSet};
use crate::pupil::{self, Pupil};

pub use blink::blinking_ratio;
pub use isolate::{isolate_eye, IsolatedEye, MASKED_PIX};

/// Eye isolation parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// Margin (pixels) added around the eye contour's bounding box.
    pub margin_px: u32,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self { margin_px: 5 }
    }
}

/// One eye in one frame.
///
/// Recomputed from scratch every frame; pupil coordinates are local to
/// `frame` and must be offset by `origin` to land in the source frame.
#[derive(Debug, Clone)]
pub struct EyeRegion {
    pub side: EyeSide,
    /// Masked crop of the eye.
    pub frame: GrayImage,
    /// Top-left of the crop in the source frame.
    pub origin: [u32; 2],
    /// Geometric center of the crop, `(width / 2, height / 2)`.
    pub center: [f64; 2],
    /// Eye contour in source-frame pixels.
    pub landmark_points: [[i32; 2]; 6],
    /// Width/height ratio; `None` when the lids' midpoints coincide.
    pub blinking_ratio: Option<f64>,
    /// Threshold the pupil was located with.
    pub threshold: u8,
    pub pupil: Option<Pupil>,
}

impl EyeRegion {
    /// Isolate and analyze one eye.
    ///
    /// While `calibration` is warming up the isolated image is fed to it
    /// before the pupil is located with the side's current threshold.
    pub fn analyze(
        frame: &GrayImage,
        landmarks: &LandmarkSet,
        side: EyeSide,
        calibration: &mut Calibration,
        config: &EyeConfig,
    ) -> Self {
        let points = landmarks.eye_points(side);
        let blinking_ratio = blinking_ratio(&points);
        let IsolatedEye { frame: eye, origin } = isolate_eye(frame, &points, config.margin_px);
        let (w, h) = eye.dimensions();

        if !calibration.is_complete() {
            calibration.evaluate(&eye, side);
        }
        let threshold = calibration.threshold(side);
        let pupil = pupil::locate(&eye, threshold, calibration.pupil_config());

        tracing::trace!(
            %side,
            origin_x = origin[0],
            origin_y = origin[1],
            threshold,
            blinking_ratio,
            found = pupil.is_some(),
            "eye analyzed"
        );

        Self {
            side,
            frame: eye,
            origin,
            center: [w as f64 / 2.0, h as f64 / 2.0],
            landmark_points: points,
            blinking_ratio,
            threshold,
            pupil,
        }
    }

    /// Pupil centroid in source-frame coordinates.
    pub fn pupil_absolute(&self) -> Option<[f64; 2]> {
        self.pupil.map(|p| p.absolute(self.origin))
    }
}
