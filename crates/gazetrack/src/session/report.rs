//! Serializable per-frame output.

use crate::calibration::CalibrationProgress;
use crate::eye::EyeRegion;

use super::GazeState;

/// Per-eye summary in frame coordinates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EyeReport {
    /// Top-left of the eye crop in the frame.
    pub origin: [u32; 2],
    /// Eye crop size `[width, height]`.
    pub size: [u32; 2],
    /// Width/height ratio of the eye contour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blinking_ratio: Option<f64>,
    /// Threshold used for pupil location.
    pub threshold: u8,
    /// Pupil centroid relative to the crop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil_local: Option<[f64; 2]>,
    /// Pupil centroid in frame coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil: Option<[f64; 2]>,
}

impl From<&EyeRegion> for EyeReport {
    fn from(eye: &EyeRegion) -> Self {
        Self {
            origin: eye.origin,
            size: [eye.frame.width(), eye.frame.height()],
            blinking_ratio: eye.blinking_ratio,
            threshold: eye.threshold,
            pupil_local: eye.pupil.map(|p| [p.x, p.y]),
            pupil: eye.pupil_absolute(),
        }
    }
}

/// Full gaze result for a single frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GazeReport {
    /// Whether landmarks were supplied for this frame.
    pub face_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<EyeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<EyeReport>,
    /// Mean horizontal pupil ratio (0 = far right, 1 = far left).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_ratio: Option<f64>,
    /// Mean vertical pupil ratio (0 = top, 1 = bottom).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_ratio: Option<f64>,
    /// Combined blink/direction classification.
    pub state: GazeState,
    /// Calibration progress after this frame.
    pub calibration: CalibrationProgress,
}
