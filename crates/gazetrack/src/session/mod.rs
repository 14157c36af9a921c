//! Gaze session: both eyes per frame, blink and direction classification.
//!
//! A [`GazeSession`] owns the calibration for one video stream. Each call to
//! [`GazeSession::analyze`] processes a frame to completion and returns a
//! [`GazeFrame`] holding both eye regions; classification is derived from
//! that pair only, never from a single eye.

mod report;

use image::{DynamicImage, GrayImage};

use crate::calibration::{Calibration, CalibrationProgress};
use crate::config::{ConfigError, GazeConfig};
use crate::eye::EyeRegion;
use crate::landmarks::{EyeSide, LandmarkSet};

pub use report::{EyeReport, GazeReport};

/// Blink and gaze-direction cutoffs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GazeLimits {
    /// Mean blink ratio above which the eyes count as closed.
    pub blink_ratio_threshold: f64,
    /// Horizontal ratio at or below which the gaze is "right".
    pub right_limit: f64,
    /// Horizontal ratio at or above which the gaze is "left".
    pub left_limit: f64,
    /// Pixels subtracted from the crop extent when normalizing pupil position.
    pub ratio_inset_px: f64,
}

impl Default for GazeLimits {
    fn default() -> Self {
        Self {
            blink_ratio_threshold: 5.7,
            right_limit: 0.35,
            left_limit: 0.65,
            ratio_inset_px: 10.0,
        }
    }
}

/// Combined per-frame classification, in reporting priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeState {
    Blinking,
    Right,
    Left,
    Center,
    /// No face, or pupils not located in both eyes.
    Unknown,
}

impl std::fmt::Display for GazeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Blinking => "blinking",
            Self::Right => "looking right",
            Self::Left => "looking left",
            Self::Center => "looking center",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Both eyes of one analyzed frame.
#[derive(Debug, Clone)]
pub struct GazeFrame {
    eyes: Option<[EyeRegion; 2]>,
    limits: GazeLimits,
}

impl GazeFrame {
    fn eye(&self, side: EyeSide) -> Option<&EyeRegion> {
        self.eyes.as_ref().map(|e| &e[side.slot()])
    }

    pub fn left(&self) -> Option<&EyeRegion> {
        self.eye(EyeSide::Left)
    }

    pub fn right(&self) -> Option<&EyeRegion> {
        self.eye(EyeSide::Right)
    }

    pub fn face_detected(&self) -> bool {
        self.eyes.is_some()
    }

    /// True when both pupils were located.
    pub fn pupils_located(&self) -> bool {
        self.eyes
            .as_ref()
            .is_some_and(|e| e.iter().all(|eye| eye.pupil.is_some()))
    }

    /// Left pupil in frame coordinates.
    pub fn pupil_left_coords(&self) -> Option<[f64; 2]> {
        self.left()?.pupil_absolute()
    }

    /// Right pupil in frame coordinates.
    pub fn pupil_right_coords(&self) -> Option<[f64; 2]> {
        self.right()?.pupil_absolute()
    }

    fn mean_axis_ratio(&self, axis: usize) -> Option<f64> {
        let eyes = self.eyes.as_ref()?;
        let mut sum = 0.0;
        for eye in eyes {
            let pupil = eye.pupil?;
            let pos = if axis == 0 { pupil.x } else { pupil.y };
            let extent = eye.center[axis] * 2.0 - self.limits.ratio_inset_px;
            if extent <= 0.0 {
                return None;
            }
            sum += pos / extent;
        }
        Some(sum / 2.0)
    }

    /// Mean horizontal pupil position: 0.0 is extreme right, 1.0 extreme left.
    pub fn horizontal_ratio(&self) -> Option<f64> {
        self.mean_axis_ratio(0)
    }

    /// Mean vertical pupil position: 0.0 is extreme top, 1.0 extreme bottom.
    pub fn vertical_ratio(&self) -> Option<f64> {
        self.mean_axis_ratio(1)
    }

    /// Mean blink ratio of both eyes, when both are defined.
    pub fn blinking_ratio(&self) -> Option<f64> {
        let eyes = self.eyes.as_ref()?;
        Some((eyes[0].blinking_ratio? + eyes[1].blinking_ratio?) / 2.0)
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking_ratio()
            .is_some_and(|r| r > self.limits.blink_ratio_threshold)
    }

    pub fn is_right(&self) -> bool {
        self.horizontal_ratio()
            .is_some_and(|r| r <= self.limits.right_limit)
    }

    pub fn is_left(&self) -> bool {
        self.horizontal_ratio()
            .is_some_and(|r| r >= self.limits.left_limit)
    }

    pub fn is_center(&self) -> bool {
        self.pupils_located() && !self.is_right() && !self.is_left()
    }

    pub fn state(&self) -> GazeState {
        if self.is_blinking() {
            GazeState::Blinking
        } else if self.is_right() {
            GazeState::Right
        } else if self.is_left() {
            GazeState::Left
        } else if self.is_center() {
            GazeState::Center
        } else {
            GazeState::Unknown
        }
    }

    /// Serializable summary; `calibration` is the progress after this frame.
    pub fn report(&self, calibration: CalibrationProgress) -> GazeReport {
        GazeReport {
            face_detected: self.face_detected(),
            left: self.left().map(EyeReport::from),
            right: self.right().map(EyeReport::from),
            horizontal_ratio: self.horizontal_ratio(),
            vertical_ratio: self.vertical_ratio(),
            state: self.state(),
            calibration,
        }
    }
}

/// Stateful gaze tracker for one stream.
///
/// Each session owns its calibration, so independent streams are tracked by
/// independent sessions.
#[derive(Debug, Clone)]
pub struct GazeSession {
    config: GazeConfig,
    calibration: Calibration,
    frames: u64,
}

impl Default for GazeSession {
    fn default() -> Self {
        Self::new(GazeConfig::default())
    }
}

impl GazeSession {
    /// Create a session without checking `config`.
    ///
    /// Use [`GazeSession::try_new`] for configurations that were not loaded
    /// through [`GazeConfig::from_json_file`].
    pub fn new(config: GazeConfig) -> Self {
        let calibration = Calibration::new(config.calibration.clone(), config.pupil.clone());
        Self {
            config,
            calibration,
            frames: 0,
        }
    }

    /// Validate `config`, then create a session.
    pub fn try_new(config: GazeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &GazeConfig {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Number of frames analyzed so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Analyze one grayscale frame.
    ///
    /// `landmarks` is `None` when no face was detected; the frame then yields
    /// no eye regions and calibration is untouched.
    pub fn analyze(&mut self, frame: &GrayImage, landmarks: Option<&LandmarkSet>) -> GazeFrame {
        self.frames += 1;
        let eyes = landmarks.map(|lm| {
            EyeSide::BOTH.map(|side| {
                EyeRegion::analyze(frame, lm, side, &mut self.calibration, &self.config.eye)
            })
        });
        if eyes.is_none() {
            tracing::trace!(frame = self.frames, "no face in frame");
        }
        GazeFrame {
            eyes,
            limits: self.config.gaze.clone(),
        }
    }

    /// Analyze a color or grayscale frame of any pixel layout.
    pub fn analyze_image(
        &mut self,
        frame: &DynamicImage,
        landmarks: Option<&LandmarkSet>,
    ) -> GazeFrame {
        let gray = frame.to_luma8();
        self.analyze(&gray, landmarks)
    }

    /// Analyze a frame and summarize it.
    pub fn report(&mut self, frame: &GrayImage, landmarks: Option<&LandmarkSet>) -> GazeReport {
        let analysis = self.analyze(frame, landmarks);
        analysis.report(self.calibration.progress())
    }

    /// Restart threshold calibration from scratch.
    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationConfig;
    use crate::test_utils::{synthetic_face, SyntheticEye};
    use approx::assert_abs_diff_eq;

    fn wide_eye(center: [i32; 2], dx: f32) -> SyntheticEye {
        SyntheticEye {
            half_size: [30, 12],
            pupil_offset: [dx, 0.0],
            ..SyntheticEye::at(center)
        }
    }

    fn face(dx: f32) -> (GrayImage, LandmarkSet) {
        synthetic_face(260, 120, wide_eye([70, 60], dx), wide_eye([180, 60], dx))
    }

    #[test]
    fn classifies_direction_from_pupil_offset() {
        let mut session = GazeSession::default();
        for (dx, expected) in [
            (-17.0, GazeState::Right),
            (7.0, GazeState::Left),
            (-5.0, GazeState::Center),
        ] {
            let (frame, lm) = face(dx);
            let out = session.analyze(&frame, Some(&lm));
            assert!(out.pupils_located(), "dx={dx}");
            assert_eq!(out.state(), expected, "dx={dx} ratio={:?}", out.horizontal_ratio());
        }
    }

    #[test]
    fn horizontal_ratio_uses_crop_extent() {
        let mut session = GazeSession::default();
        let (frame, lm) = face(-5.0);
        let out = session.analyze(&frame, Some(&lm));
        // Crop is 70 px wide, so the ratio is (35 - 5) / (70 - 10).
        assert_abs_diff_eq!(out.horizontal_ratio().unwrap(), 0.5, epsilon = 1.0 / 60.0);
        assert_abs_diff_eq!(out.vertical_ratio().unwrap(), 17.0 / 24.0, epsilon = 1.0 / 24.0);
    }

    #[test]
    fn absolute_pupil_coordinates() {
        let mut session = GazeSession::default();
        let (frame, lm) = face(-5.0);
        let out = session.analyze(&frame, Some(&lm));
        let [lx, ly] = out.pupil_left_coords().unwrap();
        let [rx, ry] = out.pupil_right_coords().unwrap();
        assert_abs_diff_eq!(lx, 65.0, epsilon = 1.0);
        assert_abs_diff_eq!(ly, 60.0, epsilon = 1.0);
        assert_abs_diff_eq!(rx, 175.0, epsilon = 1.0);
        assert_abs_diff_eq!(ry, 60.0, epsilon = 1.0);
    }

    #[test]
    fn closed_eyes_are_blinking() {
        let closed = |c| SyntheticEye {
            half_size: [30, 4],
            pupil_radius: 2.0,
            ..SyntheticEye::at(c)
        };
        let (frame, lm) = synthetic_face(260, 120, closed([70, 60]), closed([180, 60]));
        let mut session = GazeSession::default();
        let out = session.analyze(&frame, Some(&lm));
        assert_abs_diff_eq!(out.blinking_ratio().unwrap(), 7.5, epsilon = 1e-12);
        assert!(out.is_blinking());
        assert_eq!(out.state(), GazeState::Blinking);
    }

    #[test]
    fn no_face_leaves_calibration_untouched() {
        let mut session = GazeSession::default();
        let frame = GrayImage::new(64, 48);
        let report = session.report(&frame, None);
        assert!(!report.face_detected);
        assert_eq!(report.state, GazeState::Unknown);
        assert!(report.left.is_none());
        assert_eq!(report.calibration.left_samples, 0);
        assert_eq!(session.frame_count(), 1);
    }

    #[test]
    fn calibration_converges_then_detects_held_out_frame() {
        let config = GazeConfig::default();
        let mut session = GazeSession::new(config.clone());

        for i in 0..25u32 {
            let pix = 20 + (i % 5) as u8 * 8;
            let eye = |c| SyntheticEye {
                pupil_pix: pix,
                ..wide_eye(c, (i % 3) as f32 - 1.0)
            };
            let (frame, lm) = synthetic_face(260, 120, eye([70, 60]), eye([180, 60]));
            let before = session.calibration().is_complete();
            let frozen = before.then(|| session.calibration().progress().thresholds);
            session.analyze(&frame, Some(&lm));
            if let Some(frozen) = frozen {
                assert_eq!(session.calibration().progress().thresholds, frozen);
            }
            if i + 1 < config.calibration.sample_count as u32 {
                assert!(!session.calibration().is_complete(), "frame {i}");
            }
        }
        assert!(session.calibration().is_complete());

        let held_out = |c| SyntheticEye {
            pupil_pix: 20,
            ..wide_eye(c, 2.0)
        };
        let (frame, lm) = synthetic_face(260, 120, held_out([70, 60]), held_out([180, 60]));
        let out = session.analyze(&frame, Some(&lm));
        assert!(out.pupil_left_coords().is_some());
        assert!(out.pupil_right_coords().is_some());
    }

    #[test]
    fn sessions_do_not_share_calibration() {
        let cfg = GazeConfig {
            calibration: CalibrationConfig {
                sample_count: 1,
                ..CalibrationConfig::default()
            },
            ..GazeConfig::default()
        };
        let mut a = GazeSession::new(cfg.clone());
        let b = GazeSession::new(cfg);
        let (frame, lm) = face(0.0);
        a.analyze(&frame, Some(&lm));
        assert!(a.calibration().is_complete());
        assert!(!b.calibration().is_complete());

        a.reset_calibration();
        assert!(!a.calibration().is_complete());
    }

    #[test]
    fn try_new_rejects_invalid_config() {
        let mut cfg = GazeConfig::default();
        cfg.calibration.sample_count = 0;
        assert_eq!(
            GazeSession::try_new(cfg).err(),
            Some(ConfigError::ZeroSampleCount)
        );
        assert!(GazeSession::try_new(GazeConfig::default()).is_ok());
    }

    #[test]
    fn report_serializes_state_snake_case() {
        let mut session = GazeSession::default();
        let (frame, lm) = face(-5.0);
        let report = session.report(&frame, Some(&lm));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "center");
        assert_eq!(json["face_detected"], true);
        assert!(json["left"]["pupil"].is_array());
        assert_eq!(GazeState::Left.to_string(), "looking left");
    }
}
