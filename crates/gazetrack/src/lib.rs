//! gazetrack: pure-Rust pupil location and gaze classification from facial
//! landmarks.
//!
//! Face and landmark detection are external: callers hand in a grayscale
//! frame and a 68-point Multi-PIE landmark set. Per eye, the pipeline stages
//! are:
//!
//! 1. **Blink ratio** – eye width over lid-to-lid height.
//! 2. **Isolation** – polygon mask of the eye contour, crop with a margin.
//! 3. **Calibration** – during warm-up, scan binarization thresholds until
//!    one isolates a single dark blob; freeze the per-eye average.
//! 4. **Pupil** – threshold, open, pick the largest dark blob, moment
//!    centroid.
//!
//! [`GazeSession`] runs both eyes per frame and classifies the pair as
//! blinking, looking right, left or center.
//!
//! # Example
//!
//! ```no_run
//! use gazetrack::{GazeSession, LandmarkSet};
//! use std::path::Path;
//!
//! let frame = image::open("frame.png").unwrap().to_luma8();
//! let landmarks = LandmarkSet::from_json_file(Path::new("landmarks.json")).unwrap();
//! let mut session = GazeSession::default();
//! let analysis = session.analyze(&frame, Some(&landmarks));
//! println!("{} left={:?}", analysis.state(), analysis.pupil_left_coords());
//! ```

pub mod annotate;
pub mod calibration;
mod config;
pub mod eye;
mod landmarks;
pub mod pupil;
mod session;

#[cfg(test)]
pub(crate) mod test_utils;

pub use annotate::annotate_frame;
pub use calibration::{
    Calibration, CalibrationConfig, CalibrationProgress, CalibrationState, ThresholdAggregator,
};
pub use config::{ConfigError, GazeConfig};
pub use eye::{EyeConfig, EyeRegion};
pub use landmarks::{
    EyeSide, LandmarkError, LandmarkSet, MAX_LANDMARK_COORD, MIN_LANDMARK_POINTS, MULTI_PIE_POINTS,
};
pub use pupil::{Pupil, PupilConfig};
pub use session::{EyeReport, GazeFrame, GazeLimits, GazeReport, GazeSession, GazeState};
