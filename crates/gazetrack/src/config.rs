//! Top-level configuration aggregating every tunable of the pipeline.
//!
//! All sections deserialize with defaults, so a partial JSON file only needs
//! to name the values it overrides.

use std::path::Path;

use crate::calibration::CalibrationConfig;
use crate::eye::EyeConfig;
use crate::pupil::PupilConfig;
use crate::session::GazeLimits;

/// Errors reported by [`GazeConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `calibration.scan_step` is zero.
    ZeroScanStep,
    /// `calibration.scan_start..scan_end` contains no threshold.
    EmptyScanRange {
        /// First threshold of the scan.
        start: u16,
        /// Exclusive end of the scan.
        end: u16,
    },
    /// `calibration.sample_count` is zero.
    ZeroSampleCount,
    /// A floating-point setting is NaN, infinite or out of its domain.
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroScanStep => write!(f, "calibration.scan_step must be positive"),
            Self::EmptyScanRange { start, end } => {
                write!(f, "calibration scan range {}..{} is empty", start, end)
            }
            Self::ZeroSampleCount => write!(f, "calibration.sample_count must be positive"),
            Self::InvalidValue { field, value } => {
                write!(f, "invalid value for {}: {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Eye isolation parameters.
    pub eye: EyeConfig,
    /// Binarization and blob selection parameters.
    pub pupil: PupilConfig,
    /// Threshold auto-calibration parameters.
    pub calibration: CalibrationConfig,
    /// Blink and gaze-direction cutoffs.
    pub gaze: GazeLimits,
}

impl GazeConfig {
    /// Load a configuration from JSON and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cal = &self.calibration;
        if cal.scan_step == 0 {
            return Err(ConfigError::ZeroScanStep);
        }
        if cal.scan_start >= cal.scan_end || cal.scan_start > 255 {
            return Err(ConfigError::EmptyScanRange {
                start: cal.scan_start,
                end: cal.scan_end,
            });
        }
        if cal.sample_count == 0 {
            return Err(ConfigError::ZeroSampleCount);
        }
        check_unit(
            "calibration.target_iris_coverage",
            cal.target_iris_coverage,
        )?;

        check_non_negative("pupil.blur_sigma", self.pupil.blur_sigma as f64)?;
        check_non_negative("gaze.blink_ratio_threshold", self.gaze.blink_ratio_threshold)?;
        check_unit("gaze.right_limit", self.gaze.right_limit)?;
        check_unit("gaze.left_limit", self.gaze.left_limit)?;
        if self.gaze.right_limit > self.gaze.left_limit {
            return Err(ConfigError::InvalidValue {
                field: "gaze.right_limit",
                value: self.gaze.right_limit,
            });
        }
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}
