//! Per-eye binarization threshold auto-calibration.
//!
//! During warm-up every isolated eye image is scanned over a fixed threshold
//! range. The threshold that isolates exactly the expected number of dark
//! blobs is recorded in that side's bounded history. Once both histories
//! hold `sample_count` readings the per-side thresholds are aggregated and
//! frozen for the rest of the session.
//!
//! The scan is linear on purpose: the blob count is not monotonic in the
//! threshold, so bisection could skip the only matching interval.

use std::collections::VecDeque;

use image::GrayImage;

use crate::landmarks::EyeSide;
use crate::pupil::{count_dark_regions, smooth_eye, threshold_smoothed, PupilConfig};

/// How recorded thresholds collapse into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdAggregator {
    /// Integer (truncating) mean.
    #[default]
    Mean,
    /// Median; the two middle values are averaged for even counts.
    Median,
}

impl ThresholdAggregator {
    fn apply(self, values: &VecDeque<u8>) -> Option<u8> {
        if values.is_empty() {
            return None;
        }
        match self {
            Self::Mean => {
                let sum: u32 = values.iter().map(|&v| v as u32).sum();
                Some((sum / values.len() as u32) as u8)
            }
            Self::Median => {
                let mut sorted: Vec<u8> = values.iter().copied().collect();
                sorted.sort_unstable();
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 1 {
                    Some(sorted[mid])
                } else {
                    Some(((sorted[mid - 1] as u16 + sorted[mid] as u16) / 2) as u8)
                }
            }
        }
    }
}

/// Threshold calibration parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Samples per side required before thresholds are frozen.
    pub sample_count: usize,
    /// First threshold of the scan (inclusive).
    pub scan_start: u16,
    /// End of the scan (exclusive, at most 256).
    pub scan_end: u16,
    /// Scan step.
    pub scan_step: u16,
    /// Number of dark regions a well-chosen threshold produces.
    pub target_blob_count: usize,
    /// Expected fraction of the inner eye crop covered by the dark foreground.
    /// Breaks ties between thresholds that all yield the target blob count.
    pub target_iris_coverage: f64,
    /// Border trimmed from the eye image before measuring coverage.
    pub coverage_margin_px: u32,
    /// Threshold used while a side has no samples yet.
    pub fallback_threshold: u8,
    /// Aggregation of recorded thresholds.
    pub aggregator: ThresholdAggregator,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_count: 20,
            scan_start: 5,
            scan_end: 100,
            scan_step: 5,
            target_blob_count: 1,
            target_iris_coverage: 0.48,
            coverage_margin_px: 5,
            fallback_threshold: 50,
            aggregator: ThresholdAggregator::Mean,
        }
    }
}

impl CalibrationConfig {
    /// Thresholds visited by one scan, in increasing order.
    pub fn scan_thresholds(&self) -> impl Iterator<Item = u8> {
        let end = self.scan_end.min(256);
        let step = self.scan_step.max(1) as usize;
        (self.scan_start..end).step_by(step).map(|t| t as u8)
    }
}

/// Warm-up state of one side (or of the whole manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    WarmingUp,
    Complete,
}

/// Snapshot of calibration progress for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationProgress {
    /// Samples recorded for the left eye.
    pub left_samples: usize,
    /// Samples recorded for the right eye.
    pub right_samples: usize,
    /// Samples required per side.
    pub required: usize,
    /// Left/right thresholds currently in effect.
    pub thresholds: [u8; 2],
    /// Whether thresholds are frozen.
    pub complete: bool,
}

/// Result of scanning one eye image.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScanCandidate {
    threshold: u8,
    coverage: f64,
}

/// Find the threshold that best isolates the pupil in one eye image.
///
/// Returns `None` when no scanned threshold yields `target_blob_count` dark
/// regions.
pub fn best_threshold(eye: &GrayImage, config: &CalibrationConfig, pupil: &PupilConfig) -> Option<u8> {
    let (w, h) = eye.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let smoothed = smooth_eye(eye, pupil);

    let mut best: Option<ScanCandidate> = None;
    for threshold in config.scan_thresholds() {
        let mask = threshold_smoothed(&smoothed, threshold, pupil);
        if count_dark_regions(&mask) != config.target_blob_count {
            continue;
        }
        let coverage = iris_coverage(&mask, config.coverage_margin_px);
        let better = match best {
            None => true,
            Some(b) => {
                (coverage - config.target_iris_coverage).abs()
                    < (b.coverage - config.target_iris_coverage).abs()
            }
        };
        if better {
            best = Some(ScanCandidate {
                threshold,
                coverage,
            });
        }
    }
    best.map(|c| c.threshold)
}

/// Fraction of foreground pixels inside the mask with `margin` trimmed from
/// every side. Falls back to the full mask when the trimmed window is empty.
fn iris_coverage(mask: &GrayImage, margin: u32) -> f64 {
    let (w, h) = mask.dimensions();
    let (x0, y0, x1, y1) = if w > 2 * margin && h > 2 * margin {
        (margin, margin, w - margin, h - margin)
    } else {
        (0, 0, w, h)
    };
    let total = (x1 - x0) as u64 * (y1 - y0) as u64;
    if total == 0 {
        return 0.0;
    }
    let mut dark = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            if mask.get_pixel(x, y)[0] != 0 {
                dark += 1;
            }
        }
    }
    dark as f64 / total as f64
}

/// Per-session threshold calibration for both eyes.
///
/// Owned by the caller and passed into every eye analysis; two sessions never
/// share calibration state.
#[derive(Debug, Clone)]
pub struct Calibration {
    config: CalibrationConfig,
    pupil: PupilConfig,
    histories: [VecDeque<u8>; 2],
    frozen: Option<[u8; 2]>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(CalibrationConfig::default(), PupilConfig::default())
    }
}

impl Calibration {
    /// Create an empty calibration using `pupil` binarization settings.
    ///
    /// With `sample_count == 0` nothing needs to be collected: the
    /// calibration starts complete, frozen at `fallback_threshold`.
    pub fn new(config: CalibrationConfig, pupil: PupilConfig) -> Self {
        let cap = config.sample_count;
        let mut calibration = Self {
            config,
            pupil,
            histories: [VecDeque::with_capacity(cap), VecDeque::with_capacity(cap)],
            frozen: None,
        };
        calibration.try_freeze();
        calibration
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Binarization settings the thresholds are calibrated for.
    pub fn pupil_config(&self) -> &PupilConfig {
        &self.pupil
    }

    /// True once both sides have collected `sample_count` samples.
    pub fn is_complete(&self) -> bool {
        self.frozen.is_some()
    }

    /// Warm-up state of one side.
    pub fn side_state(&self, side: EyeSide) -> CalibrationState {
        if self.histories[side.slot()].len() >= self.config.sample_count {
            CalibrationState::Complete
        } else {
            CalibrationState::WarmingUp
        }
    }

    /// Recorded thresholds of one side, oldest first.
    pub fn history(&self, side: EyeSide) -> impl ExactSizeIterator<Item = u8> + '_ {
        self.histories[side.slot()].iter().copied()
    }

    /// Threshold currently in effect for `side`.
    ///
    /// Frozen once calibration is complete; a running aggregate before that,
    /// or the configured fallback while the side has no samples.
    pub fn threshold(&self, side: EyeSide) -> u8 {
        if let Some(frozen) = self.frozen {
            return frozen[side.slot()];
        }
        self.config
            .aggregator
            .apply(&self.histories[side.slot()])
            .unwrap_or(self.config.fallback_threshold)
    }

    /// Feed one isolated eye image into the warm-up.
    ///
    /// Returns the threshold recorded for this frame, or `None` when the
    /// calibration is already complete or no scanned threshold matched.
    pub fn evaluate(&mut self, eye: &GrayImage, side: EyeSide) -> Option<u8> {
        if self.is_complete() {
            return None;
        }
        let Some(threshold) = best_threshold(eye, &self.config, &self.pupil) else {
            tracing::debug!(%side, "calibration sample skipped: no threshold matched");
            return None;
        };

        let history = &mut self.histories[side.slot()];
        if history.len() >= self.config.sample_count {
            history.pop_front();
        }
        history.push_back(threshold);
        tracing::debug!(
            %side,
            threshold,
            samples = history.len(),
            "calibration sample recorded"
        );

        self.try_freeze();
        Some(threshold)
    }

    fn try_freeze(&mut self) {
        let n = self.config.sample_count;
        if self.histories.iter().any(|h| h.len() < n) {
            return;
        }
        let fallback = self.config.fallback_threshold;
        let frozen = [
            self.config.aggregator.apply(&self.histories[0]).unwrap_or(fallback),
            self.config.aggregator.apply(&self.histories[1]).unwrap_or(fallback),
        ];
        tracing::info!(
            left = frozen[0],
            right = frozen[1],
            "threshold calibration complete"
        );
        self.frozen = Some(frozen);
    }

    /// Discard all samples and return to warm-up.
    pub fn reset(&mut self) {
        for h in &mut self.histories {
            h.clear();
        }
        self.frozen = None;
        self.try_freeze();
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            left_samples: self.histories[0].len(),
            right_samples: self.histories[1].len(),
            required: self.config.sample_count,
            thresholds: [self.threshold(EyeSide::Left), self.threshold(EyeSide::Right)],
            complete: self.is_complete(),
        }
    }
}
