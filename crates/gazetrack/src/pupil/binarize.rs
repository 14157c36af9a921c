//! Threshold binarization with speckle cleanup.
//!
//! Dark pixels (strictly below the threshold) become foreground (255). The
//! same preprocessing feeds both pupil location and threshold calibration so
//! that a calibrated threshold means the same thing in both places.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

use super::PupilConfig;

/// Smooth an eye image before thresholding.
///
/// Returns a copy when blurring is disabled so callers can treat the output
/// uniformly.
pub fn smooth_eye(eye: &GrayImage, config: &PupilConfig) -> GrayImage {
    let (w, h) = eye.dimensions();
    if w == 0 || h == 0 || config.blur_sigma <= 0.0 {
        return eye.clone();
    }
    imageproc::filter::gaussian_blur_f32(eye, config.blur_sigma)
}

/// Threshold an already smoothed eye image and apply morphological opening.
pub fn threshold_smoothed(smoothed: &GrayImage, threshold: u8, config: &PupilConfig) -> GrayImage {
    let (w, h) = smoothed.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (dst, src) in mask.pixels_mut().zip(smoothed.pixels()) {
        if src[0] < threshold {
            *dst = Luma([255]);
        }
    }
    if config.open_radius > 0 && w > 0 && h > 0 {
        // Opening = erosion then dilation; removes blobs thinner than the element.
        imageproc::morphology::open_mut(&mut mask, Norm::LInf, config.open_radius);
    }
    mask
}

/// Full binarization: smooth, threshold, open.
pub fn binarize(eye: &GrayImage, threshold: u8, config: &PupilConfig) -> GrayImage {
    threshold_smoothed(&smooth_eye(eye, config), threshold, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_config() -> PupilConfig {
        PupilConfig {
            blur_sigma: 0.0,
            open_radius: 0,
        }
    }

    #[test]
    fn dark_pixels_become_foreground() {
        let mut img = GrayImage::from_pixel(4, 1, Luma([200]));
        img.put_pixel(1, 0, Luma([10]));
        img.put_pixel(2, 0, Luma([50]));
        let mask = binarize(&img, 50, &raw_config());
        let values: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 255, 0, 0]);
    }

    #[test]
    fn opening_removes_isolated_speckle() {
        let mut img = GrayImage::from_pixel(21, 21, Luma([220]));
        img.put_pixel(3, 3, Luma([0]));
        for y in 8..15 {
            for x in 8..15 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let cfg = PupilConfig {
            blur_sigma: 0.0,
            open_radius: 1,
        };
        let mask = binarize(&img, 100, &cfg);
        assert_eq!(mask.get_pixel(3, 3)[0], 0);
        assert_eq!(mask.get_pixel(11, 11)[0], 255);
    }

    #[test]
    fn empty_image_is_passed_through() {
        let img = GrayImage::new(0, 0);
        let mask = binarize(&img, 128, &PupilConfig::default());
        assert_eq!(mask.dimensions(), (0, 0));
    }
}
