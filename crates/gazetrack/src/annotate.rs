//! Visual overlay of an analyzed frame for inspection.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::eye::EyeRegion;
use crate::session::GazeFrame;

const PUPIL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 200, 0]);

/// Half-length of the pupil crosshair arms, in pixels.
pub const CROSS_HALF_LEN: f32 = 5.0;

fn draw_cross(img: &mut RgbImage, [x, y]: [f64; 2], color: Rgb<u8>) {
    let (x, y) = (x as f32, y as f32);
    draw_line_segment_mut(img, (x - CROSS_HALF_LEN, y), (x + CROSS_HALF_LEN, y), color);
    draw_line_segment_mut(img, (x, y - CROSS_HALF_LEN), (x, y + CROSS_HALF_LEN), color);
}

fn draw_contour(img: &mut RgbImage, eye: &EyeRegion, color: Rgb<u8>) {
    let pts = &eye.landmark_points;
    for (i, a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        draw_line_segment_mut(
            img,
            (a[0] as f32, a[1] as f32),
            (b[0] as f32, b[1] as f32),
            color,
        );
    }
}

/// Copy `frame` to RGB and draw eye contours and pupil crosshairs.
pub fn annotate_frame(frame: &DynamicImage, analysis: &GazeFrame) -> RgbImage {
    let mut out = frame.to_rgb8();
    for eye in [analysis.left(), analysis.right()].into_iter().flatten() {
        draw_contour(&mut out, eye, CONTOUR_COLOR);
        if let Some(p) = eye.pupil_absolute() {
            draw_cross(&mut out, p, PUPIL_COLOR);
        }
    }
    out
}
