//! Synthetic frames and landmark sets for unit tests.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::landmarks::{LandmarkSet, MULTI_PIE_POINTS};

/// Render a filled disk on a uniform background.
///
/// Pixels at distance `d <= radius` from `center` get `disk_pix`, the rest
/// `bg_pix`.
pub(crate) fn draw_disk_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    disk_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(w, h, Luma([bg_pix]));
    draw_disk(&mut img, center, radius, disk_pix);
    img
}

pub(crate) fn draw_disk(img: &mut GrayImage, center: [f32; 2], radius: f32, pix: u8) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - center[0];
            let dy = y as f32 - center[1];
            if (dx * dx + dy * dy).sqrt() <= radius {
                img.put_pixel(x, y, Luma([pix]));
            }
        }
    }
}

/// Geometry of one synthetic eye.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SyntheticEye {
    /// Eye center in frame pixels.
    pub center: [i32; 2],
    /// Half width (corner to center) and half height (lid to center).
    pub half_size: [i32; 2],
    /// Pupil offset from the eye center.
    pub pupil_offset: [f32; 2],
    pub pupil_radius: f32,
    pub pupil_pix: u8,
}

impl SyntheticEye {
    pub(crate) fn at(center: [i32; 2]) -> Self {
        Self {
            center,
            half_size: [21, 10],
            pupil_offset: [0.0, 0.0],
            pupil_radius: 5.0,
            pupil_pix: 30,
        }
    }

    /// Six contour points in canonical landmark order.
    pub(crate) fn contour(&self) -> [[i32; 2]; 6] {
        let [cx, cy] = self.center;
        let [a, b] = self.half_size;
        let t = a / 3;
        [
            [cx - a, cy],
            [cx - t, cy - b],
            [cx + t, cy - b],
            [cx + a, cy],
            [cx + t, cy + b],
            [cx - t, cy + b],
        ]
    }

    pub(crate) fn pupil_center(&self) -> [f32; 2] {
        [
            self.center[0] as f32 + self.pupil_offset[0],
            self.center[1] as f32 + self.pupil_offset[1],
        ]
    }
}

pub(crate) const SKIN_PIX: u8 = 150;
pub(crate) const SCLERA_PIX: u8 = 235;

/// Render a face-like frame with two eyes and return matching landmarks.
pub(crate) fn synthetic_face(
    w: u32,
    h: u32,
    left: SyntheticEye,
    right: SyntheticEye,
) -> (GrayImage, LandmarkSet) {
    let mut img = GrayImage::from_pixel(w, h, Luma([SKIN_PIX]));
    let mut points = vec![[w as i32 / 2, h as i32 / 2]; MULTI_PIE_POINTS];

    for (eye, first_idx) in [(left, 36usize), (right, 42usize)] {
        let contour = eye.contour();
        let poly: Vec<Point<i32>> = contour.iter().map(|p| Point::new(p[0], p[1])).collect();
        draw_polygon_mut(&mut img, &poly, Luma([SCLERA_PIX]));
        draw_disk(&mut img, eye.pupil_center(), eye.pupil_radius, eye.pupil_pix);
        for (k, p) in contour.iter().enumerate() {
            points[first_idx + k] = *p;
        }
    }

    let landmarks = LandmarkSet::new(points).expect("68 points");
    (img, landmarks)
}
