//! Eye isolation: polygon mask plus a tight crop with a fixed margin.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::landmarks::clamp_coord;

/// Value written outside the eye contour.
pub const MASKED_PIX: u8 = 255;

/// Masked eye crop and its placement in the source frame.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolatedEye {
    /// Cropped image; pixels outside the eye contour are white.
    pub frame: GrayImage,
    /// Top-left corner of the crop in frame pixels.
    pub origin: [u32; 2],
}

/// Crop bounds `[x0, y0, x1, y1)` of the contour expanded by `margin`,
/// clamped to a `w × h` frame.
pub(crate) fn crop_bounds(points: &[[i32; 2]], margin: u32, w: u32, h: u32) -> [u32; 4] {
    let m = margin as i64;
    let min_x = points.iter().map(|p| p[0]).min().unwrap_or(0) as i64 - m;
    let max_x = points.iter().map(|p| p[0]).max().unwrap_or(0) as i64 + m;
    let min_y = points.iter().map(|p| p[1]).min().unwrap_or(0) as i64 - m;
    let max_y = points.iter().map(|p| p[1]).max().unwrap_or(0) as i64 + m;

    let x0 = min_x.clamp(0, w as i64) as u32;
    let x1 = max_x.clamp(0, w as i64) as u32;
    let y0 = min_y.clamp(0, h as i64) as u32;
    let y1 = max_y.clamp(0, h as i64) as u32;
    [x0, y0, x1.max(x0), y1.max(y0)]
}

/// Fill the contour with `color`, tolerating repeated and collinear points.
fn fill_contour(canvas: &mut GrayImage, contour: &[Point<i32>], color: Luma<u8>) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(contour.len());
    for &p in contour {
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    match poly.len() {
        0 => {}
        1 => {
            let p = poly[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        2 => {
            let (a, b) = (poly[0], poly[1]);
            draw_line_segment_mut(
                canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            );
        }
        _ => draw_polygon_mut(canvas, &poly, color),
    }
}

/// Blank everything outside the eye contour and crop around it.
///
/// The crop spans `[min - margin, max + margin)` on both axes, clamped to the
/// frame. A contour lying entirely outside the frame yields an empty image.
pub fn isolate_eye(frame: &GrayImage, points: &[[i32; 2]; 6], margin: u32) -> IsolatedEye {
    let (w, h) = frame.dimensions();
    let [x0, y0, x1, y1] = crop_bounds(points, margin, w, h);
    let (cw, ch) = (x1 - x0, y1 - y0);

    // Mask in crop coordinates: 255 is opaque, the contour interior is 0.
    let mut mask = GrayImage::from_pixel(cw, ch, Luma([255]));
    if cw > 0 && ch > 0 {
        let shift = |v: i32, origin: u32| {
            clamp_coord((v as i64 - origin as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        };
        let local: Vec<Point<i32>> = points
            .iter()
            .map(|p| Point::new(shift(p[0], x0), shift(p[1], y0)))
            .collect();
        fill_contour(&mut mask, &local, Luma([0]));
    }

    let eye = GrayImage::from_fn(cw, ch, |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            *frame.get_pixel(x0 + x, y0 + y)
        } else {
            Luma([MASKED_PIX])
        }
    });

    IsolatedEye {
        frame: eye,
        origin: [x0, y0],
    }
}
