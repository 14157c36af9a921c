//! Eye aspect ratio used for blink detection.

/// Midpoint of two pixels, truncated toward zero.
#[inline]
pub(crate) fn middle_point(p1: [i32; 2], p2: [i32; 2]) -> [i32; 2] {
    let mid = |a: i32, b: i32| ((a as i64 + b as i64) / 2) as i32;
    [mid(p1[0], p2[0]), mid(p1[1], p2[1])]
}

#[inline]
fn distance(a: [i32; 2], b: [i32; 2]) -> f64 {
    let dx = (a[0] as i64 - b[0] as i64) as f64;
    let dy = (a[1] as i64 - b[1] as i64) as f64;
    dx.hypot(dy)
}

/// Width-to-height ratio of an eye contour.
///
/// `points` are in canonical order (outer corner, upper lid ×2, inner corner,
/// lower lid ×2). Width joins the two corners; height joins the midpoints of
/// the upper and lower lid pairs. A closed eye has a large ratio. Returns
/// `None` when the lid midpoints coincide.
pub fn blinking_ratio(points: &[[i32; 2]; 6]) -> Option<f64> {
    let left = points[0];
    let right = points[3];
    let top = middle_point(points[1], points[2]);
    let bottom = middle_point(points[5], points[4]);

    let width = distance(left, right);
    let height = distance(top, bottom);
    if height == 0.0 {
        return None;
    }
    Some(width / height)
}
