//! Connected dark regions of a binarized eye image and their moments.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

/// One 8-connected foreground component with its raw image moments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DarkRegion {
    /// Zeroth-order moment (pixel count).
    pub area: u32,
    /// First-order moment along x.
    pub m10: f64,
    /// First-order moment along y.
    pub m01: f64,
}

impl DarkRegion {
    /// Centroid `(m10 / m00, m01 / m00)`, `None` for an empty region.
    pub fn centroid(&self) -> Option<[f64; 2]> {
        if self.area == 0 {
            return None;
        }
        let m00 = self.area as f64;
        Some([self.m10 / m00, self.m01 / m00])
    }
}

/// Label the foreground of a binary mask.
///
/// A component that covers the entire image is not a region of a uniform
/// image's darker part, so it is dropped.
pub fn dark_regions(mask: &GrayImage) -> Vec<DarkRegion> {
    let (w, h) = mask.dimensions();
    let total = w as u64 * h as u64;
    // A single pixel can only be empty or fully covered; the labeller also
    // rejects a lone foreground pixel.
    if total <= 1 {
        return Vec::new();
    }

    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut regions: Vec<DarkRegion> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if regions.len() < label {
            regions.resize(
                label,
                DarkRegion {
                    area: 0,
                    m10: 0.0,
                    m01: 0.0,
                },
            );
        }
        let r = &mut regions[label - 1];
        r.area += 1;
        r.m10 += x as f64;
        r.m01 += y as f64;
    }

    regions.retain(|r| r.area > 0 && (r.area as u64) < total);
    regions
}

/// Number of qualifying dark regions in a binary mask.
pub fn count_dark_regions(mask: &GrayImage) -> usize {
    dark_regions(mask).len()
}
