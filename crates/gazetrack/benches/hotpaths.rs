use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gazetrack::calibration::best_threshold;
use gazetrack::pupil::locate;
use gazetrack::{CalibrationConfig, PupilConfig};

/// Noisy eye crop with a dark pupil disk.
fn make_eye_fixture(w: u32, h: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let (cx, cy) = (w as f32 * 0.45, h as f32 * 0.5);
    let r = h as f32 * 0.22;
    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let base = if (dx * dx + dy * dy).sqrt() <= r { 35.0 } else { 210.0 };
        let noise: f32 = rng.gen_range(-12.0..12.0);
        Luma([(base + noise).clamp(0.0, 255.0) as u8])
    })
}

fn bench_pupil_locate(c: &mut Criterion) {
    let cfg = PupilConfig::default();
    let eye_small = make_eye_fixture(52, 30, 3);
    let eye_large = make_eye_fixture(160, 90, 5);

    c.bench_function("pupil_locate_52x30", |b| {
        b.iter(|| black_box(locate(black_box(&eye_small), black_box(70), &cfg)))
    });

    c.bench_function("pupil_locate_160x90", |b| {
        b.iter(|| black_box(locate(black_box(&eye_large), black_box(70), &cfg)))
    });
}

fn bench_calibration_scan(c: &mut Criterion) {
    let cal = CalibrationConfig::default();
    let pupil = PupilConfig::default();
    let eye = make_eye_fixture(52, 30, 11);

    c.bench_function("calibration_scan_52x30", |b| {
        b.iter(|| black_box(best_threshold(black_box(&eye), &cal, &pupil)))
    });
}

criterion_group!(hotpaths, bench_pupil_locate, bench_calibration_scan);
criterion_main!(hotpaths);
