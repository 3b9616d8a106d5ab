use bl_core::{Image, Kernel, PixelBuffer};
use bl_filter::{CannyConfig, CannyDetector, weighted_mean_filter};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn build_slanted_rgba(width: usize, height: usize) -> PixelBuffer {
    let theta = 20.0f32.to_radians();
    let nx = theta.cos();
    let ny = theta.sin();
    let t = nx * (0.5 * width as f32) + ny * (0.5 * height as f32);

    Image::from_fn(width, height, |x, y| {
        let d = nx * x as f32 + ny * y as f32 - t;
        let v = if d >= 0.0 { 255 } else { 0 };
        [v, v, v, 255]
    })
}

fn bench_canny(c: &mut Criterion) {
    let img = build_slanted_rgba(640, 480);
    let cfg = CannyConfig::default();
    let mut det = CannyDetector::new();

    c.bench_function("canny_detect_640x480", |b| {
        b.iter(|| {
            let out = det.detect(black_box(&img), black_box(&cfg)).expect("valid config");
            black_box(out.data().len());
        });
    });
}

fn bench_gaussian_blur(c: &mut Criterion) {
    let img = build_slanted_rgba(640, 480);
    let kernel = Kernel::gaussian();

    c.bench_function("weighted_mean_gaussian_640x480", |b| {
        b.iter(|| {
            let out = weighted_mean_filter(black_box(&img), black_box(&kernel)).expect("valid kernel");
            black_box(out.data().len());
        });
    });
}

criterion_group!(benches, bench_canny, bench_gaussian_blur);
criterion_main!(benches);
