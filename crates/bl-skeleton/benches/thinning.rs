use bl_core::{Image, PixelBuffer};
use bl_skeleton::{SkeletonConfig, ThinningAlgorithm, skeletonize};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// Dark sinusoidal ridges, 4 px wide with an 11 px period.
fn build_ridges(width: usize, height: usize) -> PixelBuffer {
    Image::from_fn(width, height, |x, y| {
        let phase = (y as f32 + 3.0 * (x as f32 * 0.08).sin()) as usize % 11;
        let v = if phase < 4 { 0 } else { 255 };
        [v, v, v, 255]
    })
}

fn bench_thinning(c: &mut Criterion) {
    let img = build_ridges(256, 256);

    for (name, algorithm) in [
        ("thin_hit_and_miss_256", ThinningAlgorithm::HitAndMiss),
        ("thin_kmm_256", ThinningAlgorithm::Kmm),
    ] {
        let cfg = SkeletonConfig {
            algorithm,
            ..SkeletonConfig::default()
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let out = skeletonize(black_box(&img), black_box(&cfg)).expect("valid templates");
                black_box(out.data().len());
            });
        });
    }
}

criterion_group!(benches, bench_thinning);
criterion_main!(benches);
