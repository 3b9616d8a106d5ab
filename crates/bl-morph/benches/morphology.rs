use bl_core::{Image, Kernel, PixelBuffer};
use bl_morph::{MorphOp, apply_sequence, distance_transform};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn build_disc_rgba(width: usize, height: usize, radius: f32) -> PixelBuffer {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let v = if dx * dx + dy * dy <= radius * radius { 0 } else { 255 };
        [v, v, v, 255]
    })
}

fn bench_open_close(c: &mut Criterion) {
    let img = build_disc_rgba(320, 240, 60.0);
    let kernel = Kernel::square(3).expect("valid kernel");
    let ops = [MorphOp::Open, MorphOp::Close];

    c.bench_function("morph_open_close_320x240", |b| {
        b.iter(|| {
            let out = apply_sequence(black_box(&ops), black_box(&img), black_box(&kernel))
                .expect("valid mask");
            black_box(out.data().len());
        });
    });
}

fn bench_distance(c: &mut Criterion) {
    let img = build_disc_rgba(320, 240, 60.0);

    c.bench_function("distance_transform_320x240", |b| {
        b.iter(|| {
            let out = distance_transform(black_box(&img));
            black_box(out.data().len());
        });
    });
}

criterion_group!(benches, bench_open_close, bench_distance);
criterion_main!(benches);
