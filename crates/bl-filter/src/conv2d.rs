//! 2D kernel convolution over RGBA buffers.
//!
//! Every tap is a correlation tap: the kernel cell `(kx, ky)` reads the source
//! at `(x + kx - anchor_x, y + ky - anchor_y)`. Taps that fall outside the
//! image are skipped, and in the weighted-mean filter they are dropped from
//! the divisor too, so border pixels are averaged over the part of the
//! footprint that exists.
//!
//! Kernels are centre-anchored here, so they must be square with an odd side.
//! Derivative pairs such as Roberts go through [`directional_filter`], which
//! has no such restriction.

use bl_core::{BorderMode, Error, Image, ImageView, Kernel, PixelBuffer, clamp_u8, tap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvolveMode {
    /// `Σ p·w / Σ w` over in-bounds taps.
    #[default]
    WeightedMean,
    /// `Σ p·w`, saturated to `0..=255`.
    Raw,
}

pub fn convolve(buf: &PixelBuffer, kernel: &Kernel, mode: ConvolveMode) -> Result<PixelBuffer, Error> {
    match mode {
        ConvolveMode::WeightedMean => weighted_mean_filter(buf, kernel),
        ConvolveMode::Raw => convolve_raw(buf, kernel),
    }
}

/// Smoothing-style convolution. Kernels whose weights sum to zero cannot be
/// normalized and are rejected.
pub fn weighted_mean_filter(buf: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer, Error> {
    kernel.require_square_odd()?;
    kernel.require_nonzero_sum()?;
    let total = kernel.sum();
    let view = buf.as_view();

    Ok(Image::from_fn(buf.width(), buf.height(), |x, y| {
        let mut acc = [0.0f32; 3];
        let mut wsum = 0.0f32;
        for (dx, dy, w) in kernel.taps() {
            if let Some(p) = tap(&view, x as isize + dx, y as isize + dy, &BorderMode::Skip) {
                acc[0] += p[0] as f32 * w;
                acc[1] += p[1] as f32 * w;
                acc[2] += p[2] as f32 * w;
                wsum += w;
            }
        }
        let div = if wsum.abs() > f32::EPSILON { wsum } else { total };
        let alpha = view.get(x, y).map_or(255, |p| p[3]);
        [
            clamp_u8(acc[0] / div),
            clamp_u8(acc[1] / div),
            clamp_u8(acc[2] / div),
            alpha,
        ]
    }))
}

pub fn convolve_raw(buf: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer, Error> {
    kernel.require_square_odd()?;
    let view = buf.as_view();

    Ok(Image::from_fn(buf.width(), buf.height(), |x, y| {
        let mut acc = [0.0f32; 3];
        for (dx, dy, w) in kernel.taps() {
            if let Some(p) = tap(&view, x as isize + dx, y as isize + dy, &BorderMode::Skip) {
                acc[0] += p[0] as f32 * w;
                acc[1] += p[1] as f32 * w;
                acc[2] += p[2] as f32 * w;
            }
        }
        let alpha = view.get(x, y).map_or(255, |p| p[3]);
        [clamp_u8(acc[0]), clamp_u8(acc[1]), clamp_u8(acc[2]), alpha]
    }))
}

/// Single-plane weighted mean, same border rule as [`weighted_mean_filter`].
pub fn weighted_mean_plane(src: &ImageView<'_, f32>, kernel: &Kernel, dst: &mut [f32]) -> Result<(), Error> {
    kernel.require_square_odd()?;
    kernel.require_nonzero_sum()?;
    let w = src.width();
    if dst.len() != w * src.height() {
        return Err(Error::SizeMismatch {
            expected: w * src.height(),
            actual: dst.len(),
        });
    }

    let total = kernel.sum();
    for y in 0..src.height() {
        for x in 0..w {
            let mut acc = 0.0f32;
            let mut wsum = 0.0f32;
            for (dx, dy, k) in kernel.taps() {
                if let Some(v) = tap(src, x as isize + dx, y as isize + dy, &BorderMode::Skip) {
                    acc += v * k;
                    wsum += k;
                }
            }
            let div = if wsum.abs() > f32::EPSILON { wsum } else { total };
            dst[y * w + x] = acc / div;
        }
    }
    Ok(())
}

/// Raw single-plane correlation with skipped outside taps.
pub fn correlate_plane(src: &ImageView<'_, f32>, kernel: &Kernel) -> Image<f32> {
    Image::from_fn(src.width(), src.height(), |x, y| {
        kernel
            .taps()
            .filter_map(|(dx, dy, k)| {
                tap(src, x as isize + dx, y as isize + dy, &BorderMode::Skip).map(|v| v * k)
            })
            .sum()
    })
}

/// Gradient magnitude `sqrt(gx² + gy²)` of the intensity plane for a pair of
/// derivative kernels (Sobel, Roberts). The result is written to R, G and B.
pub fn directional_filter(buf: &PixelBuffer, kx: &Kernel, ky: &Kernel) -> Result<PixelBuffer, Error> {
    if kx.dims() != ky.dims() {
        return Err(Error::InvalidKernel("directional kernels must share dimensions"));
    }

    let plane = buf.intensity_plane();
    let gx = correlate_plane(&plane.as_view(), kx);
    let gy = correlate_plane(&plane.as_view(), ky);

    let mut out = buf.clone();
    for ((px, &a), &b) in out.data_mut().iter_mut().zip(gx.data()).zip(gy.data()) {
        let m = clamp_u8((a * a + b * b).sqrt());
        *px = [m, m, m, px[3]];
    }
    Ok(out)
}
