//! Point-wise colour operations.
//!
//! Every operation reads each pixel independently, writes R, G and B, and
//! copies alpha through unchanged.

use serde::{Deserialize, Serialize};

use crate::Image;
use crate::pixel::{PixelBuffer, Rgba, clamp_u8, gray, intensity};

fn map_rgb(buf: &PixelBuffer, f: impl Fn(f32) -> f32) -> PixelBuffer {
    buf.map(|&[r, g, b, a]| {
        [
            clamp_u8(f(r as f32)),
            clamp_u8(f(g as f32)),
            clamp_u8(f(b as f32)),
            a,
        ]
    })
}

/// Replaces R, G and B with the rounded channel mean.
pub fn grayscale(buf: &PixelBuffer) -> PixelBuffer {
    buf.map(|&px| gray(clamp_u8(intensity(px)), px[3]))
}

/// Scales every colour channel by `percent / 100`.
pub fn brightness(buf: &PixelBuffer, percent: f32) -> PixelBuffer {
    let k = percent / 100.0;
    map_rgb(buf, |c| c * k)
}

/// Scales distance from mid-grey: `(c - 128) * percent / 100 + 128`.
pub fn contrast(buf: &PixelBuffer, percent: f32) -> PixelBuffer {
    let k = percent / 100.0;
    map_rgb(buf, |c| (c - 128.0) * k + 128.0)
}

pub fn negative(buf: &PixelBuffer) -> PixelBuffer {
    buf.map(|&[r, g, b, a]| [255 - r, 255 - g, 255 - b, a])
}

/// `intensity > threshold` becomes white, everything else black.
pub fn binarize(buf: &PixelBuffer, threshold: f32) -> PixelBuffer {
    buf.map(|&px| {
        let v = if intensity(px) > threshold { 255 } else { 0 };
        gray(v, px[3])
    })
}

/// The manipulation chain of an interactive editor, evaluated in `f32` and
/// rounded once at the end so intermediate steps do not lose precision.
///
/// Order: grayscale, brightness, contrast, negative, threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointAdjustments {
    pub grayscale: bool,
    /// Percent, 100 is identity.
    pub brightness: f32,
    /// Percent, 100 is identity.
    pub contrast: f32,
    pub negative: bool,
    pub threshold: Option<f32>,
}

impl Default for PointAdjustments {
    fn default() -> Self {
        Self {
            grayscale: false,
            brightness: 100.0,
            contrast: 100.0,
            negative: false,
            threshold: None,
        }
    }
}

impl PointAdjustments {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, buf: &PixelBuffer) -> PixelBuffer {
        buf.map(|&px| self.apply_pixel(px))
    }

    fn apply_pixel(&self, px: Rgba) -> Rgba {
        let mut c = [px[0] as f32, px[1] as f32, px[2] as f32];

        if self.grayscale {
            let m = (c[0] + c[1] + c[2]) / 3.0;
            c = [m; 3];
        }

        let kb = self.brightness / 100.0;
        let kc = self.contrast / 100.0;
        for v in &mut c {
            *v *= kb;
            *v = (*v - 128.0) * kc + 128.0;
            if self.negative {
                *v = 255.0 - *v;
            }
        }

        if let Some(t) = self.threshold {
            let m = (c[0] + c[1] + c[2]) / 3.0;
            let v = if m > t { 255.0 } else { 0.0 };
            c = [v; 3];
        }

        [clamp_u8(c[0]), clamp_u8(c[1]), clamp_u8(c[2]), px[3]]
    }
}

/// Z-score normalization of the intensity plane. A flat image maps to zeros.
pub fn normalize(buf: &PixelBuffer) -> Image<f32> {
    let plane = buf.intensity_plane();
    let n = plane.data().len();
    if n == 0 {
        return plane;
    }

    let mean = plane.data().iter().sum::<f32>() / n as f32;
    let var = plane
        .data()
        .iter()
        .map(|&v| (v - mean) * (v - mean))
        .sum::<f32>()
        / n as f32;
    let std = var.sqrt();

    if std <= f32::EPSILON {
        return plane.map(|_| 0.0);
    }
    plane.map(|&v| (v - mean) / std)
}

/// Linearly maps the plane's `[min, max]` onto `[0, 255]`. A flat plane maps
/// to zeros.
pub fn contrast_stretch(plane: &Image<f32>) -> Image<u8> {
    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in plane.data() {
        if v < min_v {
            min_v = v;
        }
        if v > max_v {
            max_v = v;
        }
    }

    if plane.is_empty() || (max_v - min_v).abs() < 1e-12 {
        return plane.map(|_| 0);
    }

    let scale = 255.0 / (max_v - min_v);
    plane.map(|&v| clamp_u8((v - min_v) * scale))
}
