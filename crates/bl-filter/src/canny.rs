//! Canny edge detection on RGBA buffers.
//!
//! Pipeline: intensity plane, weighted-mean blur, 3×3 Sobel gradient,
//! 4-direction non-maximum suppression, double threshold, one pass of
//! hysteresis.
//!
//! Gradient convention: `gx` grows to the right and `gy` grows downwards
//! (image rows). A pixel whose 3×3 Sobel footprint leaves the image gets
//! gradient 0, so the outermost 1-px frame is never an edge.
//!
//! Hysteresis is deliberately local: a weak pixel survives only if one of its
//! 8 neighbours was already strong after thresholding. Chains of weak pixels
//! do not propagate strength to each other.

use bl_core::{Error, Image, Kernel, PixelBuffer, intensity};
use serde::{Deserialize, Serialize};

use crate::conv2d::weighted_mean_plane;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Pre-blur kernel; `None` skips smoothing.
    pub blur: Option<Kernel>,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            blur: Some(Kernel::gaussian()),
            low_threshold: 50.0,
            high_threshold: 100.0,
        }
    }
}

impl CannyConfig {
    /// Thresholds in `(low, high)` order regardless of how they were given.
    pub fn ordered_thresholds(&self) -> (f32, f32) {
        let mut low = self.low_threshold;
        let mut high = self.high_threshold;
        if high < low {
            core::mem::swap(&mut high, &mut low);
        }
        (low, high)
    }
}

/// Reusable detector; scratch planes are kept between calls of equal size.
#[derive(Debug, Clone)]
pub struct CannyDetector {
    gray: Image<f32>,
    smooth: Image<f32>,
    gx: Image<f32>,
    gy: Image<f32>,
    mag: Image<f32>,
    nms: Image<f32>,
    class: Vec<u8>,
}

impl CannyDetector {
    pub fn new() -> Self {
        Self {
            gray: Image::new_fill(0, 0, 0.0),
            smooth: Image::new_fill(0, 0, 0.0),
            gx: Image::new_fill(0, 0, 0.0),
            gy: Image::new_fill(0, 0, 0.0),
            mag: Image::new_fill(0, 0, 0.0),
            nms: Image::new_fill(0, 0, 0.0),
            class: Vec::new(),
        }
    }

    /// Binary edge mask: 255 on edges, 0 elsewhere.
    pub fn detect(&mut self, buf: &PixelBuffer, cfg: &CannyConfig) -> Result<Image<u8>, Error> {
        let (w, h) = buf.dims();
        self.ensure_dims(w, h);

        for (dst, &px) in self.gray.data_mut().iter_mut().zip(buf.data()) {
            *dst = intensity(px);
        }

        match &cfg.blur {
            Some(kernel) => {
                weighted_mean_plane(&self.gray.as_view(), kernel, self.smooth.data_mut())?
            }
            None => self.smooth.data_mut().copy_from_slice(self.gray.data()),
        }

        self.compute_sobel();
        self.non_max_suppression();

        let (low, high) = cfg.ordered_thresholds();
        let mut out = Image::new_fill(w, h, 0u8);
        hysteresis(self.nms.data(), w, h, low, high, &mut self.class, out.data_mut());
        Ok(out)
    }

    /// Gradient magnitude of the last call, for visualization.
    pub fn magnitude(&self) -> &Image<f32> {
        &self.mag
    }

    fn ensure_dims(&mut self, w: usize, h: usize) {
        if self.gray.width() != w || self.gray.height() != h {
            self.gray = Image::new_fill(w, h, 0.0);
            self.smooth = Image::new_fill(w, h, 0.0);
            self.gx = Image::new_fill(w, h, 0.0);
            self.gy = Image::new_fill(w, h, 0.0);
            self.mag = Image::new_fill(w, h, 0.0);
            self.nms = Image::new_fill(w, h, 0.0);
        }
        let n = w.saturating_mul(h);
        if self.class.len() != n {
            self.class = vec![NONE; n];
        }
    }

    fn compute_sobel(&mut self) {
        let w = self.smooth.width();
        let h = self.smooth.height();
        let src = self.smooth.data();

        let gx = self.gx.data_mut();
        let gy = self.gy.data_mut();
        let mag = self.mag.data_mut();
        gx.fill(0.0);
        gy.fill(0.0);
        mag.fill(0.0);

        if w < 3 || h < 3 {
            return;
        }

        for y in 1..(h - 1) {
            for x in 1..(w - 1) {
                let p00 = src[(y - 1) * w + x - 1];
                let p01 = src[(y - 1) * w + x];
                let p02 = src[(y - 1) * w + x + 1];
                let p10 = src[y * w + x - 1];
                let p12 = src[y * w + x + 1];
                let p20 = src[(y + 1) * w + x - 1];
                let p21 = src[(y + 1) * w + x];
                let p22 = src[(y + 1) * w + x + 1];

                let gxx = (p02 + 2.0 * p12 + p22) - (p00 + 2.0 * p10 + p20);
                let gyy = (p20 + 2.0 * p21 + p22) - (p00 + 2.0 * p01 + p02);

                let idx = y * w + x;
                gx[idx] = gxx;
                gy[idx] = gyy;
                mag[idx] = gxx.hypot(gyy);
            }
        }
    }

    fn non_max_suppression(&mut self) {
        let w = self.mag.width();
        let h = self.mag.height();
        let gx = self.gx.data();
        let gy = self.gy.data();
        let mag = self.mag.data();
        let nms = self.nms.data_mut();

        nms.fill(0.0);
        if w < 3 || h < 3 {
            return;
        }

        const TAN22_5: f32 = 0.414_213_57;
        const TAN67_5: f32 = 2.414_213_7;

        for y in 1..(h - 1) {
            for x in 1..(w - 1) {
                let idx = y * w + x;
                let m = mag[idx];
                if m <= 0.0 {
                    continue;
                }

                let gxx = gx[idx];
                let gyy = gy[idx];
                let ax = gxx.abs();
                let ay = gyy.abs();

                let (i1, i2) = if ay <= ax * TAN22_5 {
                    (idx - 1, idx + 1)
                } else if ay >= ax * TAN67_5 {
                    (idx - w, idx + w)
                } else if gxx * gyy > 0.0 {
                    (idx - w - 1, idx + w + 1)
                } else {
                    (idx - w + 1, idx + w - 1)
                };

                if m >= mag[i1] && m >= mag[i2] {
                    nms[idx] = m;
                }
            }
        }
    }
}

impl Default for CannyDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies `nms` into strong (`>= high`) and weak (`[low, high)`) pixels,
/// then keeps strong pixels and weak pixels touching a strong one.
fn hysteresis(nms: &[f32], w: usize, h: usize, low: f32, high: f32, class: &mut [u8], out: &mut [u8]) {
    for (c, &v) in class.iter_mut().zip(nms) {
        *c = if v <= 0.0 {
            NONE
        } else if v >= high {
            STRONG
        } else if v >= low {
            WEAK
        } else {
            NONE
        };
    }

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let keep = match class[idx] {
                STRONG => true,
                WEAK => {
                    let y0 = y.saturating_sub(1);
                    let y1 = (y + 1).min(h - 1);
                    let x0 = x.saturating_sub(1);
                    let x1 = (x + 1).min(w - 1);
                    (y0..=y1).any(|ny| (x0..=x1).any(|nx| class[ny * w + nx] == STRONG))
                }
                _ => false,
            };
            out[idx] = if keep { 255 } else { 0 };
        }
    }
}

/// One-shot Canny returning an opaque black/white buffer.
pub fn canny(buf: &PixelBuffer, cfg: &CannyConfig) -> Result<PixelBuffer, Error> {
    let mask = CannyDetector::new().detect(buf, cfg)?;
    Ok(PixelBuffer::from_gray_plane(&mask))
}
