//! Daugman rubber-sheet unwrapping and Gabor phase encoding.
//!
//! ## Unwrapping
//! Row `j` of the normalized image samples the circle of radius
//! `r_p + (r_i - r_p) * j / H` around the pupil centre. Columns map to angles
//! through a [`SectorLayout`] of three angular bands that avoid the eyelids:
//! the upper half of the rows sweeps one wide arc over the full width, the
//! next quarter and the last quarter each sweep a narrower arc over the left
//! half and its mirror (+180°) over the right half.
//!
//! ## Encoding
//! The rows are split into 8 bands. Each band is averaged over its rows,
//! smoothed with a sliding Gaussian window (valid positions only),
//! resampled to [`CODE_COLS`] points and projected on a complex Gabor
//! wavelet centred on every sample. The sign of the real part (`<= 0`) and of
//! the imaginary part (`< 0`) give two bits per sample.

use core::ops::Range;

use bl_core::{
    BorderMode, Image, PixelBuffer, Point2f, Rgba, TRANSPARENT, Vec2f, intensity, sample_nearest,
};
use bl_filter::conv1d::{correlate_valid, resample_floor};
use bl_filter::{GaussianWindow, gabor_response};
use serde::{Deserialize, Serialize};

use crate::boundary::IrisGeometry;
use crate::code::{CODE_COLS, CODE_ROWS, IrisCode};
use crate::error::IrisError;

/// Angular bands of the code; two bits (real, imaginary) per band.
pub const BANDS: usize = CODE_ROWS / 2;

/// Colour of sampled points in the unwrap visualization.
pub const SAMPLE_MARK: Rgba = [255, 50, 140, 255];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaugmanParams {
    /// Gabor carrier frequency, cycles per sample.
    pub frequency: f32,
    /// Width of the sliding Gaussian window.
    pub sigma: f32,
    pub window_size: usize,
    pub normalized_width: usize,
    pub normalized_height: usize,
}

impl Default for DaugmanParams {
    fn default() -> Self {
        Self {
            frequency: 0.75,
            sigma: 5.0,
            window_size: 25,
            normalized_width: 512,
            normalized_height: 128,
        }
    }
}

impl DaugmanParams {
    pub fn validate(&self) -> Result<(), IrisError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(IrisError::InvalidConfig("frequency must be > 0 and finite"));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(IrisError::InvalidConfig("sigma must be > 0 and finite"));
        }
        if self.window_size == 0 {
            return Err(IrisError::InvalidConfig("window_size must be > 0"));
        }
        if self.normalized_width % 2 != 0 || self.normalized_width < self.window_size {
            return Err(IrisError::InvalidConfig(
                "normalized_width must be even and at least window_size",
            ));
        }
        if self.normalized_height == 0 || self.normalized_height % BANDS != 0 {
            return Err(IrisError::InvalidConfig(
                "normalized_height must be a positive multiple of 8",
            ));
        }
        Ok(())
    }
}

/// Arc swept across the columns of one band, in degrees. Angles follow image
/// axes (`x = r cos a`, `y = r sin a`, y downwards), so 90° points down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub start_deg: f32,
    pub sweep_deg: f32,
}

impl Arc {
    /// Angle of column `i` out of `columns`, sweeping clockwise from `start`.
    fn angle(&self, i: usize, columns: usize) -> f32 {
        (self.start_deg - self.sweep_deg * i as f32 / columns as f32).to_radians()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorLayout {
    /// Rows `[0, H/2)`, full width.
    pub upper: Arc,
    /// Rows `[H/2, 3H/4)`, left half plus mirror.
    pub middle: Arc,
    /// Rows `[3H/4, H)`, left half plus mirror.
    pub lower: Arc,
}

impl Default for SectorLayout {
    fn default() -> Self {
        Self {
            upper: Arc {
                start_deg: 165.0,
                sweep_deg: 330.0,
            },
            middle: Arc {
                start_deg: 146.5,
                sweep_deg: 113.0,
            },
            lower: Arc {
                start_deg: 135.0,
                sweep_deg: 90.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolarUnwrap {
    /// `normalized_width × normalized_height`; unsampled pixels are
    /// transparent black.
    pub normalized: PixelBuffer,
    /// Copy of the input with every sampled point marked.
    pub visualization: PixelBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrisEncoding {
    pub code: IrisCode,
    pub unwrap: PolarUnwrap,
}

struct Unwrapper<'a> {
    src: &'a PixelBuffer,
    center: Point2f,
    normalized: PixelBuffer,
    visualization: PixelBuffer,
}

impl Unwrapper<'_> {
    fn sample(&mut self, radius: f32, angle: f32, col: usize, row: usize) {
        let p = self.center + Vec2f::from_polar(radius, angle);
        let src = self.src;
        if let Some(px) = sample_nearest(&src.as_view(), p.x, p.y, &BorderMode::Skip) {
            if let Some(dst) = self.normalized.get_mut(col, row) {
                *dst = [px[0], px[1], px[2], 255];
            }
            self.visualization
                .put(p.x.round() as isize, p.y.round() as isize, SAMPLE_MARK);
        }
    }

    fn full(&mut self, arc: &Arc, rows: Range<usize>, geometry: &IrisGeometry, w: usize, h: usize) {
        for j in rows {
            let r = ring_radius(geometry, j, h);
            for i in 0..w {
                self.sample(r, arc.angle(i, w), i, j);
            }
        }
    }

    fn mirrored(&mut self, arc: &Arc, rows: Range<usize>, geometry: &IrisGeometry, w: usize, h: usize) {
        let half = w / 2;
        for j in rows {
            let r = ring_radius(geometry, j, h);
            for i in 0..half {
                let a = arc.angle(i, half);
                self.sample(r, a, i, j);
                self.sample(r, a + core::f32::consts::PI, i + half, j);
            }
        }
    }
}

fn ring_radius(geometry: &IrisGeometry, row: usize, height: usize) -> f32 {
    let rp = geometry.pupil_radius();
    rp + (geometry.iris_radius() - rp) * row as f32 / height as f32
}

/// Samples the iris annulus into a `normalized_width × normalized_height`
/// rectangle.
pub fn unwrap(
    buf: &PixelBuffer,
    geometry: &IrisGeometry,
    params: &DaugmanParams,
    layout: &SectorLayout,
) -> Result<PolarUnwrap, IrisError> {
    params.validate()?;
    let (w, h) = (params.normalized_width, params.normalized_height);

    let mut u = Unwrapper {
        src: buf,
        center: geometry.center(),
        normalized: Image::new_fill(w, h, TRANSPARENT),
        visualization: buf.clone(),
    };
    u.full(&layout.upper, 0..h / 2, geometry, w, h);
    u.mirrored(&layout.middle, h / 2..3 * h / 4, geometry, w, h);
    u.mirrored(&layout.lower, 3 * h / 4..h, geometry, w, h);

    Ok(PolarUnwrap {
        normalized: u.normalized,
        visualization: u.visualization,
    })
}

/// Column means of rows `rows` of the normalized image.
fn band_profile(normalized: &PixelBuffer, rows: Range<usize>) -> Vec<f32> {
    let w = normalized.width();
    let n = rows.len() as f32;
    let mut acc = vec![0.0f32; w];
    for y in rows {
        for (x, a) in acc.iter_mut().enumerate() {
            if let Some(&px) = normalized.get(x, y) {
                *a += intensity(px);
            }
        }
    }
    for a in &mut acc {
        *a /= n;
    }
    acc
}

/// Two bits per resampled point: row `2b` holds `real <= 0`, row `2b + 1`
/// holds `imag < 0` for band `b`.
pub fn encode_normalized(normalized: &PixelBuffer, params: &DaugmanParams) -> Result<IrisCode, IrisError> {
    params.validate()?;
    if normalized.dims() != (params.normalized_width, params.normalized_height) {
        return Err(IrisError::Image(bl_core::Error::DimensionMismatch {
            expected: (params.normalized_width, params.normalized_height),
            actual: normalized.dims(),
        }));
    }

    let window = GaussianWindow::new(params.window_size, params.sigma);
    let band_height = params.normalized_height / BANDS;
    let mut code = IrisCode::zeros(CODE_ROWS, CODE_COLS)?;

    for band in 0..BANDS {
        let rows = band * band_height..(band + 1) * band_height;
        let smoothed = correlate_valid(&band_profile(normalized, rows), &window.weights);
        let samples = resample_floor(&smoothed, CODE_COLS);

        for k in 0..CODE_COLS {
            let (re, im) = gabor_response(&samples, k as f32, params.frequency);
            code.set(2 * band, k, re <= 0.0);
            code.set(2 * band + 1, k, im < 0.0);
        }
    }
    Ok(code)
}

/// [`unwrap`] followed by [`encode_normalized`].
pub fn encode(
    buf: &PixelBuffer,
    geometry: &IrisGeometry,
    params: &DaugmanParams,
    layout: &SectorLayout,
) -> Result<IrisEncoding, IrisError> {
    let unwrap = unwrap(buf, geometry, params, layout)?;
    let code = encode_normalized(&unwrap.normalized, params)?;
    Ok(IrisEncoding { code, unwrap })
}

#[cfg(test)]
mod tests {
    use bl_core::Image;

    use super::*;
    use crate::pupil::PupilInfo;

    fn geometry(cx: f32, cy: f32, rp: f32, ri: f32) -> IrisGeometry {
        let pupil = PupilInfo {
            center_x: cx,
            center_y: cy,
            radius: rp,
        };
        IrisGeometry::new(pupil, ri).expect("valid geometry")
    }

    fn small_params() -> DaugmanParams {
        DaugmanParams {
            normalized_width: 64,
            normalized_height: 16,
            window_size: 9,
            ..DaugmanParams::default()
        }
    }

    #[test]
    fn params_are_validated() {
        assert!(DaugmanParams::default().validate().is_ok());
        let odd = DaugmanParams {
            normalized_width: 511,
            ..DaugmanParams::default()
        };
        assert!(odd.validate().is_err());
        let short = DaugmanParams {
            normalized_height: 12,
            ..DaugmanParams::default()
        };
        assert!(short.validate().is_err());
        let narrow = DaugmanParams {
            normalized_width: 16,
            ..DaugmanParams::default()
        };
        assert!(narrow.validate().is_err());
    }

    #[test]
    fn default_layout_matches_band_angles() {
        let l = SectorLayout::default();
        assert!((l.upper.angle(0, 512) - 165f32.to_radians()).abs() < 1e-6);
        assert!((l.middle.angle(128, 256) - 90f32.to_radians()).abs() < 1e-5);
        assert!((l.lower.angle(0, 256) - 135f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn unwrap_copies_annulus_pixels() {
        let img = Image::from_fn(100, 100, |x, y| {
            let d = ((x as f32 - 50.0).powi(2) + (y as f32 - 50.0).powi(2)).sqrt();
            if d > 12.0 && d < 40.0 {
                [120u8, 60, 30, 255]
            } else {
                [0, 0, 0, 255]
            }
        });
        let g = geometry(50.0, 50.0, 15.0, 35.0);
        let out = unwrap(&img, &g, &small_params(), &SectorLayout::default()).expect("valid params");

        assert_eq!(out.normalized.dims(), (64, 16));
        assert!(out.normalized.data().iter().all(|&p| p == [120, 60, 30, 255]));
        assert_eq!(out.visualization.dims(), (100, 100));
        assert!(out.visualization.data().iter().any(|&p| p == SAMPLE_MARK));
    }

    #[test]
    fn samples_outside_the_image_stay_transparent() {
        let img = Image::new_fill(40, 40, [200u8, 200, 200, 255]);
        let g = geometry(2.0, 20.0, 10.0, 30.0);
        let out = unwrap(&img, &g, &small_params(), &SectorLayout::default()).expect("valid params");
        assert!(out.normalized.data().iter().any(|&p| p == TRANSPARENT));
        assert!(out.normalized.data().iter().any(|&p| p == [200, 200, 200, 255]));
    }

    #[test]
    fn code_has_fixed_shape() {
        let img = Image::from_fn(120, 120, |x, y| {
            let v = ((x * 31 + y * 17) % 256) as u8;
            [v, v, v, 255]
        });
        let g = geometry(60.0, 60.0, 12.0, 40.0);
        let enc = encode(&img, &g, &small_params(), &SectorLayout::default()).expect("valid params");
        assert_eq!(enc.code.dims(), (CODE_ROWS, CODE_COLS));
    }

    #[test]
    fn flat_band_has_constant_phase_bits() {
        let params = small_params();
        let normalized = Image::new_fill(64, 16, [100u8, 100, 100, 255]);
        let a = encode_normalized(&normalized, &params).expect("valid params");
        let brighter = Image::new_fill(64, 16, [200u8, 200, 200, 255]);
        let b = encode_normalized(&brighter, &params).expect("valid params");
        // Scaling a signal never flips the sign of its projection.
        assert_eq!(a, b);
        for band in 1..BANDS {
            assert_eq!(a.row(2 * band), a.row(0));
            assert_eq!(a.row(2 * band + 1), a.row(1));
        }
    }

    #[test]
    fn wrong_normalized_size_is_rejected() {
        let normalized = Image::new_fill(10, 16, [0u8, 0, 0, 255]);
        assert!(encode_normalized(&normalized, &small_params()).is_err());
    }
}
