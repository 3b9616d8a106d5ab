//! RGBA pixel buffers.

use crate::{Error, Image};

/// One pixel: `[r, g, b, a]`.
pub type Rgba = [u8; 4];

/// Row-major RGBA raster, the unit every primitive consumes and produces.
pub type PixelBuffer = Image<Rgba>;

pub const BLACK: Rgba = [0, 0, 0, 255];
pub const WHITE: Rgba = [255, 255, 255, 255];
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Mean of the colour channels; alpha is ignored.
#[inline]
pub fn intensity(px: Rgba) -> f32 {
    (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0
}

/// Rounds to nearest and saturates into `0..=255`. NaN maps to 0.
#[inline]
pub fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Grey pixel with the given value in every colour channel and the given alpha.
#[inline]
pub fn gray(v: u8, alpha: u8) -> Rgba {
    [v, v, v, alpha]
}

impl Image<Rgba> {
    /// Wraps an interleaved RGBA byte buffer. The length must be exactly
    /// `width * height * 4`.
    pub fn from_rgba_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, Error> {
        let pixels = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;
        let expected = pixels.checked_mul(4).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;

        if bytes.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let data = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Image::from_vec(width, height, data)
    }

    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.data().iter().flatten().copied().collect()
    }

    pub fn intensity_plane(&self) -> Image<f32> {
        self.map(|&px| intensity(px))
    }

    /// Opaque grey buffer from a single-channel plane.
    pub fn from_gray_plane(plane: &Image<u8>) -> Self {
        plane.map(|&v| gray(v, 255))
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelBuffer, clamp_u8, intensity};
    use crate::{Error, Image};

    #[test]
    fn rgba_bytes_round_trip_and_length_check() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let buf = PixelBuffer::from_rgba_bytes(2, 1, &bytes).expect("valid buffer");
        assert_eq!(buf.data(), &[[1, 2, 3, 4], [5, 6, 7, 8]]);
        assert_eq!(buf.to_rgba_bytes(), bytes.to_vec());

        let err = PixelBuffer::from_rgba_bytes(2, 2, &bytes).unwrap_err();
        assert_eq!(
            err,
            Error::SizeMismatch {
                expected: 16,
                actual: 8
            }
        );
    }

    #[test]
    fn intensity_ignores_alpha() {
        assert!((intensity([30, 60, 90, 0]) - 60.0).abs() < 1e-6);
        assert!((intensity([30, 60, 90, 255]) - 60.0).abs() < 1e-6);
    }

    #[test]
    fn clamp_rounds_and_saturates() {
        assert_eq!(clamp_u8(-3.0), 0);
        assert_eq!(clamp_u8(127.5), 128);
        assert_eq!(clamp_u8(300.0), 255);
        assert_eq!(clamp_u8(f32::NAN), 0);
    }

    #[test]
    fn gray_plane_is_opaque() {
        let plane = Image::from_vec(2, 1, vec![0u8, 200]).expect("valid image");
        let buf = PixelBuffer::from_gray_plane(&plane);
        assert_eq!(buf.data(), &[[0, 0, 0, 255], [200, 200, 200, 255]]);
    }
}
