//! Flat grey-level morphology on RGBA buffers.
//!
//! The mask is a [`Kernel`] whose non-zero cells form the support. Erosion
//! takes the per-channel minimum over `p + s`, dilation the per-channel
//! maximum over `p - s` (the reflected support), for every support offset `s`
//! relative to the anchor. All four channels are processed, alpha included.
//! Taps outside the image are ignored.
//!
//! With the reflected dilation, `open(x) <= x <= close(x)` holds per channel
//! for any mask, symmetric or not.

use bl_core::{BorderMode, Error, Image, Kernel, PixelBuffer, Rgba, tap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphOp {
    Erode,
    Dilate,
    /// Erode, then dilate.
    Open,
    /// Dilate, then erode.
    Close,
}

impl MorphOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Erode => "erode",
            Self::Dilate => "dilate",
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

fn support(kernel: &Kernel) -> Result<Vec<(isize, isize)>, Error> {
    let s: Vec<_> = kernel.support().collect();
    if s.is_empty() {
        return Err(Error::InvalidKernel("morphology mask has no active cells"));
    }
    Ok(s)
}

fn rank_filter(
    buf: &PixelBuffer,
    offsets: &[(isize, isize)],
    init: u8,
    pick: fn(u8, u8) -> u8,
) -> PixelBuffer {
    let view = buf.as_view();
    Image::from_fn(buf.width(), buf.height(), |x, y| {
        let mut acc: Rgba = [init; 4];
        for &(dx, dy) in offsets {
            if let Some(p) = tap(&view, x as isize + dx, y as isize + dy, &BorderMode::Skip) {
                for c in 0..4 {
                    acc[c] = pick(acc[c], p[c]);
                }
            }
        }
        acc
    })
}

pub fn erode(buf: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer, Error> {
    let offsets = support(kernel)?;
    Ok(rank_filter(buf, &offsets, u8::MAX, u8::min))
}

pub fn dilate(buf: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer, Error> {
    let offsets: Vec<_> = support(kernel)?.into_iter().map(|(dx, dy)| (-dx, -dy)).collect();
    Ok(rank_filter(buf, &offsets, u8::MIN, u8::max))
}

/// Single entry point for the four operations.
pub fn apply(op: MorphOp, buf: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer, Error> {
    match op {
        MorphOp::Erode => erode(buf, kernel),
        MorphOp::Dilate => dilate(buf, kernel),
        MorphOp::Open => dilate(&erode(buf, kernel)?, kernel),
        MorphOp::Close => erode(&dilate(buf, kernel)?, kernel),
    }
}

/// Applies `ops` left to right. An empty sequence returns a copy of the input.
pub fn apply_sequence(ops: &[MorphOp], buf: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer, Error> {
    support(kernel)?;
    let mut out = buf.clone();
    for &op in ops {
        out = apply(op, &out, kernel)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use bl_core::{Image, Kernel, PixelBuffer};

    use super::{MorphOp, apply, apply_sequence, dilate, erode};

    fn textured(w: usize, h: usize) -> PixelBuffer {
        Image::from_fn(w, h, |x, y| {
            let v = ((x * 37 + y * 91 + x * y * 13) % 256) as u8;
            [v, v.wrapping_mul(3), 255 - v, (x * 40 % 256) as u8]
        })
    }

    fn single_white_dot() -> PixelBuffer {
        let mut img = Image::new_fill(5, 5, [0u8, 0, 0, 255]);
        *img.get_mut(2, 2).expect("in bounds") = [255, 255, 255, 255];
        img
    }

    #[test]
    fn open_removes_single_pixel_speck() {
        let k = Kernel::square(3).expect("valid kernel");
        let out = apply(MorphOp::Open, &single_white_dot(), &k).expect("valid mask");
        assert!(out.data().iter().all(|p| p[0] == 0));
    }

    #[test]
    fn close_fills_single_pixel_hole() {
        let mut img = Image::new_fill(5, 5, [255u8, 255, 255, 255]);
        *img.get_mut(2, 2).expect("in bounds") = [0, 0, 0, 255];
        let k = Kernel::square(3).expect("valid kernel");

        let out = apply(MorphOp::Close, &img, &k).expect("valid mask");
        assert_eq!(out.get(2, 2), Some(&[255, 255, 255, 255]));
    }

    #[test]
    fn zero_cells_are_not_part_of_the_mask() {
        let cross = Kernel::from_rows(&[[0.0f32, 1.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]])
            .expect("valid kernel");
        let out = dilate(&single_white_dot(), &cross).expect("valid mask");

        assert_eq!(out.get(2, 1).expect("in bounds")[0], 255);
        assert_eq!(out.get(1, 1).expect("in bounds")[0], 0);
    }

    #[test]
    fn outside_taps_are_ignored_not_padded() {
        let img = Image::new_fill(3, 3, [200u8, 200, 200, 255]);
        let k = Kernel::square(3).expect("valid kernel");
        assert_eq!(erode(&img, &k).expect("valid mask"), img);
        assert_eq!(dilate(&img, &k).expect("valid mask"), img);
    }

    #[test]
    fn open_is_below_and_close_is_above_for_asymmetric_masks() {
        let img = textured(11, 9);
        let masks = [
            Kernel::square(3).expect("valid kernel"),
            Kernel::from_rows(&[[1.0f32, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]])
                .expect("valid kernel"),
            // Even masks are fine for morphology.
            Kernel::from_rows(&[
                [1.0f32, 1.0, 1.0, 1.0],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ])
            .and_then(|k| k.with_anchor(0, 0))
            .expect("valid kernel"),
            Kernel::roberts_x(),
        ];

        for k in &masks {
            let open = apply(MorphOp::Open, &img, k).expect("valid mask");
            let close = apply(MorphOp::Close, &img, k).expect("valid mask");
            for ((o, x), c) in open.data().iter().zip(img.data()).zip(close.data()) {
                for ch in 0..4 {
                    assert!(o[ch] <= x[ch] && x[ch] <= c[ch]);
                }
            }
        }
    }

    #[test]
    fn sequence_applies_in_order() {
        let img = textured(9, 9);
        let k = Kernel::square(3).expect("valid kernel");

        let seq = apply_sequence(&[MorphOp::Erode, MorphOp::Dilate], &img, &k).expect("valid mask");
        let open = apply(MorphOp::Open, &img, &k).expect("valid mask");
        assert_eq!(seq, open);

        let unchanged = apply_sequence(&[], &img, &k).expect("valid mask");
        assert_eq!(unchanged, img);
    }

    #[test]
    fn empty_mask_is_rejected() {
        let k = Kernel::from_rows(&[[0.0f32; 3]; 3]).expect("valid kernel");
        assert!(erode(&single_white_dot(), &k).is_err());
        assert!(apply_sequence(&[], &single_white_dot(), &k).is_err());
    }
}
