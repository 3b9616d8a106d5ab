//! Binary morphology with explicit structuring elements and anchors.
//!
//! Masks are `Image<u8>` with foreground [`FOREGROUND`] (0, dark ridges on a
//! light page) and background [`BACKGROUND`] (255). Taps outside the image
//! read as background, so shapes touching the border erode from it.

use bl_core::{BorderMode, Error, Image, ImageView, PixelBuffer, intensity, tap};

pub const FOREGROUND: u8 = 0;
pub const BACKGROUND: u8 = 255;

const OUTSIDE: BorderMode<u8> = BorderMode::Constant(BACKGROUND);

/// Hit / don't-care grid with an anchor cell.
///
/// The anchor defaults to the first hit in row-major order, or the geometric
/// centre when the element has no hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: usize,
    height: usize,
    hits: Vec<bool>,
    anchor: (usize, usize),
}

impl StructuringElement {
    pub fn new(width: usize, height: usize, hits: Vec<bool>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidKernel("structuring element must not be empty"));
        }
        if hits.len() != width * height {
            return Err(Error::SizeMismatch {
                expected: width * height,
                actual: hits.len(),
            });
        }

        let anchor = hits
            .iter()
            .position(|&h| h)
            .map_or(((width - 1) / 2, (height - 1) / 2), |i| (i % width, i / width));

        Ok(Self {
            width,
            height,
            hits,
            anchor,
        })
    }

    /// Parses rows of `x` (hit) and `.` (don't care).
    pub fn from_pattern(rows: &[&str]) -> Result<Self, Error> {
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut hits = Vec::with_capacity(width * rows.len());
        for row in rows {
            if row.chars().count() != width {
                return Err(Error::InvalidKernel("pattern rows must have equal length"));
            }
            for ch in row.chars() {
                match ch {
                    'x' | 'X' => hits.push(true),
                    '.' => hits.push(false),
                    _ => return Err(Error::InvalidKernel("pattern cells must be 'x' or '.'")),
                }
            }
        }
        Self::new(width, rows.len(), hits)
    }

    pub fn with_anchor(mut self, x: usize, y: usize) -> Result<Self, Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidAnchor { x, y });
        }
        self.anchor = (x, y);
        Ok(self)
    }

    /// Moves the anchor to the geometric centre.
    pub fn centered(self) -> Self {
        let (cx, cy) = ((self.width - 1) / 2, (self.height - 1) / 2);
        Self {
            anchor: (cx, cy),
            ..self
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    pub fn hit_count(&self) -> usize {
        self.hits.iter().filter(|&&h| h).count()
    }

    /// Offsets of hit cells relative to the anchor.
    pub fn hit_offsets(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        let (ax, ay) = (self.anchor.0 as isize, self.anchor.1 as isize);
        self.hits.iter().enumerate().filter(|(_, h)| **h).map(move |(i, _)| {
            ((i % self.width) as isize - ax, (i / self.width) as isize - ay)
        })
    }

    /// Point reflection through the anchor.
    fn reflected_offsets(&self) -> Vec<(isize, isize)> {
        self.hit_offsets().map(|(dx, dy)| (-dx, -dy)).collect()
    }
}

/// Dark pixels (`intensity < threshold`) become foreground.
pub fn binarize_mask(buf: &PixelBuffer, threshold: f32) -> Image<u8> {
    buf.map(|&px| {
        if intensity(px) < threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

pub fn negate(mask: &Image<u8>) -> Image<u8> {
    mask.map(|&v| 255 - v)
}

fn fits(view: &ImageView<'_, u8>, x: usize, y: usize, offsets: &[(isize, isize)]) -> bool {
    offsets.iter().all(|&(dx, dy)| {
        tap(view, x as isize + dx, y as isize + dy, &OUTSIDE) == Some(FOREGROUND)
    })
}

fn touches(view: &ImageView<'_, u8>, x: usize, y: usize, offsets: &[(isize, isize)]) -> bool {
    offsets.iter().any(|&(dx, dy)| {
        tap(view, x as isize + dx, y as isize + dy, &OUTSIDE) == Some(FOREGROUND)
    })
}

/// Foreground where every hit cell, placed with its anchor on the pixel,
/// lands on foreground. An element without hits fits everywhere.
pub fn erode_with_rep(mask: &Image<u8>, se: &StructuringElement) -> Image<u8> {
    let offsets: Vec<_> = se.hit_offsets().collect();
    let view = mask.as_view();
    Image::from_fn(mask.width(), mask.height(), |x, y| {
        if fits(&view, x, y, &offsets) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Foreground where the reflected element touches any foreground pixel.
pub fn dilate_with_rep(mask: &Image<u8>, se: &StructuringElement) -> Image<u8> {
    let offsets = se.reflected_offsets();
    let view = mask.as_view();
    Image::from_fn(mask.width(), mask.height(), |x, y| {
        if touches(&view, x, y, &offsets) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Foreground where `hit` fits the foreground and `miss` fits the background.
pub fn hit_and_miss(
    mask: &Image<u8>,
    hit: &StructuringElement,
    miss: &StructuringElement,
) -> Image<u8> {
    let fg = erode_with_rep(mask, hit);
    let bg = erode_with_rep(&negate(mask), miss);
    let mut out = fg;
    for (o, &b) in out.data_mut().iter_mut().zip(bg.data()) {
        if *o != FOREGROUND || b != FOREGROUND {
            *o = BACKGROUND;
        }
    }
    out
}
