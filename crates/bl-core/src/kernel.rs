//! Square weight matrices with an anchor cell.
//!
//! Any size is accepted at construction, which is what morphology masks and
//! the 2×2 Roberts pair need. Symmetric convolution additionally requires an
//! odd size, checked by [`Kernel::require_square_odd`].
//!
//! A kernel is addressed as `weight(kx, ky)` with `kx < width`, `ky < height`.
//! Applying it at pixel `(x, y)` reads the source at
//! `(x + kx - anchor_x, y + ky - anchor_y)`.
//!
//! The default anchor is `((width - 1) / 2, (height - 1) / 2)`: the centre of
//! odd-sized kernels and the top-left cell of a 2×2 Roberts kernel.

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KernelSpec", into = "KernelSpec")]
pub struct Kernel {
    width: usize,
    height: usize,
    weights: Vec<f32>,
    anchor: (usize, usize),
}

/// Serialized form: nested rows plus an optional `[x, y]` anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KernelSpec {
    rows: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor: Option<[usize; 2]>,
}

impl TryFrom<KernelSpec> for Kernel {
    type Error = Error;

    fn try_from(spec: KernelSpec) -> Result<Self, Self::Error> {
        let kernel = Kernel::from_rows(&spec.rows)?;
        match spec.anchor {
            Some([x, y]) => kernel.with_anchor(x, y),
            None => Ok(kernel),
        }
    }
}

impl From<Kernel> for KernelSpec {
    fn from(k: Kernel) -> Self {
        let rows = k.weights.chunks(k.width).map(<[f32]>::to_vec).collect();
        let anchor = (k.anchor != k.default_anchor()).then_some([k.anchor.0, k.anchor.1]);
        KernelSpec { rows, anchor }
    }
}

impl Kernel {
    pub fn new(width: usize, height: usize, weights: Vec<f32>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidKernel("kernel must not be empty"));
        }
        if width != height {
            return Err(Error::InvalidKernel("kernel must be square"));
        }
        if weights.len() != width * height {
            return Err(Error::SizeMismatch {
                expected: width * height,
                actual: weights.len(),
            });
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidKernel("weights must be finite"));
        }

        Ok(Self {
            width,
            height,
            weights,
            anchor: ((width - 1) / 2, (height - 1) / 2),
        })
    }

    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, Error> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if rows.iter().any(|r| r.as_ref().len() != width) {
            return Err(Error::InvalidKernel("rows must have equal length"));
        }
        let weights = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::new(width, rows.len(), weights)
    }

    /// `size × size` kernel filled with ones; the usual flat morphology mask.
    pub fn square(size: usize) -> Result<Self, Error> {
        Self::new(size, size, vec![1.0; size.saturating_mul(size)])
    }

    pub fn with_anchor(mut self, x: usize, y: usize) -> Result<Self, Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidAnchor { x, y });
        }
        self.anchor = (x, y);
        Ok(self)
    }

    pub fn average() -> Self {
        Self::preset([[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]])
    }

    pub fn gaussian() -> Self {
        Self::preset([[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]])
    }

    pub fn sharpen() -> Self {
        Self::preset([[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]])
    }

    pub fn sobel_x() -> Self {
        Self::preset([[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]])
    }

    pub fn sobel_y() -> Self {
        Self::preset([[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]])
    }

    pub fn roberts_x() -> Self {
        Self::preset([[1.0, 0.0], [0.0, -1.0]])
    }

    pub fn roberts_y() -> Self {
        Self::preset([[0.0, 1.0], [-1.0, 0.0]])
    }

    fn preset<const W: usize, const H: usize>(rows: [[f32; W]; H]) -> Self {
        let weights = rows.iter().flatten().copied().collect();
        Self {
            width: W,
            height: H,
            weights,
            anchor: ((W - 1) / 2, (H - 1) / 2),
        }
    }

    fn default_anchor(&self) -> (usize, usize) {
        ((self.width - 1) / 2, (self.height - 1) / 2)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn weight(&self, kx: usize, ky: usize) -> f32 {
        self.weights[ky * self.width + kx]
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Iterates `(dx, dy, weight)` for every cell, offsets relative to the anchor.
    pub fn taps(&self) -> impl Iterator<Item = (isize, isize, f32)> + '_ {
        let (ax, ay) = (self.anchor.0 as isize, self.anchor.1 as isize);
        self.weights.iter().enumerate().map(move |(i, &w)| {
            let kx = (i % self.width) as isize;
            let ky = (i / self.width) as isize;
            (kx - ax, ky - ay, w)
        })
    }

    /// Non-zero cells only: the support of a flat morphology mask.
    pub fn support(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        self.taps().filter(|t| t.2 != 0.0).map(|(dx, dy, _)| (dx, dy))
    }

    /// Centre-anchored convolution needs a square kernel with an odd side.
    pub fn require_square_odd(&self) -> Result<(), Error> {
        if self.width != self.height {
            return Err(Error::InvalidKernel("kernel must be square"));
        }
        if self.width % 2 == 0 {
            return Err(Error::InvalidKernel("kernel size must be odd"));
        }
        Ok(())
    }

    pub fn require_nonzero_sum(&self) -> Result<(), Error> {
        if self.sum().abs() <= f32::EPSILON {
            return Err(Error::InvalidKernel("weights sum to zero"));
        }
        Ok(())
    }
}
