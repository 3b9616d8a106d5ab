//! Shift-tolerant Hamming comparison of iris codes.
//!
//! Head tilt rotates the iris, which moves the code columns cyclically. The
//! second code is read at every column shift in `[-max_shift, max_shift]`
//! and the smallest mismatch fraction wins.

use bl_core::{BLACK, Image, PixelBuffer, Rgba, WHITE};
use serde::{Deserialize, Serialize};

use crate::code::IrisCode;
use crate::error::IrisError;

pub const MISMATCH: Rgba = [255, 0, 0, 255];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Distances strictly below this are a match.
    pub threshold: f32,
    pub max_shift: usize,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            max_shift: 8,
        }
    }
}

impl ComparatorConfig {
    pub fn validate(&self) -> Result<(), IrisError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(IrisError::InvalidConfig("threshold must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Per-bit mismatches at the best shift, with the bits of the first code.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffMap {
    rows: usize,
    cols: usize,
    mismatch: Vec<bool>,
    bits: Vec<bool>,
}

impl DiffMap {
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_mismatch(&self, row: usize, col: usize) -> bool {
        self.mismatch[row * self.cols + col]
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatch.iter().filter(|&&m| m).count()
    }

    /// Red for a mismatch, otherwise black for 1 and white for 0.
    pub fn render(&self, scale: usize) -> PixelBuffer {
        let scale = scale.max(1);
        Image::from_fn(self.cols * scale, self.rows * scale, |x, y| {
            let idx = (y / scale) * self.cols + x / scale;
            if self.mismatch[idx] {
                MISMATCH
            } else if self.bits[idx] {
                BLACK
            } else {
                WHITE
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub is_match: bool,
    /// Fraction of differing bits at the best shift.
    pub distance: f32,
    /// Column offset applied to the second code.
    pub shift: i32,
    #[serde(skip)]
    pub diff: DiffMap,
}

fn shifted_col(col: usize, shift: i32, cols: usize) -> usize {
    (col as i64 + shift as i64).rem_euclid(cols as i64) as usize
}

/// Fraction of bits where `a[i][j] != b[i][(j + shift) mod cols]`.
pub fn hamming_distance(a: &IrisCode, b: &IrisCode, shift: i32) -> Result<f32, IrisError> {
    ensure_same_shape(a, b)?;
    let (rows, cols) = a.dims();
    let mut diff = 0usize;
    for i in 0..rows {
        for j in 0..cols {
            if a.get(i, j) != b.get(i, shifted_col(j, shift, cols)) {
                diff += 1;
            }
        }
    }
    Ok(diff as f32 / a.len() as f32)
}

fn ensure_same_shape(a: &IrisCode, b: &IrisCode) -> Result<(), IrisError> {
    if a.dims() != b.dims() {
        return Err(IrisError::CodeShapeMismatch {
            expected: a.dims(),
            actual: b.dims(),
        });
    }
    Ok(())
}

/// Shifts in the order `0, -1, 1, -2, 2, ...` so a strict minimum keeps the
/// smallest magnitude on ties.
fn shift_order(max_shift: usize) -> impl Iterator<Item = i32> {
    let m = max_shift as i32;
    core::iter::once(0).chain((1..=m).flat_map(|s| [-s, s]))
}

pub fn compare(a: &IrisCode, b: &IrisCode, cfg: &ComparatorConfig) -> Result<ComparisonReport, IrisError> {
    cfg.validate()?;
    ensure_same_shape(a, b)?;

    let mut best_shift = 0;
    let mut best = f32::INFINITY;
    for shift in shift_order(cfg.max_shift) {
        let d = hamming_distance(a, b, shift)?;
        if d < best {
            best = d;
            best_shift = shift;
        }
    }

    let (rows, cols) = a.dims();
    let mut mismatch = Vec::with_capacity(a.len());
    let mut bits = Vec::with_capacity(a.len());
    for i in 0..rows {
        for j in 0..cols {
            let bit = a.get(i, j);
            bits.push(bit);
            mismatch.push(bit != b.get(i, shifted_col(j, best_shift, cols)));
        }
    }

    Ok(ComparisonReport {
        is_match: best < cfg.threshold,
        distance: best,
        shift: best_shift,
        diff: DiffMap {
            rows,
            cols,
            mismatch,
            bits,
        },
    })
}
