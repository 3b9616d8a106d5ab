use bl_core::{BLACK, Image, PixelBuffer, WHITE};
use serde::{Deserialize, Serialize};

use crate::error::IrisError;

/// Rows of an encoded iris: 8 angular bands, real and imaginary bit each.
pub const CODE_ROWS: usize = 16;
/// Gabor samples per band.
pub const CODE_COLS: usize = 128;

/// Row-major binary matrix.
///
/// Serialized as nested rows of `0` / `1` numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct IrisCode {
    rows: usize,
    cols: usize,
    bits: Vec<bool>,
}

impl IrisCode {
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, IrisError> {
        if rows == 0 || cols == 0 {
            return Err(IrisError::InvalidCode("code must have at least one bit"));
        }
        Ok(Self {
            rows,
            cols,
            bits: vec![false; rows * cols],
        })
    }

    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, IrisError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut code = Self::zeros(rows.len(), cols)?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(IrisError::InvalidCode("rows must have equal length"));
            }
            for (c, &v) in row.iter().enumerate() {
                let bit = match v {
                    0 => false,
                    1 => true,
                    _ => return Err(IrisError::InvalidCode("bits must be 0 or 1")),
                };
                code.set(r, c, bit);
            }
        }
        Ok(code)
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.bits
            .chunks(self.cols)
            .map(|row| row.iter().map(|&b| u8::from(b)).collect())
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Panics when out of range.
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(row < self.rows && col < self.cols, "bit index out of range");
        self.bits[row * self.cols + col]
    }

    /// Panics when out of range.
    pub fn set(&mut self, row: usize, col: usize, bit: bool) {
        assert!(row < self.rows && col < self.cols, "bit index out of range");
        self.bits[row * self.cols + col] = bit;
    }

    pub fn row(&self, row: usize) -> &[bool] {
        &self.bits[row * self.cols..(row + 1) * self.cols]
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// One `scale × scale` block per bit: black for 1, white for 0.
    pub fn render(&self, scale: usize) -> PixelBuffer {
        let scale = scale.max(1);
        Image::from_fn(self.cols * scale, self.rows * scale, |x, y| {
            if self.get(y / scale, x / scale) {
                BLACK
            } else {
                WHITE
            }
        })
    }
}

impl TryFrom<Vec<Vec<u8>>> for IrisCode {
    type Error = IrisError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<IrisCode> for Vec<Vec<u8>> {
    fn from(code: IrisCode) -> Self {
        code.to_rows()
    }
}
