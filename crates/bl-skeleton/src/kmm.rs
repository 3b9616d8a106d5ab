//! KMM thinning.
//!
//! Works on a plane padded by one zero pixel where ridge pixels are non-zero.
//! Each iteration:
//! 1. every ridge pixel with an empty 8-neighbour becomes 2 (contour);
//! 2. every 2 whose four edge neighbours are set becomes 3 (elbow);
//! 3. every ridge pixel whose neighbourhood code is in [`FOUR_CODES`] becomes
//!    4 and is removed;
//! 4. 2s, then 3s, whose code is in [`DELETE_CODES`] are removed in place,
//!    scanning row-major so earlier removals affect later decisions;
//! 5. survivors are reset to 1.
//!
//! Steps 1-3 read the plane as it was before the step.
//!
//! The neighbourhood code sums, for every non-zero neighbour, its weight
//! clockwise from the top: `1, 2, 4, ..., 128`.

use bl_core::Image;
use bl_morph::{BACKGROUND, FOREGROUND};
use log::debug;

const EMPTY: u8 = 0;
const RIDGE: u8 = 1;
const CONTOUR: u8 = 2;
const ELBOW: u8 = 3;
const STUB: u8 = 4;

/// `(dx, dy)` of the eight neighbours in code-weight order.
const NEIGHBOURS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Two to four consecutive neighbours: a stub sticking out of a ridge.
pub const FOUR_CODES: [u8; 24] = [
    3, 6, 12, 24, 48, 96, 192, 129, 7, 14, 28, 56, 112, 224, 193, 131, 15, 30, 60, 120, 240, 225,
    195, 135,
];

pub const DELETE_CODES: [u8; 120] = [
    3, 5, 7, 12, 13, 14, 15, 20, 21, 22, 23, 28, 29, 30, 31, 48, 52, 53, 54, 55, 56, 60, 61, 62, 63,
    65, 67, 69, 71, 77, 79, 80, 81, 83, 84, 85, 86, 87, 88, 89, 91, 92, 93, 94, 95, 97, 99, 101,
    103, 109, 111, 112, 113, 115, 116, 117, 118, 119, 120, 121, 123, 124, 125, 126, 127, 131, 133,
    135, 141, 143, 149, 151, 157, 159, 181, 183, 189, 191, 192, 193, 195, 197, 199, 205, 207, 208,
    209, 211, 212, 213, 214, 215, 216, 217, 219, 220, 221, 222, 223, 224, 225, 227, 229, 231, 237,
    239, 240, 241, 243, 244, 245, 246, 247, 248, 249, 251, 252, 253, 254, 255,
];

const fn lookup(codes: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < codes.len() {
        table[codes[i] as usize] = true;
        i += 1;
    }
    table
}

static IS_FOUR: [bool; 256] = lookup(&FOUR_CODES);
static IS_DELETE: [bool; 256] = lookup(&DELETE_CODES);

struct Plane {
    w: usize,
    h: usize,
    px: Vec<u8>,
}

impl Plane {
    fn code(&self, x: usize, y: usize) -> u8 {
        NEIGHBOURS
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, &(dx, dy))| {
                let nx = (x as isize + dx) as usize;
                let ny = (y as isize + dy) as usize;
                if self.px[ny * self.w + nx] != EMPTY {
                    acc | (1 << bit)
                } else {
                    acc
                }
            })
    }

    fn edge_neighbours_set(&self, x: usize, y: usize) -> bool {
        let w = self.w;
        let i = y * w + x;
        [i - w, i + 1, i + w, i - 1]
            .iter()
            .all(|&n| self.px[n] != EMPTY)
    }

    /// Sets every interior pixel matching `rule` to `value`; all pixels read
    /// the plane as it was before the pass.
    fn mark(&mut self, value: u8, rule: impl Fn(&Self, usize, usize) -> bool) {
        let mut hits = Vec::new();
        for y in 1..self.h - 1 {
            for x in 1..self.w - 1 {
                if rule(self, x, y) {
                    hits.push(y * self.w + x);
                }
            }
        }
        for i in hits {
            self.px[i] = value;
        }
    }

    /// Removes pixels in state `state` with a deletable code, in scan order.
    fn delete_sequential(&mut self, state: u8) -> usize {
        let mut removed = 0;
        for y in 1..self.h - 1 {
            for x in 1..self.w - 1 {
                let i = y * self.w + x;
                if self.px[i] == state && IS_DELETE[self.code(x, y) as usize] {
                    self.px[i] = EMPTY;
                    removed += 1;
                }
            }
        }
        removed
    }

    fn iterate(&mut self) -> usize {
        self.mark(CONTOUR, |p, x, y| {
            p.px[y * p.w + x] != EMPTY && p.code(x, y) != u8::MAX
        });
        self.mark(ELBOW, |p, x, y| {
            p.px[y * p.w + x] == CONTOUR && p.edge_neighbours_set(x, y)
        });
        self.mark(STUB, |p, x, y| {
            p.px[y * p.w + x] != EMPTY && IS_FOUR[p.code(x, y) as usize]
        });

        let mut removed = 0;
        for v in &mut self.px {
            if *v == STUB {
                *v = EMPTY;
                removed += 1;
            }
        }
        removed += self.delete_sequential(CONTOUR);
        removed += self.delete_sequential(ELBOW);

        for v in &mut self.px {
            if *v != EMPTY {
                *v = RIDGE;
            }
        }
        removed
    }
}

/// Thins the foreground (`0`) of `mask`. Stops early once an iteration
/// removes nothing; later iterations would leave the plane unchanged, so the
/// result equals running all `iterations`.
pub fn thin_kmm(mask: &Image<u8>, iterations: usize) -> Image<u8> {
    let bitmap = mask
        .map(|&v| if v == FOREGROUND { RIDGE } else { EMPTY })
        .padded(1, EMPTY);
    let mut plane = Plane {
        w: bitmap.width(),
        h: bitmap.height(),
        px: bitmap.into_vec(),
    };

    for iter in 0..iterations {
        if plane.iterate() == 0 {
            debug!("KMM thinning converged after {iter} iterations");
            break;
        }
    }

    let (w, h) = (plane.w, plane.h);
    Image::from_fn(w - 2, h - 2, |x, y| {
        if plane.px[(y + 1) * w + x + 1] != EMPTY {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}
