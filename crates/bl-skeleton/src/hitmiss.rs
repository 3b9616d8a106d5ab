//! Thinning by repeated hit-and-miss with the eight compass rotations of a
//! 3×3 edge template. Matched pixels are peeled off one direction at a time.

use bl_core::{Error, Image};
use bl_morph::{BACKGROUND, FOREGROUND, StructuringElement, hit_and_miss};
use log::debug;

/// `(hit, miss)` patterns, rotated clockwise starting with the south edge.
const COMPASS: [([&str; 3], [&str; 3]); 8] = [
    (["...", ".x.", "xxx"], ["xxx", "...", "..."]),
    (["...", "xx.", "xx."], [".xx", "..x", "..."]),
    (["x..", "xx.", "x.."], ["..x", "..x", "..x"]),
    (["xx.", "xx.", "..."], ["...", "..x", ".xx"]),
    (["xxx", ".x.", "..."], ["...", "...", "xxx"]),
    ([".xx", ".xx", "..."], ["...", "x..", "xx."]),
    (["..x", ".xx", "..x"], ["x..", "x..", "x.."]),
    (["...", ".xx", ".xx"], ["xx.", "x..", "..."]),
];

fn compass_pairs() -> Result<Vec<(StructuringElement, StructuringElement)>, Error> {
    COMPASS
        .iter()
        .map(|(hit, miss)| {
            Ok((
                StructuringElement::from_pattern(hit)?.centered(),
                StructuringElement::from_pattern(miss)?.centered(),
            ))
        })
        .collect()
}

/// Thins the foreground (`0`) of `mask`. Stops early once a full round of
/// the eight templates removes nothing; such a round is a fixed point, so the
/// result equals running all `iterations` rounds.
pub fn thin_hit_and_miss(mask: &Image<u8>, iterations: usize) -> Result<Image<u8>, Error> {
    let pairs = compass_pairs()?;
    let mut current = mask.clone();

    for iter in 0..iterations {
        let mut removed = 0usize;
        for (hit, miss) in &pairs {
            let matched = hit_and_miss(&current, hit, miss);
            for (px, &m) in current.data_mut().iter_mut().zip(matched.data()) {
                if m == FOREGROUND {
                    *px = BACKGROUND;
                    removed += 1;
                }
            }
        }
        if removed == 0 {
            debug!("hit-and-miss thinning converged after {iter} iterations");
            break;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use bl_core::Image;
    use bl_morph::{BACKGROUND, FOREGROUND};

    use super::{compass_pairs, thin_hit_and_miss};

    #[test]
    fn templates_are_centred_and_disjoint() {
        for (hit, miss) in compass_pairs().expect("valid templates") {
            assert_eq!(hit.anchor(), (1, 1));
            assert_eq!(miss.anchor(), (1, 1));
            assert_eq!(hit.hit_count() + miss.hit_count(), 7);
            let h: Vec<_> = hit.hit_offsets().collect();
            assert!(miss.hit_offsets().all(|o| !h.contains(&o)));
        }
    }

    #[test]
    fn single_pixel_survives() {
        let mut mask = Image::new_fill(5, 5, BACKGROUND);
        *mask.get_mut(2, 2).expect("in bounds") = FOREGROUND;
        let out = thin_hit_and_miss(&mask, 10).expect("valid templates");
        assert_eq!(out, mask);
    }

    #[test]
    fn converged_output_is_a_fixed_point() {
        let mask = Image::from_fn(16, 11, |x, y| {
            if (2..14).contains(&x) && (3..8).contains(&y) { FOREGROUND } else { BACKGROUND }
        });
        let thin = thin_hit_and_miss(&mask, 50).expect("valid templates");
        assert_ne!(thin, mask);
        assert_eq!(thin_hit_and_miss(&thin, 1).expect("valid templates"), thin);
        assert_eq!(thin_hit_and_miss(&mask, 500).expect("valid templates"), thin);
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mask = Image::from_fn(6, 6, |x, _| if x < 3 { FOREGROUND } else { BACKGROUND });
        assert_eq!(thin_hit_and_miss(&mask, 0).expect("valid templates"), mask);
    }
}
