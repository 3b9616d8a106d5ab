//! Ridge skeletonization for fingerprint-like images.
//!
//! The input is binarized at intensity 128. [`Polarity`] says which side of
//! that level is the ridge; the output uses the same polarity with opaque
//! pixels, so a dark-ridge image comes back as dark one-pixel lines on white.
//!
//! Two thinning algorithms are available:
//! - [`hitmiss`]: eight compass hit-and-miss templates per iteration.
//! - [`kmm`]: contour / elbow / stub classification with lookup tables.

pub mod hitmiss;
pub mod kmm;

use bl_core::{Error, Image, PixelBuffer, gray, intensity};
use bl_morph::{BACKGROUND, FOREGROUND, negate};
use serde::{Deserialize, Serialize};

pub use hitmiss::thin_hit_and_miss;
pub use kmm::thin_kmm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinningAlgorithm {
    #[default]
    HitAndMiss,
    Kmm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Ridges darker than 128 on a light background.
    #[default]
    DarkOnLight,
    LightOnDark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonConfig {
    pub algorithm: ThinningAlgorithm,
    /// Upper bound on thinning rounds. Both algorithms return as soon as a
    /// round removes nothing, with the same output a full run would give.
    pub iterations: usize,
    pub polarity: Polarity,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            algorithm: ThinningAlgorithm::default(),
            iterations: 10,
            polarity: Polarity::default(),
        }
    }
}

/// Ridge mask with ridges as [`FOREGROUND`].
pub fn ridge_mask(buf: &PixelBuffer, polarity: Polarity) -> Image<u8> {
    let dark = buf.map(|&px| {
        if intensity(px) < 128.0 {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });
    match polarity {
        Polarity::DarkOnLight => dark,
        Polarity::LightOnDark => negate(&dark),
    }
}

fn render(mask: &Image<u8>, polarity: Polarity) -> PixelBuffer {
    let mask = match polarity {
        Polarity::DarkOnLight => mask.clone(),
        Polarity::LightOnDark => negate(mask),
    };
    mask.map(|&v| gray(v, 255))
}

pub fn skeletonize(buf: &PixelBuffer, cfg: &SkeletonConfig) -> Result<PixelBuffer, Error> {
    let mask = ridge_mask(buf, cfg.polarity);
    let thin = match cfg.algorithm {
        ThinningAlgorithm::HitAndMiss => thin_hit_and_miss(&mask, cfg.iterations)?,
        ThinningAlgorithm::Kmm => thin_kmm(&mask, cfg.iterations),
    };
    Ok(render(&thin, cfg.polarity))
}

#[cfg(test)]
mod tests {
    use bl_core::{Image, PixelBuffer};

    use super::*;

    /// 40×15 canvas with a 30×5 bar, `ink` on `paper`.
    fn bar(ink: u8, paper: u8) -> PixelBuffer {
        Image::from_fn(40, 15, |x, y| {
            let v = if (5..35).contains(&x) && (5..10).contains(&y) {
                ink
            } else {
                paper
            };
            [v, v, v, 255]
        })
    }

    /// Rows 5..=9 of the 40×15 output, `#` for ridge; all other rows are empty.
    fn ridge_rows(out: &PixelBuffer, ridge: u8) -> Vec<String> {
        for y in (0..5).chain(10..15) {
            assert!((0..40).all(|x| out.get(x, y).expect("in bounds")[0] != ridge), "row {y}");
        }
        (5..10)
            .map(|y| {
                (0..40)
                    .map(|x| if out.get(x, y).expect("in bounds")[0] == ridge { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    // Compass thinning leaves a two-pixel fork at each end of the centreline.
    const HIT_AND_MISS_BAR: [&str; 5] = [
        ".....#............................#.....",
        ".....##..........................##.....",
        "......############################......",
        ".....##..........................#......",
        ".....#...........................##.....",
    ];

    // KMM trims the ends to x 7..=32 and keeps one spur below the east end.
    const KMM_BAR: [&str; 5] = [
        "........................................",
        "........................................",
        ".......##########################.......",
        ".................................#......",
        "........................................",
    ];

    #[test]
    fn five_pixel_bar_thins_to_its_centreline() {
        for (algorithm, expected) in [
            (ThinningAlgorithm::HitAndMiss, HIT_AND_MISS_BAR),
            (ThinningAlgorithm::Kmm, KMM_BAR),
        ] {
            for iterations in [20, 50] {
                let cfg = SkeletonConfig {
                    algorithm,
                    iterations,
                    ..SkeletonConfig::default()
                };
                let out = skeletonize(&bar(0, 255), &cfg).expect("valid templates");
                assert_eq!(out.dims(), (40, 15));
                assert_eq!(ridge_rows(&out, 0), expected, "{algorithm:?} x{iterations}");
            }
        }
    }

    #[test]
    fn skeleton_sizes_and_end_points() {
        let count = |out: &PixelBuffer| out.data().iter().filter(|p| p[0] == 0).count();
        let hm = skeletonize(&bar(0, 255), &SkeletonConfig::default()).expect("valid templates");
        assert_eq!(count(&hm), 40);
        for (x, y) in [(5, 5), (34, 5), (5, 9), (34, 9), (6, 7), (33, 7)] {
            assert_eq!(hm.get(x, y).expect("in bounds")[0], 0, "({x}, {y})");
        }

        let cfg = SkeletonConfig {
            algorithm: ThinningAlgorithm::Kmm,
            ..SkeletonConfig::default()
        };
        let kmm = skeletonize(&bar(0, 255), &cfg).expect("valid templates");
        assert_eq!(count(&kmm), 27);
        for (x, y) in [(7, 7), (32, 7), (33, 8)] {
            assert_eq!(kmm.get(x, y).expect("in bounds")[0], 0, "({x}, {y})");
        }
        assert_eq!(kmm.get(6, 7).expect("in bounds")[0], 255);
        assert_eq!(kmm.get(33, 7).expect("in bounds")[0], 255);
    }

    #[test]
    fn light_ridges_keep_their_polarity() {
        let cfg = SkeletonConfig {
            algorithm: ThinningAlgorithm::Kmm,
            iterations: 20,
            polarity: Polarity::LightOnDark,
        };
        let out = skeletonize(&bar(255, 0), &cfg).expect("valid templates");
        assert_eq!(ridge_rows(&out, 255), KMM_BAR);
        assert!(out.data().iter().all(|p| p[3] == 255));
    }

    #[test]
    fn blank_page_stays_blank() {
        let page = Image::new_fill(12, 9, [240u8, 240, 240, 255]);
        for algorithm in [ThinningAlgorithm::HitAndMiss, ThinningAlgorithm::Kmm] {
            let cfg = SkeletonConfig {
                algorithm,
                ..SkeletonConfig::default()
            };
            let out = skeletonize(&page, &cfg).expect("valid templates");
            assert!(out.data().iter().all(|&p| p == [255, 255, 255, 255]));
        }
    }

    #[test]
    fn config_reads_snake_case_json() {
        let cfg: SkeletonConfig =
            serde_json::from_str(r#"{"algorithm": "kmm", "polarity": "light_on_dark"}"#)
                .expect("valid json");
        assert_eq!(cfg.algorithm, ThinningAlgorithm::Kmm);
        assert_eq!(cfg.polarity, Polarity::LightOnDark);
        assert_eq!(cfg.iterations, 10);
    }
}
