//! Pupil localization.
//!
//! Two stages:
//! 1. [`get_pupil`] turns an eye image into a mask where the pupil is a dark
//!    blob on a white page: global binarization relative to the mean
//!    intensity, a chamfer distance transform, a second binarization and an
//!    optional morphology sequence.
//! 2. [`detect_pupil_with_projections`] finds that blob from the row and
//!    column counts of dark pixels.

use bl_core::analysis::mean_intensity;
use bl_core::color::binarize;
use bl_core::{Kernel, PixelBuffer, Point2f, intensity};
use bl_filter::conv1d::smooth_clipped;
use bl_morph::{MorphOp, apply_sequence, distance_transform};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{IrisError, ProjectionAxis, PupilFailure};

/// Projection values above this fraction of `min(width, height)` are
/// treated as eyelid/frame artefacts and zeroed.
const PROJECTION_CAP: f32 = 0.8;
/// Smoothed projection values must exceed this to start a region.
const DENSITY_FLOOR: f32 = 10.0;
/// Regions narrower than this are only used when nothing wider exists.
const MIN_SPAN: usize = 5;
/// Span beyond which a wider region no longer scores higher per pixel.
const SPAN_SATURATION: usize = 50;
const MAX_ASPECT: f32 = 2.0;
/// Minimum distance of the centre to every edge, in radii.
const BORDER_MARGIN: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PupilConfig {
    /// Divisor of the mean intensity used as the first binarization level.
    pub xl: f32,
    /// Level applied to the rendered distance transform.
    pub threshold: f32,
    /// Morphology applied to the final mask, in order.
    pub ops: Vec<MorphOp>,
    pub kernel: Kernel,
}

impl Default for PupilConfig {
    fn default() -> Self {
        Self {
            xl: 4.5,
            threshold: 216.0,
            ops: Vec::new(),
            kernel: Kernel::average(),
        }
    }
}

impl PupilConfig {
    /// Settings tuned for close-up eye photographs: a lower distance level
    /// and a clean-up sequence that removes eyelash fragments.
    pub fn eye_preset() -> Self {
        let mut ops = vec![MorphOp::Erode; 10];
        ops.extend([MorphOp::Dilate; 15]);
        ops.extend([MorphOp::Erode; 8]);
        Self {
            xl: 4.0,
            threshold: 200.0,
            ops,
            kernel: Kernel::average(),
        }
    }

    pub fn validate(&self) -> Result<(), IrisError> {
        if !(self.xl.is_finite() && self.xl > 0.0) {
            return Err(IrisError::InvalidConfig("xl must be > 0 and finite"));
        }
        if !self.threshold.is_finite() {
            return Err(IrisError::InvalidConfig("threshold must be finite"));
        }
        if self.kernel.support().next().is_none() {
            return Err(IrisError::InvalidConfig("kernel must have active cells"));
        }
        Ok(())
    }
}

/// Localized pupil in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PupilInfo {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
}

impl PupilInfo {
    pub fn center(&self) -> Point2f {
        Point2f::new(self.center_x, self.center_y)
    }
}

/// Pupil mask: the pupil dark, everything else white.
pub fn get_pupil(buf: &PixelBuffer, cfg: &PupilConfig) -> Result<PixelBuffer, IrisError> {
    cfg.validate()?;
    let p = mean_intensity(buf);
    let coarse = binarize(buf, p / cfg.xl);
    let distance = distance_transform(&coarse);
    let mask = binarize(&distance, cfg.threshold);
    Ok(apply_sequence(&cfg.ops, &mask, &cfg.kernel)?)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Region {
    start: usize,
    /// Inclusive.
    end: usize,
    sum: f32,
}

impl Region {
    fn span(&self) -> usize {
        self.end - self.start
    }

    fn midpoint(&self) -> f32 {
        (self.start as f32 + self.span() as f32 / 2.0).round()
    }

    fn half_span(&self) -> f32 {
        self.span() as f32 / 2.0
    }
}

fn dark_projections(buf: &PixelBuffer) -> (Vec<f32>, Vec<f32>) {
    let (w, h) = buf.dims();
    let mut rows = vec![0.0f32; h];
    let mut cols = vec![0.0f32; w];
    for (y, row) in buf.data().chunks(w.max(1)).enumerate().take(h) {
        for (x, &px) in row.iter().enumerate() {
            if intensity(px) < 128.0 {
                rows[y] += 1.0;
                cols[x] += 1.0;
            }
        }
    }
    (rows, cols)
}

fn condition(mut projection: Vec<f32>, cap: f32) -> Vec<f32> {
    for v in &mut projection {
        if *v > cap {
            *v = 0.0;
        }
    }
    let mut smooth = vec![0.0f32; projection.len()];
    smooth_clipped(&projection, &[1.0, 1.0, 1.0], &mut smooth);
    smooth
}

fn density_regions(projection: &[f32]) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut current: Option<Region> = None;

    for (i, &v) in projection.iter().enumerate() {
        if v > DENSITY_FLOOR {
            let r = current.get_or_insert(Region {
                start: i,
                end: i,
                sum: 0.0,
            });
            r.end = i;
            r.sum += v;
        } else if let Some(r) = current.take() {
            regions.push(r);
        }
    }
    regions.extend(current);
    regions
}

fn best_region(regions: &[Region]) -> Option<Region> {
    let mut best: Option<(Region, f32)> = None;
    for r in regions.iter().filter(|r| r.span() >= MIN_SPAN) {
        let span = r.span();
        let score = r.sum / span as f32 * span.min(SPAN_SATURATION) as f32;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((*r, score));
        }
    }
    best.map(|(r, _)| r).or_else(|| regions.first().copied())
}

fn locate(projection: Vec<f32>, cap: f32, axis: ProjectionAxis) -> Result<Region, PupilFailure> {
    let smooth = condition(projection, cap);
    let regions = density_regions(&smooth);
    debug!("pupil {axis:?} projection: {} dense regions", regions.len());
    best_region(&regions).ok_or(PupilFailure::NoRegion { axis })
}

fn check_border(center: Point2f, radius: f32, w: usize, h: usize) -> Result<(), PupilFailure> {
    let margin = radius * BORDER_MARGIN;
    if center.x < margin
        || center.y < margin
        || center.x > w as f32 - margin
        || center.y > h as f32 - margin
    {
        return Err(PupilFailure::NearBorder { center, radius });
    }
    Ok(())
}

/// Finds the dark blob of a pupil mask from its row and column projections.
pub fn detect_pupil_with_projections(buf: &PixelBuffer) -> Result<PupilInfo, PupilFailure> {
    let (w, h) = buf.dims();
    let cap = PROJECTION_CAP * w.min(h) as f32;
    let (rows, cols) = dark_projections(buf);

    let vertical = locate(rows, cap, ProjectionAxis::Rows)?;
    let horizontal = locate(cols, cap, ProjectionAxis::Columns)?;

    let half_height = vertical.half_span();
    let half_width = horizontal.half_span();
    let lo = half_width.min(half_height);
    let hi = half_width.max(half_height);
    if lo <= 0.0 || hi / lo > MAX_ASPECT {
        return Err(PupilFailure::NonCircular {
            half_width,
            half_height,
        });
    }

    let center = Point2f::new(horizontal.midpoint(), vertical.midpoint());
    let radius = ((half_width + half_height) / 2.0).round();

    check_border(center, radius, w, h)?;

    Ok(PupilInfo {
        center_x: center.x,
        center_y: center.y,
        radius,
    })
}

/// [`get_pupil`] followed by [`detect_pupil_with_projections`].
pub fn localize_pupil(buf: &PixelBuffer, cfg: &PupilConfig) -> Result<PupilInfo, IrisError> {
    let mask = get_pupil(buf, cfg)?;
    match detect_pupil_with_projections(&mask) {
        Ok(info) => {
            debug!(
                "pupil at ({}, {}) radius {}",
                info.center_x, info.center_y, info.radius
            );
            Ok(info)
        }
        Err(failure) => {
            debug!("pupil localization failed: {failure}");
            Err(failure.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use bl_core::{Image, PixelBuffer};

    use super::*;

    fn disc(w: usize, h: usize, cx: f32, cy: f32, r: f32) -> PixelBuffer {
        Image::from_fn(w, h, |x, y| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let v = if dx * dx + dy * dy <= r * r { 0 } else { 255 };
            [v, v, v, 255]
        })
    }

    #[test]
    fn regions_split_on_density_floor() {
        let p = [0.0f32, 12.0, 15.0, 3.0, 20.0, 20.0, 20.0];
        let regions = density_regions(&p);
        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].start, regions[0].end), (1, 2));
        assert_eq!((regions[1].start, regions[1].end), (4, 6));
        assert_eq!(regions[1].sum, 60.0);
    }

    #[test]
    fn narrow_regions_are_a_fallback_only() {
        let narrow = Region {
            start: 0,
            end: 2,
            sum: 900.0,
        };
        let wide = Region {
            start: 10,
            end: 20,
            sum: 200.0,
        };
        assert_eq!(best_region(&[narrow, wide]), Some(wide));
        assert_eq!(best_region(&[narrow]), Some(narrow));
        assert_eq!(best_region(&[]), None);
    }

    #[test]
    fn first_region_wins_ties() {
        let a = Region {
            start: 0,
            end: 10,
            sum: 100.0,
        };
        let b = Region {
            start: 30,
            end: 40,
            sum: 100.0,
        };
        assert_eq!(best_region(&[a, b]), Some(a));
    }

    #[test]
    fn projections_find_a_dark_disc() {
        let img = disc(80, 60, 40.0, 30.0, 12.0);
        let info = detect_pupil_with_projections(&img).expect("disc found");
        assert_eq!(info.center(), Point2f::new(40.0, 30.0));
        assert!((info.radius - 12.0).abs() <= 2.0, "radius {}", info.radius);
    }

    #[test]
    fn blank_image_has_no_region() {
        let img = Image::new_fill(40, 40, [255u8, 255, 255, 255]);
        assert_eq!(
            detect_pupil_with_projections(&img),
            Err(PupilFailure::NoRegion {
                axis: ProjectionAxis::Rows
            })
        );
    }

    #[test]
    fn elongated_blob_is_not_circular() {
        let img = Image::from_fn(100, 100, |x, y| {
            let v = if (20..80).contains(&x) && (45..57).contains(&y) {
                0
            } else {
                255
            };
            [v, v, v, 255]
        });
        assert!(matches!(
            detect_pupil_with_projections(&img),
            Err(PupilFailure::NonCircular { .. })
        ));
    }

    #[test]
    fn centre_within_half_radius_of_an_edge_is_rejected() {
        assert!(check_border(Point2f::new(50.0, 50.0), 20.0, 100, 100).is_ok());
        assert!(check_border(Point2f::new(10.0, 50.0), 20.0, 100, 100).is_ok());
        assert_eq!(
            check_border(Point2f::new(9.0, 50.0), 20.0, 100, 100),
            Err(PupilFailure::NearBorder {
                center: Point2f::new(9.0, 50.0),
                radius: 20.0
            })
        );
        assert!(check_border(Point2f::new(50.0, 91.0), 20.0, 100, 100).is_err());
    }

    #[test]
    fn eye_preset_has_the_cleanup_sequence() {
        let cfg = PupilConfig::eye_preset();
        assert_eq!(cfg.ops.len(), 33);
        assert_eq!(cfg.ops[10], MorphOp::Dilate);
        assert_eq!(cfg.ops[32], MorphOp::Erode);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = PupilConfig {
            xl: 0.0,
            ..PupilConfig::default()
        };
        let img = disc(20, 20, 10.0, 10.0, 4.0);
        assert_eq!(
            get_pupil(&img, &cfg),
            Err(IrisError::InvalidConfig("xl must be > 0 and finite"))
        );
    }

    #[test]
    fn config_reads_partial_json() {
        let cfg: PupilConfig =
            serde_json::from_str(r#"{"threshold": 250.0, "ops": ["erode", "dilate"]}"#)
                .expect("valid json");
        assert_eq!(cfg.threshold, 250.0);
        assert_eq!(cfg.xl, 4.5);
        assert_eq!(cfg.ops, vec![MorphOp::Erode, MorphOp::Dilate]);
    }
}
