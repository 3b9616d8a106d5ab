//! Iris boundary search on concentric rings around the pupil.
//!
//! The image is smoothed, the mean intensity of every 1-px ring
//! `(r - 1)² <= d² <= r²` around the rounded pupil centre is measured, and the
//! largest jump between consecutive rings beyond `threshold_factor * r_p` is
//! taken as the iris/sclera transition. A flat profile past that radius has
//! no boundary.

use bl_core::{Kernel, PixelBuffer, Point2f, intensity};
use bl_filter::weighted_mean_filter;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::IrisError;
use crate::pupil::PupilInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisBoundaryConfig {
    pub smoothing: Kernel,
    /// Rings are measured out to `search_factor * r_p`.
    pub search_factor: f32,
    /// Only rings beyond `threshold_factor * r_p` can hold the iris boundary.
    pub threshold_factor: f32,
}

impl Default for IrisBoundaryConfig {
    fn default() -> Self {
        Self {
            smoothing: Kernel::gaussian(),
            search_factor: 3.0,
            threshold_factor: 1.5,
        }
    }
}

impl IrisBoundaryConfig {
    pub fn validate(&self) -> Result<(), IrisError> {
        if !(self.threshold_factor.is_finite() && self.threshold_factor >= 1.0) {
            return Err(IrisError::InvalidConfig("threshold_factor must be >= 1"));
        }
        if !(self.search_factor.is_finite() && self.search_factor > self.threshold_factor) {
            return Err(IrisError::InvalidConfig(
                "search_factor must exceed threshold_factor",
            ));
        }
        self.smoothing.require_square_odd()?;
        self.smoothing.require_nonzero_sum()?;
        Ok(())
    }
}

/// One ring of a radial profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadialSample {
    /// Outer radius of the ring.
    pub radius: usize,
    pub mean_intensity: f32,
    /// `|mean - previous mean|`, 0 for the first ring.
    pub delta: f32,
}

/// Pupil plus outer iris radius; the iris always encloses the pupil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IrisGeometry {
    pupil: PupilInfo,
    iris_radius: f32,
}

impl IrisGeometry {
    pub fn new(pupil: PupilInfo, iris_radius: f32) -> Result<Self, IrisError> {
        let valid = pupil.radius.is_finite()
            && pupil.radius > 0.0
            && iris_radius.is_finite()
            && iris_radius > pupil.radius;
        if !valid {
            return Err(IrisError::InvalidGeometry {
                pupil_radius: pupil.radius,
                iris_radius,
            });
        }
        Ok(Self { pupil, iris_radius })
    }

    pub fn pupil(&self) -> &PupilInfo {
        &self.pupil
    }

    pub fn center(&self) -> Point2f {
        self.pupil.center()
    }

    pub fn pupil_radius(&self) -> f32 {
        self.pupil.radius
    }

    pub fn iris_radius(&self) -> f32 {
        self.iris_radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrisBoundary {
    pub profile: Vec<RadialSample>,
    /// Ring with the strongest jump overall, normally the pupil edge.
    pub pupil_jump: RadialSample,
    /// Strongest jump beyond the threshold radius.
    pub iris_jump: RadialSample,
    /// Rings between the pupil boundary and the iris jump.
    pub iris_jump_index: usize,
    pub geometry: IrisGeometry,
}

/// Mean intensity of the rings `1..max_radius` around the rounded `center`.
///
/// A pixel at an exact integer distance `r` lies on both ring `r` and ring
/// `r + 1`. Rings with no pixel inside the image repeat the previous mean.
pub fn radial_profile(buf: &PixelBuffer, center: Point2f, max_radius: usize) -> Vec<RadialSample> {
    let rings = max_radius.saturating_sub(1);
    if rings == 0 {
        return Vec::new();
    }

    let (w, h) = buf.dims();
    let cx = center.x.round() as isize;
    let cy = center.y.round() as isize;
    let reach = max_radius as isize;

    let mut sums = vec![0.0f64; rings];
    let mut counts = vec![0usize; rings];
    let mut add = |ring: usize, v: f32| {
        if (1..=rings).contains(&ring) {
            sums[ring - 1] += v as f64;
            counts[ring - 1] += 1;
        }
    };

    let y0 = (cy - reach).max(0);
    let y1 = (cy + reach).min(h as isize - 1);
    let x0 = (cx - reach).max(0);
    let x1 = (cx + reach).min(w as isize - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (dx, dy) = (x - cx, y - cy);
            let d2 = (dx * dx + dy * dy) as usize;
            let Some(px) = buf.get(x as usize, y as usize) else {
                continue;
            };
            let v = intensity(*px);
            let root = d2.isqrt();
            if root * root == d2 {
                add(root, v);
                add(root + 1, v);
            } else {
                add(root + 1, v);
            }
        }
    }

    let mut profile = Vec::with_capacity(rings);
    let mut prev = 0.0f32;
    for (i, (&sum, &count)) in sums.iter().zip(&counts).enumerate() {
        let mean = if count > 0 {
            (sum / count as f64) as f32
        } else {
            prev
        };
        let delta = if i == 0 { 0.0 } else { (mean - prev).abs() };
        profile.push(RadialSample {
            radius: i + 1,
            mean_intensity: mean,
            delta,
        });
        prev = mean;
    }
    profile
}

fn strongest<'a>(samples: impl Iterator<Item = &'a RadialSample>) -> Option<RadialSample> {
    let mut best: Option<RadialSample> = None;
    for s in samples {
        if best.is_none_or(|b| s.delta > b.delta) {
            best = Some(*s);
        }
    }
    best
}

pub fn find_iris_boundary(
    buf: &PixelBuffer,
    pupil: &PupilInfo,
    cfg: &IrisBoundaryConfig,
) -> Result<IrisBoundary, IrisError> {
    cfg.validate()?;
    if !(pupil.radius.is_finite() && pupil.radius > 0.0) {
        return Err(IrisError::InvalidGeometry {
            pupil_radius: pupil.radius,
            iris_radius: 0.0,
        });
    }

    let smoothed = weighted_mean_filter(buf, &cfg.smoothing)?;
    let max_radius = (cfg.search_factor * pupil.radius).ceil() as usize;
    let profile = radial_profile(&smoothed, pupil.center(), max_radius);

    let pupil_jump = strongest(profile.iter()).ok_or(IrisError::IrisNotFound)?;
    let limit = cfg.threshold_factor * pupil.radius;
    let iris_jump = strongest(
        profile
            .iter()
            .filter(|s| s.radius as f32 > limit && s.delta > 0.0),
    )
    .ok_or(IrisError::IrisNotFound)?;

    let iris_jump_index = iris_jump.radius - pupil.radius.round() as usize;
    let geometry = IrisGeometry::new(*pupil, pupil.radius + iris_jump_index as f32)?;
    debug!(
        "iris boundary: pupil jump at ring {}, iris jump at ring {} ({} rings out)",
        pupil_jump.radius, iris_jump.radius, iris_jump_index
    );

    Ok(IrisBoundary {
        profile,
        pupil_jump,
        iris_jump,
        iris_jump_index,
        geometry,
    })
}
