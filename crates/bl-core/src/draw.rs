//! Overlay drawing for localization results. Both functions return a copy of
//! the input with the shape burned in; pixels falling outside are dropped.

use crate::geom::{Point2f, Vec2f};
use crate::pixel::{PixelBuffer, Rgba};

/// Circle outline sampled once per degree.
pub fn draw_circle(buf: &PixelBuffer, center: Point2f, radius: f32, color: Rgba) -> PixelBuffer {
    let mut out = buf.clone();
    for deg in 0..360 {
        let p = center + Vec2f::from_polar(radius, (deg as f32).to_radians());
        out.put(p.x.round() as isize, p.y.round() as isize, color);
    }
    out
}

/// Horizontal and vertical strokes of `half_len` pixels on each side.
pub fn draw_crosshair(buf: &PixelBuffer, center: Point2f, half_len: usize, color: Rgba) -> PixelBuffer {
    let mut out = buf.clone();
    let cx = center.x.round() as isize;
    let cy = center.y.round() as isize;
    let n = half_len as isize;
    for d in -n..=n {
        out.put(cx + d, cy, color);
        out.put(cx, cy + d, color);
    }
    out
}
