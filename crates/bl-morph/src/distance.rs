//! Two-pass chamfer distance transform with unit steps (chessboard metric).

use bl_core::{Image, PixelBuffer, clamp_u8};

/// A pixel is foreground when any colour channel exceeds 128.
pub fn foreground_mask(buf: &PixelBuffer) -> Image<bool> {
    buf.map(|px| px[0] > 128 || px[1] > 128 || px[2] > 128)
}

/// Distance of every pixel to the nearest foreground pixel. Pixels that
/// cannot reach any foreground keep `width + height`.
pub fn chamfer_distances(mask: &Image<bool>) -> Image<u32> {
    let (w, h) = mask.dims();
    let inf = (w + h) as u32;
    let mut d = mask.map(|&fg| if fg { 0 } else { inf });
    let dist = d.data_mut();

    let step = |v: u32| v.saturating_add(1);

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if dist[idx] == 0 {
                continue;
            }
            let mut m = dist[idx];
            if y > 0 {
                if x > 0 {
                    m = m.min(step(dist[idx - w - 1]));
                }
                m = m.min(step(dist[idx - w]));
                if x + 1 < w {
                    m = m.min(step(dist[idx - w + 1]));
                }
            }
            if x > 0 {
                m = m.min(step(dist[idx - 1]));
            }
            dist[idx] = m;
        }
    }

    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let idx = y * w + x;
            let mut m = dist[idx];
            if x + 1 < w {
                m = m.min(step(dist[idx + 1]));
            }
            if y + 1 < h {
                if x > 0 {
                    m = m.min(step(dist[idx + w - 1]));
                }
                m = m.min(step(dist[idx + w]));
                if x + 1 < w {
                    m = m.min(step(dist[idx + w + 1]));
                }
            }
            dist[idx] = m;
        }
    }

    d
}

/// Renders distances as brightness: foreground is 255, the farthest reachable
/// pixel is 0, unreachable pixels are 0. With no positive finite distance all
/// reachable pixels are 255. Alpha is copied from the input.
pub fn distance_transform(buf: &PixelBuffer) -> PixelBuffer {
    let (w, h) = buf.dims();
    let inf = (w + h) as u32;
    let dist = chamfer_distances(&foreground_mask(buf));

    let max_d = dist
        .data()
        .iter()
        .copied()
        .filter(|&v| v != inf)
        .max()
        .unwrap_or(0);

    let mut out = buf.clone();
    for (px, &d) in out.data_mut().iter_mut().zip(dist.data()) {
        let v = if d == inf {
            0
        } else if max_d == 0 {
            255
        } else {
            clamp_u8(255.0 - d as f32 / max_d as f32 * 255.0)
        };
        *px = [v, v, v, px[3]];
    }
    out
}
