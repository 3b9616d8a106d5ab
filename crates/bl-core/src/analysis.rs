//! Whole-image statistics: histograms, projections, mean intensity.

use serde::Serialize;

use crate::pixel::{PixelBuffer, intensity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RgbHistogram {
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
}

/// 256-bin count per colour channel.
pub fn histogram_rgb(buf: &PixelBuffer) -> RgbHistogram {
    let mut h = RgbHistogram {
        red: vec![0; 256],
        green: vec![0; 256],
        blue: vec![0; 256],
    };
    for px in buf.data() {
        h.red[px[0] as usize] += 1;
        h.green[px[1] as usize] += 1;
        h.blue[px[2] as usize] += 1;
    }
    h
}

/// Intensity sums along each row (`rows[y]`) and each column (`cols[x]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projections {
    pub rows: Vec<f32>,
    pub cols: Vec<f32>,
}

pub fn intensity_projections(buf: &PixelBuffer) -> Projections {
    let (w, h) = buf.dims();
    let mut rows = vec![0.0f32; h];
    let mut cols = vec![0.0f32; w];
    let view = buf.as_view();
    for (y, sum) in rows.iter_mut().enumerate() {
        for (x, &px) in view.row(y).iter().enumerate() {
            let v = intensity(px);
            *sum += v;
            cols[x] += v;
        }
    }
    Projections { rows, cols }
}

/// Mean colour intensity over all pixels, `0.0` for an empty buffer.
pub fn mean_intensity(buf: &PixelBuffer) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }
    let total: f64 = buf.data().iter().map(|&px| intensity(px) as f64).sum();
    (total / buf.data().len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::{histogram_rgb, intensity_projections, mean_intensity};
    use crate::Image;

    #[test]
    fn histogram_counts_every_pixel_once_per_channel() {
        let img = Image::from_vec(
            2,
            2,
            vec![[0u8, 10, 255, 0], [0, 10, 0, 0], [5, 5, 5, 0], [0, 0, 0, 0]],
        )
        .expect("valid image");
        let h = histogram_rgb(&img);

        assert_eq!(h.red[0], 3);
        assert_eq!(h.red[5], 1);
        assert_eq!(h.green[10], 2);
        assert_eq!(h.blue[255], 1);
        assert_eq!(h.blue.iter().sum::<u32>(), 4);
    }

    #[test]
    fn projections_and_mean() {
        let img = Image::from_fn(3, 2, |x, y| {
            let v = (x * 30 + y * 3) as u8;
            [v, v, v, 255]
        });
        let p = intensity_projections(&img);

        assert_eq!(p.rows, vec![90.0, 99.0]);
        assert_eq!(p.cols, vec![3.0, 63.0, 123.0]);
        assert!((mean_intensity(&img) - 31.5).abs() < 1e-5);

        let empty = Image::<[u8; 4]>::from_vec(0, 0, Vec::new()).expect("valid image");
        assert_eq!(mean_intensity(&empty), 0.0);
        assert!(intensity_projections(&empty).rows.is_empty());
    }
}
