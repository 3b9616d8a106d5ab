use crate::border::BorderMode;
use crate::image::ImageView;

/// Reads the pixel at integer coordinates; outside taps are resolved through
/// `border`. `None` means the tap is skipped.
pub fn tap<T: Copy>(img: &ImageView<'_, T>, x: isize, y: isize, border: &BorderMode<T>) -> Option<T> {
    match img.get_signed(x, y) {
        Some(v) => Some(*v),
        None => border.outside(),
    }
}

/// Nearest-neighbour sample at pixel-centre coordinates: `(x, y)` is rounded
/// to the closest pixel index.
pub fn sample_nearest<T: Copy>(
    img: &ImageView<'_, T>,
    x: f32,
    y: f32,
    border: &BorderMode<T>,
) -> Option<T> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    tap(img, x.round() as isize, y.round() as isize, border)
}

#[cfg(test)]
mod tests {
    use crate::border::BorderMode;
    use crate::image::Image;
    use crate::sample::{sample_nearest, tap};

    fn grid() -> Image<u8> {
        Image::from_vec(
            3,
            3,
            vec![
                0u8, 1, 2, // row 0
                10, 11, 12, // row 1
                20, 21, 22, // row 2
            ],
        )
        .expect("valid image")
    }

    #[test]
    fn nearest_rounds_to_pixel_centres() {
        let img = grid();
        let view = img.as_view();

        assert_eq!(sample_nearest(&view, 1.2, 1.6, &BorderMode::Skip), Some(21));
        assert_eq!(sample_nearest(&view, 0.49, 0.49, &BorderMode::Skip), Some(0));
        assert_eq!(sample_nearest(&view, -0.6, 1.0, &BorderMode::Skip), None);
        assert_eq!(sample_nearest(&view, f32::NAN, 1.0, &BorderMode::Constant(5)), None);
    }

    #[test]
    fn taps_outside_follow_border_mode() {
        let img = grid();
        let view = img.as_view();

        assert_eq!(tap(&view, 3, 0, &BorderMode::Skip), None);
        assert_eq!(tap(&view, 3, 0, &BorderMode::Constant(99)), Some(99));
        assert_eq!(tap(&view, 1, 2, &BorderMode::Constant(99)), Some(21));
    }
}
