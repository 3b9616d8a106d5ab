use bl_core::{Image, PixelBuffer};

/// Dark disc of radius `r` centred on `(cx, cy)` on a white page.
pub fn disc(width: usize, height: usize, cx: f32, cy: f32, r: f32) -> PixelBuffer {
    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let v = if dx * dx + dy * dy <= r * r { 0 } else { 255 };
        [v, v, v, 255]
    })
}

/// Square eye image: black pupil, grey iris with an angular texture of
/// `spokes` periods and amplitude 20, bright sclera.
pub fn eye(size: usize, pupil_r: f32, iris_r: f32, spokes: f32) -> PixelBuffer {
    assert!(size > 0, "image size must be positive");
    let c = size as f32 / 2.0;
    Image::from_fn(size, size, |x, y| {
        let dx = x as f32 - c;
        let dy = y as f32 - c;
        let d = (dx * dx + dy * dy).sqrt();
        let v = if d <= pupil_r {
            0.0
        } else if d <= iris_r {
            100.0 + 20.0 * (spokes * dy.atan2(dx)).sin()
        } else {
            230.0
        };
        let v = v.round() as u8;
        [v, v, v, 255]
    })
}
