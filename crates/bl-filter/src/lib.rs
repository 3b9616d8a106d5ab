//! Kernel convolution and edge detection over RGBA pixel buffers.
//!
//! Coordinates follow the pixel-centre convention of `bl-core`: the sample at
//! index `(x, y)` sits at position `(x, y)`.
//!
//! Out-of-image taps are skipped rather than padded (see [`conv2d`]); the
//! filters here never invent pixel values beyond the border.

pub mod canny;
pub mod conv1d;
pub mod conv2d;
pub mod kernels1d;

pub use canny::{CannyConfig, CannyDetector, canny};
pub use conv2d::{
    ConvolveMode, convolve, convolve_raw, correlate_plane, directional_filter,
    weighted_mean_filter, weighted_mean_plane,
};
pub use kernels1d::{GaussianWindow, gabor_response};
