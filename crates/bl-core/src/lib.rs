//! Foundational primitives for biometric image processing.
//!
//! ## Pixel Buffers
//! [`PixelBuffer`] is a row-major RGBA raster (`Image<[u8; 4]>`). Every
//! primitive in the workspace treats its input as read-only and returns a
//! freshly allocated output. Alpha is carried through unchanged unless an
//! operation says otherwise.
//!
//! ## Intensity
//! Wherever a single luminance value is needed the mean of R, G and B is used
//! (see [`intensity`]); alpha never participates.
//!
//! ## Kernels and Borders
//! [`Kernel`] taps are addressed relative to an anchor cell. Neighbourhood
//! operations decide per call what an out-of-image tap means through
//! [`BorderMode`]: skipped entirely, or read as a constant.

pub mod analysis;
mod border;
pub mod color;
pub mod draw;
mod error;
mod geom;
mod image;
mod kernel;
mod pixel;
mod sample;

pub use border::BorderMode;
pub use error::Error;
pub use geom::{Point2f, Vec2f};
pub use image::{Image, ImageView};
pub use kernel::Kernel;
pub use pixel::{BLACK, PixelBuffer, Rgba, TRANSPARENT, WHITE, clamp_u8, gray, intensity};
pub use sample::{sample_nearest, tap};
