//! Morphology and distance transforms.
//!
//! Two flavours live side by side:
//! - [`flat`]: grey-level min/max over a [`bl_core::Kernel`] mask, applied to
//!   all four RGBA channels. Outside taps are ignored.
//! - [`anchored`]: binary masks (`0` foreground, `255` background) with
//!   explicit [`StructuringElement`] anchors, as used by thinning. Outside
//!   taps read as background.

pub mod anchored;
pub mod distance;
pub mod flat;

pub use anchored::{
    BACKGROUND, FOREGROUND, StructuringElement, binarize_mask, dilate_with_rep, erode_with_rep,
    hit_and_miss, negate,
};
pub use distance::{chamfer_distances, distance_transform, foreground_mask};
pub use flat::{MorphOp, apply, apply_sequence, dilate, erode};
