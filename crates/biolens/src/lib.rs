//! Umbrella crate for the `biolens` workspace.
//!
//! Pixel-buffer primitives and the iris pipeline are re-exported at the root;
//! the filter, morphology and skeleton crates are reachable as modules.

pub use bl_core::*;
pub use bl_iris::*;

pub use bl_filter as filter;
pub use bl_morph as morph;
pub use bl_skeleton as skeleton;
