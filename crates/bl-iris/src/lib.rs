//! Iris recognition on RGBA eye images.
//!
//! ## Stages
//! - [`pupil`]: pupil mask and projection-based localization.
//! - [`boundary`]: radial intensity profile and the iris/sclera jump.
//! - [`daugman`]: rubber-sheet unwrapping and Gabor phase bits.
//! - [`compare`]: shift-tolerant Hamming distance between codes.
//! - [`record`]: named codes and a small in-memory library.
//!
//! [`IrisPipeline`] chains the first three stages. Every stage returns an
//! [`IrisError`] instead of a partial result; in particular an image where no
//! iris boundary is found never reaches the encoder.

pub mod boundary;
mod code;
pub mod compare;
pub mod daugman;
mod error;
mod pipeline;
pub mod pupil;
pub mod record;

pub use boundary::{IrisBoundary, IrisBoundaryConfig, IrisGeometry, RadialSample, find_iris_boundary, radial_profile};
pub use code::{CODE_COLS, CODE_ROWS, IrisCode};
pub use compare::{ComparatorConfig, ComparisonReport, DiffMap, compare, hamming_distance};
pub use daugman::{DaugmanParams, IrisEncoding, PolarUnwrap, SectorLayout, encode, encode_normalized, unwrap};
pub use error::{IrisError, ProjectionAxis, PupilFailure};
pub use pipeline::{IrisAnalysis, IrisPipeline};
pub use pupil::{PupilConfig, PupilInfo, detect_pupil_with_projections, get_pupil, localize_pupil};
pub use record::{CodeLibrary, Eye, RecordTags, SavedCodeRecord};
