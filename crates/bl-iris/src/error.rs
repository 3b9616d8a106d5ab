use core::fmt;

use bl_core::Point2f;

/// Projection axis a pupil search step ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionAxis {
    Rows,
    Columns,
}

/// Why projection-based pupil detection rejected an image.
#[derive(Debug, Clone, PartialEq)]
pub enum PupilFailure {
    /// No run of the smoothed dark-pixel projection exceeded the density floor.
    NoRegion { axis: ProjectionAxis },
    /// Half-spans differ by more than 2×, or one of them is zero.
    NonCircular { half_width: f32, half_height: f32 },
    /// Centre closer than half a radius to an image edge.
    NearBorder { center: Point2f, radius: f32 },
}

impl fmt::Display for PupilFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRegion { axis } => write!(f, "no dark region along {axis:?}"),
            Self::NonCircular {
                half_width,
                half_height,
            } => write!(
                f,
                "region is not circular (half-width {half_width}, half-height {half_height})"
            ),
            Self::NearBorder { center, radius } => write!(
                f,
                "pupil at ({}, {}) with radius {radius} is too close to the border",
                center.x, center.y
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrisError {
    Image(bl_core::Error),
    InvalidConfig(&'static str),
    PupilNotFound(PupilFailure),
    IrisNotFound,
    InvalidGeometry { pupil_radius: f32, iris_radius: f32 },
    CodeShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    InvalidCode(&'static str),
    BlankName,
    Serialization(String),
}

impl fmt::Display for IrisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(e) => write!(f, "image error: {e}"),
            Self::InvalidConfig(reason) => write!(f, "invalid config: {reason}"),
            Self::PupilNotFound(reason) => write!(f, "pupil not found: {reason}"),
            Self::IrisNotFound => write!(f, "no iris boundary beyond the search threshold"),
            Self::InvalidGeometry {
                pupil_radius,
                iris_radius,
            } => write!(
                f,
                "iris radius {iris_radius} must exceed pupil radius {pupil_radius}"
            ),
            Self::CodeShapeMismatch { expected, actual } => write!(
                f,
                "iris code shape mismatch: {}x{} vs {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::InvalidCode(reason) => write!(f, "invalid iris code: {reason}"),
            Self::BlankName => write!(f, "record name must not be blank"),
            Self::Serialization(msg) => write!(f, "serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for IrisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bl_core::Error> for IrisError {
    fn from(e: bl_core::Error) -> Self {
        Self::Image(e)
    }
}

impl From<PupilFailure> for IrisError {
    fn from(f: PupilFailure) -> Self {
        Self::PupilNotFound(f)
    }
}

impl From<serde_json::Error> for IrisError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
