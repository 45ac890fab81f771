//! Error types shared by every calculation.

use thiserror::Error;

/// Result type for surveying calculations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a calculation cannot produce a result.
///
/// All of these indicate that the _input_ cannot be resolved, not that the library has a bug.
/// Expected geometric non-solutions (eg, parallel rays in an intersection) are not errors and are
/// reported as `Ok(None)` by the calculation that can produce them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The geometry of the input does not determine a unique solution.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// An observation lacks a measured quantity the calculation needs.
    #[error("missing {quantity} in observation of point {point}")]
    MissingMeasurement {
        point: String,
        quantity: &'static str,
    },

    /// A point that must be known has no (or only partial) coordinates.
    #[error("no coordinates on point {0}")]
    MissingCoordinates(String),

    /// A zero or near-zero pivot was met during elimination.
    #[error("singular system of equations (pivot in row {row} vanished)")]
    SingularSystem { row: usize },

    /// Fewer point pairs than the model has free parameters.
    #[error("not enough points: {required} required, {actual} given")]
    NotEnoughPoints { required: usize, actual: usize },

    /// Polynomial transformations are supported for degree 3, 4 and 5.
    #[error("unsupported polynomial degree {0}")]
    UnsupportedDegree(usize),

    /// Matrix and vector sizes of a linear system do not agree.
    #[error("dimension mismatch: {rows}x{columns} matrix with {len} long right-hand side")]
    DimensionMismatch {
        rows: usize,
        columns: usize,
        len: usize,
    },

    /// An angle could not be parsed or is not finite.
    #[error("invalid angle: {0}")]
    InvalidAngle(String),

    /// A traverse needs at least three points.
    #[error("At least 3 points must be added to traverse line!")]
    TraverseTooShort,

    /// The first point of a traverse must have coordinates.
    #[error("No coordinates on start point!")]
    TraverseNoStartCoordinates,

    /// A free traverse cannot be computed without a start orientation.
    #[error("No orientation on start point and no coordinates on end point!")]
    TraverseUnconstrained,

    /// An angle point of a traverse lacks one of its two directions.
    #[error("No angle at point {0}!")]
    TraverseNoAngle(String),

    /// A traverse leg has no measured distance from either end.
    #[error("No distance between points {0} and {1}!")]
    TraverseNoDistance(String, String),
}

impl Error {
    pub(crate) fn missing(point: &str, quantity: &'static str) -> Self {
        Self::MissingMeasurement {
            point: point.to_owned(),
            quantity,
        }
    }

    /// Returns `true` for the failures of a traverse precondition.
    #[must_use]
    pub fn is_traverse_precondition(&self) -> bool {
        matches!(
            self,
            Error::TraverseTooShort
                | Error::TraverseNoStartCoordinates
                | Error::TraverseUnconstrained
                | Error::TraverseNoAngle(_)
                | Error::TraverseNoDistance(_, _)
        )
    }
}
