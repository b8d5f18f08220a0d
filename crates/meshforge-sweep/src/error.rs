//! Error types for sweep construction.

use thiserror::Error;

/// Result type for sweep operations.
pub type SweepResult<T> = Result<T, SweepError>;

/// Errors that can occur while building an extruded or swept solid.
///
/// These cover only inputs the builder cannot start from. Finalization
/// problems (a weld that fails to close the mesh) are handled with bounded
/// retries and a best-effort result, never an error.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A profile ring has too few points.
    #[error("profile ring needs at least {min} points, got {actual}")]
    TooFewRingPoints {
        /// Minimum required points.
        min: usize,
        /// Actual point count.
        actual: usize,
    },

    /// The profile's points do not span a plane.
    #[error("profile is degenerate: points are collinear or coincident")]
    DegenerateProfile,

    /// The sweep path has too few points.
    #[error("path needs at least {min} points, got {actual}")]
    TooFewPathPoints {
        /// Minimum required points.
        min: usize,
        /// Actual point count.
        actual: usize,
    },

    /// The extrusion offset has zero length.
    #[error("extrusion offset is zero")]
    ZeroOffset,
}
