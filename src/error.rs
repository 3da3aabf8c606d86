//! Error types shared across the crate.

use thiserror::Error;

/// Result type for terrain volume operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by survey ingestion, mesh construction and volume
/// analysis. Faults are detected eagerly; no operation returns partial
/// results.
#[derive(Debug, Error)]
pub enum Error {
    /// Three referenced points are collinear in plan view, leaving the
    /// triangle without a footprint.
    #[error("degenerate triangle: vertices are collinear in plan view")]
    DegenerateTriangle,

    /// Both points share the same x coordinate, so `y = slope * x + b`
    /// has no defined slope.
    #[error("line through the two points is vertical")]
    VerticalLine,

    #[error("a survey needs at least 3 points, got {found}")]
    InvalidPointCount { found: usize },

    #[error("mesh contains no triangles")]
    EmptyMesh,

    #[error("triangle index {index} out of range for {point_count} points")]
    TriangleIndexOutOfRange { index: usize, point_count: usize },

    #[error("non-finite coordinate in survey row {row}")]
    NonFiniteCoordinate { row: usize },

    #[error("sweep step must be positive and finite")]
    NonPositiveStep,

    #[error("swell factor must be positive and finite")]
    NonPositiveSwellFactor,

    #[error("unexpected survey columns: expected [{expected}], found [{found}]")]
    InvalidColumns { expected: String, found: String },

    #[error("unsupported survey file extension: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("invalid GPX data: {0}")]
    Gpx(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
