//! Terrain earthwork volume engine.
//!
//! Builds a Triangulated Irregular Network from surveyed elevation points
//! and computes cut and fill volumes against horizontal grading levels,
//! including the level sweep that produces volume curves for earthwork
//! planning.

pub mod analysis;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod survey;

pub use analysis::{volume_curve, SweepConfig, VolumeCurve, VolumeCurvePoint};
pub use error::{Error, Result};
pub use geometry::{Plane, Point};
pub use mesh::TriangulatedMesh;
pub use survey::{CoordinateSystem, Survey};
