//! Geometry primitives for terrain volume computations.

use crate::error::{Error, Result};

/// Survey point in a local Cartesian frame.
///
/// The optional `elevation` carries the originally surveyed elevation
/// through normalization so reports can refer to real-world levels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub elevation: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            elevation: None,
        }
    }

    /// Creates a point that remembers the surveyed elevation it came from.
    pub fn with_elevation(x: f64, y: f64, z: f64, elevation: f64) -> Self {
        Self {
            x,
            y,
            z,
            elevation: Some(elevation),
        }
    }
}

/// Calculates the horizontal (plan-view) distance between two points.
pub fn distance_xy(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Returns `(slope, intercept)` of `y = slope * x + intercept` through the
/// plan-view projections of `a` and `b`.
///
/// Fails with [`Error::VerticalLine`] when both points share the same x
/// coordinate.
pub fn line_parameters(a: Point, b: Point) -> Result<(f64, f64)> {
    if b.x - a.x == 0.0 {
        return Err(Error::VerticalLine);
    }
    let slope = (b.y - a.y) / (b.x - a.x);
    let intercept = -slope * a.x + a.y;
    Ok((slope, intercept))
}

/// Plane `z = a * x + b * y + c` fitted through three vertices.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Plane {
    /// Evaluates the plane at a horizontal location.
    pub fn elevation_at(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }
}

/// Fits the exact plane through three vertices using the cross product of
/// the two edge vectors from `a`.
///
/// Fails with [`Error::DegenerateTriangle`] when the normal has no
/// vertical component, i.e. the triangle has zero plan-view footprint.
pub fn plane_fit(a: Point, b: Point, c: Point) -> Result<Plane> {
    let ab = (b.x - a.x, b.y - a.y, b.z - a.z);
    let ac = (c.x - a.x, c.y - a.y, c.z - a.z);
    let nx = ab.1 * ac.2 - ab.2 * ac.1;
    let ny = ab.2 * ac.0 - ab.0 * ac.2;
    let nz = ab.0 * ac.1 - ab.1 * ac.0;
    if nz == 0.0 {
        return Err(Error::DegenerateTriangle);
    }
    let pa = -nx / nz;
    let pb = -ny / nz;
    let pc = a.z - pa * a.x - pb * a.y;
    Ok(Plane {
        a: pa,
        b: pb,
        c: pc,
    })
}

/// Signed area of the triangle's plan-view projection (shoelace formula).
/// Callers take the absolute value unless winding direction matters.
pub fn footprint_area(a: Point, b: Point, c: Point) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}
