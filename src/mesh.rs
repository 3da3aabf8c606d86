//! Triangulated terrain surfaces and cut/fill volume aggregation.

use std::collections::HashMap;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::geometry::{footprint_area, plane_fit, Plane, Point};

/// Mesh triangle with its cached plane fit and plan-view footprint area.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Triangle {
    /// Indices into the mesh point store.
    pub indices: [usize; 3],
    /// Plane `z = a * x + b * y + c` through the three vertices.
    pub plane: Plane,
    /// Absolute area of the plan-view projection.
    pub footprint_area: f64,
}

/// Triangulated Irregular Network over a surveyed point cloud.
///
/// Points are owned by the mesh; triangles reference them by index.
/// Immutable after construction, so it can be shared across worker
/// threads without locking.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TriangulatedMesh {
    points: Vec<Point>,
    triangles: Vec<Triangle>,
    surface_area: f64,
    #[serde(skip)]
    level_cache: Mutex<HashMap<u64, (f64, f64)>>,
}

impl Clone for TriangulatedMesh {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            triangles: self.triangles.clone(),
            surface_area: self.surface_area,
            level_cache: Mutex::new(HashMap::new()),
        }
    }
}

impl TriangulatedMesh {
    /// Builds a mesh from a point store and a triangle index list supplied
    /// by a triangulation collaborator.
    ///
    /// Validation is eager: point count, coordinate finiteness, index
    /// ranges and per-triangle degeneracy are all checked here, and the
    /// plane fit and footprint area of every triangle are cached.
    pub fn new(points: Vec<Point>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if points.len() < 3 {
            return Err(Error::InvalidPointCount {
                found: points.len(),
            });
        }
        for (row, p) in points.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(Error::NonFiniteCoordinate { row });
            }
        }
        if triangles.is_empty() {
            return Err(Error::EmptyMesh);
        }
        let mut cached = Vec::with_capacity(triangles.len());
        for indices in triangles {
            for &index in &indices {
                if index >= points.len() {
                    return Err(Error::TriangleIndexOutOfRange {
                        index,
                        point_count: points.len(),
                    });
                }
            }
            let [i, j, k] = indices;
            let (a, b, c) = (points[i], points[j], points[k]);
            let plane = plane_fit(a, b, c)?;
            let area = footprint_area(a, b, c).abs();
            if area == 0.0 {
                return Err(Error::DegenerateTriangle);
            }
            cached.push(Triangle {
                indices,
                plane,
                footprint_area: area,
            });
        }
        let surface_area = cached.iter().map(|t| t.footprint_area).sum();
        Ok(Self {
            points,
            triangles: cached,
            surface_area,
            level_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Builds a mesh from a point cloud using Delaunay triangulation on
    /// the plan-view projection.
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        let coords: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&coords);
        let triangles = triangulation
            .triangles
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::new(points, triangles)
    }

    /// Vertices of the mesh.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Triangles with their cached plane fits and footprint areas.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Absolute plan-view footprint area of each triangle, in triangle
    /// order.
    pub fn triangle_footprint_areas(&self) -> Vec<f64> {
        self.triangles.iter().map(|t| t.footprint_area).collect()
    }

    /// Total plan-view area covered by the mesh.
    pub fn surface_area(&self) -> f64 {
        self.surface_area
    }

    /// Minimum and maximum vertex elevation in the local frame.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), p| (lo.min(p.z), hi.max(p.z)),
        )
    }

    /// Volume between the surface and the zero datum.
    ///
    /// Elevations are non-negative after survey normalization, so this is
    /// a pure cut quantity.
    pub fn total_volume(&self) -> f64 {
        self.volumes_at_level(0.0).0
    }

    /// Mesh-wide `(cut, fill)` volumes relative to the horizontal
    /// reference level.
    ///
    /// Triangle contributions are summed with a parallel map-reduce;
    /// results are memoized per exact level so repeated sweep queries stay
    /// cheap.
    pub fn volumes_at_level(&self, level: f64) -> (f64, f64) {
        let key = level.to_bits();
        if let Some(&hit) = self.level_cache.lock().unwrap().get(&key) {
            return hit;
        }
        let totals = self
            .triangles
            .par_iter()
            .map(|t| {
                let [i, j, k] = t.indices;
                triangle_cut_fill(self.points[i], self.points[j], self.points[k], level)
            })
            .reduce(|| (0.0, 0.0), |p, q| (p.0 + q.0, p.1 + q.1));
        self.level_cache.lock().unwrap().insert(key, totals);
        totals
    }
}

/// Signed prism volume of a triangle relative to `level`: positive when
/// the surface lies above the level, negative below. Exact for a linear
/// height field over a triangular footprint (mean height times area).
fn signed_prism_volume(a: Point, b: Point, c: Point, level: f64) -> f64 {
    let area = footprint_area(a, b, c).abs();
    let mean_height = ((a.z - level) + (b.z - level) + (c.z - level)) / 3.0;
    area * mean_height
}

/// Point on edge `ab` where the surface crosses `level`.
fn level_intersection(a: Point, b: Point, level: f64) -> Point {
    let da = a.z - level;
    let db = b.z - level;
    let t = da / (da - db);
    Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y), level)
}

/// Cut and fill volume between a single triangle and a horizontal
/// reference level, restricted to the triangle's footprint.
///
/// Non-straddling triangles use the prism closed form directly. A
/// triangle straddling the level is clipped at the level into the corner
/// triangle of the isolated vertex plus the remaining quadrilateral,
/// which is split along a diagonal; the closed form is applied per piece.
/// A vertex exactly on the level belongs to the cut side, so clipping
/// there degenerates into a zero-area piece and nothing is double
/// counted. Both results are non-negative and invariant under vertex
/// permutation.
pub fn triangle_cut_fill(a: Point, b: Point, c: Point, level: f64) -> (f64, f64) {
    if a.z >= level && b.z >= level && c.z >= level {
        return (signed_prism_volume(a, b, c, level), 0.0);
    }
    if a.z <= level && b.z <= level && c.z <= level {
        return (0.0, -signed_prism_volume(a, b, c, level));
    }
    // Straddling: isolate the vertex sitting alone on its side of the
    // level and clip the two edges that run from it.
    let above = [a.z >= level, b.z >= level, c.z >= level];
    let (iso, v1, v2) = if above[0] == above[1] {
        (c, a, b)
    } else if above[0] == above[2] {
        (b, c, a)
    } else {
        (a, b, c)
    };
    let p1 = level_intersection(iso, v1, level);
    let p2 = level_intersection(iso, v2, level);
    // Corner triangle on the isolated side, then the quadrilateral
    // (v1, v2, p2, p1) split along the p1-v2 diagonal.
    let mut cut = 0.0;
    let mut fill = 0.0;
    for [p, q, r] in [[iso, p1, p2], [v1, v2, p1], [v2, p2, p1]] {
        let volume = signed_prism_volume(p, q, r, level);
        if volume >= 0.0 {
            cut += volume;
        } else {
            fill -= volume;
        }
    }
    (cut, fill)
}
