//! Cut/fill level-sweep analysis over a triangulated terrain surface.

use log::debug;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::mesh::TriangulatedMesh;

/// Sweep configuration: vertical spacing between reference levels and the
/// soil swell multiplier applied to fill volumes.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SweepConfig {
    /// Vertical distance between consecutive reference levels.
    pub step: f64,
    /// Volume expansion of excavated soil once loosened; 1.0 means no
    /// swell.
    pub swell_factor: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            swell_factor: 1.0,
        }
    }
}

impl SweepConfig {
    /// Creates a validated configuration.
    pub fn new(step: f64, swell_factor: f64) -> Result<Self> {
        let config = Self { step, swell_factor };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(Error::NonPositiveStep);
        }
        if !(self.swell_factor.is_finite() && self.swell_factor > 0.0) {
            return Err(Error::NonPositiveSwellFactor);
        }
        Ok(())
    }
}

/// One entry of a volume curve: cut and fill at a candidate grading
/// level.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VolumeCurvePoint {
    pub level: f64,
    pub cut: f64,
    pub fill_raw: f64,
    /// `fill_raw` scaled by the swell factor.
    pub fill_swell: f64,
}

/// Volume curve produced by one sweep, ordered by ascending level.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VolumeCurve {
    points: Vec<VolumeCurvePoint>,
}

impl VolumeCurve {
    /// Curve entries in ascending level order.
    pub fn points(&self) -> &[VolumeCurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the curve point where cut and swollen fill are closest,
    /// i.e. the grading level requiring no net import or export of
    /// material.
    pub fn balance_level(&self) -> Option<&VolumeCurvePoint> {
        self.points.iter().min_by(|p, q| {
            let dp = (p.cut - p.fill_swell).abs();
            let dq = (q.cut - q.fill_swell).abs();
            dp.partial_cmp(&dq).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

impl<'a> IntoIterator for &'a VolumeCurve {
    type Item = &'a VolumeCurvePoint;
    type IntoIter = std::slice::Iter<'a, VolumeCurvePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Sweeps reference levels from the lowest to just past the highest mesh
/// elevation and collects the cut/fill volumes at each level.
///
/// Levels start at `z_min` and advance by `config.step` up to and
/// including the first level at or above `z_max`, so the first entry has
/// zero fill and the last has zero cut. Levels are evaluated in parallel;
/// the returned curve is ordered ascending.
pub fn volume_curve(mesh: &TriangulatedMesh, config: &SweepConfig) -> Result<VolumeCurve> {
    config.validate()?;
    let (z_min, z_max) = mesh.elevation_range();
    let mut levels = Vec::new();
    let mut level = z_min;
    loop {
        levels.push(level);
        if level >= z_max {
            break;
        }
        level += config.step;
    }
    debug!(
        "sweeping {} levels over [{z_min}, {z_max}] with step {}",
        levels.len(),
        config.step
    );
    let points = levels
        .par_iter()
        .map(|&level| {
            let (cut, fill_raw) = mesh.volumes_at_level(level);
            VolumeCurvePoint {
                level,
                cut,
                fill_raw,
                fill_swell: fill_raw * config.swell_factor,
            }
        })
        .collect();
    Ok(VolumeCurve { points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn ramp_mesh() -> TriangulatedMesh {
        TriangulatedMesh::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 2.0),
            Point::new(0.0, 1.0, 2.0),
        ])
        .unwrap()
    }

    #[test]
    fn sweep_boundary_and_monotonicity() {
        let mesh = ramp_mesh();
        let config = SweepConfig::new(0.5, 1.0).unwrap();
        let curve = volume_curve(&mesh, &config).unwrap();
        let pts = curve.points();
        assert_eq!(pts.len(), 5);
        assert!(pts[0].fill_raw.abs() < 1e-9);
        assert!(pts.last().unwrap().cut.abs() < 1e-9);
        for pair in pts.windows(2) {
            assert!(pair[1].level > pair[0].level);
            assert!(pair[1].cut <= pair[0].cut + 1e-9);
            assert!(pair[1].fill_raw >= pair[0].fill_raw - 1e-9);
        }
    }

    #[test]
    fn sweep_first_level_matches_total_volume() {
        let mesh = ramp_mesh();
        let curve = volume_curve(&mesh, &SweepConfig::default()).unwrap();
        assert!((curve.points()[0].cut - mesh.total_volume()).abs() < 1e-9);
    }

    #[test]
    fn sweep_covers_top_even_for_uneven_step() {
        let mesh = ramp_mesh();
        let config = SweepConfig::new(0.75, 1.0).unwrap();
        let curve = volume_curve(&mesh, &config).unwrap();
        let last = curve.points().last().unwrap();
        assert!(last.level >= 2.0);
        assert!(last.cut.abs() < 1e-9);
    }

    #[test]
    fn swell_factor_scales_fill() {
        let mesh = ramp_mesh();
        let config = SweepConfig::new(0.5, 1.4).unwrap();
        let curve = volume_curve(&mesh, &config).unwrap();
        for p in &curve {
            assert!((p.fill_swell - p.fill_raw * 1.4).abs() < 1e-12);
            assert!(p.cut >= 0.0 && p.fill_raw >= 0.0);
        }
    }

    #[test]
    fn balance_level_of_symmetric_ramp() {
        let mesh = ramp_mesh();
        let config = SweepConfig::new(0.5, 1.0).unwrap();
        let curve = volume_curve(&mesh, &config).unwrap();
        let balance = curve.balance_level().unwrap();
        // The ramp is symmetric about its mid elevation.
        assert!((balance.level - 1.0).abs() < 1e-9);
        assert!((balance.cut - balance.fill_swell).abs() < 1e-9);
    }

    #[test]
    fn flat_mesh_yields_single_zero_point() {
        let mesh = TriangulatedMesh::from_points(vec![
            Point::new(0.0, 0.0, 1.0),
            Point::new(1.0, 0.0, 1.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(0.0, 1.0, 1.0),
        ])
        .unwrap();
        let curve = volume_curve(&mesh, &SweepConfig::default()).unwrap();
        assert_eq!(curve.len(), 1);
        let p = &curve.points()[0];
        assert!(p.cut.abs() < 1e-9 && p.fill_raw.abs() < 1e-9);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            SweepConfig::new(0.0, 1.0),
            Err(Error::NonPositiveStep)
        ));
        assert!(matches!(
            SweepConfig::new(f64::NAN, 1.0),
            Err(Error::NonPositiveStep)
        ));
        assert!(matches!(
            SweepConfig::new(1.0, -0.5),
            Err(Error::NonPositiveSwellFactor)
        ));
        let mesh = ramp_mesh();
        assert!(volume_curve(
            &mesh,
            &SweepConfig {
                step: -1.0,
                swell_factor: 1.0
            }
        )
        .is_err());
    }
}
