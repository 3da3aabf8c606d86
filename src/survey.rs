//! Survey ingestion: reads surveyed point clouds from disk and normalizes
//! them into the local Cartesian frame the volume engine works in.

use std::path::Path;

use log::{debug, info};
use roxmltree::Document;

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::mesh::TriangulatedMesh;

/// Coordinate system a survey file is expressed in.
///
/// Resolved once at ingestion; the volume engine only ever sees local
/// Cartesian points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CoordinateSystem {
    Geographic,
    Utm,
    Cartesian,
}

impl CoordinateSystem {
    fn expected_columns(self) -> [&'static str; 3] {
        match self {
            CoordinateSystem::Geographic => ["latitude", "longitude", "elevation"],
            CoordinateSystem::Utm => ["northing", "easting", "elevation"],
            CoordinateSystem::Cartesian => ["x", "y", "z"],
        }
    }
}

/// Survey row after coordinate-system resolution, before normalization.
struct RawRecord {
    easting: f64,
    northing: f64,
    elevation: f64,
}

/// Converts a geographic WGS84 coordinate to UTM.
fn utm_record(latitude: f64, longitude: f64, elevation: f64) -> RawRecord {
    let zone = utm::lat_lon_to_zone_number(latitude, longitude);
    let (northing, easting, _convergence) = utm::to_utm_wgs84(latitude, longitude, zone);
    RawRecord {
        easting,
        northing,
        elevation,
    }
}

/// Surveyed point cloud normalized into a local Cartesian frame.
///
/// `x`/`y` are offsets from the westmost/southmost point, `z` is the
/// elevation above the lowest point; every point keeps its original
/// surveyed elevation for reporting.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Survey {
    pub name: String,
    pub points: Vec<Point>,
}

impl Survey {
    /// Reads a survey from `path`, dispatching on the file extension:
    /// `.csv`/`.txt` for column data, `.gpx` for GPS tracks.
    pub fn from_path(path: &str, name: &str, coordinate_system: CoordinateSystem) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Self::from_csv_path(path, name, coordinate_system),
            "gpx" => Self::from_gpx_path(path, name),
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// Reads CSV/TXT survey data from a file.
    pub fn from_csv_path(
        path: &str,
        name: &str,
        coordinate_system: CoordinateSystem,
    ) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(&text, name, coordinate_system)
    }

    /// Parses CSV/TXT survey data whose header row names the coordinate
    /// columns of `coordinate_system`. Column order in the file is free
    /// as long as the names match.
    pub fn from_csv_str(
        text: &str,
        name: &str,
        coordinate_system: CoordinateSystem,
    ) -> Result<Self> {
        let expected = coordinate_system.expected_columns();
        let columns_error = |found: &str| Error::InvalidColumns {
            expected: expected.join(","),
            found: found.to_string(),
        };

        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or_else(|| columns_error(""))?;
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        if columns.len() != expected.len() {
            return Err(columns_error(&columns.join(",")));
        }
        let mut index = [0usize; 3];
        for (slot, want) in index.iter_mut().zip(expected) {
            *slot = columns
                .iter()
                .position(|c| c == want)
                .ok_or_else(|| columns_error(&columns.join(",")))?;
        }

        let mut records = Vec::new();
        for (row, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != columns.len() {
                return Err(columns_error(line));
            }
            let mut values = [0.0f64; 3];
            for (value, &i) in values.iter_mut().zip(&index) {
                *value = fields[i]
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or(Error::NonFiniteCoordinate { row: row + 1 })?;
            }
            let [c0, c1, c2] = values;
            records.push(match coordinate_system {
                CoordinateSystem::Geographic => utm_record(c0, c1, c2),
                CoordinateSystem::Utm => RawRecord {
                    northing: c0,
                    easting: c1,
                    elevation: c2,
                },
                CoordinateSystem::Cartesian => RawRecord {
                    easting: c0,
                    northing: c1,
                    elevation: c2,
                },
            });
        }
        debug!("parsed {} survey rows from CSV data", records.len());
        Self::from_records(records, name)
    }

    /// Reads a GPX track from a file. GPX data is always geographic.
    pub fn from_gpx_path(path: &str, name: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_gpx_str(&text, name)
    }

    /// Parses `<trkpt lat lon><ele>` track points from GPX XML.
    pub fn from_gpx_str(xml: &str, name: &str) -> Result<Self> {
        let doc = Document::parse(xml).map_err(|e| Error::Gpx(e.to_string()))?;
        let mut records = Vec::new();
        for node in doc.descendants().filter(|n| n.has_tag_name("trkpt")) {
            let lat = node
                .attribute("lat")
                .ok_or_else(|| Error::Gpx("track point missing lat attribute".into()))?;
            let lon = node
                .attribute("lon")
                .ok_or_else(|| Error::Gpx("track point missing lon attribute".into()))?;
            let ele = node
                .children()
                .find(|c| c.has_tag_name("ele"))
                .and_then(|c| c.text())
                .ok_or_else(|| Error::Gpx("track point missing ele element".into()))?;
            let latitude: f64 = lat
                .trim()
                .parse()
                .map_err(|_| Error::Gpx(format!("invalid latitude {lat:?}")))?;
            let longitude: f64 = lon
                .trim()
                .parse()
                .map_err(|_| Error::Gpx(format!("invalid longitude {lon:?}")))?;
            let elevation: f64 = ele
                .trim()
                .parse()
                .map_err(|_| Error::Gpx(format!("invalid elevation {ele:?}")))?;
            records.push(utm_record(latitude, longitude, elevation));
        }
        debug!("parsed {} track points from GPX data", records.len());
        Self::from_records(records, name)
    }

    /// Shifts resolved records into the local frame: offsets from the
    /// minimum easting/northing/elevation, original elevation kept.
    fn from_records(records: Vec<RawRecord>, name: &str) -> Result<Self> {
        if records.len() < 3 {
            return Err(Error::InvalidPointCount {
                found: records.len(),
            });
        }
        let min_easting = records.iter().map(|r| r.easting).fold(f64::INFINITY, f64::min);
        let min_northing = records
            .iter()
            .map(|r| r.northing)
            .fold(f64::INFINITY, f64::min);
        let min_elevation = records
            .iter()
            .map(|r| r.elevation)
            .fold(f64::INFINITY, f64::min);
        let points = records
            .iter()
            .map(|r| {
                Point::with_elevation(
                    r.easting - min_easting,
                    r.northing - min_northing,
                    r.elevation - min_elevation,
                    r.elevation,
                )
            })
            .collect::<Vec<_>>();
        info!("survey {name:?}: {} points normalized", points.len());
        Ok(Self {
            name: name.to_string(),
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Minimum and maximum surveyed elevation.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .map(|p| p.elevation.unwrap_or(p.z))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e), hi.max(e))
            })
    }

    /// Triangulates the survey into a terrain mesh (Delaunay in plan
    /// view).
    pub fn into_mesh(self) -> Result<TriangulatedMesh> {
        TriangulatedMesh::from_points(self.points)
    }
}
