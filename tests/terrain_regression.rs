use terravol::{volume_curve, CoordinateSystem, Survey, SweepConfig};

const SAMPLE: &str = "tests/data/sample_survey_cartesian.csv";

/// The sample terrain is a 155-point survey of the planar surface
/// `z = 0.1 x + 0.05 y` over a 10 x 13 footprint, so the exact volume is
/// `130 * z(centroid) = 107.25` no matter how the points get
/// triangulated.
const SAMPLE_VOLUME: f64 = 107.25;

#[test]
fn sample_terrain_total_volume() {
    let survey = Survey::from_csv_path(SAMPLE, "sample", CoordinateSystem::Cartesian).unwrap();
    assert_eq!(survey.len(), 155);
    let mesh = survey.into_mesh().unwrap();
    let volume = mesh.total_volume();
    assert!(
        (volume - SAMPLE_VOLUME).abs() / SAMPLE_VOLUME < 0.01,
        "volume {volume}"
    );
    assert!((mesh.surface_area() - 130.0).abs() < 1e-6);
}

#[test]
fn sample_terrain_volume_is_permutation_invariant() {
    let survey = Survey::from_csv_path(SAMPLE, "sample", CoordinateSystem::Cartesian).unwrap();
    let mesh = survey.clone().into_mesh().unwrap();
    // Rotate every triangle's vertex indices and rebuild.
    let rotated: Vec<[usize; 3]> = mesh
        .triangles()
        .iter()
        .map(|t| [t.indices[1], t.indices[2], t.indices[0]])
        .collect();
    let remesh = terravol::TriangulatedMesh::new(survey.points, rotated).unwrap();
    assert!((mesh.total_volume() - remesh.total_volume()).abs() < 0.05);
}

#[test]
fn sample_terrain_volume_curve() {
    let _ = env_logger::builder().is_test(true).try_init();
    let survey = Survey::from_csv_path(SAMPLE, "sample", CoordinateSystem::Cartesian).unwrap();
    let mesh = survey.into_mesh().unwrap();
    let config = SweepConfig::new(0.25, 1.4).unwrap();
    let curve = volume_curve(&mesh, &config).unwrap();

    let pts = curve.points();
    assert!(pts.len() >= 7);
    assert!(pts[0].fill_raw.abs() < 1e-9);
    assert!(pts.last().unwrap().cut.abs() < 1e-9);
    for pair in pts.windows(2) {
        assert!(pair[1].cut <= pair[0].cut + 0.01);
        assert!(pair[1].fill_raw >= pair[0].fill_raw - 0.01);
        assert!((pair[1].level - pair[0].level - 0.25).abs() < 1e-9);
    }
    for p in pts {
        assert!((p.fill_swell - p.fill_raw * 1.4).abs() < 1e-9);
    }

    // Mass balance at every level: cut - fill equals the signed volume
    // between the surface and the level plane.
    let area = mesh.surface_area();
    let total = mesh.total_volume();
    for p in pts {
        let signed = total - area * p.level;
        assert!((p.cut - p.fill_raw - signed).abs() < 0.01);
    }
}

#[test]
fn volume_curve_serializes_to_tabular_json() {
    let survey = Survey::from_csv_path(SAMPLE, "sample", CoordinateSystem::Cartesian).unwrap();
    let mesh = survey.into_mesh().unwrap();
    let curve = volume_curve(&mesh, &SweepConfig::default()).unwrap();
    let json = serde_json::to_value(&curve).unwrap();
    let rows = json["points"].as_array().unwrap();
    assert_eq!(rows.len(), curve.len());
    for row in rows {
        for field in ["level", "cut", "fill_raw", "fill_swell"] {
            assert!(row[field].is_number());
        }
    }
}
