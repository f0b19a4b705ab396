//! Reading coordinate files, triangulating their projection and writing the mesh.

use std::io::Cursor;

use planar_delaunay::io::parser::{IoError, parse_coordinates, read_coordinates};
use planar_delaunay::io::projection::project_vertices;
use planar_delaunay::io::writer::{MESH_HEADER, write_mesh, write_mesh_file};
use planar_delaunay::prelude::*;

const SURVEY: &str = "\
*   N,            X             Y             Z
* Nodes
    1,  1.0,  1.0,  1.0
    2,  1.0,  1.0,  2.0
    3,  1.5,  0.5,  2.0
    4,  2.0,  0.0,  1.0
bad line, 1, 2, 3
";

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("planar_delaunay_{}_{name}", std::process::id()))
}

#[test]
fn test_survey_to_mesh_pipeline() {
    let points = parse_coordinates(Cursor::new(SURVEY)).unwrap();
    assert_eq!(points.len(), 4);

    // Projection multiplies by depth: this is the diamond (1,1) (2,2) (3,1) (2,0).
    let vertices = project_vertices(&points);
    assert_eq!(vertices[1].coords(), [2.0, 2.0]);
    assert_eq!(vertices[2].coords(), [3.0, 1.0]);

    let output = triangulate(&vertices, DelaunayConfig::default()).unwrap();
    let mut out = Vec::new();
    write_mesh(&mut out, &points, &output.triangles, &output.vertex_ids).unwrap();
    let text = String::from_utf8(out).unwrap();

    let expected = [
        MESH_HEADER,
        "* Nodes",
        "     1,             1,             1,             1",
        "     2,             1,             1,             2",
        "     3,           1.5,           0.5,             2",
        "     4,             2,             0,             1",
        "*Elements",
        "     2,     3,     4,     1",
        "     3,     3,     1,     2",
    ];
    assert_eq!(text.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn test_written_nodes_parse_back() {
    let points = parse_coordinates(Cursor::new(SURVEY)).unwrap();
    let vertices = project_vertices(&points);
    let output = triangulate(&vertices, DelaunayConfig::default()).unwrap();

    let path = temp_path("roundtrip.txt");
    write_mesh_file(&path, &points, &output.triangles, &output.vertex_ids).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let nodes = text.split("*Elements").next().unwrap();
    let back = parse_coordinates(Cursor::new(nodes)).unwrap();
    assert_eq!(back, points);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = read_coordinates(temp_path("does_not_exist.txt")).unwrap_err();
    assert!(matches!(err, IoError::Io { .. }));
}

#[test]
fn test_read_coordinates_from_disk() {
    let path = temp_path("survey.txt");
    std::fs::write(&path, SURVEY).unwrap();
    let points = read_coordinates(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(points.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}
