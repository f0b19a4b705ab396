//! Mesh output files.
//!
//! The layout is a fixed header, a `* Nodes` section with one `id, x, y, z` line
//! per used point, and a `*Elements` section with one `id, v1, v2, v3` line per
//! triangle. Ids are right-aligned to width 5 and coordinates to width 13; a
//! value shorter than its width gets one extra leading space, a longer value is
//! written unpadded.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::delaunay_triangulation::TriangleRecord;
use crate::core::vertex::VertexId;
use crate::io::parser::{IoError, SurveyPoint};

/// First line of every mesh file.
pub const MESH_HEADER: &str = "*   N,            X             Y             Z";

const ID_WIDTH: usize = 5;
const COORD_WIDTH: usize = 13;
const SIGNIFICANT_DIGITS: usize = 6;

fn pad(value: &str, width: usize) -> String {
    if value.len() < width {
        format!("{value:>w$}", w = width + 1)
    } else {
        value.to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Formats `value` with six significant digits, choosing fixed or scientific
/// notation by magnitude and dropping trailing zeros.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::io::writer::format_significant;
///
/// assert_eq!(format_significant(2.0), "2");
/// assert_eq!(format_significant(-0.125), "-0.125");
/// assert_eq!(format_significant(1234.56789), "1234.57");
/// assert_eq!(format_significant(0.0001), "0.0001");
/// assert_eq!(format_significant(1_234_567.0), "1.23457e+06");
/// assert_eq!(format_significant(0.000_012_5), "1.25e-05");
/// ```
#[must_use]
pub fn format_significant(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{value:.prec$e}", prec = SIGNIFICANT_DIGITS - 1);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits = i32::try_from(SIGNIFICANT_DIGITS).unwrap_or(6);

    if (-4..digits).contains(&exponent) {
        let decimals = usize::try_from(digits - 1 - exponent).unwrap_or(0);
        let fixed = format!("{value:.decimals$}");
        strip_fraction_zeros(&fixed).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            strip_fraction_zeros(mantissa),
            exponent.unsigned_abs()
        )
    }
}

/// Writes the mesh to `writer`.
///
/// Only points whose id is in `used_ids` are listed, in the order of `points`.
///
/// # Errors
///
/// Returns any error of the underlying writer.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
/// use planar_delaunay::core::delaunay_triangulation::TriangleRecord;
/// use planar_delaunay::io::parser::SurveyPoint;
/// use planar_delaunay::io::writer::write_mesh;
///
/// let points = [SurveyPoint { id: 1, x: 0.5, y: 1.0, z: 2.0 }];
/// let triangles = [TriangleRecord { id: 7, vertices: [1, 2, 3] }];
/// let mut out = Vec::new();
/// write_mesh(&mut out, &points, &triangles, &BTreeSet::from([1])).unwrap();
/// let text = String::from_utf8(out).unwrap();
/// assert!(text.contains("\n     1,           0.5,             1,             2\n"));
/// assert!(text.ends_with("*Elements\n     7,     1,     2,     3\n"));
/// ```
pub fn write_mesh(
    writer: &mut impl Write,
    points: &[SurveyPoint],
    triangles: &[TriangleRecord],
    used_ids: &BTreeSet<VertexId>,
) -> std::io::Result<()> {
    writeln!(writer, "{MESH_HEADER}")?;
    writeln!(writer, "* Nodes")?;
    for point in points.iter().filter(|p| used_ids.contains(&p.id)) {
        writeln!(
            writer,
            "{},{},{},{}",
            pad(&point.id.to_string(), ID_WIDTH),
            pad(&format_significant(point.x), COORD_WIDTH),
            pad(&format_significant(point.y), COORD_WIDTH),
            pad(&format_significant(point.z), COORD_WIDTH),
        )?;
    }

    writeln!(writer, "*Elements")?;
    for triangle in triangles {
        let [a, b, c] = triangle.vertices;
        writeln!(
            writer,
            "{},{},{},{}",
            pad(&triangle.id.to_string(), ID_WIDTH),
            pad(&a.to_string(), ID_WIDTH),
            pad(&b.to_string(), ID_WIDTH),
            pad(&c.to_string(), ID_WIDTH),
        )?;
    }
    Ok(())
}

/// Writes the mesh to a file, replacing any existing content.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be created or written.
pub fn write_mesh_file(
    path: impl AsRef<Path>,
    points: &[SurveyPoint],
    triangles: &[TriangleRecord],
    used_ids: &BTreeSet<VertexId>,
) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_mesh(&mut writer, points, triangles, used_ids)?;
    writer.flush()?;
    Ok(())
}
