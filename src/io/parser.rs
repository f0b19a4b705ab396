//! Survey coordinate files.
//!
//! Each data line has the form `id, x, y, z` followed by anything: an unsigned
//! integer id and three decimal numbers (optional sign, optional fraction,
//! optional exponent). Lines whose first non-blank character is `*` are
//! comments. Any other line is reported and skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::vertex::VertexId;

/// One point read from a coordinate file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurveyPoint {
    /// Point id
    pub id: VertexId,
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
    /// z coordinate
    pub z: f64,
}

/// Errors raised while reading or writing mesh files.
#[derive(Debug, Error)]
pub enum IoError {
    /// The underlying reader or writer failed
    #[error("I/O error: {source}")]
    Io {
        /// The underlying error
        #[from]
        source: std::io::Error,
    },

    /// A data line carries an id that does not fit a vertex id
    #[error("Line {line}: id {id} is out of range")]
    Parse {
        /// One-based line number
        line: usize,
        /// The offending id text
        id: String,
    },
}

/// Splits a leading run of bytes matching `pred` off `s`.
fn take_while(s: &str, pred: impl Fn(u8) -> bool) -> (&str, &str) {
    let end = s.bytes().position(|b| !pred(b)).unwrap_or(s.len());
    s.split_at(end)
}

/// Splits one number `[-+]?[0-9]+\.?[0-9]*([eE][-+]?[0-9]+)?` off `s`.
fn take_number(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |n| from + n)
    };

    let integer_end = digits(end);
    if integer_end == end {
        return None;
    }
    end = integer_end;
    if bytes.get(end) == Some(&b'.') {
        end = digits(end + 1);
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent_end = digits(end + 1 + sign);
        if exponent_end > end + 1 + sign {
            end = exponent_end;
        }
    }

    let (number, rest) = s.split_at(end);
    number.parse().ok().map(|value| (value, rest))
}

enum Line {
    Comment,
    Point { id: String, coords: [f64; 3] },
    Unparseable,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim_start();
    if line.starts_with('*') {
        return Line::Comment;
    }
    let (id, mut rest) = take_while(line, |b| b.is_ascii_digit());
    if id.is_empty() {
        return Line::Unparseable;
    }

    let mut coords = [0.0; 3];
    for coord in &mut coords {
        let Some(after_comma) = rest.strip_prefix(',') else {
            return Line::Unparseable;
        };
        let Some((value, after)) = take_number(after_comma.trim_start()) else {
            return Line::Unparseable;
        };
        *coord = value;
        rest = after;
    }
    Line::Point {
        id: id.to_string(),
        coords,
    }
}

/// Reads every data line of `reader`.
///
/// Unparseable lines are logged with `warn!` and skipped.
///
/// # Errors
///
/// - [`IoError::Io`] if reading fails
/// - [`IoError::Parse`] if an id does not fit a vertex id
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::io::parser::parse_coordinates;
///
/// let text = "* header\n1, 0.5, 2, -3e-1\nnot a point\n   2,1.0,1.0,1.0 trailing\n";
/// let points = parse_coordinates(text.as_bytes()).unwrap();
/// assert_eq!(points.len(), 2);
/// assert_eq!(points[0].z, -0.3);
/// assert_eq!(points[1].id, 2);
/// ```
pub fn parse_coordinates(reader: impl BufRead) -> Result<Vec<SurveyPoint>, IoError> {
    let mut points = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Line::Comment => {}
            Line::Point { id, coords: [x, y, z] } => {
                let id = id.parse::<VertexId>().map_err(|_| IoError::Parse {
                    line: index + 1,
                    id: id.clone(),
                })?;
                points.push(SurveyPoint { id, x, y, z });
            }
            Line::Unparseable => tracing::warn!("Can not load line: {line}"),
        }
    }
    Ok(points)
}

/// Reads a coordinate file from disk.
///
/// # Errors
///
/// Same as [`parse_coordinates`], plus failure to open the file.
pub fn read_coordinates(path: impl AsRef<Path>) -> Result<Vec<SurveyPoint>, IoError> {
    let file = File::open(path)?;
    parse_coordinates(BufReader::new(file))
}
