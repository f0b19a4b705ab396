//! Geometric predicates for planar triangulation.
//!
//! This module contains the numerically delicate tests the incremental algorithm
//! is built on: orientation of a point triple, classification of a point against a
//! triangle, and the opposite-angle-sum form of the local Delaunay test.
//!
//! Every predicate works with an absolute tolerance `epsilon` supplied by the
//! caller (see [`DelaunayConfig`](crate::core::config::DelaunayConfig)); no exact
//! arithmetic is attempted.
//!
//! Triangles are expected in clockwise order. A clockwise triple is reported as
//! [`Orientation::RIGHT`].

use crate::core::vertex::Vertex;

// =============================================================================
// TYPES
// =============================================================================

/// Orientation of an ordered point triple `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `c` lies to the right of `a -> b` (clockwise turn, negative cross product)
    RIGHT,
    /// `c` lies to the left of `a -> b` (counter-clockwise turn, positive cross product)
    LEFT,
    /// The three points are collinear within tolerance
    COLLINEAR,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RIGHT => write!(f, "RIGHT"),
            Self::LEFT => write!(f, "LEFT"),
            Self::COLLINEAR => write!(f, "COLLINEAR"),
        }
    }
}

/// Position of a point relative to a clockwise triangle.
///
/// `OnEdge(k)` names the edge opposite vertex `k`, which is also the edge whose
/// neighbor lives in neighbor slot `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    /// Strictly inside the triangle
    Inside,
    /// On the edge opposite the vertex with this index
    OnEdge(usize),
    /// Outside the triangle
    Outside,
}

impl std::fmt::Display for PointLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inside => write!(f, "Inside"),
            Self::OnEdge(edge) => write!(f, "OnEdge({edge})"),
            Self::Outside => write!(f, "Outside"),
        }
    }
}

/// Errors raised when a predicate receives unusable input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredicateError {
    /// A helper was given no points at all
    #[error("{operation} requires at least one vertex")]
    EmptyInput {
        /// Name of the helper that rejected the input
        operation: &'static str,
    },

    /// A vertex slot was empty
    #[error("Vertex slot {slot} is empty")]
    MissingVertex {
        /// Index of the empty slot
        slot: usize,
    },

    /// The triangle is not wound clockwise
    #[error("Triangle is not clockwise (orientation {orientation})")]
    InvalidTriangle {
        /// Orientation actually observed
        orientation: Orientation,
    },

    /// Two vertices that must be distinct coincide
    #[error("Vertices ({x}, {y}) coincide")]
    CoincidentVertices {
        /// x coordinate of the coincident location
        x: f64,
        /// y coordinate of the coincident location
        y: f64,
    },
}

// =============================================================================
// ORIENTATION
// =============================================================================

/// Orientation of `(a, b, c)` from the sign of `(b - a) x (c - a)`.
///
/// A cross product whose magnitude is below `epsilon` is [`Orientation::COLLINEAR`],
/// which also covers coincident points.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::geometry::predicates::{orientation, Orientation};
/// use planar_delaunay::vertex;
///
/// let a = vertex!(1, 0.0, 0.0);
/// let b = vertex!(2, 0.0, 2.0);
/// let c = vertex!(3, 2.0, 0.0);
/// assert_eq!(orientation(&a, &b, &c, 1e-5), Orientation::RIGHT);
/// assert_eq!(orientation(&a, &c, &b, 1e-5), Orientation::LEFT);
/// ```
#[must_use]
pub fn orientation(a: &Vertex, b: &Vertex, c: &Vertex, epsilon: f64) -> Orientation {
    let cross = (b.x() - a.x()) * (c.y() - a.y()) - (c.x() - a.x()) * (b.y() - a.y());
    if cross.abs() < epsilon {
        Orientation::COLLINEAR
    } else if cross < 0.0 {
        Orientation::RIGHT
    } else {
        Orientation::LEFT
    }
}

/// [`orientation`] over possibly empty slots.
///
/// # Errors
///
/// Returns [`PredicateError::MissingVertex`] naming the first empty slot.
pub fn try_orientation(
    a: Option<&Vertex>,
    b: Option<&Vertex>,
    c: Option<&Vertex>,
    epsilon: f64,
) -> Result<Orientation, PredicateError> {
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => Ok(orientation(a, b, c, epsilon)),
        (None, _, _) => Err(PredicateError::MissingVertex { slot: 0 }),
        (_, None, _) => Err(PredicateError::MissingVertex { slot: 1 }),
        (_, _, None) => Err(PredicateError::MissingVertex { slot: 2 }),
    }
}

// =============================================================================
// POINT CLASSIFICATION
// =============================================================================

const fn straddles(a: f64, b: f64, epsilon: f64) -> bool {
    (a >= epsilon && b <= -epsilon) || (a <= -epsilon && b >= epsilon)
}

/// Classifies `point` against the clockwise triangle `corners`.
///
/// One edge function is evaluated per edge. A value within `epsilon` of zero puts
/// the point on that edge, provided the two other edge functions do not disagree
/// in sign (which would place the point on the edge's supporting line but beyond
/// its endpoints). Otherwise the point is inside when all three values share a sign.
///
/// Edges are tested in the order `(0,1)`, `(1,2)`, `(2,0)`.
///
/// # Errors
///
/// Returns [`PredicateError::InvalidTriangle`] if `corners` is not clockwise.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::geometry::predicates::{classify, PointLocation};
/// use planar_delaunay::vertex;
///
/// let tri = [vertex!(1, 0.0, 0.0), vertex!(2, 0.0, 2.0), vertex!(3, 2.0, 0.0)];
/// let eps = 1e-5;
/// assert_eq!(classify(&tri, &vertex!(9, 0.5, 0.5), eps).unwrap(), PointLocation::Inside);
/// assert_eq!(classify(&tri, &vertex!(9, 1.0, 1.0), eps).unwrap(), PointLocation::OnEdge(0));
/// assert_eq!(classify(&tri, &vertex!(9, 3.0, 3.0), eps).unwrap(), PointLocation::Outside);
/// ```
pub fn classify(
    corners: &[Vertex; 3],
    point: &Vertex,
    epsilon: f64,
) -> Result<PointLocation, PredicateError> {
    let [v0, v1, v2] = corners;
    let winding = orientation(v0, v1, v2, epsilon);
    if winding != Orientation::RIGHT {
        return Err(PredicateError::InvalidTriangle {
            orientation: winding,
        });
    }

    let (px, py) = (point.x(), point.y());
    let e01 = (v0.x() - px) * (v1.y() - v0.y()) - (v1.x() - v0.x()) * (v0.y() - py);
    let e12 = (v1.x() - px) * (v2.y() - v1.y()) - (v2.x() - v1.x()) * (v1.y() - py);
    let e20 = (v2.x() - px) * (v0.y() - v2.y()) - (v0.x() - v2.x()) * (v2.y() - py);

    if e01.abs() < epsilon && !straddles(e12, e20, epsilon) {
        return Ok(PointLocation::OnEdge(2));
    }
    if e12.abs() < epsilon && !straddles(e01, e20, epsilon) {
        return Ok(PointLocation::OnEdge(0));
    }
    if e20.abs() < epsilon && !straddles(e01, e12, epsilon) {
        return Ok(PointLocation::OnEdge(1));
    }

    if (e01 > 0.0 && e12 > 0.0 && e20 > 0.0) || (e01 < 0.0 && e12 < 0.0 && e20 < 0.0) {
        Ok(PointLocation::Inside)
    } else {
        Ok(PointLocation::Outside)
    }
}

// =============================================================================
// LOCAL DELAUNAY TEST
// =============================================================================

/// Opposite-angle-sum test for the edge `first - last`.
///
/// `apex` and `opposite_apex` are the two vertices facing the shared edge from
/// either side, and `(apex, first, last)` is clockwise. The edge is locally
/// Delaunay when the angles at the two apexes sum to at most 180 degrees.
///
/// The sums are evaluated without trigonometry: the dot products `s_alpha` and
/// `s_beta` carry the cosines. When their signs disagree the sine terms decide,
/// oriented so that both are positive for a valid clockwise pair.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::geometry::predicates::opposite_angle_sum_ok;
/// use planar_delaunay::vertex;
///
/// let first = vertex!(1, -1.0, 0.0);
/// let last = vertex!(2, 1.0, 0.0);
/// // Two flat apexes: both angles are obtuse, the edge must flip.
/// assert!(!opposite_angle_sum_ok(&vertex!(3, 0.0, -0.1), &first, &vertex!(4, 0.0, 0.1), &last));
/// // Two tall apexes: both angles are acute.
/// assert!(opposite_angle_sum_ok(&vertex!(3, 0.0, -5.0), &first, &vertex!(4, 0.0, 5.0), &last));
/// ```
#[must_use]
pub fn opposite_angle_sum_ok(
    apex: &Vertex,
    first: &Vertex,
    opposite_apex: &Vertex,
    last: &Vertex,
) -> bool {
    let (x0, y0) = (apex.x(), apex.y());
    let (x1, y1) = (first.x(), first.y());
    let (x2, y2) = (opposite_apex.x(), opposite_apex.y());
    let (x3, y3) = (last.x(), last.y());

    let s_alpha = (x0 - x1) * (x0 - x3) + (y0 - y1) * (y0 - y3);
    let s_beta = (x2 - x1) * (x2 - x3) + (y2 - y1) * (y2 - y3);

    if s_alpha < 0.0 && s_beta < 0.0 {
        return false;
    }
    if s_alpha >= 0.0 && s_beta >= 0.0 {
        return true;
    }

    let c_alpha = (x0 - x3) * (y0 - y1) - (x0 - x1) * (y0 - y3);
    let c_beta = (x2 - x1) * (y2 - y3) - (x2 - x3) * (y2 - y1);
    s_alpha * c_beta + c_alpha * s_beta >= 0.0
}

// =============================================================================
// ANGLES
// =============================================================================

fn angle_arms(a: &Vertex, b: &Vertex, c: &Vertex, epsilon: f64) -> Result<[f64; 4], PredicateError> {
    for other in [b, c] {
        if a.coincides_with(other, epsilon) {
            return Err(PredicateError::CoincidentVertices { x: a.x(), y: a.y() });
        }
    }
    Ok([b.x() - a.x(), b.y() - a.y(), c.x() - a.x(), c.y() - a.y()])
}

/// Absolute sine of the angle at `a` between `a -> b` and `a -> c`.
///
/// # Errors
///
/// Returns [`PredicateError::CoincidentVertices`] if `a` coincides with `b` or `c`.
pub fn sin_alpha(a: &Vertex, b: &Vertex, c: &Vertex, epsilon: f64) -> Result<f64, PredicateError> {
    let [ux, uy, vx, vy] = angle_arms(a, b, c, epsilon)?;
    Ok((ux * vy - vx * uy).abs() / (ux.hypot(uy) * vx.hypot(vy)))
}

/// Absolute cosine of the angle at `a` between `a -> b` and `a -> c`.
///
/// # Errors
///
/// Returns [`PredicateError::CoincidentVertices`] if `a` coincides with `b` or `c`.
pub fn cos_alpha(a: &Vertex, b: &Vertex, c: &Vertex, epsilon: f64) -> Result<f64, PredicateError> {
    let [ux, uy, vx, vy] = angle_arms(a, b, c, epsilon)?;
    Ok((ux * vx + uy * vy).abs() / (ux.hypot(uy) * vx.hypot(vy)))
}

// =============================================================================
// TESTS
// =============================================================================
