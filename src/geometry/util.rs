//! Geometric helper functions.
//!
//! Small utilities shared by the engine and the spatial cache: centroids,
//! distances, bounding rectangles, segment intersection, the synthetic enclosing
//! rectangle, and seeded random vertex generation for tests and benchmarks.

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::vertex::{Vertex, VertexId};
use crate::geometry::predicates::{Orientation, PredicateError, orientation};

// =============================================================================
// BOUNDING RECTANGLE
// =============================================================================

/// Axis-aligned rectangle `[min_x, max_x] x [min_y, max_y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    /// Smallest x coordinate
    pub min_x: f64,
    /// Smallest y coordinate
    pub min_y: f64,
    /// Largest x coordinate
    pub max_x: f64,
    /// Largest y coordinate
    pub max_y: f64,
}

impl BoundingRect {
    /// Smallest rectangle containing every vertex.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::EmptyInput`] if `vertices` is empty.
    pub fn from_vertices<'a, I>(vertices: I) -> Result<Self, PredicateError>
    where
        I: IntoIterator<Item = &'a Vertex>,
    {
        let mut iter = vertices.into_iter();
        let first = iter.next().ok_or(PredicateError::EmptyInput {
            operation: "bounding_rect",
        })?;
        let start = Self {
            min_x: first.x(),
            min_y: first.y(),
            max_x: first.x(),
            max_y: first.y(),
        };
        Ok(iter.fold(start, |rect, v| Self {
            min_x: rect.min_x.min(v.x()),
            min_y: rect.min_y.min(v.y()),
            max_x: rect.max_x.max(v.x()),
            max_y: rect.max_y.max(v.y()),
        }))
    }

    /// The rectangle grown by `margin` on every side.
    #[must_use]
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Width along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Bounding rectangle of a triangle's three corners.
#[must_use]
pub fn bounding_rect(corners: &[Vertex; 3]) -> BoundingRect {
    let [a, b, c] = corners;
    BoundingRect {
        min_x: a.x().min(b.x()).min(c.x()),
        min_y: a.y().min(b.y()).min(c.y()),
        max_x: a.x().max(b.x()).max(c.x()),
        max_y: a.y().max(b.y()).max(c.y()),
    }
}

// =============================================================================
// MEASURES
// =============================================================================

/// Centroid of a triangle, tagged with the `sentinel` id.
#[must_use]
pub fn centroid(corners: &[Vertex; 3], sentinel: VertexId) -> Vertex {
    let [a, b, c] = corners;
    Vertex::new(
        sentinel,
        (a.x() + b.x() + c.x()) / 3.0,
        (a.y() + b.y() + c.y()) / 3.0,
    )
}

/// Euclidean distance between two vertices.
#[must_use]
pub fn distance(a: &Vertex, b: &Vertex) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Euclidean distance from the centroid of `corners` to `point`.
///
/// Same as measuring from [`centroid`], without building a tagged vertex.
#[must_use]
pub fn centroid_distance(corners: &[Vertex; 3], point: &Vertex) -> f64 {
    let [a, b, c] = corners;
    let cx = (a.x() + b.x() + c.x()) / 3.0;
    let cy = (a.y() + b.y() + c.y()) / 3.0;
    (cx - point.x()).hypot(cy - point.y())
}

// =============================================================================
// SEGMENTS
// =============================================================================

fn within_extent(point: &Vertex, from: &Vertex, to: &Vertex) -> bool {
    point.x() >= from.x().min(to.x())
        && point.x() <= from.x().max(to.x())
        && point.y() >= from.y().min(to.y())
        && point.y() <= from.y().max(to.y())
}

const fn opposite_sides(a: Orientation, b: Orientation) -> bool {
    matches!(
        (a, b),
        (Orientation::LEFT, Orientation::RIGHT) | (Orientation::RIGHT, Orientation::LEFT)
    )
}

/// Tests whether segment `a - b` intersects segment `c - d`.
///
/// A proper crossing always counts. With `touch` set, an endpoint lying on the
/// other segment (collinear and within its extent) counts as well.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::geometry::util::segments_intersect;
/// use planar_delaunay::vertex;
///
/// let a = vertex!(1, 0.0, 0.0);
/// let b = vertex!(2, 2.0, 2.0);
/// let c = vertex!(3, 0.0, 2.0);
/// let d = vertex!(4, 2.0, 0.0);
/// assert!(segments_intersect(&a, &b, &c, &d, false, 1e-5));
///
/// // T-junction: only counts when touching is allowed.
/// let e = vertex!(5, 1.0, 1.0);
/// let f = vertex!(6, 3.0, 0.0);
/// assert!(!segments_intersect(&a, &b, &e, &f, false, 1e-5));
/// assert!(segments_intersect(&a, &b, &e, &f, true, 1e-5));
/// ```
#[must_use]
pub fn segments_intersect(
    a: &Vertex,
    b: &Vertex,
    c: &Vertex,
    d: &Vertex,
    touch: bool,
    epsilon: f64,
) -> bool {
    let d1 = orientation(c, d, a, epsilon);
    let d2 = orientation(c, d, b, epsilon);
    let d3 = orientation(a, b, c, epsilon);
    let d4 = orientation(a, b, d, epsilon);

    if opposite_sides(d1, d2) && opposite_sides(d3, d4) {
        return true;
    }
    if !touch {
        return false;
    }

    (d1 == Orientation::COLLINEAR && within_extent(a, c, d))
        || (d2 == Orientation::COLLINEAR && within_extent(b, c, d))
        || (d3 == Orientation::COLLINEAR && within_extent(c, a, b))
        || (d4 == Orientation::COLLINEAR && within_extent(d, a, b))
}

// =============================================================================
// BOOTSTRAP HELPERS
// =============================================================================

/// Corners of the rectangle enclosing `vertices`, padded by `offset`.
///
/// The order is `(min_x, min_y)`, `(min_x, max_y)`, `(max_x, min_y)`,
/// `(max_x, max_y)`. Every corner carries the `sentinel` id.
///
/// # Errors
///
/// Returns [`PredicateError::EmptyInput`] if `vertices` is empty.
pub fn enclosing_rectangle_corners(
    vertices: &[Vertex],
    offset: f64,
    sentinel: VertexId,
) -> Result<[Vertex; 4], PredicateError> {
    let rect = BoundingRect::from_vertices(vertices)
        .map_err(|_| PredicateError::EmptyInput {
            operation: "enclosing_rectangle_corners",
        })?
        .padded(offset);
    Ok([
        Vertex::new(sentinel, rect.min_x, rect.min_y),
        Vertex::new(sentinel, rect.min_x, rect.max_y),
        Vertex::new(sentinel, rect.max_x, rect.min_y),
        Vertex::new(sentinel, rect.max_x, rect.max_y),
    ])
}

/// First clockwise triangle made of the first two vertices and the earliest
/// vertex that is not collinear with them.
///
/// Returns the triangle as indices into `vertices`, or `None` if there are fewer
/// than three vertices or every candidate is collinear with the first two.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::geometry::util::first_non_collinear_triangle;
/// use planar_delaunay::vertex;
///
/// let vs = [
///     vertex!(1, 0.0, 0.0),
///     vertex!(2, 1.0, 0.0),
///     vertex!(3, 2.0, 0.0),
///     vertex!(4, 1.0, 1.0),
/// ];
/// // (0, 3, 1) is the clockwise order of the seed triangle.
/// assert_eq!(first_non_collinear_triangle(&vs, 1e-5), Some([0, 3, 1]));
/// ```
#[must_use]
pub fn first_non_collinear_triangle(vertices: &[Vertex], epsilon: f64) -> Option<[usize; 3]> {
    let [first, second, ..] = vertices else {
        return None;
    };
    vertices
        .iter()
        .enumerate()
        .skip(2)
        .find_map(|(i, v)| match orientation(first, second, v, epsilon) {
            Orientation::RIGHT => Some([0, 1, i]),
            Orientation::LEFT => Some([0, i, 1]),
            Orientation::COLLINEAR => None,
        })
}

// =============================================================================
// RANDOM GENERATION
// =============================================================================

/// Generates `n_vertices` seeded random vertices with ids `1..=n_vertices`.
///
/// Both coordinates are drawn uniformly from `range.0..range.1`.
///
/// # Errors
///
/// Returns [`PredicateError::EmptyInput`] if the range is empty.
pub fn generate_random_vertices_seeded(
    n_vertices: usize,
    range: (f64, f64),
    seed: u64,
) -> Result<Vec<Vertex>, PredicateError> {
    if range.0 >= range.1 || !range.0.is_finite() || !range.1.is_finite() {
        return Err(PredicateError::EmptyInput {
            operation: "generate_random_vertices_seeded",
        });
    }
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Ok((1..=n_vertices)
        .map(|i| {
            let id = VertexId::try_from(i).unwrap_or(VertexId::MAX);
            Vertex::new(
                id,
                rng.random_range(range.0..range.1),
                rng.random_range(range.0..range.1),
            )
        })
        .collect())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vertex::SENTINEL_VERTEX_ID;
    use crate::vertex;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-5;

    #[test]
    fn test_bounding_rect_of_vertices_and_triangle() {
        let tri = [vertex!(1, 0.0, 2.0), vertex!(2, 3.0, -1.0), vertex!(3, 1.0, 4.0)];
        let rect = bounding_rect(&tri);
        assert_eq!(
            rect,
            BoundingRect {
                min_x: 0.0,
                min_y: -1.0,
                max_x: 3.0,
                max_y: 4.0
            }
        );
        assert_eq!(BoundingRect::from_vertices(&tri).unwrap(), rect);
        assert!(rect.contains(3.0, 4.0));
        assert!(!rect.contains(3.1, 4.0));
        assert_relative_eq!(rect.width(), 3.0);
        assert_relative_eq!(rect.height(), 5.0);
    }

    #[test]
    fn test_bounding_rect_rejects_empty_input() {
        let empty: [Vertex; 0] = [];
        assert!(matches!(
            BoundingRect::from_vertices(&empty),
            Err(PredicateError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_distance_and_centroid_distance() {
        let tri = [vertex!(1, 0.0, 0.0), vertex!(2, 0.0, 3.0), vertex!(3, 3.0, 0.0)];
        let c = centroid(&tri, SENTINEL_VERTEX_ID);
        assert_eq!(c.id(), SENTINEL_VERTEX_ID);
        assert_relative_eq!(c.x(), 1.0);
        assert_relative_eq!(c.y(), 1.0);
        assert_relative_eq!(distance(&tri[1], &tri[2]), 18.0_f64.sqrt());
        assert_relative_eq!(centroid_distance(&tri, &vertex!(9, 4.0, 5.0)), 5.0);
        assert_relative_eq!(centroid_distance(&tri, &vertex!(9, 1.0, 1.0)), 0.0);

        // Only coordinates matter, so synthetic corners measure the same.
        let relabeled = tri.map(|v| Vertex::synthetic(v.x(), v.y()));
        let p = vertex!(SENTINEL_VERTEX_ID, -2.0, 0.5);
        assert_relative_eq!(
            centroid_distance(&relabeled, &p),
            centroid_distance(&tri, &p)
        );
        assert_relative_eq!(centroid_distance(&tri, &p), distance(&c, &p));
        assert_relative_eq!(centroid_distance(&tri, &p), 9.25_f64.sqrt());
    }

    #[test]
    fn test_segments_intersect_cases() {
        let a = vertex!(1, 0.0, 0.0);
        let b = vertex!(2, 2.0, 0.0);

        // Parallel, disjoint.
        assert!(!segments_intersect(
            &a,
            &b,
            &vertex!(3, 0.0, 1.0),
            &vertex!(4, 2.0, 1.0),
            true,
            EPS
        ));
        // Shared endpoint.
        let c = vertex!(5, 2.0, 2.0);
        assert!(!segments_intersect(&a, &b, &b, &c, false, EPS));
        assert!(segments_intersect(&a, &b, &b, &c, true, EPS));
        // Collinear, beyond the extent.
        let far = [vertex!(6, 3.0, 0.0), vertex!(7, 4.0, 0.0)];
        assert!(!segments_intersect(&a, &b, &far[0], &far[1], true, EPS));
    }

    #[test]
    fn test_enclosing_rectangle_corner_order() {
        let vs = [vertex!(1, 1.0, 1.0), vertex!(2, 3.0, 2.0), vertex!(3, 2.0, 0.0)];
        let corners = enclosing_rectangle_corners(&vs, 1.0, SENTINEL_VERTEX_ID).unwrap();
        let coords: Vec<[f64; 2]> = corners.iter().map(Vertex::coords).collect();
        assert_eq!(
            coords,
            vec![[0.0, -1.0], [0.0, 3.0], [4.0, -1.0], [4.0, 3.0]]
        );
        assert!(corners.iter().all(|c| c.id() == SENTINEL_VERTEX_ID));
        assert!(enclosing_rectangle_corners(&[], 1.0, SENTINEL_VERTEX_ID).is_err());
    }

    #[test]
    fn test_first_non_collinear_triangle() {
        let clockwise = [vertex!(1, 0.0, 0.0), vertex!(2, 0.0, 1.0), vertex!(3, 1.0, 0.0)];
        assert_eq!(first_non_collinear_triangle(&clockwise, EPS), Some([0, 1, 2]));

        let collinear = [vertex!(1, 0.0, 0.0), vertex!(2, 1.0, 1.0), vertex!(3, 2.0, 2.0)];
        assert_eq!(first_non_collinear_triangle(&collinear, EPS), None);
        assert_eq!(first_non_collinear_triangle(&collinear[..2], EPS), None);
    }

    #[test]
    fn test_random_vertices_are_reproducible() {
        let a = generate_random_vertices_seeded(25, (-10.0, 10.0), 7).unwrap();
        let b = generate_random_vertices_seeded(25, (-10.0, 10.0), 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.first().map(Vertex::id), Some(1));
        assert_eq!(a.last().map(Vertex::id), Some(25));
        assert!(
            a.iter()
                .all(|v| (-10.0..10.0).contains(&v.x()) && (-10.0..10.0).contains(&v.y()))
        );
        assert!(generate_random_vertices_seeded(3, (1.0, 1.0), 7).is_err());
    }
}
