//! Labeled planar vertices.
//!
//! A [`Vertex`] is an identified 2D point. Vertices are created once, either by the
//! caller or by the bootstrap step, and never mutated afterwards. Synthetic helper
//! vertices (rectangle corners, centroids) carry the sentinel id so that they can be
//! filtered from every result.
//!
//! Two equality notions exist:
//!
//! - *full equality* (`approx::AbsDiffEq`): same id and coordinates within a tolerance
//! - *coordinate equality* ([`Vertex::coincides_with`]): coordinates only, ids ignored
//!
//! Coordinate equality is the one used to detect that a new point lands on an
//! already placed vertex.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::core::config::DEFAULT_EPSILON;

/// Caller-assigned vertex identifier.
pub type VertexId = i32;

/// Id reserved for synthetic vertices that never reach the output.
pub const SENTINEL_VERTEX_ID: VertexId = i32::MIN;

/// Convenience macro for creating a [`Vertex`] from an id and two coordinates.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::vertex;
///
/// let v = vertex!(7, 1.0, 2.5);
/// assert_eq!(v.id(), 7);
/// assert_eq!(v.coords(), [1.0, 2.5]);
/// ```
#[macro_export]
macro_rules! vertex {
    ($id:expr, $x:expr, $y:expr) => {
        $crate::core::vertex::Vertex::new($id, $x, $y)
    };
}

// Re-export the macro at the crate level for convenience
pub use crate::vertex;

// =============================================================================
// VERTEX STRUCT DEFINITION
// =============================================================================

/// An identified point of the plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    id: VertexId,
    x: f64,
    y: f64,
}

impl Vertex {
    /// Creates a vertex with the given id and coordinates.
    #[must_use]
    pub const fn new(id: VertexId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    /// Creates a synthetic vertex carrying [`SENTINEL_VERTEX_ID`].
    #[must_use]
    pub const fn synthetic(x: f64, y: f64) -> Self {
        Self::new(SENTINEL_VERTEX_ID, x, y)
    }

    /// The vertex id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> VertexId {
        self.id
    }

    /// The x coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// The y coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Both coordinates as `[x, y]`.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Returns `true` if this vertex carries `sentinel` as its id.
    #[inline]
    #[must_use]
    pub const fn is_synthetic(&self, sentinel: VertexId) -> bool {
        self.id == sentinel
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Coordinate-only equality: both coordinates differ by strictly less than `epsilon`.
    ///
    /// Ids are ignored, so a synthetic vertex can coincide with a real one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use planar_delaunay::vertex;
    ///
    /// let a = vertex!(1, 0.0, 0.0);
    /// let b = vertex!(2, 0.000_001, 0.0);
    /// assert!(a.coincides_with(&b, 1e-5));
    /// assert!(!a.coincides_with(&vertex!(1, 0.1, 0.0), 1e-5));
    /// ```
    #[must_use]
    pub fn coincides_with(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl AbsDiffEq for Vertex {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        DEFAULT_EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.id == other.id
            && self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

// =============================================================================
// TESTS
// =============================================================================
