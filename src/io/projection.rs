//! Projection of survey points onto the triangulation plane.
//!
//! A point `(x, y, z)` maps to the planar vertex `(x * z, y * z)` with the same id.

use crate::core::vertex::Vertex;
use crate::io::parser::SurveyPoint;

impl SurveyPoint {
    /// The planar vertex this point projects to.
    #[must_use]
    pub const fn project(&self) -> Vertex {
        Vertex::new(self.id, self.x * self.z, self.y * self.z)
    }
}

/// Projects every point, keeping input order.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::io::parser::SurveyPoint;
/// use planar_delaunay::io::projection::project_vertices;
///
/// let points = [SurveyPoint { id: 3, x: 1.5, y: -2.0, z: 2.0 }];
/// let vertices = project_vertices(&points);
/// assert_eq!(vertices[0].id(), 3);
/// assert_eq!(vertices[0].coords(), [3.0, -4.0]);
/// ```
#[must_use]
pub fn project_vertices(points: &[SurveyPoint]) -> Vec<Vertex> {
    points.iter().map(SurveyPoint::project).collect()
}
