//! Point location through the spatial cache.
//!
//! The grid cell containing the query point yields a short list of candidate
//! triangles. Candidates are examined in cell order:
//!
//! 1. a candidate with a corner coinciding with the point ends the search with
//!    [`LocateResult::Duplicate`]
//! 2. the first candidate classifying the point as inside or on an edge wins
//! 3. otherwise the candidate whose centroid is nearest to the point is returned
//!
//! When the mesh has a single triangle, or the cell a single candidate, that
//! triangle is returned after the duplicate check without classification; the
//! caller classifies it and handles the outside case.

use crate::core::spatial_cache::SpatialCache;
use crate::core::triangulation_data_structure::{Tds, TriangleKey};
use crate::core::vertex::Vertex;
use crate::geometry::predicates::{PointLocation, PredicateError, classify};
use crate::geometry::util::centroid_distance;

/// Result of a point location query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateResult {
    /// The triangle to insert the point into
    Triangle(TriangleKey),
    /// The point coincides with a vertex already in the mesh
    Duplicate,
}

/// Error during point location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocateError {
    /// The cache holds no triangles
    #[error("Cannot locate in empty triangulation")]
    EmptyCache,

    /// The point maps outside the grid
    #[error("Point ({x}, {y}) lies outside the spatial grid")]
    OutsideGrid {
        /// x coordinate of the query point
        x: f64,
        /// y coordinate of the query point
        y: f64,
    },

    /// The point's grid cell lists no triangle
    #[error("No candidate triangle for point ({x}, {y})")]
    NoCandidates {
        /// x coordinate of the query point
        x: f64,
        /// y coordinate of the query point
        y: f64,
    },

    /// Geometric predicate failed
    #[error("Predicate error: {source}")]
    PredicateError {
        #[from]
        /// The underlying predicate error
        source: PredicateError,
    },
}

fn has_coincident_corner(corners: &[Vertex; 3], point: &Vertex, epsilon: f64) -> bool {
    corners.iter().any(|v| v.coincides_with(point, epsilon))
}

fn single(tds: &Tds, key: TriangleKey, point: &Vertex) -> Result<LocateResult, LocateError> {
    if has_coincident_corner(&tds.corners(key)?, point, tds.epsilon()) {
        Ok(LocateResult::Duplicate)
    } else {
        Ok(LocateResult::Triangle(key))
    }
}

/// Finds the triangle `point` should be inserted into.
///
/// # Errors
///
/// - [`LocateError::EmptyCache`] if there is nothing to search
/// - [`LocateError::OutsideGrid`] if the point maps outside the grid
/// - [`LocateError::NoCandidates`] if its cell is empty
/// - [`LocateError::PredicateError`] if a candidate triangle is invalid
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::core::algorithms::locate::{locate, LocateResult};
/// use planar_delaunay::prelude::*;
///
/// let points = [vertex!(1, 0.0, 0.0), vertex!(2, 4.0, 0.0), vertex!(3, 2.0, 3.0)];
/// let mut dt = DelaunayTriangulation::default();
/// dt.bootstrap(&points).unwrap();
/// let cache = dt.cache().unwrap();
///
/// assert!(matches!(
///     locate(dt.tds(), cache, &vertex!(9, 2.0, 1.0)),
///     Ok(LocateResult::Triangle(_))
/// ));
/// ```
pub fn locate(
    tds: &Tds,
    cache: &SpatialCache,
    point: &Vertex,
) -> Result<LocateResult, LocateError> {
    let epsilon = tds.epsilon();
    match cache.triangles() {
        [] => return Err(LocateError::EmptyCache),
        [only] => return single(tds, *only, point),
        _ => {}
    }

    let candidates = cache.candidates(point).ok_or(LocateError::OutsideGrid {
        x: point.x(),
        y: point.y(),
    })?;
    if let [only] = candidates {
        return single(tds, *only, point);
    }

    let mut nearest: Option<(f64, TriangleKey)> = None;
    for &key in candidates {
        let corners = tds.corners(key)?;
        if has_coincident_corner(&corners, point, epsilon) {
            return Ok(LocateResult::Duplicate);
        }
        if classify(&corners, point, epsilon)? != PointLocation::Outside {
            return Ok(LocateResult::Triangle(key));
        }
        let d = centroid_distance(&corners, point);
        if nearest.is_none_or(|(best, _)| d < best) {
            nearest = Some((d, key));
        }
    }

    nearest
        .map(|(_, key)| LocateResult::Triangle(key))
        .ok_or(LocateError::NoCandidates {
            x: point.x(),
            y: point.y(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DelaunayConfig;
    use crate::core::factory::TriangleFactory;
    use crate::vertex;

    /// Square `[0, 4]^2` split along the `(0,4)-(4,0)` diagonal.
    fn fixture() -> (Tds, SpatialCache, [TriangleKey; 2]) {
        let mut tds = Tds::new(1e-5);
        let mut factory = TriangleFactory::new();
        let a = tds.insert_vertex(vertex!(1, 0.0, 0.0));
        let b = tds.insert_vertex(vertex!(2, 0.0, 4.0));
        let c = tds.insert_vertex(vertex!(3, 4.0, 0.0));
        let d = tds.insert_vertex(vertex!(4, 4.0, 4.0));
        let lower = factory.create(&mut tds, [a, b, c]);
        let upper = factory.create(&mut tds, [d, c, b]);
        tds.bind(lower, [Some(upper), None, None]).unwrap();
        let cache =
            SpatialCache::bootstrap(&tds, &[lower, upper], &DelaunayConfig::default()).unwrap();
        (tds, cache, [lower, upper])
    }

    #[test]
    fn test_locate_prefers_containing_triangle() {
        let (tds, cache, [lower, upper]) = fixture();
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 1.0, 1.0)).unwrap(),
            LocateResult::Triangle(lower)
        );
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 3.0, 3.0)).unwrap(),
            LocateResult::Triangle(upper)
        );
        // On the shared diagonal: the first candidate in cell order wins.
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 2.0, 2.0)).unwrap(),
            LocateResult::Triangle(lower)
        );
    }

    #[test]
    fn test_locate_reports_duplicates() {
        let (tds, cache, _) = fixture();
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 4.0, 4.0)).unwrap(),
            LocateResult::Duplicate
        );
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 0.000_001, 0.0)).unwrap(),
            LocateResult::Duplicate
        );
    }

    #[test]
    fn test_locate_outside_grid_fails() {
        let (tds, cache, _) = fixture();
        assert!(matches!(
            locate(&tds, &cache, &vertex!(9, 50.0, 1.0)),
            Err(LocateError::OutsideGrid { .. })
        ));
    }

    #[test]
    fn test_locate_falls_back_to_nearest_centroid() {
        let mut tds = Tds::new(1e-5);
        let mut factory = TriangleFactory::new();
        let a = tds.insert_vertex(vertex!(1, 0.0, 0.0));
        let b = tds.insert_vertex(vertex!(2, 0.0, 1.0));
        let c = tds.insert_vertex(vertex!(3, 1.0, 0.0));
        let d = tds.insert_vertex(vertex!(4, 4.0, 4.0));
        let e = tds.insert_vertex(vertex!(5, 4.0, 3.0));
        let f = tds.insert_vertex(vertex!(6, 3.0, 4.0));
        let near_origin = factory.create(&mut tds, [a, b, c]);
        let far_corner = factory.create(&mut tds, [d, e, f]);
        let cache = SpatialCache::bootstrap(
            &tds,
            &[near_origin, far_corner],
            &DelaunayConfig::default(),
        )
        .unwrap();

        // Both points are in the grid but outside every triangle.
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 3.0, 3.0)).unwrap(),
            LocateResult::Triangle(far_corner)
        );
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 1.0, 1.5)).unwrap(),
            LocateResult::Triangle(near_origin)
        );
    }

    #[test]
    fn test_locate_with_single_triangle_skips_classification() {
        let mut tds = Tds::new(1e-5);
        let mut factory = TriangleFactory::new();
        let a = tds.insert_vertex(vertex!(1, 0.0, 0.0));
        let b = tds.insert_vertex(vertex!(2, 0.0, 4.0));
        let c = tds.insert_vertex(vertex!(3, 4.0, 0.0));
        let only = factory.create(&mut tds, [a, b, c]);
        let cache = SpatialCache::bootstrap(&tds, &[only], &DelaunayConfig::default()).unwrap();

        // Outside the triangle but still handed back for the caller to classify.
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 3.5, 3.5)).unwrap(),
            LocateResult::Triangle(only)
        );
        assert_eq!(
            locate(&tds, &cache, &vertex!(9, 0.0, 4.0)).unwrap(),
            LocateResult::Duplicate
        );
    }
}
