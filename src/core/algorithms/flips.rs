//! Edge flips and local Delaunay repair.
//!
//! A flip replaces the diagonal of the convex quadrilateral formed by two
//! adjacent triangles with the other diagonal. Both triangles keep their keys and
//! ids and are reshaped in place.
//!
//! Repair is a single local pass: after an insertion, each edge of each created
//! triangle is tested once with the opposite-angle criterion and flipped if it
//! fails. Flips do not cascade to the triangles they touch, so the result is
//! locally improved rather than globally Delaunay.

use thiserror::Error;

use crate::core::spatial_cache::{CacheError, SpatialCache};
use crate::core::triangle::TriangleId;
use crate::core::triangulation_data_structure::{BindError, Tds, TriangleKey, VertexKey};
use crate::geometry::predicates::{
    Orientation, PredicateError, opposite_angle_sum_ok, orientation,
};

/// Errors raised while flipping an edge.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FlipError {
    /// The edge lies on the hull; there is nothing to flip with
    #[error("Triangle {triangle} has no neighbor across edge {edge}")]
    NoNeighbor {
        /// Id of the triangle
        triangle: TriangleId,
        /// Index of the edge
        edge: usize,
    },

    /// The recorded neighbor does not share the edge
    #[error("Triangle {triangle} and its neighbor across edge {edge} share no edge")]
    NotAdjacent {
        /// Id of the triangle
        triangle: TriangleId,
        /// Index of the edge
        edge: usize,
    },

    /// One of the flipped triangles would not be clockwise
    #[error("Flip of edge {edge} of triangle {triangle} rejected: quadrilateral is not convex")]
    Rejected {
        /// Id of the triangle
        triangle: TriangleId,
        /// Index of the edge
        edge: usize,
    },

    /// A triangle key does not resolve
    #[error("Triangle {key:?} does not exist")]
    MissingTriangle {
        /// The unknown key
        key: TriangleKey,
    },

    /// Relinking neighbors failed
    #[error("Bind failed: {source}")]
    Bind {
        /// The underlying bind error
        #[from]
        source: BindError,
    },

    /// The spatial cache could not be updated
    #[error("Cache update failed: {source}")]
    Cache {
        /// The underlying cache error
        #[from]
        source: CacheError,
    },

    /// Geometric predicate failed
    #[error("Predicate error: {source}")]
    Predicate {
        /// The underlying predicate error
        #[from]
        source: PredicateError,
    },
}

/// Counters collected by [`repair_local`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairStats {
    /// Number of edges tested.
    pub edges_checked: usize,
    /// Number of flips performed.
    pub flips_performed: usize,
    /// Number of flips refused by the convexity guard.
    pub flips_rejected: usize,
}

impl RepairStats {
    /// Adds another pass's counters to these.
    pub const fn accumulate(&mut self, other: Self) {
        self.edges_checked += other.edges_checked;
        self.flips_performed += other.flips_performed;
        self.flips_rejected += other.flips_rejected;
    }
}

fn vertex_keys(tds: &Tds, key: TriangleKey) -> Result<[VertexKey; 3], FlipError> {
    tds.triangle(key)
        .ok_or(FlipError::MissingTriangle { key })?
        .vertex_keys()
        .ok_or(FlipError::Predicate {
            source: PredicateError::MissingVertex { slot: 0 },
        })
}

/// `true` if edge `edge` of `key` satisfies the opposite-angle criterion.
///
/// Hull edges and edges whose neighbor does not share them are reported as
/// locally Delaunay; there is nothing to flip.
///
/// # Errors
///
/// Fails if either triangle's corners cannot be resolved.
pub fn is_locally_delaunay(tds: &Tds, key: TriangleKey, edge: usize) -> Result<bool, FlipError> {
    let triangle = tds.triangle(key).ok_or(FlipError::MissingTriangle { key })?;
    let Some(opposite) = triangle.neighbor(edge) else {
        return Ok(true);
    };
    let Some(j) = tds.shared_edge(opposite, key) else {
        return Ok(true);
    };
    let c = tds.corners(key)?;
    let nc = tds.corners(opposite)?;
    Ok(opposite_angle_sum_ok(
        &c[edge],
        &c[(edge + 1) % 3],
        &nc[j],
        &c[(edge + 2) % 3],
    ))
}

/// Flips edge `edge` of `key` with the neighbor across it.
///
/// With `key = (v1, v2, v3)` rotated so that `v1` is vertex `edge`, and the
/// neighbor's apex `w` facing the edge `v2 - v3`, the two triangles become
/// `key = (v1, w, v3)` and `neighbor = (w, v1, v2)`.
///
/// # Errors
///
/// - [`FlipError::NoNeighbor`] if the edge is on the hull
/// - [`FlipError::Rejected`] if either new triangle would not be clockwise; the
///   mesh is unchanged
/// - any structural error from binding or cache maintenance
pub fn flip_edge(
    tds: &mut Tds,
    cache: &mut SpatialCache,
    key: TriangleKey,
    edge: usize,
) -> Result<(), FlipError> {
    let triangle = tds.triangle(key).ok_or(FlipError::MissingTriangle { key })?;
    let id = triangle.id();
    let tn = *triangle.neighbors();
    let opposite = triangle
        .neighbor(edge)
        .ok_or(FlipError::NoNeighbor { triangle: id, edge })?;
    let j = tds
        .shared_edge(opposite, key)
        .ok_or(FlipError::NotAdjacent { triangle: id, edge })?;
    let on = *tds
        .triangle(opposite)
        .ok_or(FlipError::MissingTriangle { key: opposite })?
        .neighbors();

    let tk = vertex_keys(tds, key)?;
    let ok = vertex_keys(tds, opposite)?;
    let tc = tds.corners(key)?;
    let oc = tds.corners(opposite)?;
    let (i1, i2) = ((edge + 1) % 3, (edge + 2) % 3);
    let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);

    let epsilon = tds.epsilon();
    if orientation(&tc[edge], &oc[j], &tc[i2], epsilon) != Orientation::RIGHT
        || orientation(&oc[j], &tc[edge], &oc[j2], epsilon) != Orientation::RIGHT
    {
        return Err(FlipError::Rejected { triangle: id, edge });
    }

    cache.remove(tds, key)?;
    cache.remove(tds, opposite)?;
    tds.set_vertices(key, [tk[edge], ok[j], tk[i2]])?;
    tds.set_vertices(opposite, [ok[j], tk[edge], ok[j2]])?;

    tds.bind(key, [on[j2], tn[i1], Some(opposite)])?;
    tds.bind(opposite, [tn[i2], on[j1], Some(key)])?;

    cache.reindex(tds, key)?;
    cache.reindex(tds, opposite)?;
    tracing::debug!("Flipped edge {edge} of triangle {id}");
    Ok(())
}

/// Runs one local repair pass over `created`.
///
/// Every edge of every listed triangle is tested once, re-reading the triangle
/// after each flip. Rejected flips are counted and skipped.
///
/// # Errors
///
/// Any flip failure other than [`FlipError::Rejected`] aborts the pass.
pub fn repair_local(
    tds: &mut Tds,
    cache: &mut SpatialCache,
    created: &[TriangleKey],
) -> Result<RepairStats, FlipError> {
    let mut stats = RepairStats::default();
    for &key in created {
        for edge in 0..3 {
            stats.edges_checked += 1;
            if is_locally_delaunay(tds, key, edge)? {
                continue;
            }
            match flip_edge(tds, cache, key, edge) {
                Ok(()) => stats.flips_performed += 1,
                Err(FlipError::Rejected { triangle, edge }) => {
                    stats.flips_rejected += 1;
                    tracing::debug!("Flip rejected for edge {edge} of triangle {triangle}");
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(stats)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DelaunayConfig;
    use crate::core::factory::TriangleFactory;
    use crate::core::vertex::Vertex;
    use crate::vertex;

    /// Two triangles over the edge `(-1,0)-(1,0)` with apexes at `(0,-h)` and `d`.
    fn pair(h: f64, d: Vertex) -> (Tds, SpatialCache, [TriangleKey; 2]) {
        let mut tds = Tds::new(1e-5);
        let mut factory = TriangleFactory::new();
        let a = tds.insert_vertex(vertex!(1, 0.0, -h));
        let b = tds.insert_vertex(vertex!(2, -1.0, 0.0));
        let c = tds.insert_vertex(vertex!(3, 1.0, 0.0));
        let d = tds.insert_vertex(d);
        let t = factory.create(&mut tds, [a, b, c]);
        let o = factory.create(&mut tds, [d, c, b]);
        tds.bind(t, [Some(o), None, None]).unwrap();
        let cache = SpatialCache::bootstrap(&tds, &[t, o], &DelaunayConfig::default()).unwrap();
        (tds, cache, [t, o])
    }

    fn ids(tds: &Tds, key: TriangleKey) -> [i32; 3] {
        tds.corners(key).unwrap().map(|v| v.id())
    }

    #[test]
    fn test_is_locally_delaunay() {
        let (tds, _, [t, o]) = pair(0.1, vertex!(4, 0.0, 0.1));
        assert!(!is_locally_delaunay(&tds, t, 0).unwrap());
        assert!(!is_locally_delaunay(&tds, o, 0).unwrap());
        // Hull edges.
        assert!(is_locally_delaunay(&tds, t, 1).unwrap());

        let (tds, _, [t, _]) = pair(5.0, vertex!(4, 0.0, 5.0));
        assert!(is_locally_delaunay(&tds, t, 0).unwrap());
    }

    #[test]
    fn test_flip_edge_swaps_diagonal() {
        let (mut tds, mut cache, [t, o]) = pair(0.1, vertex!(4, 0.0, 0.1));
        flip_edge(&mut tds, &mut cache, t, 0).unwrap();

        assert_eq!(ids(&tds, t), [1, 4, 3]);
        assert_eq!(ids(&tds, o), [4, 1, 2]);
        assert_eq!(tds.triangle(t).unwrap().id(), 1);
        assert_eq!(tds.triangle(o).unwrap().id(), 2);
        assert!(tds.is_valid_triangle(t) && tds.is_valid_triangle(o));
        assert_eq!(tds.triangle(t).unwrap().neighbor(2), Some(o));
        assert_eq!(tds.triangle(o).unwrap().neighbor(2), Some(t));
        assert!(tds.validate_neighbors().is_ok());
        assert!(is_locally_delaunay(&tds, t, 2).unwrap());
    }

    #[test]
    fn test_flip_edge_rejects_non_convex_quad() {
        // The far apex lies on the extension of (0,-0.1)-(1,0).
        let (mut tds, mut cache, [t, o]) = pair(0.1, vertex!(4, 2.0, 0.1));
        let before = (tds.triangle(t).cloned(), tds.triangle(o).cloned());
        assert_eq!(
            flip_edge(&mut tds, &mut cache, t, 0),
            Err(FlipError::Rejected {
                triangle: 1,
                edge: 0
            })
        );
        assert_eq!((tds.triangle(t).cloned(), tds.triangle(o).cloned()), before);
    }

    #[test]
    fn test_flip_edge_on_hull_fails() {
        let (mut tds, mut cache, [t, _]) = pair(0.1, vertex!(4, 0.0, 0.1));
        assert_eq!(
            flip_edge(&mut tds, &mut cache, t, 1),
            Err(FlipError::NoNeighbor {
                triangle: 1,
                edge: 1
            })
        );
    }

    #[test]
    fn test_repair_local_single_pass() {
        let (mut tds, mut cache, [t, o]) = pair(0.1, vertex!(4, 0.0, 0.1));
        let stats = repair_local(&mut tds, &mut cache, &[t]).unwrap();
        assert_eq!(
            stats,
            RepairStats {
                edges_checked: 3,
                flips_performed: 1,
                flips_rejected: 0
            }
        );
        assert!(tds.validate_neighbors().is_ok());
        for edge in 0..3 {
            assert!(is_locally_delaunay(&tds, t, edge).unwrap());
            assert!(is_locally_delaunay(&tds, o, edge).unwrap());
        }

        let mut total = RepairStats::default();
        total.accumulate(stats);
        total.accumulate(repair_local(&mut tds, &mut cache, &[t, o]).unwrap());
        assert_eq!(total.edges_checked, 9);
        assert_eq!(total.flips_performed, 1);
    }
}
