//! Incremental vertex insertion by triangle splitting.
//!
//! A new vertex is located, classified against the located triangle, and then
//! inserted by one of two splits:
//!
//! - [`split_inside`]: the triangle becomes three triangles meeting at the vertex
//! - [`split_on_edge`]: the triangle (and its neighbor across the edge, if any)
//!   each become two, for two or four triangles in total
//!
//! # Identity contract
//!
//! A split reshapes the triangles it splits in place instead of replacing them:
//! the key of every split triangle stays valid and names the first of its
//! children, and only the remaining children are allocated through the
//! [`TriangleFactory`]. The returned [`SplitOutcome`] lists the reused keys in
//! their documented positions followed by the newly allocated ones, together
//! with the key of the stored vertex.
//!
//! # Guards
//!
//! Before anything is mutated, every child triangle the split would produce is
//! checked for clockwise orientation. A failed check rejects the vertex with
//! [`InsertionError::GeometricGuard`] and leaves the mesh untouched.

use smallvec::smallvec;

use crate::core::algorithms::locate::{LocateError, LocateResult, locate};
use crate::core::collections::TriangleKeyBuffer;
use crate::core::factory::TriangleFactory;
use crate::core::spatial_cache::{CacheError, SpatialCache};
use crate::core::triangle::TriangleId;
use crate::core::triangulation_data_structure::{BindError, Tds, TriangleKey, VertexKey};
use crate::core::vertex::{Vertex, VertexId};
use crate::geometry::predicates::{Orientation, PointLocation, PredicateError, orientation};

/// Outcome of inserting one vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertionOutcome {
    /// The vertex was inserted; `created` lists every triangle split or allocated
    Inserted {
        /// Key of the stored vertex
        vertex: VertexKey,
        /// Triangles produced by the split, reused keys first
        created: TriangleKeyBuffer,
    },
    /// The vertex coincides with one already placed and was dropped
    Duplicate,
    /// The vertex was rejected by a geometric guard and left out
    Skipped {
        /// Id of the rejected vertex
        vertex_id: VertexId,
    },
}

/// Result of a successful split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitOutcome {
    /// Key of the vertex stored by the split
    pub vertex: VertexKey,
    /// Triangles produced by the split, reused keys first
    pub created: TriangleKeyBuffer,
}

/// Errors raised while inserting a vertex.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InsertionError {
    /// A child triangle of the split would not be clockwise
    #[error("Skipped vertex: {vertex_id} (validation problem in triangle {triangle})")]
    GeometricGuard {
        /// Id of the rejected vertex
        vertex_id: VertexId,
        /// Id of the triangle that could not be split
        triangle: TriangleId,
    },

    /// The vertex lies outside every triangle of the mesh
    #[error("Vertex {vertex_id} lies outside the triangulated region")]
    OutsideTriangulation {
        /// Id of the vertex
        vertex_id: VertexId,
    },

    /// The edge index is not 0, 1 or 2
    #[error("Edge index {edge} is out of range")]
    InvalidEdge {
        /// The offending index
        edge: usize,
    },

    /// A triangle key does not resolve
    #[error("Triangle {key:?} does not exist")]
    MissingTriangle {
        /// The unknown key
        key: TriangleKey,
    },

    /// Point location failed
    #[error("Location failed: {source}")]
    Locate {
        /// The underlying location error
        #[from]
        source: LocateError,
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

/// Vertex keys, corners, neighbors and id of one triangle.
struct Snapshot {
    id: TriangleId,
    keys: [VertexKey; 3],
    corners: [Vertex; 3],
    neighbors: [Option<TriangleKey>; 3],
}

fn snapshot(tds: &Tds, key: TriangleKey) -> Result<Snapshot, InsertionError> {
    let triangle = tds
        .triangle(key)
        .ok_or(InsertionError::MissingTriangle { key })?;
    let corners = triangle.corners(tds)?;
    let keys = triangle
        .vertex_keys()
        .ok_or(PredicateError::MissingVertex { slot: 0 })?;
    Ok(Snapshot {
        id: triangle.id(),
        keys,
        corners,
        neighbors: *triangle.neighbors(),
    })
}

fn guard(
    checks: &[(&Vertex, &Vertex, &Vertex)],
    epsilon: f64,
    vertex: &Vertex,
    triangle: TriangleId,
) -> Result<(), InsertionError> {
    if checks
        .iter()
        .all(|(a, b, c)| orientation(a, b, c, epsilon) == Orientation::RIGHT)
    {
        Ok(())
    } else {
        Err(InsertionError::GeometricGuard {
            vertex_id: vertex.id(),
            triangle,
        })
    }
}

/// Splits `target` into three triangles meeting at `vertex`.
///
/// With `target = (v0, v1, v2)` the children are, in returned order,
/// `target = (p, v0, v1)`, then new `(p, v1, v2)` and `(p, v2, v0)`.
///
/// # Errors
///
/// - [`InsertionError::GeometricGuard`] if a child would not be clockwise; the
///   mesh is unchanged
/// - any structural error from binding or cache maintenance
pub fn split_inside(
    tds: &mut Tds,
    cache: &mut SpatialCache,
    factory: &mut TriangleFactory,
    target: TriangleKey,
    vertex: Vertex,
) -> Result<SplitOutcome, InsertionError> {
    let snap = snapshot(tds, target)?;
    let [c0, c1, c2] = &snap.corners;
    guard(
        &[(&vertex, c0, c1), (&vertex, c1, c2), (&vertex, c2, c0)],
        tds.epsilon(),
        &vertex,
        snap.id,
    )?;

    let [k0, k1, k2] = snap.keys;
    let [n0, n1, n2] = snap.neighbors;
    let p = tds.insert_vertex(vertex);

    cache.remove(tds, target)?;
    tds.set_vertices(target, [p, k0, k1])?;
    let second = factory.create(tds, [p, k1, k2]);
    let third = factory.create(tds, [p, k2, k0]);

    tds.bind(target, [n2, Some(second), Some(third)])?;
    tds.bind(second, [n0, Some(third), Some(target)])?;
    tds.bind(third, [n1, Some(target), Some(second)])?;

    cache.reindex(tds, target)?;
    cache.insert(tds, second)?;
    cache.insert(tds, third)?;

    tracing::debug!(
        "Vertex {} split triangle {} into three",
        vertex.id(),
        snap.id
    );
    Ok(SplitOutcome {
        vertex: p,
        created: smallvec![target, second, third],
    })
}

/// Far side of an edge split: the neighbor across the edge and its layout.
struct FarSide {
    key: TriangleKey,
    apex: VertexKey,
    first: VertexKey,
    second: VertexKey,
    first_neighbor: Option<TriangleKey>,
    second_neighbor: Option<TriangleKey>,
}

/// Splits the edge of `target` opposite vertex `edge` at `vertex`.
///
/// Let `target = (a, v1, v2)` rotated so that `a` is vertex `edge`. The near side
/// becomes `target = (a, v1, p)` and new `(a, p, v2)`. If a neighbor lies across
/// the edge, it is rotated the same way to `(b, v2, v1)` and becomes
/// `neighbor = (b, v2, p)` and new `(b, p, v1)`.
///
/// The returned order is `target`, its new sibling, then the neighbor and its new
/// sibling when the edge is interior.
///
/// # Errors
///
/// - [`InsertionError::InvalidEdge`] if `edge > 2`
/// - [`InsertionError::GeometricGuard`] if any of the up to four children would
///   not be clockwise; the mesh is unchanged
/// - any structural error from binding or cache maintenance
pub fn split_on_edge(
    tds: &mut Tds,
    cache: &mut SpatialCache,
    factory: &mut TriangleFactory,
    target: TriangleKey,
    edge: usize,
    vertex: Vertex,
) -> Result<SplitOutcome, InsertionError> {
    if edge > 2 {
        return Err(InsertionError::InvalidEdge { edge });
    }
    let epsilon = tds.epsilon();
    let near = snapshot(tds, target)?;
    let (i1, i2) = ((edge + 1) % 3, (edge + 2) % 3);
    guard(
        &[
            (&near.corners[edge], &near.corners[i1], &vertex),
            (&near.corners[edge], &vertex, &near.corners[i2]),
        ],
        epsilon,
        &vertex,
        near.id,
    )?;

    let far = match near.neighbors[edge] {
        None => None,
        Some(key) => {
            let snap = snapshot(tds, key)?;
            let j = tds
                .shared_edge(key, target)
                .ok_or(BindError::NoSharedEdge {
                    inner: target,
                    outer: key,
                    slot: edge,
                })?;
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            guard(
                &[
                    (&snap.corners[j], &snap.corners[j1], &vertex),
                    (&snap.corners[j], &vertex, &snap.corners[j2]),
                ],
                epsilon,
                &vertex,
                snap.id,
            )?;
            Some(FarSide {
                key,
                apex: snap.keys[j],
                first: snap.keys[j1],
                second: snap.keys[j2],
                first_neighbor: snap.neighbors[j1],
                second_neighbor: snap.neighbors[j2],
            })
        }
    };

    let apex = near.keys[edge];
    let (first, second) = (near.keys[i1], near.keys[i2]);
    let (first_neighbor, second_neighbor) = (near.neighbors[i1], near.neighbors[i2]);
    let p = tds.insert_vertex(vertex);

    cache.remove(tds, target)?;
    if let Some(far) = &far {
        cache.remove(tds, far.key)?;
    }

    tds.set_vertices(target, [apex, first, p])?;
    let near_sibling = factory.create(tds, [apex, p, second]);
    let far_sibling = match &far {
        Some(far) => {
            tds.set_vertices(far.key, [far.apex, far.first, p])?;
            Some(factory.create(tds, [far.apex, p, far.second]))
        }
        None => None,
    };

    tds.bind(target, [far_sibling, Some(near_sibling), second_neighbor])?;
    tds.bind(
        near_sibling,
        [far.as_ref().map(|f| f.key), first_neighbor, Some(target)],
    )?;
    if let (Some(far), Some(far_sibling)) = (&far, far_sibling) {
        tds.bind(
            far.key,
            [Some(near_sibling), Some(far_sibling), far.second_neighbor],
        )?;
        tds.bind(far_sibling, [Some(target), far.first_neighbor, Some(far.key)])?;
    }

    cache.reindex(tds, target)?;
    cache.insert(tds, near_sibling)?;
    let mut created: TriangleKeyBuffer = smallvec![target, near_sibling];
    if let (Some(far), Some(far_sibling)) = (&far, far_sibling) {
        cache.reindex(tds, far.key)?;
        cache.insert(tds, far_sibling)?;
        created.push(far.key);
        created.push(far_sibling);
    }

    tracing::debug!(
        "Vertex {} split edge {edge} of triangle {} into {} triangles",
        vertex.id(),
        near.id,
        created.len()
    );
    Ok(SplitOutcome {
        vertex: p,
        created,
    })
}

/// Locates `vertex` and inserts it with the matching split.
///
/// Local Delaunay repair is not part of this step; callers run it over the
/// returned triangles.
///
/// # Errors
///
/// - [`InsertionError::GeometricGuard`] when the split is rejected
/// - [`InsertionError::OutsideTriangulation`] when the vertex lies outside the mesh
/// - any location, predicate or structural error
pub fn insert_vertex(
    tds: &mut Tds,
    cache: &mut SpatialCache,
    factory: &mut TriangleFactory,
    vertex: Vertex,
) -> Result<InsertionOutcome, InsertionError> {
    let target = match locate(tds, cache, &vertex)? {
        LocateResult::Duplicate => return Ok(InsertionOutcome::Duplicate),
        LocateResult::Triangle(key) => key,
    };

    let split = match tds.classify(target, &vertex)? {
        PointLocation::Inside => split_inside(tds, cache, factory, target, vertex)?,
        PointLocation::OnEdge(edge) => split_on_edge(tds, cache, factory, target, edge, vertex)?,
        PointLocation::Outside => {
            return Err(InsertionError::OutsideTriangulation {
                vertex_id: vertex.id(),
            });
        }
    };

    Ok(InsertionOutcome::Inserted {
        vertex: split.vertex,
        created: split.created,
    })
}

// =============================================================================
// TESTS
// =============================================================================
