//! Triangulation data structure.
//!
//! [`Tds`] owns two arenas: the vertices and the triangles of the mesh. Triangles
//! refer to vertices and to each other through stable slotmap keys, so the
//! triangle-to-triangle adjacency graph contains no reference cycles and every
//! mutation is an explicit arena operation.
//!
//! # Adjacency invariant
//!
//! Whenever triangle `A` records `B` in neighbor slot `k`, the edge of `A` opposite
//! vertex `k` is shared with `B`, and `B` records `A` back in the slot of that same
//! edge. [`Tds::bind`] is the only operation that writes neighbor slots and it
//! checks both halves before touching anything.
//!
//! Triangles are never removed from the arena. Splits and flips reshape existing
//! triangles in place and allocate the extra ones through
//! [`TriangleFactory`](crate::core::factory::TriangleFactory).

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

use crate::core::collections::{FastHashSet, StorageMap};
use crate::core::triangle::Triangle;
use crate::core::vertex::Vertex;
use crate::geometry::predicates::{PointLocation, PredicateError};
use crate::geometry::util::{BoundingRect, bounding_rect};

// =============================================================================
// KEYS
// =============================================================================

new_key_type! {
    /// Key type for accessing vertices in the storage map.
    ///
    /// Keys stay valid for the lifetime of the [`Tds`]; vertices are never removed.
    pub struct VertexKey;
}

new_key_type! {
    /// Key type for accessing triangles in the storage map.
    ///
    /// A key keeps naming the same triangle object while splits and flips change
    /// its shape.
    pub struct TriangleKey;
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by [`Tds::bind`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// A key does not name a triangle of this structure
    #[error("Triangle {key:?} does not exist")]
    MissingTriangle {
        /// The unknown key
        key: TriangleKey,
    },

    /// The inner triangle is missing a vertex or is not clockwise
    #[error("Inner triangle {key:?} is not valid")]
    InvalidInner {
        /// Key of the invalid inner triangle
        key: TriangleKey,
    },

    /// An outer triangle shares no edge with the inner triangle
    #[error("Triangle {outer:?} shares no edge with {inner:?} (slot {slot})")]
    NoSharedEdge {
        /// Key of the inner triangle
        inner: TriangleKey,
        /// Key of the offending outer triangle
        outer: TriangleKey,
        /// Slot the outer triangle was supplied for
        slot: usize,
    },

    /// An outer triangle shares an edge, but not the one opposite its slot
    #[error("Triangle {outer:?} was supplied for slot {slot} but shares edge {shared}")]
    SlotMismatch {
        /// Key of the offending outer triangle
        outer: TriangleKey,
        /// Slot the outer triangle was supplied for
        slot: usize,
        /// Edge actually shared with the inner triangle
        shared: usize,
    },
}

/// Structural problems found by [`Tds::validate_neighbors`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TdsValidationError {
    /// A neighbor slot refers to a triangle that does not exist
    #[error("Triangle {triangle:?} slot {slot} refers to missing triangle {neighbor:?}")]
    DanglingNeighbor {
        /// Triangle holding the bad link
        triangle: TriangleKey,
        /// Slot of the bad link
        slot: usize,
        /// The missing key
        neighbor: TriangleKey,
    },

    /// A neighbor does not sit across the edge its slot names
    #[error("Triangle {triangle:?} slot {slot} holds {neighbor:?}, which is not across that edge")]
    MisplacedNeighbor {
        /// Triangle holding the bad link
        triangle: TriangleKey,
        /// Slot of the bad link
        slot: usize,
        /// The misplaced neighbor
        neighbor: TriangleKey,
    },

    /// A neighbor does not link back
    #[error("Triangle {neighbor:?} does not link back to {triangle:?}")]
    AsymmetricNeighbor {
        /// Triangle holding the one-way link
        triangle: TriangleKey,
        /// The neighbor missing the back link
        neighbor: TriangleKey,
    },

    /// The same triangle appears in two slots
    #[error("Triangle {triangle:?} lists {neighbor:?} more than once")]
    DuplicateNeighbor {
        /// Triangle with the repeated neighbor
        triangle: TriangleKey,
        /// The repeated neighbor
        neighbor: TriangleKey,
    },
}

// =============================================================================
// TDS
// =============================================================================

/// Arena-backed storage of the planar mesh.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tds {
    vertices: StorageMap<VertexKey, Vertex>,
    triangles: StorageMap<TriangleKey, Triangle>,
    epsilon: f64,
}

impl Tds {
    /// Creates an empty structure using `epsilon` for every geometric query.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            vertices: StorageMap::with_key(),
            triangles: StorageMap::with_key(),
            epsilon,
        }
    }

    /// Tolerance used by the geometric queries.
    #[inline]
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Stores a vertex and returns its key.
    pub fn insert_vertex(&mut self, vertex: Vertex) -> VertexKey {
        self.vertices.insert(vertex)
    }

    /// Looks up a vertex.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    /// Iterates over all stored vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> {
        self.vertices.iter()
    }

    /// Number of stored vertices, synthetic ones included.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Stores a triangle and returns its key.
    ///
    /// Only the triangle factory and tests call this directly.
    pub(crate) fn insert_triangle(&mut self, triangle: Triangle) -> TriangleKey {
        self.triangles.insert(triangle)
    }

    /// Looks up a triangle.
    #[must_use]
    pub fn triangle(&self, key: TriangleKey) -> Option<&Triangle> {
        self.triangles.get(key)
    }

    pub(crate) fn triangle_mut(&mut self, key: TriangleKey) -> Option<&mut Triangle> {
        self.triangles.get_mut(key)
    }

    /// Iterates over all triangles.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleKey, &Triangle)> {
        self.triangles.iter()
    }

    /// Number of triangles ever created.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Resolves a triangle's corners.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::MissingVertex`] if the key is unknown (reported as
    /// slot 0) or a vertex slot is empty.
    pub fn corners(&self, key: TriangleKey) -> Result<[Vertex; 3], PredicateError> {
        self.triangle(key)
            .ok_or(PredicateError::MissingVertex { slot: 0 })?
            .corners(self)
    }

    /// `true` if the key names a valid, clockwise triangle.
    #[must_use]
    pub fn is_valid_triangle(&self, key: TriangleKey) -> bool {
        self.triangle(key).is_some_and(|t| t.is_valid(self))
    }

    /// Classifies `point` against the triangle named by `key`.
    ///
    /// # Errors
    ///
    /// Fails if the triangle is unknown or invalid.
    pub fn classify(
        &self,
        key: TriangleKey,
        point: &Vertex,
    ) -> Result<PointLocation, PredicateError> {
        self.triangle(key)
            .ok_or(PredicateError::MissingVertex { slot: 0 })?
            .classify_point(self, point)
    }

    /// Bounding rectangle of the triangle named by `key`.
    ///
    /// # Errors
    ///
    /// Fails if the triangle is unknown or has an empty vertex slot.
    pub fn bounding_rect(&self, key: TriangleKey) -> Result<BoundingRect, PredicateError> {
        Ok(bounding_rect(&self.corners(key)?))
    }

    /// Index of `key`'s edge shared with `other`, or `None`.
    #[must_use]
    pub fn shared_edge(&self, key: TriangleKey, other: TriangleKey) -> Option<usize> {
        let (a, b) = (self.triangle(key)?, self.triangle(other)?);
        a.shared_edge_index_with(self, b)
    }

    /// Reshapes a triangle in place; its key and id are kept.
    pub(crate) fn set_vertices(
        &mut self,
        key: TriangleKey,
        vertices: [VertexKey; 3],
    ) -> Result<(), BindError> {
        self.triangle_mut(key)
            .ok_or(BindError::MissingTriangle { key })?
            .set_vertices(vertices);
        Ok(())
    }

    /// Links `inner` to up to three outer triangles.
    ///
    /// `outers[k]` becomes `inner`'s neighbor across the edge opposite vertex `k`,
    /// and the outer triangle records `inner` back in the slot of the shared edge.
    /// A `None` entry clears `inner`'s slot without touching anything else.
    ///
    /// Every supplied triangle is checked before any slot is written, so a failing
    /// call leaves the structure unchanged.
    ///
    /// # Errors
    ///
    /// - [`BindError::MissingTriangle`] if a key is unknown
    /// - [`BindError::InvalidInner`] if `inner` is not a valid triangle
    /// - [`BindError::NoSharedEdge`] if an outer triangle shares no edge with `inner`
    /// - [`BindError::SlotMismatch`] if it shares an edge other than the slot's
    pub fn bind(
        &mut self,
        inner: TriangleKey,
        outers: [Option<TriangleKey>; 3],
    ) -> Result<(), BindError> {
        let inner_triangle = self
            .triangle(inner)
            .ok_or(BindError::MissingTriangle { key: inner })?;
        if !inner_triangle.is_valid(self) {
            return Err(BindError::InvalidInner { key: inner });
        }

        let mut back_links = [None; 3];
        for (slot, outer) in outers.iter().enumerate() {
            let Some(outer) = *outer else {
                continue;
            };
            let outer_triangle = self
                .triangle(outer)
                .ok_or(BindError::MissingTriangle { key: outer })?;
            let shared = inner_triangle
                .shared_edge_index_with(self, outer_triangle)
                .ok_or(BindError::NoSharedEdge { inner, outer, slot })?;
            if shared != slot {
                return Err(BindError::SlotMismatch {
                    outer,
                    slot,
                    shared,
                });
            }
            let back = outer_triangle
                .shared_edge_index_with(self, inner_triangle)
                .ok_or(BindError::NoSharedEdge { inner, outer, slot })?;
            back_links[slot] = Some((outer, back));
        }

        if let Some(t) = self.triangle_mut(inner) {
            t.set_neighbors(outers);
        }
        for (outer, back) in back_links.into_iter().flatten() {
            if let Some(t) = self.triangle_mut(outer) {
                t.set_neighbor(back, Some(inner));
            }
        }
        Ok(())
    }

    /// Checks the adjacency invariant over every triangle.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate_neighbors(&self) -> Result<(), TdsValidationError> {
        for (key, triangle) in &self.triangles {
            let mut seen = FastHashSet::default();
            for (slot, neighbor) in triangle.neighbors().iter().enumerate() {
                let Some(neighbor) = *neighbor else {
                    continue;
                };
                if !seen.insert(neighbor) {
                    return Err(TdsValidationError::DuplicateNeighbor {
                        triangle: key,
                        neighbor,
                    });
                }
                let Some(other) = self.triangle(neighbor) else {
                    return Err(TdsValidationError::DanglingNeighbor {
                        triangle: key,
                        slot,
                        neighbor,
                    });
                };
                if triangle.shared_edge_index_with(self, other) != Some(slot) {
                    return Err(TdsValidationError::MisplacedNeighbor {
                        triangle: key,
                        slot,
                        neighbor,
                    });
                }
                let back = other.shared_edge_index_with(self, triangle);
                if back.and_then(|b| other.neighbor(b)) != Some(key) {
                    return Err(TdsValidationError::AsymmetricNeighbor {
                        triangle: key,
                        neighbor,
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
