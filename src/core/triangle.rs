//! Triangle cells of the planar mesh.
//!
//! A [`Triangle`] stores handles, not geometry: three vertex slots in clockwise
//! order and three neighbor slots, where neighbor `k` is the triangle across the
//! edge opposite vertex `k`. Geometric queries resolve the vertex handles through
//! the owning [`Tds`].
//!
//! Slots are optional so that a partially built (invalid) triangle can exist; such
//! a triangle fails every geometric query instead of producing a wrong answer.
//! Neighbor links are only ever written by [`Tds::bind`].

use serde::{Deserialize, Serialize};

use crate::core::triangulation_data_structure::{Tds, TriangleKey, VertexKey};
use crate::core::vertex::{Vertex, VertexId};
use crate::geometry::predicates::{
    Orientation, PointLocation, PredicateError, classify, try_orientation,
};

/// Factory-assigned triangle identifier.
pub type TriangleId = i32;

/// A mesh cell: three clockwise vertex slots and three neighbor slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    id: TriangleId,
    vertices: [Option<VertexKey>; 3],
    neighbors: [Option<TriangleKey>; 3],
}

impl Triangle {
    /// Creates an unlinked triangle over three vertices.
    #[must_use]
    pub const fn new(id: TriangleId, vertices: [VertexKey; 3]) -> Self {
        Self::with_slots(id, [Some(vertices[0]), Some(vertices[1]), Some(vertices[2])])
    }

    /// Creates an unlinked triangle whose vertex slots may be empty.
    #[must_use]
    pub const fn with_slots(id: TriangleId, vertices: [Option<VertexKey>; 3]) -> Self {
        Self {
            id,
            vertices,
            neighbors: [None; 3],
        }
    }

    /// The triangle id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> TriangleId {
        self.id
    }

    /// The three vertex slots in clockwise order.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> &[Option<VertexKey>; 3] {
        &self.vertices
    }

    /// The three neighbor slots; slot `k` is across the edge opposite vertex `k`.
    #[inline]
    #[must_use]
    pub const fn neighbors(&self) -> &[Option<TriangleKey>; 3] {
        &self.neighbors
    }

    /// Neighbor across the edge opposite vertex `k`, if any.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, k: usize) -> Option<TriangleKey> {
        self.neighbors.get(k).copied().flatten()
    }

    pub(crate) const fn set_vertices(&mut self, vertices: [VertexKey; 3]) {
        self.vertices = [Some(vertices[0]), Some(vertices[1]), Some(vertices[2])];
    }

    pub(crate) const fn set_neighbors(&mut self, neighbors: [Option<TriangleKey>; 3]) {
        self.neighbors = neighbors;
    }

    pub(crate) fn set_neighbor(&mut self, k: usize, neighbor: Option<TriangleKey>) {
        if let Some(slot) = self.neighbors.get_mut(k) {
            *slot = neighbor;
        }
    }

    /// Vertex keys, if every slot is populated.
    #[must_use]
    pub const fn vertex_keys(&self) -> Option<[VertexKey; 3]> {
        match self.vertices {
            [Some(a), Some(b), Some(c)] => Some([a, b, c]),
            _ => None,
        }
    }

    /// Resolves the three vertex slots through `tds`.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::MissingVertex`] for the first slot that is empty
    /// or refers to a vertex `tds` does not hold.
    pub fn corners(&self, tds: &Tds) -> Result<[Vertex; 3], PredicateError> {
        let resolve = |slot: usize| {
            self.vertices[slot]
                .and_then(|key| tds.vertex(key))
                .copied()
                .ok_or(PredicateError::MissingVertex { slot })
        };
        Ok([resolve(0)?, resolve(1)?, resolve(2)?])
    }

    /// `true` if all vertex slots resolve and the vertices are clockwise.
    #[must_use]
    pub fn is_valid(&self, tds: &Tds) -> bool {
        let lookup = |slot: usize| self.vertices[slot].and_then(|key| tds.vertex(key));
        matches!(
            try_orientation(lookup(0), lookup(1), lookup(2), tds.epsilon()),
            Ok(Orientation::RIGHT)
        )
    }

    /// Classifies `point` against this triangle.
    ///
    /// # Errors
    ///
    /// Fails with [`PredicateError::MissingVertex`] or
    /// [`PredicateError::InvalidTriangle`] when the triangle is not valid.
    pub fn classify_point(&self, tds: &Tds, point: &Vertex) -> Result<PointLocation, PredicateError> {
        classify(&self.corners(tds)?, point, tds.epsilon())
    }

    /// Index of this triangle's edge shared with `other`, or `None`.
    ///
    /// Vertices are matched by coordinates, not ids, because synthetic vertices all
    /// carry the same sentinel id. Either triangle being invalid yields `None`.
    #[must_use]
    pub fn shared_edge_index_with(&self, tds: &Tds, other: &Self) -> Option<usize> {
        if !self.is_valid(tds) || !other.is_valid(tds) {
            return None;
        }
        let mine = self.corners(tds).ok()?;
        let theirs = other.corners(tds).ok()?;
        let epsilon = tds.epsilon();
        let shared = mine.map(|v| theirs.iter().any(|w| v.coincides_with(w, epsilon)));

        match shared {
            [true, true, _] => Some(2),
            [true, _, true] => Some(1),
            [_, true, true] => Some(0),
            _ => None,
        }
    }

    /// `true` if any corner carries `id`.
    #[must_use]
    pub fn has_vertex_id(&self, tds: &Tds, id: VertexId) -> bool {
        self.vertices
            .iter()
            .flatten()
            .filter_map(|&key| tds.vertex(key))
            .any(|v| v.id() == id)
    }
}
