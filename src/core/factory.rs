//! Triangle allocation.
//!
//! [`TriangleFactory`] is the only creator of new triangles while the algorithm
//! runs. It hands out ids `1, 2, 3, ...` in creation order; a reshaped triangle
//! keeps the id it was created with.

use crate::core::triangle::{Triangle, TriangleId};
use crate::core::triangulation_data_structure::{Tds, TriangleKey, VertexKey};

/// Issues monotonically increasing triangle ids.
#[derive(Clone, Debug)]
pub struct TriangleFactory {
    next_id: TriangleId,
}

impl Default for TriangleFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleFactory {
    /// A factory whose first triangle gets id 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Id the next created triangle will receive.
    #[must_use]
    pub const fn peek_next_id(&self) -> TriangleId {
        self.next_id
    }

    /// Allocates an unlinked triangle over `vertices` in `tds`.
    pub fn create(&mut self, tds: &mut Tds, vertices: [VertexKey; 3]) -> TriangleKey {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        tds.insert_triangle(Triangle::new(id, vertices))
    }
}
