//! # planar-delaunay
//!
//! Incremental Delaunay triangulation of labeled points in the plane.
//!
//! Points are inserted one at a time into a mesh that starts as two synthetic
//! triangles covering a padded rectangle around the input. Each insertion splits
//! the triangle (or the pair of triangles sharing an edge) that contains the
//! point, then runs one local pass of edge flips over the new triangles. A
//! uniform grid over the bounding rectangle keeps point location cheap, and
//! doubles its resolution as the mesh gets denser. Triangles touching a
//! synthetic corner are dropped from the result.
//!
//! # Basic Usage
//!
//! ```rust
//! use planar_delaunay::prelude::*;
//!
//! let points = [
//!     vertex!(1, 1.0, 1.0),
//!     vertex!(2, 2.0, 2.0),
//!     vertex!(3, 3.0, 1.0),
//!     vertex!(4, 2.0, 0.0),
//! ];
//!
//! let output = triangulate(&points, DelaunayConfig::default()).unwrap();
//! assert!(!output.triangles.is_empty());
//! assert!(output.vertex_ids.is_subset(&[1, 2, 3, 4].into()));
//! ```
//!
//! The step API exposes the state machine:
//!
//! ```rust
//! use planar_delaunay::prelude::*;
//!
//! let points = [vertex!(1, 0.0, 0.0), vertex!(2, 4.0, 0.0), vertex!(3, 2.0, 3.0)];
//! let mut dt = DelaunayTriangulation::default();
//! dt.bootstrap(&points).unwrap();
//! for p in points {
//!     dt.insert(p).unwrap();
//! }
//! assert_eq!(dt.state(), TriangulationState::Inserting);
//! assert!(dt.validate_neighbors().is_ok());
//!
//! let output = dt.finish().unwrap();
//! assert_eq!(output.statistics.inserted, 3);
//! ```
//!
//! # Mesh Invariants
//!
//! - every triangle lists its vertices in clockwise order
//! - neighbor slot `k` holds the triangle across the edge opposite vertex `k`, and
//!   that triangle links back across the same edge
//! - every triangle is listed in each grid cell its bounding rectangle overlaps
//!
//! # Limitations
//!
//! Repair does not propagate past the triangles created by an insertion, and the
//! boundary left by dropping synthetic triangles is not re-triangulated.
//! Points outside the bootstrap region are reported as not implemented.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Mesh data structures, configuration and the triangulation algorithms.
pub mod core {
    /// Point location, splitting and flipping
    pub mod algorithms {
        /// Edge flips and single-pass local repair
        pub mod flips;
        /// Three-way and edge splits
        pub mod incremental_insertion;
        /// Grid-accelerated point location
        pub mod locate;
    }
    /// Collection aliases
    pub mod collections;
    pub mod config;
    /// The triangulation engine and its results
    pub mod delaunay_triangulation;
    pub mod factory;
    pub mod spatial_cache;
    pub mod triangle;
    pub mod triangulation_data_structure;
    pub mod vertex;

    // Re-export the `core` modules.
    pub use config::*;
    pub use delaunay_triangulation::*;
    pub use factory::*;
    pub use spatial_cache::*;
    pub use triangle::*;
    pub use triangulation_data_structure::*;
    pub use vertex::*;
}

/// Geometric predicates and helpers on planar vertices.
pub mod geometry {
    /// Orientation, classification and the opposite-angle test
    pub mod predicates;
    /// Bounding rectangles, segment intersection, bootstrap helpers
    pub mod util;

    pub use predicates::*;
    pub use util::*;
}

/// Reading survey coordinate files and writing mesh files.
pub mod io {
    pub mod parser;
    pub mod projection;
    pub mod writer;

    pub use parser::*;
    pub use projection::*;
    pub use writer::*;
}

/// A prelude module that re-exports commonly used types and macros.
pub mod prelude {
    pub use crate::core::{
        config::*, delaunay_triangulation::*, factory::*, spatial_cache::*, triangle::*,
        triangulation_data_structure::*, vertex::*,
    };

    pub use crate::core::algorithms::{
        flips::{FlipError, RepairStats},
        incremental_insertion::{InsertionError, InsertionOutcome, SplitOutcome},
        locate::{LocateError, LocateResult},
    };

    pub use crate::core::collections::{FastHashSet, SmallBuffer};

    pub use crate::geometry::{predicates::*, util::*};

    // Convenience macros
    pub use crate::vertex;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            delaunay_triangulation::DelaunayTriangulation, spatial_cache::SpatialCache,
            triangle::Triangle, triangulation_data_structure::Tds, vertex::Vertex,
        },
        is_normal,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<Vertex>());
        assert!(is_normal::<Triangle>());
        assert!(is_normal::<Tds>());
        assert!(is_normal::<SpatialCache>());
        assert!(is_normal::<DelaunayTriangulation>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let mut set: FastHashSet<VertexId> = FastHashSet::default();
        set.insert(7);
        assert!(set.contains(&7));

        let mut buffer: SmallBuffer<i32, 4> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let tri = [vertex!(1, 0.0, 0.0), vertex!(2, 0.0, 2.0), vertex!(3, 2.0, 0.0)];
        assert_eq!(
            orientation(&tri[0], &tri[1], &tri[2], DEFAULT_EPSILON),
            Orientation::RIGHT
        );
        assert_eq!(
            classify(&tri, &vertex!(9, 1.0, 1.0), DEFAULT_EPSILON).unwrap(),
            PointLocation::OnEdge(0)
        );
    }
}
