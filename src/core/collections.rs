//! Collection aliases used across the triangulation core.
//!
//! Centralizing these keeps the storage backend and the hashers swappable
//! without touching algorithm code.

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::core::triangulation_data_structure::TriangleKey;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Arena storage for vertices and triangles.
///
/// Keys stay valid across insertions, which is what lets neighbor slots hold
/// plain handles instead of shared pointers.
pub type StorageMap<K, V> = SlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// `HashSet` with the fast non-cryptographic Fx hasher.
pub type FastHashSet<T> = FxHashSet<T>;

/// Inline-first vector that spills to the heap past `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Largest number of triangles a single split creates or mutates.
pub const SPLIT_BUFFER_SIZE: usize = 4;

/// Keys produced by one split: three for an interior split, two or four for an edge split.
pub type TriangleKeyBuffer = SmallBuffer<TriangleKey, SPLIT_BUFFER_SIZE>;

/// Inline capacity of one grid cell before spilling.
pub const GRID_CELL_INLINE_CAPACITY: usize = 8;

/// Triangle references held by one grid cell.
pub type GridCellBuffer = SmallBuffer<TriangleKey, GRID_CELL_INLINE_CAPACITY>;
