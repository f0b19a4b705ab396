//! Incremental Delaunay triangulation engine.
//!
//! [`DelaunayTriangulation`] drives the whole run through a small state machine:
//!
//! ```text
//! NotStarted -> Bootstrapped -> Inserting -> PostProcess -> Done
//!                                   |
//!                                   v
//!                                 Failed
//! ```
//!
//! - **bootstrap** builds the starting mesh, by default two synthetic triangles
//!   covering a padded rectangle around every input point, and the spatial cache
//! - **insert** adds one real point: locate, split, then one local repair pass
//!   over the triangles the split produced
//! - **finish** drops every triangle touching a synthetic vertex and reports the
//!   remaining triangles and the set of vertex ids they use
//!
//! A point rejected by a geometric guard is skipped with a warning and the run
//! continues. A point that cannot be placed inside the current mesh is a
//! [`DelaunayError::NotImplemented`] error; the synthetic rectangle bootstrap makes
//! this unreachable for points that were part of the bootstrap input.
//!
//! Any other insertion or repair error may leave the mesh half rewritten, so
//! it moves the engine to [`TriangulationState::Failed`]; from there every
//! further `insert` or `finish` is an [`DelaunayError::InvalidState`] error.
//!
//! # Known limitations
//!
//! - Repair is not propagated: triangles changed by a flip are not re-checked
//!   against their own neighbors, so the result is not guaranteed to be globally
//!   Delaunay.
//! - Filtering synthetic triangles does not re-triangulate the boundary they
//!   leave behind, which may therefore be non-convex.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::flips::{FlipError, repair_local};
use crate::core::algorithms::incremental_insertion::{
    InsertionError, InsertionOutcome, insert_vertex,
};
use crate::core::algorithms::locate::LocateError;
use crate::core::collections::FastHashSet;
use crate::core::config::{BootstrapStrategy, DelaunayConfig};
use crate::core::factory::TriangleFactory;
use crate::core::spatial_cache::{CacheError, SpatialCache};
use crate::core::triangle::TriangleId;
use crate::core::triangulation_data_structure::{
    BindError, Tds, TdsValidationError, TriangleKey,
};
use crate::core::vertex::{Vertex, VertexId};
use crate::geometry::predicates::PredicateError;
use crate::geometry::util::{enclosing_rectangle_corners, first_non_collinear_triangle};

// =============================================================================
// STATE AND ERRORS
// =============================================================================

/// Lifecycle of a triangulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriangulationState {
    /// Nothing has happened yet
    #[default]
    NotStarted,
    /// The starting mesh and the spatial cache exist
    Bootstrapped,
    /// At least one real point has been processed
    Inserting,
    /// Synthetic triangles are being filtered out
    PostProcess,
    /// The result has been produced
    Done,
    /// A structural error left the mesh inconsistent; the run cannot continue
    Failed,
}

/// The four failure kinds of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unusable bootstrap input or a broken structural invariant; the run aborts
    ValidationFailure,
    /// A split or flip would produce a non-clockwise triangle
    GeometricGuardSkip,
    /// Missing, non-finite or otherwise malformed arguments
    InvalidInput,
    /// A point lies outside every triangle of the mesh
    UnreachableLocation,
}

/// Errors raised by [`DelaunayTriangulation`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DelaunayError {
    /// The bootstrap input cannot seed a mesh
    #[error("Bootstrap validation failed: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The point lies outside the triangulated region; extending the hull is not supported
    #[error("Vertex {vertex_id} lies outside the triangulated region; hull extension is not implemented")]
    NotImplemented {
        /// Id of the point that could not be placed
        vertex_id: VertexId,
    },

    /// Malformed input point
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// The operation is not allowed in the current state
    #[error("{operation} is not allowed in state {state:?}")]
    InvalidState {
        /// The attempted operation
        operation: &'static str,
        /// The state the engine was in
        state: TriangulationState,
    },

    /// Insertion failed
    #[error(transparent)]
    Insertion(#[from] InsertionError),

    /// Local repair failed
    #[error(transparent)]
    Repair(#[from] FlipError),

    /// Spatial cache failure
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Neighbor linking failure
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Geometric predicate failure
    #[error(transparent)]
    Predicate(#[from] PredicateError),
}

impl DelaunayError {
    /// The failure kind this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotImplemented { .. }
            | Self::Insertion(
                InsertionError::OutsideTriangulation { .. }
                | InsertionError::Locate {
                    source: LocateError::OutsideGrid { .. } | LocateError::NoCandidates { .. },
                },
            ) => ErrorKind::UnreachableLocation,
            Self::Insertion(InsertionError::GeometricGuard { .. })
            | Self::Repair(FlipError::Rejected { .. }) => ErrorKind::GeometricGuardSkip,
            Self::InvalidInput { .. }
            | Self::Predicate(_)
            | Self::Insertion(
                InsertionError::Predicate { .. }
                | InsertionError::InvalidEdge { .. }
                | InsertionError::Locate {
                    source: LocateError::PredicateError { .. },
                },
            )
            | Self::Repair(FlipError::Predicate { .. }) => ErrorKind::InvalidInput,
            _ => ErrorKind::ValidationFailure,
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// One output triangle: its id and the ids of its corners in clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriangleRecord {
    /// Triangle id
    pub id: TriangleId,
    /// Corner vertex ids
    pub vertices: [VertexId; 3],
}

impl TriangleRecord {
    /// `true` if any corner carries `id`.
    #[must_use]
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }
}

/// Counters collected over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangulationStatistics {
    /// Real points inserted, bootstrap seeds included
    pub inserted: usize,
    /// Points dropped because they coincide with a placed vertex
    pub duplicates: usize,
    /// Points skipped by a geometric guard
    pub skipped: usize,
    /// Edge flips performed by local repair
    pub flips_performed: usize,
    /// Edge flips refused by the convexity guard
    pub flips_rejected: usize,
    /// Times the spatial grid doubled
    pub grid_growths: usize,
}

/// Final result of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangulationOutput {
    /// Triangles without synthetic corners, in creation order
    pub triangles: Vec<TriangleRecord>,
    /// Distinct vertex ids used by `triangles`
    pub vertex_ids: BTreeSet<VertexId>,
    /// Run counters
    pub statistics: TriangulationStatistics,
}

/// Keeps the records that have no corner carrying `sentinel`.
///
/// Applying the filter to its own output returns the same list.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::core::delaunay_triangulation::{filter_synthetic, TriangleRecord};
///
/// let records = [
///     TriangleRecord { id: 1, vertices: [1, 2, 3] },
///     TriangleRecord { id: 2, vertices: [1, i32::MIN, 3] },
/// ];
/// let kept = filter_synthetic(&records, i32::MIN);
/// assert_eq!(kept, vec![records[0]]);
/// assert_eq!(filter_synthetic(&kept, i32::MIN), kept);
/// ```
#[must_use]
pub fn filter_synthetic(records: &[TriangleRecord], sentinel: VertexId) -> Vec<TriangleRecord> {
    records
        .iter()
        .filter(|r| !r.contains(sentinel))
        .copied()
        .collect()
}

/// Distinct vertex ids used by `records`.
#[must_use]
pub fn vertex_ids(records: &[TriangleRecord]) -> BTreeSet<VertexId> {
    records.iter().flat_map(|r| r.vertices).collect()
}

// =============================================================================
// ENGINE
// =============================================================================

/// Incremental planar Delaunay triangulation.
///
/// # Examples
///
/// ```rust
/// use planar_delaunay::prelude::*;
///
/// let points = [
///     vertex!(1, 1.0, 1.0),
///     vertex!(2, 2.0, 2.0),
///     vertex!(3, 3.0, 1.0),
///     vertex!(4, 2.0, 0.0),
/// ];
/// let output = triangulate(&points, DelaunayConfig::default()).unwrap();
/// assert!(!output.triangles.is_empty());
/// assert!(output.vertex_ids.iter().all(|id| (1..=4).contains(id)));
/// ```
#[derive(Clone, Debug)]
pub struct DelaunayTriangulation {
    config: DelaunayConfig,
    state: TriangulationState,
    tds: Tds,
    cache: Option<SpatialCache>,
    factory: TriangleFactory,
    seed_ids: FastHashSet<VertexId>,
    statistics: TriangulationStatistics,
}

impl Default for DelaunayTriangulation {
    fn default() -> Self {
        Self::new(DelaunayConfig::default())
    }
}

impl DelaunayTriangulation {
    /// Creates an engine that has not been bootstrapped yet.
    #[must_use]
    pub fn new(config: DelaunayConfig) -> Self {
        Self {
            tds: Tds::new(config.epsilon),
            config,
            state: TriangulationState::NotStarted,
            cache: None,
            factory: TriangleFactory::new(),
            seed_ids: FastHashSet::default(),
            statistics: TriangulationStatistics::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TriangulationState {
        self.state
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DelaunayConfig {
        &self.config
    }

    /// The underlying mesh, synthetic triangles included.
    #[must_use]
    pub const fn tds(&self) -> &Tds {
        &self.tds
    }

    /// The spatial cache, once bootstrapped.
    #[must_use]
    pub const fn cache(&self) -> Option<&SpatialCache> {
        self.cache.as_ref()
    }

    /// Counters collected so far.
    #[must_use]
    pub const fn statistics(&self) -> &TriangulationStatistics {
        &self.statistics
    }

    /// Number of triangles in the current mesh, synthetic ones included.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.cache.as_ref().map_or(0, SpatialCache::len)
    }

    /// Checks the neighbor invariant over the whole mesh.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate_neighbors(&self) -> Result<(), TdsValidationError> {
        self.tds.validate_neighbors()
    }

    /// Records of every triangle of the current mesh, synthetic ones included.
    ///
    /// # Errors
    ///
    /// Fails if a triangle has an unresolved corner.
    pub fn triangle_records(&self) -> Result<Vec<TriangleRecord>, DelaunayError> {
        let Some(cache) = &self.cache else {
            return Ok(Vec::new());
        };
        let mut records = Vec::with_capacity(cache.len());
        for &key in cache.triangles() {
            let corners = self.tds.corners(key)?;
            let id = self
                .tds
                .triangle(key)
                .map(|t| t.id())
                .ok_or(PredicateError::MissingVertex { slot: 0 })?;
            records.push(TriangleRecord {
                id,
                vertices: corners.map(|v| v.id()),
            });
        }
        Ok(records)
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[TriangulationState],
    ) -> Result<(), DelaunayError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(DelaunayError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn check_point(&self, vertex: &Vertex) -> Result<(), DelaunayError> {
        if !vertex.is_finite() {
            return Err(DelaunayError::InvalidInput {
                message: format!("vertex {} has non-finite coordinates", vertex.id()),
            });
        }
        if vertex.is_synthetic(self.config.sentinel_id) {
            return Err(DelaunayError::InvalidInput {
                message: format!("vertex id {} is reserved for synthetic vertices", vertex.id()),
            });
        }
        Ok(())
    }

    /// Builds the starting mesh and the spatial cache from `points`.
    ///
    /// With [`BootstrapStrategy::SyntheticRectangle`] no point is added yet; with
    /// [`BootstrapStrategy::FirstNonCollinear`] the three seed points are.
    ///
    /// # Errors
    ///
    /// - [`DelaunayError::InvalidState`] unless the engine is fresh
    /// - [`DelaunayError::InvalidInput`] for a non-finite point, a point carrying
    ///   the sentinel id, or a repeated id
    /// - [`DelaunayError::Validation`] for fewer than three points or, when seeding
    ///   from the input, if every point is collinear with the first two
    pub fn bootstrap(&mut self, points: &[Vertex]) -> Result<(), DelaunayError> {
        self.require("bootstrap", &[TriangulationState::NotStarted])?;
        let mut ids = FastHashSet::default();
        for point in points {
            self.check_point(point)?;
            if !ids.insert(point.id()) {
                return Err(DelaunayError::InvalidInput {
                    message: format!("vertex id {} appears more than once", point.id()),
                });
            }
        }
        if points.len() < 3 {
            return Err(DelaunayError::Validation {
                message: format!("at least 3 points are required, got {}", points.len()),
            });
        }

        let seeds = match self.config.bootstrap {
            BootstrapStrategy::SyntheticRectangle => self.bootstrap_rectangle(points)?,
            BootstrapStrategy::FirstNonCollinear => self.bootstrap_first_triangle(points)?,
        };
        let cache = SpatialCache::bootstrap(&self.tds, &seeds, &self.config)?;
        tracing::debug!(
            "Bootstrapped {:?} with {} triangles for {} points",
            self.config.bootstrap,
            seeds.len(),
            points.len()
        );
        self.cache = Some(cache);
        self.state = TriangulationState::Bootstrapped;
        Ok(())
    }

    fn bootstrap_rectangle(&mut self, points: &[Vertex]) -> Result<Vec<TriangleKey>, DelaunayError> {
        let corners = enclosing_rectangle_corners(
            points,
            self.config.rectangle_offset,
            self.config.sentinel_id,
        )?;
        let [c0, c1, c2, c3] = corners.map(|c| self.tds.insert_vertex(c));
        let first = self.factory.create(&mut self.tds, [c0, c1, c2]);
        let second = self.factory.create(&mut self.tds, [c3, c2, c1]);
        if !(self.tds.is_valid_triangle(first) && self.tds.is_valid_triangle(second)) {
            return Err(DelaunayError::Validation {
                message: "the enclosing rectangle has no area".to_string(),
            });
        }
        self.tds.bind(first, [Some(second), None, None])?;
        Ok(vec![first, second])
    }

    fn bootstrap_first_triangle(
        &mut self,
        points: &[Vertex],
    ) -> Result<Vec<TriangleKey>, DelaunayError> {
        let indices = first_non_collinear_triangle(points, self.config.epsilon).ok_or_else(|| {
            DelaunayError::Validation {
                message: "every point is collinear with the first two".to_string(),
            }
        })?;
        let keys = indices.map(|i| self.tds.insert_vertex(points[i]));
        let seed = self.factory.create(&mut self.tds, keys);
        self.seed_ids.extend(indices.map(|i| points[i].id()));
        self.statistics.inserted += 3;
        Ok(vec![seed])
    }

    /// Inserts one real point and repairs around it.
    ///
    /// A point coinciding with a placed vertex is dropped as
    /// [`InsertionOutcome::Duplicate`]. A point whose split would produce a
    /// non-clockwise triangle is logged and returned as
    /// [`InsertionOutcome::Skipped`]; neither ends the run.
    ///
    /// # Errors
    ///
    /// - [`DelaunayError::InvalidState`] before bootstrap, after finish, or after
    ///   a structural failure
    /// - [`DelaunayError::InvalidInput`] for a malformed point
    /// - [`DelaunayError::NotImplemented`] if the point lies outside the mesh
    /// - any structural failure of the split or the repair pass; the engine
    ///   then moves to [`TriangulationState::Failed`]
    pub fn insert(&mut self, vertex: Vertex) -> Result<InsertionOutcome, DelaunayError> {
        self.require(
            "insert",
            &[TriangulationState::Bootstrapped, TriangulationState::Inserting],
        )?;
        self.check_point(&vertex)?;
        let cache = self.cache.as_mut().ok_or(DelaunayError::InvalidState {
            operation: "insert",
            state: self.state,
        })?;
        self.state = TriangulationState::Inserting;

        let outcome = match insert_vertex(&mut self.tds, cache, &mut self.factory, vertex) {
            Ok(InsertionOutcome::Inserted {
                vertex: key,
                created,
            }) => {
                let repair = repair_local(&mut self.tds, cache, &created).map_err(|e| {
                    tracing::warn!("Repair after vertex {} failed: {e}", vertex.id());
                    self.state = TriangulationState::Failed;
                    DelaunayError::from(e)
                })?;
                self.statistics.inserted += 1;
                self.statistics.flips_performed += repair.flips_performed;
                self.statistics.flips_rejected += repair.flips_rejected;
                InsertionOutcome::Inserted {
                    vertex: key,
                    created,
                }
            }
            Ok(InsertionOutcome::Duplicate) => {
                tracing::debug!("Vertex {} is already present, dropped", vertex.id());
                self.statistics.duplicates += 1;
                InsertionOutcome::Duplicate
            }
            Ok(skipped @ InsertionOutcome::Skipped { .. }) => skipped,
            Err(InsertionError::GeometricGuard { vertex_id, .. }) => {
                tracing::warn!("Skipped vertex: {vertex_id} (validation problem)");
                self.statistics.skipped += 1;
                InsertionOutcome::Skipped { vertex_id }
            }
            Err(
                InsertionError::OutsideTriangulation { .. }
                | InsertionError::Locate {
                    source: LocateError::OutsideGrid { .. } | LocateError::NoCandidates { .. },
                },
            ) => {
                return Err(DelaunayError::NotImplemented {
                    vertex_id: vertex.id(),
                });
            }
            Err(e) => {
                tracing::warn!("Inserting vertex {} failed: {e}", vertex.id());
                self.state = TriangulationState::Failed;
                return Err(e.into());
            }
        };
        self.statistics.grid_growths = cache.growth_count();
        Ok(outcome)
    }

    /// Drops the synthetic triangles and produces the result.
    ///
    /// # Errors
    ///
    /// - [`DelaunayError::InvalidState`] before bootstrap, after a previous finish,
    ///   or once an insertion has failed
    /// - [`DelaunayError::Predicate`] if a triangle has an unresolved corner
    pub fn finish(&mut self) -> Result<TriangulationOutput, DelaunayError> {
        self.require(
            "finish",
            &[TriangulationState::Bootstrapped, TriangulationState::Inserting],
        )?;
        self.state = TriangulationState::PostProcess;
        let records = self.triangle_records()?;
        let triangles = filter_synthetic(&records, self.config.sentinel_id);
        tracing::debug!(
            "Dropped {} synthetic triangles, {} remain",
            records.len() - triangles.len(),
            triangles.len()
        );
        let vertex_ids = vertex_ids(&triangles);
        self.state = TriangulationState::Done;
        Ok(TriangulationOutput {
            triangles,
            vertex_ids,
            statistics: self.statistics,
        })
    }

    /// Runs bootstrap, inserts every point in order, and finishes.
    ///
    /// Seed points already placed by the bootstrap are not inserted again.
    ///
    /// # Errors
    ///
    /// Any error of [`bootstrap`](Self::bootstrap), [`insert`](Self::insert) or
    /// [`finish`](Self::finish); a skipped point is not an error.
    pub fn triangulate(&mut self, points: &[Vertex]) -> Result<TriangulationOutput, DelaunayError> {
        self.bootstrap(points)?;
        for point in points {
            if self.seed_ids.contains(&point.id()) {
                continue;
            }
            self.insert(*point)?;
        }
        self.finish()
    }
}

/// Triangulates `points` in one call with the given configuration.
///
/// # Errors
///
/// See [`DelaunayTriangulation::triangulate`].
pub fn triangulate(
    points: &[Vertex],
    config: DelaunayConfig,
) -> Result<TriangulationOutput, DelaunayError> {
    DelaunayTriangulation::new(config).triangulate(points)
}

// =============================================================================
// TESTS
// =============================================================================
