//! Uniform-grid spatial cache over the triangulated region.
//!
//! The cache owns the authoritative list of triangles taking part in the mesh
//! and a square grid of `m x m` cells laid over the (padded) bounding rectangle
//! of the bootstrap mesh. Each cell lists the triangles whose bounding rectangle
//! overlaps it. This over-approximates true overlap: a cell may reference a
//! triangle that does not actually cover any of its area, but a triangle is never
//! missing from a cell it covers.
//!
//! ## Coordinates to cells
//!
//! World coordinates map to cell indices through an affine transform per axis,
//! `i = round(a_x * x + b_x)`, chosen so that the rectangle's minimum maps to 0
//! and its maximum to `m - 1`.
//!
//! ## Growth
//!
//! The grid resolution starts at `m = 2` and only grows. Before a triangle is
//! (re)indexed, if `3 * triangles > R * m^2` the grid doubles `m` over the same
//! rectangle and every listed triangle is re-indexed from scratch.
//!
//! ## Reshaping triangles
//!
//! A triangle whose shape changes must be [`remove`](SpatialCache::remove)d
//! with its old shape and [`reindex`](SpatialCache::reindex)ed with the new one.
//! Removal only clears grid cells; the authoritative list is append-only.

use num_traits::cast;
use thiserror::Error;

use crate::core::collections::GridCellBuffer;
use crate::core::config::DelaunayConfig;
use crate::core::triangulation_data_structure::{Tds, TriangleKey};
use crate::core::vertex::Vertex;
use crate::geometry::predicates::PredicateError;
use crate::geometry::util::BoundingRect;

/// Errors raised by the spatial cache.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CacheError {
    /// Bootstrap was called without triangles
    #[error("Spatial cache bootstrap requires at least one triangle")]
    EmptyBootstrap,

    /// A triangle handed to the cache is missing or not clockwise
    #[error("Triangle {key:?} is not valid")]
    InvalidTriangle {
        /// Key of the rejected triangle
        key: TriangleKey,
    },

    /// The bootstrap rectangle cannot be mapped onto a grid
    #[error("Bounding rectangle {rect:?} cannot be gridded")]
    DegenerateExtent {
        /// The offending rectangle
        rect: BoundingRect,
    },

    /// A triangle's geometry could not be resolved
    #[error("Predicate error: {source}")]
    Predicate {
        /// The underlying predicate error
        #[from]
        source: PredicateError,
    },
}

#[expect(
    clippy::cast_precision_loss,
    reason = "grid resolutions stay far below 2^52"
)]
const fn usize_to_f64(n: usize) -> f64 {
    n as f64
}

/// Affine map from one world axis onto grid indices.
#[derive(Clone, Copy, Debug, PartialEq)]
struct AxisMapping {
    scale: f64,
    shift: f64,
}

impl AxisMapping {
    fn new(min: f64, max: f64, grid_size: usize) -> Self {
        let scale = usize_to_f64(grid_size - 1) / (max - min);
        Self {
            scale,
            shift: -min * scale,
        }
    }

    fn raw(&self, value: f64) -> f64 {
        self.scale.mul_add(value, self.shift).round()
    }

    /// Index of `value`, or `None` if it falls off the grid.
    fn index(&self, value: f64, grid_size: usize) -> Option<usize> {
        cast::<f64, usize>(self.raw(value)).filter(|&i| i < grid_size)
    }

    /// Index of `value`, clamped onto the grid.
    fn clamped_index(&self, value: f64, grid_size: usize) -> usize {
        let upper = grid_size - 1;
        let raw = self.raw(value).clamp(0.0, usize_to_f64(upper));
        cast::<f64, usize>(raw).map_or(0, |i| i.min(upper))
    }
}

/// Grid index over the triangles of the mesh.
#[derive(Clone, Debug)]
pub struct SpatialCache {
    grid_size: usize,
    growth_factor: usize,
    rect: BoundingRect,
    x_axis: AxisMapping,
    y_axis: AxisMapping,
    cells: Vec<GridCellBuffer>,
    triangles: Vec<TriangleKey>,
    growth_count: usize,
}

impl SpatialCache {
    /// Builds the cache around the bootstrap triangles.
    ///
    /// The grid covers the union of the triangles' bounding rectangles padded by
    /// the configured epsilon, starts at the configured resolution, and lists every
    /// bootstrap triangle in every cell.
    ///
    /// # Errors
    ///
    /// - [`CacheError::EmptyBootstrap`] if `triangles` is empty
    /// - [`CacheError::InvalidTriangle`] if any triangle is missing or not clockwise
    /// - [`CacheError::DegenerateExtent`] if the rectangle is not finite
    pub fn bootstrap(
        tds: &Tds,
        triangles: &[TriangleKey],
        config: &DelaunayConfig,
    ) -> Result<Self, CacheError> {
        if triangles.is_empty() {
            return Err(CacheError::EmptyBootstrap);
        }
        let mut rect: Option<BoundingRect> = None;
        for &key in triangles {
            if !tds.is_valid_triangle(key) {
                return Err(CacheError::InvalidTriangle { key });
            }
            let r = tds.bounding_rect(key)?;
            rect = Some(rect.map_or(r, |acc| acc.union(&r)));
        }
        let rect = rect
            .ok_or(CacheError::EmptyBootstrap)?
            .padded(config.epsilon);
        if !(rect.width().is_finite() && rect.height().is_finite())
            || rect.width() <= 0.0
            || rect.height() <= 0.0
        {
            return Err(CacheError::DegenerateExtent { rect });
        }

        let grid_size = config.initial_grid_size.max(2);
        let mut cache = Self {
            grid_size,
            growth_factor: config.growth_factor,
            rect,
            x_axis: AxisMapping::new(rect.min_x, rect.max_x, grid_size),
            y_axis: AxisMapping::new(rect.min_y, rect.max_y, grid_size),
            cells: vec![GridCellBuffer::new(); grid_size * grid_size],
            triangles: triangles.to_vec(),
            growth_count: 0,
        };
        for cell in &mut cache.cells {
            cell.extend(triangles.iter().copied());
        }
        tracing::debug!(
            "Spatial cache bootstrapped: {} triangles, grid {grid_size}x{grid_size}, rect {rect:?}",
            triangles.len()
        );
        Ok(cache)
    }

    /// Current grid resolution `m`.
    #[must_use]
    pub const fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// How many times the grid has doubled.
    #[must_use]
    pub const fn growth_count(&self) -> usize {
        self.growth_count
    }

    /// The padded rectangle covered by the grid.
    #[must_use]
    pub const fn bounding_rect(&self) -> &BoundingRect {
        &self.rect
    }

    /// The authoritative triangle list, in registration order.
    #[must_use]
    pub fn triangles(&self) -> &[TriangleKey] {
        &self.triangles
    }

    /// Number of registered triangles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.triangles.len()
    }

    /// `true` if no triangle is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Grid cell `(i, j)` of the world point `(x, y)`, or `None` off the grid.
    #[must_use]
    pub fn cell_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        Some((
            self.x_axis.index(x, self.grid_size)?,
            self.y_axis.index(y, self.grid_size)?,
        ))
    }

    /// Triangles listed in cell `(i, j)`.
    #[must_use]
    pub fn cell(&self, i: usize, j: usize) -> Option<&[TriangleKey]> {
        if i >= self.grid_size || j >= self.grid_size {
            return None;
        }
        self.cells.get(i * self.grid_size + j).map(|c| c.as_slice())
    }

    /// Candidate triangles for `point`: the contents of its grid cell.
    #[must_use]
    pub fn candidates(&self, point: &Vertex) -> Option<&[TriangleKey]> {
        let (i, j) = self.cell_index(point.x(), point.y())?;
        self.cell(i, j)
    }

    /// Registers a newly created triangle and indexes it.
    ///
    /// # Errors
    ///
    /// Fails if the triangle's geometry cannot be resolved.
    pub fn insert(&mut self, tds: &Tds, key: TriangleKey) -> Result<(), CacheError> {
        self.triangles.push(key);
        self.reindex(tds, key)
    }

    /// Indexes an already registered triangle under its current shape, growing
    /// the grid first when the density threshold is crossed.
    ///
    /// # Errors
    ///
    /// Fails if a triangle's geometry cannot be resolved.
    pub fn reindex(&mut self, tds: &Tds, key: TriangleKey) -> Result<(), CacheError> {
        if 3 * self.triangles.len() > self.growth_factor * self.grid_size * self.grid_size {
            self.grow(tds)
        } else {
            self.index_triangle(tds, key)
        }
    }

    /// Clears a triangle from every cell its current shape maps to.
    ///
    /// # Errors
    ///
    /// Fails if the triangle's geometry cannot be resolved.
    pub fn remove(&mut self, tds: &Tds, key: TriangleKey) -> Result<(), CacheError> {
        let (is, js) = self.cell_range(tds, key)?;
        for i in is {
            for j in js.clone() {
                if let Some(cell) = self.cells.get_mut(i * self.grid_size + j) {
                    cell.retain(|k| *k != key);
                }
            }
        }
        Ok(())
    }

    fn grow(&mut self, tds: &Tds) -> Result<(), CacheError> {
        let grid_size = self.grid_size * 2;
        self.grid_size = grid_size;
        self.x_axis = AxisMapping::new(self.rect.min_x, self.rect.max_x, grid_size);
        self.y_axis = AxisMapping::new(self.rect.min_y, self.rect.max_y, grid_size);
        self.cells = vec![GridCellBuffer::new(); grid_size * grid_size];
        self.growth_count += 1;
        tracing::debug!(
            "Spatial cache grid grown to {grid_size}x{grid_size} for {} triangles",
            self.triangles.len()
        );

        for key in self.triangles.clone() {
            self.index_triangle(tds, key)?;
        }
        Ok(())
    }

    fn cell_range(
        &self,
        tds: &Tds,
        key: TriangleKey,
    ) -> Result<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>), CacheError>
    {
        let rect = tds.bounding_rect(key)?;
        let m = self.grid_size;
        let i0 = self.x_axis.clamped_index(rect.min_x, m);
        let i1 = self.x_axis.clamped_index(rect.max_x, m);
        let j0 = self.y_axis.clamped_index(rect.min_y, m);
        let j1 = self.y_axis.clamped_index(rect.max_y, m);
        Ok((i0..=i1, j0..=j1))
    }

    fn index_triangle(&mut self, tds: &Tds, key: TriangleKey) -> Result<(), CacheError> {
        let (is, js) = self.cell_range(tds, key)?;
        for i in is {
            for j in js.clone() {
                if let Some(cell) = self.cells.get_mut(i * self.grid_size + j)
                    && !cell.contains(&key)
                {
                    cell.push(key);
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
