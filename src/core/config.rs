//! Engine configuration.
//!
//! Every numeric constant the triangulation depends on lives in one
//! [`DelaunayConfig`] record handed to the engine at construction. Use
//! [`DelaunayConfigBuilder`] to override individual values; unset fields keep
//! their documented defaults.
//!
//! # Examples
//!
//! ```rust
//! use planar_delaunay::core::config::{BootstrapStrategy, DelaunayConfigBuilder};
//!
//! let config = DelaunayConfigBuilder::default()
//!     .epsilon(1e-7)
//!     .bootstrap(BootstrapStrategy::FirstNonCollinear)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.growth_factor, 5);
//! assert_eq!(config.initial_grid_size, 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::vertex::{SENTINEL_VERTEX_ID, VertexId};

/// Tolerance used by predicates and coordinate matching.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Grid growth factor `R`: the grid doubles once `3 * triangles > R * m^2`.
pub const DEFAULT_GROWTH_FACTOR: usize = 5;

/// Grid resolution `m` right after bootstrap.
pub const DEFAULT_INITIAL_GRID_SIZE: usize = 2;

/// Padding of the synthetic rectangle around the input extent.
pub const DEFAULT_RECTANGLE_OFFSET: f64 = 1.0;

/// How the engine builds its starting mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootstrapStrategy {
    /// Two synthetic triangles covering a padded rectangle around every input point.
    #[default]
    SyntheticRectangle,
    /// One triangle made of the first non-collinear triple of input points.
    ///
    /// Points falling outside that triangle reach the unimplemented outside-hull path.
    FirstNonCollinear,
}

/// Numeric configuration of a triangulation run.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct DelaunayConfig {
    /// Tolerance for orientation, classification and coordinate equality.
    #[builder(default = "DEFAULT_EPSILON")]
    pub epsilon: f64,
    /// Grid growth factor `R`.
    #[builder(default = "DEFAULT_GROWTH_FACTOR")]
    pub growth_factor: usize,
    /// Initial grid resolution `m`.
    #[builder(default = "DEFAULT_INITIAL_GRID_SIZE")]
    pub initial_grid_size: usize,
    /// Padding added on every side of the synthetic rectangle.
    #[builder(default = "DEFAULT_RECTANGLE_OFFSET")]
    pub rectangle_offset: f64,
    /// Id carried by synthetic vertices.
    #[builder(default = "SENTINEL_VERTEX_ID")]
    pub sentinel_id: VertexId,
    /// Bootstrap strategy.
    #[builder(default)]
    pub bootstrap: BootstrapStrategy,
}

impl Default for DelaunayConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            initial_grid_size: DEFAULT_INITIAL_GRID_SIZE,
            rectangle_offset: DEFAULT_RECTANGLE_OFFSET,
            sentinel_id: SENTINEL_VERTEX_ID,
            bootstrap: BootstrapStrategy::default(),
        }
    }
}

impl DelaunayConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(epsilon) = self.epsilon
            && !(epsilon.is_finite() && epsilon > 0.0)
        {
            return Err(format!("epsilon must be finite and positive, got {epsilon}"));
        }
        if self.growth_factor == Some(0) {
            return Err("growth_factor must be at least 1".to_string());
        }
        if let Some(size) = self.initial_grid_size
            && size < 2
        {
            return Err(format!("initial_grid_size must be at least 2, got {size}"));
        }
        if let Some(offset) = self.rectangle_offset
            && !(offset.is_finite() && offset >= 0.0)
        {
            return Err(format!(
                "rectangle_offset must be finite and non-negative, got {offset}"
            ));
        }
        Ok(())
    }
}
