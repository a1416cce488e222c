//! # Frenzy Grid
//!
//! Uniform spatial hash grid for the Frenzy combat simulation.
//!
//! Units move every tick, so the index is never patched incrementally. It is
//! cleared and rebuilt from the authoritative unit list once per tick, and
//! radius queries only touch the handful of cells around the query circle.
//! That turns the O(n²) "who is near me" problem into near O(n) per tick.
//!
//! - **Cheap keys**: a cell is identified by a single `i64` derived from its
//!   two cell coordinates, no tuples or strings hashed on the hot path
//! - **Pooled buckets**: cell buckets are kept across `clear()` calls, so a
//!   steady-state rebuild does not allocate
//! - **Over-inclusive queries**: `get_nearby` returns every entry in cells
//!   overlapping the circle; callers filter by exact distance
//!
//! ## Quick Start
//!
//! ```
//! use frenzy_grid::SpatialHashGrid;
//! use glam::Vec2;
//!
//! let mut grid: SpatialHashGrid<Vec2> = SpatialHashGrid::new(25.0);
//! grid.insert(Vec2::new(10.0, 10.0));
//! grid.insert(Vec2::new(500.0, 500.0));
//!
//! let nearby = grid.get_nearby(Vec2::new(12.0, 8.0), 5.0);
//! assert_eq!(nearby.len(), 1);
//!
//! grid.clear();
//! assert!(grid.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod grid;

pub use grid::{cell_key, CellKey, GridStats, Located, SpatialHashGrid, KEY_STRIDE};

use glam::Vec2;

/// Axis-aligned rectangle in world space.
///
/// Used both for map-bounds clamping and for the cell/circle overlap test
/// that lets radius queries skip corner cells the circle never reaches.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Bounds {
    /// Bounds covering a `width` x `height` tile map whose tile coordinates
    /// run from `0` to `width - 1` (and `0` to `height - 1`).
    #[must_use]
    pub fn from_map_size(width: u32, height: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let max = Vec2::new(
            width.saturating_sub(1) as f32,
            height.saturating_sub(1) as f32,
        );
        Self {
            min: Vec2::ZERO,
            max,
        }
    }

    /// Create bounds from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Check if a point is inside the bounds (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Clamp a point into the bounds.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Check if this rectangle intersects a circle.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        center.distance_squared(closest) <= radius * radius
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::from_map_size(100, 100)
    }
}
