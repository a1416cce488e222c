//! Uniform spatial hash grid.
//!
//! Entries are bucketed by the cell their position falls in. Cells are keyed
//! by a single integer (`cell_x * KEY_STRIDE + cell_y`), which is computed once
//! per insert and once per scanned cell during a query.
//!
//! # Rebuild model
//!
//! The grid is a derived index: it holds copies of (owner, position) style
//! back-references, never the entities themselves. Callers `clear()` it and
//! re-insert everything once per tick. Buckets are pooled across clears, so
//! after the first few ticks a rebuild performs no allocation beyond what the
//! busiest cell needs.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Integer key identifying one grid cell.
pub type CellKey = i64;

/// Multiplier applied to the cell x coordinate when building a [`CellKey`].
///
/// Cell coordinates are `i32`, so a stride of 2^32 keeps every `(x, y)` pair
/// distinct: `y` can never reach into the next `x` column.
pub const KEY_STRIDE: i64 = 1 << 32;

/// Fraction of a cell added to query radii to absorb float rounding at cell edges.
const EDGE_SLACK: f32 = 1.0e-3;

/// Builds the integer key for a cell.
///
/// # Example
///
/// ```
/// use frenzy_grid::cell_key;
///
/// assert_ne!(cell_key(1, -1), cell_key(0, i32::MAX));
/// assert_eq!(cell_key(3, 4), cell_key(3, 4));
/// ```
#[inline]
#[must_use]
pub fn cell_key(cell_x: i32, cell_y: i32) -> CellKey {
    i64::from(cell_x) * KEY_STRIDE + i64::from(cell_y)
}

/// Anything with a 2D world position can live in the grid.
pub trait Located {
    /// World-space position used for bucketing.
    fn position(&self) -> Vec2;
}

impl Located for Vec2 {
    fn position(&self) -> Vec2 {
        *self
    }
}

/// Occupancy statistics, mostly for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStats {
    /// Number of entries currently stored
    pub entries: usize,
    /// Number of cells holding at least one entry
    pub occupied_cells: usize,
    /// Largest number of entries in a single cell
    pub max_bucket: usize,
    /// Buckets allocated so far (occupied + pooled for reuse)
    pub pooled_buckets: usize,
}

/// Uniform grid index over 2D positions.
///
/// # Example
///
/// ```
/// use frenzy_grid::{Located, SpatialHashGrid};
/// use glam::Vec2;
///
/// #[derive(Clone, Copy)]
/// struct Marker {
///     team: u8,
///     at: Vec2,
/// }
///
/// impl Located for Marker {
///     fn position(&self) -> Vec2 {
///         self.at
///     }
/// }
///
/// let mut grid = SpatialHashGrid::new(10.0);
/// grid.insert(Marker { team: 0, at: Vec2::new(1.0, 1.0) });
/// grid.insert(Marker { team: 1, at: Vec2::new(4.0, 1.0) });
/// grid.insert(Marker { team: 1, at: Vec2::new(90.0, 90.0) });
///
/// let hostiles = grid
///     .query_radius(Vec2::new(1.0, 1.0), 5.0)
///     .into_iter()
///     .filter(|m| m.team != 0)
///     .count();
/// assert_eq!(hostiles, 1);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialHashGrid<T> {
    /// Cell edge length in world units.
    cell_size: f32,
    /// Cached `1.0 / cell_size`.
    inv_cell_size: f32,
    /// Cell key to bucket index.
    cells: HashMap<CellKey, usize>,
    /// Bucket storage. Only `buckets[..active]` hold live data.
    buckets: Vec<Vec<T>>,
    /// Cell coordinates of each active bucket, parallel to `buckets`.
    bucket_cells: Vec<(i32, i32)>,
    /// Number of buckets claimed since the last clear.
    active: usize,
    /// Total entries since the last clear.
    len: usize,
}

impl<T> SpatialHashGrid<T> {
    /// Creates an empty grid with the given cell size.
    ///
    /// Non-positive or non-finite sizes fall back to `1.0` so that cell
    /// computation can never divide by zero.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
            buckets: Vec::new(),
            bucket_cells: Vec::new(),
            active: 0,
            len: 0,
        }
    }

    /// Returns the cell edge length.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the grid holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Converts a world position to cell coordinates.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    /// World-space rectangle covered by a cell.
    #[allow(clippy::cast_precision_loss)]
    fn cell_bounds(&self, cell_x: i32, cell_y: i32) -> Bounds {
        let min = Vec2::new(cell_x as f32, cell_y as f32) * self.cell_size;
        Bounds::from_min_max(min, min + Vec2::splat(self.cell_size))
    }

    /// Drops all entries.
    ///
    /// Bucket allocations are kept for the next rebuild; the cost is
    /// proportional to the number of occupied cells, which is bounded by the
    /// number of inserts since the previous clear.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets[..self.active] {
            bucket.clear();
        }
        self.bucket_cells.clear();
        self.cells.clear();
        self.active = 0;
        self.len = 0;
    }

    /// Takes the next pooled bucket, allocating only when the pool is dry.
    fn claim_bucket(&mut self, cell: (i32, i32)) -> usize {
        let index = self.active;
        if index == self.buckets.len() {
            self.buckets.push(Vec::new());
        }
        self.bucket_cells.push(cell);
        self.active += 1;
        index
    }

    /// Visits every entry in cells overlapping the circle.
    ///
    /// Cells whose rectangle the circle cannot reach are skipped. Entries in
    /// visited cells are reported even if they lie outside the radius.
    /// Iteration order depends only on the insertion sequence, so identical
    /// rebuilds answer identical queries in identical order.
    pub fn visit_nearby<'a, F>(&'a self, center: Vec2, radius: f32, mut visit: F)
    where
        F: FnMut(&'a T),
    {
        if self.len == 0 {
            return;
        }
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let radius = radius + self.cell_size * EDGE_SLACK;
        let (min_x, min_y) = self.cell_of(center - Vec2::splat(radius));
        let (max_x, max_y) = self.cell_of(center + Vec2::splat(radius));

        let span = (i64::from(max_x) - i64::from(min_x) + 1)
            .saturating_mul(i64::from(max_y) - i64::from(min_y) + 1);
        #[allow(clippy::cast_possible_wrap)]
        let occupied = self.active as i64;

        if span > occupied {
            // Huge query: walking occupied buckets beats walking empty cells.
            for (bucket, &(cell_x, cell_y)) in
                self.buckets[..self.active].iter().zip(&self.bucket_cells)
            {
                let in_range =
                    (min_x..=max_x).contains(&cell_x) && (min_y..=max_y).contains(&cell_y);
                if in_range && self.cell_bounds(cell_x, cell_y).intersects_circle(center, radius)
                {
                    bucket.iter().for_each(&mut visit);
                }
            }
            return;
        }

        for cell_x in min_x..=max_x {
            for cell_y in min_y..=max_y {
                let Some(&index) = self.cells.get(&cell_key(cell_x, cell_y)) else {
                    continue;
                };
                if !self.cell_bounds(cell_x, cell_y).intersects_circle(center, radius) {
                    continue;
                }
                self.buckets[index].iter().for_each(&mut visit);
            }
        }
    }

    /// Returns all entries in cells overlapping the circle.
    ///
    /// This is a superset of the entries truly within `radius`; callers that
    /// need exactness filter by distance (or use [`Self::query_radius`]).
    #[must_use]
    pub fn get_nearby(&self, center: Vec2, radius: f32) -> Vec<&T> {
        let mut results = Vec::new();
        self.visit_nearby(center, radius, |entry| results.push(entry));
        results
    }

    /// Returns occupancy statistics.
    #[must_use]
    pub fn stats(&self) -> GridStats {
        GridStats {
            entries: self.len,
            occupied_cells: self.active,
            max_bucket: self.buckets[..self.active]
                .iter()
                .map(Vec::len)
                .max()
                .unwrap_or(0),
            pooled_buckets: self.buckets.len(),
        }
    }
}

impl<T: Located> SpatialHashGrid<T> {
    /// Inserts an entry into the cell its position falls in.
    pub fn insert(&mut self, entry: T) {
        let cell = self.cell_of(entry.position());
        let key = cell_key(cell.0, cell.1);
        let index = match self.cells.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.claim_bucket(cell);
                self.cells.insert(key, index);
                index
            }
        };
        self.buckets[index].push(entry);
        self.len += 1;
    }

    /// Clears the grid and inserts every entry from `entries`.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.clear();
        self.extend(entries);
    }

    /// Returns entries whose position lies within `radius` of `center`.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<&T> {
        let radius_sq = radius * radius;
        let mut results = Vec::new();
        self.visit_nearby(center, radius, |entry| {
            if entry.position().distance_squared(center) <= radius_sq {
                results.push(entry);
            }
        });
        results
    }
}

impl<T: Located> Extend<T> for SpatialHashGrid<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl<T> Default for SpatialHashGrid<T> {
    fn default() -> Self {
        Self::new(25.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
