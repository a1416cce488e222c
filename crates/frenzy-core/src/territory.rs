//! The tile map and ownership authority Frenzy mode runs on top of.
//!
//! The wider game owns the map: who owns which tile, where the water is, and
//! whether the opening spawn phase is still running. Frenzy only reads that
//! state and, during capture, asks it to transfer tiles via
//! [`Territory::conquer`].
//!
//! [`TileMap`] is a plain in-memory implementation used by tests and the
//! headless simulator. A hosting game implements [`Territory`] over its own
//! map instead.
//!
//! # Coordinates
//!
//! Tile `(x, y)` sits at world position `(x, y)`; one tile is one world unit.
//! A unit stands on the tile nearest to its position.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque, stable identifier of a player.
///
/// Ordered by numeric value; every per-player map in the simulation iterates
/// players in this order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a player id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Reference to a single map tile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileRef(u32);

impl TileRef {
    /// Creates a tile reference from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

// =============================================================================
// Territory trait
// =============================================================================

/// Map and ownership queries consumed by the simulation.
///
/// Everything except [`Territory::conquer`] is a read.
pub trait Territory {
    /// Map width in tiles.
    fn width(&self) -> u32;

    /// Map height in tiles.
    fn height(&self) -> u32;

    /// Global game tick counter.
    fn ticks(&self) -> u64;

    /// Whether the opening spawn phase is still running.
    fn in_spawn_phase(&self) -> bool;

    /// Every player currently in the game.
    fn players(&self) -> Vec<PlayerId>;

    /// Tiles owned by `player`, in a stable enumeration order.
    ///
    /// Unknown players own nothing.
    fn owned_tiles(&self, player: PlayerId) -> Vec<TileRef>;

    /// The tile at `(x, y)`, or `None` outside the map.
    fn tile_at(&self, x: i32, y: i32) -> Option<TileRef>;

    /// Tile coordinates.
    fn tile_xy(&self, tile: TileRef) -> (i32, i32);

    /// Current owner of a tile, `None` when unowned.
    fn owner(&self, tile: TileRef) -> Option<PlayerId>;

    /// Calls `visit` for every neighbour of `tile`.
    fn for_each_neighbor(&self, tile: TileRef, visit: &mut dyn FnMut(TileRef));

    /// Whether the tile is water (never capturable).
    fn is_water(&self, tile: TileRef) -> bool;

    /// Transfers ownership of `tile` to `player`.
    ///
    /// Must be a no-op when `player` already owns the tile.
    fn conquer(&mut self, tile: TileRef, player: PlayerId);

    /// Neighbours of `tile` collected into a vector.
    fn neighbors(&self, tile: TileRef) -> Vec<TileRef> {
        let mut out = Vec::with_capacity(4);
        self.for_each_neighbor(tile, &mut |n| out.push(n));
        out
    }

    /// Whether `player` owns `tile`.
    fn is_owned_by(&self, tile: TileRef, player: PlayerId) -> bool {
        self.owner(tile) == Some(player)
    }

    /// Whether any neighbour of `tile` is owned by `player`.
    fn borders_player(&self, tile: TileRef, player: PlayerId) -> bool {
        let mut found = false;
        self.for_each_neighbor(tile, &mut |n| {
            found = found || self.is_owned_by(n, player);
        });
        found
    }

    /// World position of a tile.
    #[allow(clippy::cast_precision_loss)]
    fn tile_position(&self, tile: TileRef) -> Vec2 {
        let (x, y) = self.tile_xy(tile);
        Vec2::new(x as f32, y as f32)
    }

    /// The tile a world position stands on.
    #[allow(clippy::cast_possible_truncation)]
    fn tile_at_position(&self, position: Vec2) -> Option<TileRef> {
        self.tile_at(position.x.round() as i32, position.y.round() as i32)
    }

    /// Centre of the map in world space.
    #[allow(clippy::cast_precision_loss)]
    fn map_center(&self) -> Vec2 {
        Vec2::new(self.width() as f32 / 2.0, self.height() as f32 / 2.0)
    }
}

// =============================================================================
// TileMap
// =============================================================================

/// In-memory [`Territory`] with a 4-neighbourhood.
///
/// # Example
///
/// ```
/// use frenzy_core::territory::{PlayerId, TileMap, Territory};
///
/// let mut map = TileMap::new(20, 20);
/// let red = PlayerId::new(1);
/// map.add_player(red);
/// map.fill_rect(9, 9, 11, 11, red);
///
/// assert_eq!(map.owned_tiles(red).len(), 9);
/// let tile = map.tile_at(12, 10).unwrap();
/// assert!(map.borders_player(tile, red));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMap {
    width: u32,
    height: u32,
    owners: Vec<Option<PlayerId>>,
    water: Vec<bool>,
    /// Owned tiles per player, ordered by tile index.
    owned: BTreeMap<PlayerId, BTreeSet<TileRef>>,
    ticks: u64,
    spawn_phase: bool,
}

impl TileMap {
    /// Creates an all-land, unowned map that is still in its spawn phase.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let tiles = (width as usize) * (height as usize);
        Self {
            width,
            height,
            owners: vec![None; tiles],
            water: vec![false; tiles],
            owned: BTreeMap::new(),
            ticks: 0,
            spawn_phase: true,
        }
    }

    /// Registers a player. Registering twice is harmless.
    pub fn add_player(&mut self, player: PlayerId) {
        self.owned.entry(player).or_default();
    }

    /// Removes a player and releases all of their tiles.
    pub fn remove_player(&mut self, player: PlayerId) {
        if let Some(tiles) = self.owned.remove(&player) {
            for tile in tiles {
                self.owners[tile.index() as usize] = None;
            }
        }
    }

    /// Ends (or restarts) the spawn phase.
    pub fn set_spawn_phase(&mut self, active: bool) {
        self.spawn_phase = active;
    }

    /// Advances the global tick counter.
    pub fn advance_tick(&mut self) {
        self.ticks += 1;
    }

    /// Marks a tile as water or land. Out-of-map coordinates are ignored.
    pub fn set_water(&mut self, x: i32, y: i32, water: bool) {
        if let Some(tile) = self.tile_at(x, y) {
            self.water[tile.index() as usize] = water;
        }
    }

    /// Directly sets the owner of a tile, bypassing any game rules.
    pub fn set_owner(&mut self, x: i32, y: i32, owner: Option<PlayerId>) {
        let Some(tile) = self.tile_at(x, y) else {
            return;
        };
        let slot = &mut self.owners[tile.index() as usize];
        if let Some(previous) = slot.take() {
            if let Some(set) = self.owned.get_mut(&previous) {
                set.remove(&tile);
            }
        }
        if let Some(player) = owner {
            *slot = Some(player);
            self.owned.entry(player).or_default().insert(tile);
        }
    }

    /// Assigns every tile in the inclusive rectangle to `player`.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, player: PlayerId) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set_owner(x, y, Some(player));
            }
        }
    }

    /// Assigns every land tile within `radius` of `(cx, cy)` to `player`.
    pub fn fill_disc(&mut self, cx: i32, cy: i32, radius: i32, player: PlayerId) {
        let r2 = i64::from(radius) * i64::from(radius);
        for y in (cy - radius)..=(cy + radius) {
            for x in (cx - radius)..=(cx + radius) {
                let dx = i64::from(x - cx);
                let dy = i64::from(y - cy);
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                if let Some(tile) = self.tile_at(x, y) {
                    if !self.water[tile.index() as usize] {
                        self.set_owner(x, y, Some(player));
                    }
                }
            }
        }
    }

    /// Number of tiles owned by `player`.
    #[must_use]
    pub fn owned_count(&self, player: PlayerId) -> usize {
        self.owned.get(&player).map_or(0, BTreeSet::len)
    }

    /// Owner of the tile at `(x, y)`.
    #[must_use]
    pub fn owner_at(&self, x: i32, y: i32) -> Option<PlayerId> {
        self.tile_at(x, y).and_then(|tile| self.owner(tile))
    }
}

impl Territory for TileMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }

    fn in_spawn_phase(&self) -> bool {
        self.spawn_phase
    }

    fn players(&self) -> Vec<PlayerId> {
        self.owned.keys().copied().collect()
    }

    fn owned_tiles(&self, player: PlayerId) -> Vec<TileRef> {
        self.owned
            .get(&player)
            .map(|tiles| tiles.iter().copied().collect())
            .unwrap_or_default()
    }

    fn tile_at(&self, x: i32, y: i32) -> Option<TileRef> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(TileRef::new(y * self.width + x))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn tile_xy(&self, tile: TileRef) -> (i32, i32) {
        let index = tile.index();
        ((index % self.width) as i32, (index / self.width) as i32)
    }

    fn owner(&self, tile: TileRef) -> Option<PlayerId> {
        self.owners.get(tile.index() as usize).copied().flatten()
    }

    fn for_each_neighbor(&self, tile: TileRef, visit: &mut dyn FnMut(TileRef)) {
        let (x, y) = self.tile_xy(tile);
        for (dx, dy) in [(0, -1), (-1, 0), (1, 0), (0, 1)] {
            if let Some(n) = self.tile_at(x + dx, y + dy) {
                visit(n);
            }
        }
    }

    fn is_water(&self, tile: TileRef) -> bool {
        self.water.get(tile.index() as usize).copied().unwrap_or(false)
    }

    fn conquer(&mut self, tile: TileRef, player: PlayerId) {
        if self.owner(tile) == Some(player) {
            return;
        }
        let (x, y) = self.tile_xy(tile);
        self.set_owner(x, y, Some(player));
    }
}
