//! Test helper functions for setting up maps and managers.

use glam::Vec2;

use crate::config::FrenzyConfig;
use crate::manager::FrenzyManager;
use crate::territory::{PlayerId, Territory, TileMap, TileRef};

pub const RED: PlayerId = PlayerId::new(1);
pub const BLUE: PlayerId = PlayerId::new(2);
pub const GREEN: PlayerId = PlayerId::new(3);

/// Tolerance for derived floating-point quantities.
pub const EPS: f32 = 1.0e-3;

// =============================================================================
// Setup
// =============================================================================

/// All-land map with the spawn phase already over.
pub fn active_map(width: u32, height: u32) -> TileMap {
    let mut map = TileMap::new(width, height);
    map.set_spawn_phase(false);
    map
}

/// Configuration with no starting units and spawning effectively disabled.
pub fn quiet_config() -> FrenzyConfig {
    FrenzyConfig {
        starting_units: 0,
        spawn_interval: 1.0e6,
        ..FrenzyConfig::default()
    }
}

/// Same as [`quiet_config`] but units never move.
pub fn frozen_config() -> FrenzyConfig {
    FrenzyConfig {
        unit_speed: 0.0,
        ..quiet_config()
    }
}

/// Gives `player` a disc of territory and creates their core.
pub fn spawn_player(
    manager: &mut FrenzyManager,
    map: &mut TileMap,
    player: PlayerId,
    center: (i32, i32),
    radius: i32,
) {
    map.add_player(player);
    map.fill_disc(center.0, center.1, radius, player);
    assert!(manager.on_player_spawn(&*map, player));
}

/// Three players spaced around a 96x96 map, default rules.
pub fn three_player_game(seed: u64) -> (FrenzyManager, TileMap) {
    let mut map = active_map(96, 96);
    let config = FrenzyConfig {
        spawn_interval: 0.5,
        ..FrenzyConfig::default()
    };
    let mut manager = FrenzyManager::new(config, seed);
    manager.initialize();
    spawn_player(&mut manager, &mut map, RED, (30, 30), 4);
    spawn_player(&mut manager, &mut map, BLUE, (66, 30), 4);
    spawn_player(&mut manager, &mut map, GREEN, (48, 64), 4);
    (manager, map)
}

/// Runs `ticks` ticks of `dt` seconds.
pub fn run_ticks<T: Territory + ?Sized>(
    manager: &mut FrenzyManager,
    map: &mut T,
    ticks: usize,
    dt: f32,
) {
    for _ in 0..ticks {
        manager.tick(map, dt);
    }
}

// =============================================================================
// Audited territory
// =============================================================================

/// [`TileMap`] wrapper that checks the contiguity rule on every conquest.
#[derive(Debug)]
pub struct AuditedMap {
    pub inner: TileMap,
    /// Conquests of tiles that had no neighbour owned by the conqueror.
    pub violations: Vec<(TileRef, PlayerId)>,
    /// Every conquest in order.
    pub conquests: Vec<(TileRef, PlayerId)>,
}

impl AuditedMap {
    pub fn new(inner: TileMap) -> Self {
        Self {
            inner,
            violations: Vec::new(),
            conquests: Vec::new(),
        }
    }
}

impl Territory for AuditedMap {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn ticks(&self) -> u64 {
        self.inner.ticks()
    }

    fn in_spawn_phase(&self) -> bool {
        self.inner.in_spawn_phase()
    }

    fn players(&self) -> Vec<PlayerId> {
        self.inner.players()
    }

    fn owned_tiles(&self, player: PlayerId) -> Vec<TileRef> {
        self.inner.owned_tiles(player)
    }

    fn tile_at(&self, x: i32, y: i32) -> Option<TileRef> {
        self.inner.tile_at(x, y)
    }

    fn tile_xy(&self, tile: TileRef) -> (i32, i32) {
        self.inner.tile_xy(tile)
    }

    fn owner(&self, tile: TileRef) -> Option<PlayerId> {
        self.inner.owner(tile)
    }

    fn for_each_neighbor(&self, tile: TileRef, visit: &mut dyn FnMut(TileRef)) {
        self.inner.for_each_neighbor(tile, visit);
    }

    fn is_water(&self, tile: TileRef) -> bool {
        self.inner.is_water(tile)
    }

    fn conquer(&mut self, tile: TileRef, player: PlayerId) {
        if !self.inner.borders_player(tile, player) {
            self.violations.push((tile, player));
        }
        self.conquests.push((tile, player));
        self.inner.conquer(tile, player);
    }
}

// =============================================================================
// Assertions
// =============================================================================

/// Asserts the registry's bookkeeping agrees with its unit list.
pub fn assert_counts_consistent(manager: &FrenzyManager) {
    let total: usize = manager.unit_counts().values().sum();
    assert_eq!(total, manager.units().len());
    for (&player, &count) in &manager.unit_counts() {
        let listed = manager.units().iter().filter(|u| u.owner() == player).count();
        assert_eq!(count, listed, "count mismatch for {player}");
    }
}

/// Asserts every unit stands on the map.
pub fn assert_units_on_map(manager: &FrenzyManager, width: u32, height: u32) {
    #[allow(clippy::cast_precision_loss)]
    let max = Vec2::new((width - 1) as f32, (height - 1) as f32);
    for unit in manager.units() {
        let p = unit.position;
        assert!(p.x >= 0.0 && p.y >= 0.0, "{:?} off map at {p}", unit.id());
        assert!(p.x <= max.x && p.y <= max.y, "{:?} off map at {p}", unit.id());
    }
}
