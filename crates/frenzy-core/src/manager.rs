//! Tick orchestrator for Frenzy mode.
//!
//! [`FrenzyManager`] owns the unit/structure [`Registry`], the configuration
//! snapshot and the jitter RNG, and drives one fixed-step tick at a time
//! against a [`Territory`] collaborator:
//!
//! 1. **Gate**: while the game's spawn phase is active the tick does nothing
//! 2. **Cores**: players owning territory for the first time get a core
//!    structure and their starting units
//! 3. **Spawn**: structure timers of players still in the game count down;
//!    due structures spawn a batch of units while their owner is under the cap
//! 4. **Move**: [`resolve_movement`]
//! 5. **Fight**: [`resolve_combat`]
//! 6. **Capture**: [`resolve_capture`]
//! 7. **Cleanup**: dead units are purged and unit counts updated
//! 8. **Index**: the spatial index is rebuilt for the next tick
//!
//! # Determinism
//!
//! Given the same configuration, seed and sequence of territory states, the
//! manager produces the same units, structures and conquests:
//! - Units are stored and processed in id order
//! - Structures are grouped in a `BTreeMap` keyed by player
//! - Spawn jitter comes from a `ChaCha8Rng` seeded at construction
//!
//! # Example
//!
//! ```
//! use frenzy_core::config::FrenzyConfig;
//! use frenzy_core::manager::{FrenzyManager, SimPhase};
//! use frenzy_core::territory::{PlayerId, TileMap};
//!
//! let mut map = TileMap::new(64, 64);
//! let red = PlayerId::new(1);
//! map.add_player(red);
//! map.fill_disc(32, 32, 3, red);
//! map.set_spawn_phase(false);
//!
//! let mut manager = FrenzyManager::new(FrenzyConfig::default(), 7);
//! manager.initialize();
//!
//! let report = manager.tick(&mut map, 0.1);
//! assert_eq!(report.phase, SimPhase::Active);
//! assert_eq!(report.cores_created, 1);
//! assert_eq!(manager.unit_count(red), 5);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use frenzy_grid::{Bounds, GridStats};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, trace, warn};

use crate::config::{ConfigOverride, FrenzyConfig};
use crate::entity::{Structure, StructureId, StructureKind, Unit, UnitId, UnitStats};
use crate::error::Result;
use crate::registry::Registry;
use crate::resolver::{resolve_capture, resolve_combat, resolve_movement};
use crate::snapshot::{StructureView, UnitView};
use crate::territory::{PlayerId, Territory, TileRef};

// =============================================================================
// Phase and reports
// =============================================================================

/// Coarse simulation phase, read from the game's spawn-phase flag each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimPhase {
    /// The game is still in its spawn phase; ticks do nothing.
    #[default]
    Dormant,
    /// Normal per-tick processing.
    Active,
}

impl SimPhase {
    /// Phase matching the game's spawn-phase flag.
    #[must_use]
    pub const fn from_spawn_phase(in_spawn_phase: bool) -> Self {
        if in_spawn_phase {
            Self::Dormant
        } else {
            Self::Active
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Phase the tick ran in.
    pub phase: SimPhase,
    /// Core structures created this tick.
    pub cores_created: usize,
    /// Units spawned (starting units included).
    pub spawned: usize,
    /// Units removed by cleanup.
    pub killed: usize,
    /// Tiles that changed owner.
    pub captured: usize,
    /// Units alive after cleanup.
    pub live_units: usize,
    /// Wall-clock time spent in the tick.
    pub duration: Duration,
}

// =============================================================================
// FrenzyManager
// =============================================================================

/// Owns all Frenzy state and advances it one tick at a time.
#[derive(Debug, Clone)]
pub struct FrenzyManager {
    config: FrenzyConfig,
    registry: Registry,
    rng: ChaCha8Rng,
    seed: u64,
    phase: SimPhase,
    initialized: bool,
    ticks_run: u64,
}

impl FrenzyManager {
    /// Creates a manager with an empty registry.
    ///
    /// `seed` drives spawn jitter; two managers with the same seed and inputs
    /// evolve identically.
    #[must_use]
    pub fn new(config: FrenzyConfig, seed: u64) -> Self {
        Self {
            registry: Registry::new(config.grid_cell_size),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            phase: SimPhase::Dormant,
            initialized: false,
            ticks_run: 0,
        }
    }

    /// Marks the manager ready. Calling it again is a no-op.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        info!(
            seed = self.seed,
            max_units_per_player = self.config.max_units_per_player,
            spawn_interval = self.config.spawn_interval,
            "Frenzy manager initialized"
        );
    }

    // ========================================================================
    // Lifecycle hooks
    // ========================================================================

    /// Creates `player`'s core structure and starting units.
    ///
    /// Does nothing and returns `false` if the player already has a core or
    /// owns no territory yet. The core sits on the owned tile closest to the
    /// territory centroid.
    pub fn on_player_spawn<T: Territory + ?Sized>(
        &mut self,
        territory: &T,
        player: PlayerId,
    ) -> bool {
        if self.registry.has_core(player) {
            return false;
        }
        let owned = territory.owned_tiles(player);
        let Some(position) = core_position(territory, &owned) else {
            return false;
        };
        let interval = self.config.spawn_interval;
        let Ok(core) = self
            .registry
            .add_structure(StructureKind::Hq, player, position, interval)
        else {
            return false;
        };

        let bounds = Bounds::from_map_size(territory.width(), territory.height());
        let starting = self.config.starting_units.min(self.config.max_units_per_player);
        let spawned = (0..starting)
            .filter_map(|_| self.spawn_jittered(player, core, position, &bounds))
            .count();
        self.registry.rebuild_spatial();

        info!(
            player = %player,
            x = position.x,
            y = position.y,
            starting_units = spawned,
            "Core structure created"
        );
        true
    }

    /// Registers an additional spawner (factory or port) for `owner`.
    ///
    /// # Errors
    ///
    /// - [`FrenzyError::UnknownPlayer`] if `owner` has no core yet
    /// - [`FrenzyError::DuplicateCore`] if `kind` is another core
    ///
    /// [`FrenzyError::UnknownPlayer`]: crate::error::FrenzyError::UnknownPlayer
    /// [`FrenzyError::DuplicateCore`]: crate::error::FrenzyError::DuplicateCore
    pub fn add_spawner(
        &mut self,
        owner: PlayerId,
        kind: StructureKind,
        position: Vec2,
    ) -> Result<StructureId> {
        let id = self
            .registry
            .add_structure(kind, owner, position, self.config.spawn_interval)?;
        debug!(player = %owner, %kind, x = position.x, y = position.y, "Spawner added");
        Ok(id)
    }

    /// Places a unit for `owner` exactly at `position`, credited to their core.
    ///
    /// Returns `None` if the player has no core or is at the unit cap.
    pub fn spawn_unit_at(&mut self, owner: PlayerId, position: Vec2) -> Option<UnitId> {
        let core = self.registry.core_of(owner)?.id();
        if self.registry.unit_count(owner) >= self.config.max_units_per_player {
            return None;
        }
        let id = self
            .registry
            .spawn_unit(owner, core, position, UnitStats::from_config(&self.config))?;
        self.registry.rebuild_spatial();
        Some(id)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the simulation by `dt` seconds.
    pub fn tick<T: Territory + ?Sized>(&mut self, territory: &mut T, dt: f32) -> TickReport {
        let started = Instant::now();
        let span = debug_span!("frenzy_tick", tick = territory.ticks());
        let _entered = span.enter();

        self.phase = SimPhase::from_spawn_phase(territory.in_spawn_phase());
        let mut report = TickReport {
            phase: self.phase,
            ..TickReport::default()
        };
        if self.phase == SimPhase::Dormant {
            report.live_units = self.registry.len();
            report.duration = started.elapsed();
            return report;
        }
        self.ticks_run += 1;

        let players: BTreeSet<PlayerId> = territory.players().into_iter().collect();
        for &player in &players {
            if !self.registry.has_core(player) && self.on_player_spawn(&*territory, player) {
                report.cores_created += 1;
                report.spawned += self.registry.unit_count(player);
            }
        }

        let bounds = Bounds::from_map_size(territory.width(), territory.height());
        let timed = self.advance_spawners(&players, &bounds, dt);
        if timed > 0 {
            self.registry.rebuild_spatial();
        }
        report.spawned += timed;

        let movement = resolve_movement(&mut self.registry, &*territory, &self.config, dt);
        let combat = resolve_combat(&mut self.registry, dt, movement.max_displacement);
        let capture = resolve_capture(&self.registry, territory, &self.config);

        report.killed = self.registry.remove_dead().len();
        self.registry.rebuild_spatial();

        report.captured = capture.captured;
        report.live_units = self.registry.len();
        report.duration = started.elapsed();

        debug!(
            spawned = report.spawned,
            moving = movement.moving,
            engagements = combat.engagements,
            killed = report.killed,
            captured = report.captured,
            live_units = report.live_units,
            "Tick complete"
        );

        let elapsed_ms = report.duration.as_secs_f32() * 1000.0;
        if elapsed_ms > self.config.tick_budget_ms {
            warn!(
                elapsed_ms,
                budget_ms = self.config.tick_budget_ms,
                live_units = report.live_units,
                "Frenzy tick overran its budget"
            );
        }
        report
    }

    /// Counts every structure's timer down and spawns from the due ones.
    ///
    /// Only structures of players still in `players` are advanced; a departed
    /// player's timers stay frozen. A due structure spawns up to
    /// `units_per_spawn` units, stopping at the cap. One whose owner is
    /// already at the cap keeps its timer at zero and spawns on the first tick
    /// the owner drops below the cap.
    fn advance_spawners(
        &mut self,
        players: &BTreeSet<PlayerId>,
        bounds: &Bounds,
        dt: f32,
    ) -> usize {
        let due: Vec<(PlayerId, StructureId, Vec2)> = self
            .registry
            .structures_mut()
            .filter(|s| players.contains(&s.owner()))
            .filter_map(|s| s.advance_timer(dt).then(|| (s.owner(), s.id(), s.position())))
            .collect();

        let cap = self.config.max_units_per_player;
        let batch = self.config.units_per_spawn.max(1);
        let mut spawned = 0;
        for (owner, id, position) in due {
            let room = cap.saturating_sub(self.registry.unit_count(owner));
            let made = (0..batch.min(room))
                .filter_map(|_| self.spawn_jittered(owner, id, position, bounds))
                .count();
            spawned += made;
            if let Some(structure) = self.registry.structure_mut(owner, id) {
                if made > 0 {
                    structure.reset_timer();
                } else {
                    structure.spawn_timer = 0.0;
                }
            }
        }
        spawned
    }

    /// Spawns one unit near `origin` with random jitter, clamped to the map.
    fn spawn_jittered(
        &mut self,
        owner: PlayerId,
        spawner: StructureId,
        origin: Vec2,
        bounds: &Bounds,
    ) -> Option<UnitId> {
        let offset = jitter(&mut self.rng, self.config.spawn_jitter);
        let position = bounds.clamp(origin + offset);
        let id = self.registry.spawn_unit(
            owner,
            spawner,
            position,
            UnitStats::from_config(&self.config),
        )?;
        trace!(player = %owner, unit = %id, x = position.x, y = position.y, "Unit spawned");
        Some(id)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Merges `patch` onto the current configuration.
    ///
    /// Every structure's timer is pulled down to the (possibly new) spawn
    /// interval and the unit cap is enforced at once. Returns the number of
    /// units trimmed.
    pub fn update_config(&mut self, patch: &ConfigOverride) -> usize {
        let previous_cell_size = self.config.grid_cell_size;
        self.config.apply(patch);

        if (self.config.grid_cell_size - previous_cell_size).abs() > f32::EPSILON {
            self.registry.reindex(self.config.grid_cell_size);
        }

        let interval = self.config.spawn_interval;
        for structure in self.registry.structures_mut() {
            structure.set_interval(interval);
        }

        let trimmed = self.registry.trim_to_cap(self.config.max_units_per_player);
        self.registry.rebuild_spatial();
        if trimmed > 0 {
            debug!(
                trimmed,
                max_units_per_player = self.config.max_units_per_player,
                "Units trimmed to new cap"
            );
        }

        info!(
            spawn_interval = self.config.spawn_interval,
            max_units_per_player = self.config.max_units_per_player,
            capture_radius = self.config.capture_radius,
            "Frenzy configuration updated"
        );
        trimmed
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &FrenzyConfig {
        &self.config
    }

    /// Phase observed on the most recent tick.
    #[must_use]
    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Seed the jitter RNG was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of active (non-dormant) ticks processed.
    #[must_use]
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Whether [`initialize`](Self::initialize) has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Live units in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        self.registry.units()
    }

    /// Serializable snapshot of every live unit.
    #[must_use]
    pub fn unit_views(&self) -> Vec<UnitView> {
        self.registry.units().iter().map(UnitView::from).collect()
    }

    /// Structures grouped by owner.
    #[must_use]
    pub fn structures(&self) -> &BTreeMap<PlayerId, Vec<Structure>> {
        self.registry.structures()
    }

    /// Serializable snapshot of every structure, grouped by owner.
    #[must_use]
    pub fn structure_views(&self) -> BTreeMap<PlayerId, Vec<StructureView>> {
        self.registry
            .structures()
            .iter()
            .map(|(&player, list)| (player, list.iter().map(StructureView::from).collect()))
            .collect()
    }

    /// Live units owned by `player`.
    #[must_use]
    pub fn unit_count(&self, player: PlayerId) -> usize {
        self.registry.unit_count(player)
    }

    /// Live unit counts for every player with a structure.
    #[must_use]
    pub fn unit_counts(&self) -> BTreeMap<PlayerId, usize> {
        self.registry.unit_counts()
    }

    /// Occupancy of the spatial index.
    #[must_use]
    pub fn grid_stats(&self) -> GridStats {
        self.registry.spatial().stats()
    }

    /// Deterministic hash of the simulation state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        crate::hash::hash_state(self)
    }

    pub(crate) fn rng_word_pos(&self) -> u128 {
        self.rng.get_word_pos()
    }
}

impl Default for FrenzyManager {
    fn default() -> Self {
        Self::new(FrenzyConfig::default(), 0)
    }
}

/// Uniform offset in `[-amount, amount]` on each axis.
fn jitter(rng: &mut ChaCha8Rng, amount: f32) -> Vec2 {
    if amount > 0.0 && amount.is_finite() {
        Vec2::new(
            rng.gen_range(-amount..=amount),
            rng.gen_range(-amount..=amount),
        )
    } else {
        Vec2::ZERO
    }
}

/// Owned tile nearest the centroid of `owned`; ties go to the earlier tile.
fn core_position<T: Territory + ?Sized>(territory: &T, owned: &[TileRef]) -> Option<Vec2> {
    if owned.is_empty() {
        return None;
    }
    let positions: Vec<Vec2> = owned.iter().map(|&t| territory.tile_position(t)).collect();
    #[allow(clippy::cast_precision_loss)]
    let centroid = positions.iter().copied().sum::<Vec2>() / positions.len() as f32;

    let mut best: Option<(f32, Vec2)> = None;
    for position in positions {
        let distance = position.distance_squared(centroid);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, position));
        }
    }
    best.map(|(_, position)| position)
}

// =============================================================================
// Tests
// =============================================================================
