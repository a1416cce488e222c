//! Authoritative storage for units and structures.
//!
//! The [`Registry`] is the single owner of all live Frenzy entities. It
//! provides:
//! - Unit storage ordered by id (id order is spawn order)
//! - Structures grouped per player, core structure first
//! - Per-structure live unit counts for cap enforcement
//! - The spatial index over unit positions
//!
//! # Spatial Index Synchronization
//!
//! The spatial index is a derived cache and is **not** updated when units move
//! or die. The tick orchestrator calls [`Registry::rebuild_spatial`] once at
//! the end of every tick; out-of-band mutations (direct spawns, cap trimming)
//! rebuild it as well. Between rebuilds, index entries may hold positions that
//! are up to one movement step old.
//!
//! # Example
//!
//! ```
//! use frenzy_core::entity::{StructureKind, UnitStats};
//! use frenzy_core::registry::Registry;
//! use frenzy_core::territory::PlayerId;
//! use glam::Vec2;
//!
//! let mut registry = Registry::new(25.0);
//! let red = PlayerId::new(1);
//!
//! let hq = registry
//!     .add_structure(StructureKind::Hq, red, Vec2::new(10.0, 10.0), 4.0)
//!     .unwrap();
//! let unit = registry.spawn_unit(red, hq, Vec2::new(10.0, 10.0), UnitStats::default());
//!
//! assert!(unit.is_some());
//! assert_eq!(registry.unit_count(red), 1);
//!
//! registry.rebuild_spatial();
//! assert_eq!(registry.spatial().len(), 1);
//! ```

use std::collections::BTreeMap;

use frenzy_grid::{Located, SpatialHashGrid};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{Structure, StructureId, StructureKind, Unit, UnitId, UnitStats};
use crate::error::{FrenzyError, Result};
use crate::territory::PlayerId;

// =============================================================================
// Spatial entries
// =============================================================================

/// Back-reference stored in the spatial index.
///
/// Holds a copy of the unit's id, owner and position at the last rebuild;
/// it never owns or borrows the unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitEntry {
    /// Unit this entry refers to.
    pub id: UnitId,
    /// Owner at the time of the rebuild.
    pub owner: PlayerId,
    /// Position at the time of the rebuild.
    pub position: Vec2,
}

impl Located for UnitEntry {
    fn position(&self) -> Vec2 {
        self.position
    }
}

impl From<&Unit> for UnitEntry {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            owner: unit.owner(),
            position: unit.position,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Container for every live unit and structure.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Monotonically increasing unit id counter.
    next_unit_id: u64,
    /// Monotonically increasing structure id counter.
    next_structure_id: u64,
    /// Live units, sorted by id.
    units: Vec<Unit>,
    /// Structures per player; a player's core is always at index 0.
    structures: BTreeMap<PlayerId, Vec<Structure>>,
    /// Derived proximity index, rebuilt once per tick.
    spatial: SpatialHashGrid<UnitEntry>,
}

impl Registry {
    /// Creates an empty registry whose spatial index uses `cell_size`.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            next_unit_id: 1,
            next_structure_id: 1,
            units: Vec::new(),
            structures: BTreeMap::new(),
            spatial: SpatialHashGrid::new(cell_size),
        }
    }

    // ========================================================================
    // Units
    // ========================================================================

    /// All live units in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Mutable access to the unit list for pipeline stages.
    pub(crate) fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Mutable units alongside the (read-only) spatial index.
    ///
    /// Lets a stage move units while querying last tick's positions.
    pub(crate) fn units_and_spatial(&mut self) -> (&mut [Unit], &SpatialHashGrid<UnitEntry>) {
        (&mut self.units, &self.spatial)
    }

    /// Index of a unit in the id-ordered list.
    #[must_use]
    pub fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, Unit::id).ok()
    }

    /// Looks up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit_index(id).map(|i| &self.units[i])
    }

    /// Looks up a unit by id for mutation.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.unit_index(id).map(move |i| &mut self.units[i])
    }

    /// Number of live units across all players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true when no units are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Live units owned by `player`.
    #[must_use]
    pub fn unit_count(&self, player: PlayerId) -> usize {
        self.structures
            .get(&player)
            .map_or(0, |list| list.iter().map(Structure::unit_count).sum())
    }

    /// Live unit counts for every player with a structure.
    #[must_use]
    pub fn unit_counts(&self) -> BTreeMap<PlayerId, usize> {
        self.structures
            .keys()
            .map(|&player| (player, self.unit_count(player)))
            .collect()
    }

    /// Creates a unit for `owner` at `position`, credited to `spawner`.
    ///
    /// Returns `None` (and spawns nothing) if `spawner` is not one of the
    /// owner's structures.
    pub fn spawn_unit(
        &mut self,
        owner: PlayerId,
        spawner: StructureId,
        position: Vec2,
        stats: UnitStats,
    ) -> Option<UnitId> {
        let structure = self
            .structures
            .get_mut(&owner)?
            .iter_mut()
            .find(|s| s.id() == spawner)?;
        structure.unit_count += 1;

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id += 1;
        self.units.push(Unit::new(id, owner, spawner, position, stats));
        Some(id)
    }

    /// Removes every unit with health at or below zero.
    ///
    /// Decrements the spawning structure's unit count for each removal and
    /// returns the removed ids in id order.
    pub fn remove_dead(&mut self) -> Vec<UnitId> {
        let mut removed = Vec::new();
        let structures = &mut self.structures;
        self.units.retain(|unit| {
            if unit.is_alive() {
                return true;
            }
            if let Some(s) = structures
                .get_mut(&unit.owner())
                .and_then(|list| list.iter_mut().find(|s| s.id() == unit.spawner()))
            {
                s.unit_count = s.unit_count.saturating_sub(1);
            }
            removed.push(unit.id());
            false
        });
        removed
    }

    /// Removes surplus units so no player exceeds `cap`.
    ///
    /// The most recently spawned (highest id) units are removed first.
    /// Structure unit counts are recomputed afterwards. Returns the number of
    /// units removed.
    pub fn trim_to_cap(&mut self, cap: usize) -> usize {
        let mut surplus: BTreeMap<PlayerId, usize> = BTreeMap::new();
        for unit in &self.units {
            *surplus.entry(unit.owner()).or_default() += 1;
        }
        surplus.retain(|_, count| {
            *count = count.saturating_sub(cap);
            *count > 0
        });
        if surplus.is_empty() {
            return 0;
        }

        let mut doomed = vec![false; self.units.len()];
        for (index, unit) in self.units.iter().enumerate().rev() {
            if let Some(left) = surplus.get_mut(&unit.owner()) {
                if *left > 0 {
                    *left -= 1;
                    doomed[index] = true;
                }
            }
        }

        let before = self.units.len();
        let mut flags = doomed.into_iter();
        self.units.retain(|_| !flags.next().unwrap_or(false));
        self.sync_unit_counts();
        before - self.units.len()
    }

    /// Recomputes every structure's unit count from the unit list.
    pub fn sync_unit_counts(&mut self) {
        for structure in self.structures.values_mut().flatten() {
            structure.unit_count = 0;
        }
        for unit in &self.units {
            if let Some(s) = self
                .structures
                .get_mut(&unit.owner())
                .and_then(|list| list.iter_mut().find(|s| s.id() == unit.spawner()))
            {
                s.unit_count += 1;
            }
        }
    }

    // ========================================================================
    // Structures
    // ========================================================================

    /// Structures grouped by owner.
    #[must_use]
    pub fn structures(&self) -> &BTreeMap<PlayerId, Vec<Structure>> {
        &self.structures
    }

    /// Mutable iteration over every structure, players in id order.
    pub(crate) fn structures_mut(&mut self) -> impl Iterator<Item = &mut Structure> {
        self.structures.values_mut().flatten()
    }

    /// Looks up one of `owner`'s structures for mutation.
    pub(crate) fn structure_mut(
        &mut self,
        owner: PlayerId,
        id: StructureId,
    ) -> Option<&mut Structure> {
        self.structures
            .get_mut(&owner)?
            .iter_mut()
            .find(|s| s.id() == id)
    }

    /// Structures owned by `player` (core first).
    #[must_use]
    pub fn structures_of(&self, player: PlayerId) -> &[Structure] {
        self.structures.get(&player).map_or(&[], Vec::as_slice)
    }

    /// The player's core structure, if created.
    #[must_use]
    pub fn core_of(&self, player: PlayerId) -> Option<&Structure> {
        self.structures_of(player).first().filter(|s| s.kind().is_core())
    }

    /// Whether the player already has a core structure.
    #[must_use]
    pub fn has_core(&self, player: PlayerId) -> bool {
        self.core_of(player).is_some()
    }

    /// Registers a structure.
    ///
    /// # Errors
    ///
    /// - [`FrenzyError::DuplicateCore`] when adding a second core for a player
    /// - [`FrenzyError::UnknownPlayer`] when adding a non-core spawner for a
    ///   player without a core
    pub fn add_structure(
        &mut self,
        kind: StructureKind,
        owner: PlayerId,
        position: Vec2,
        spawn_interval: f32,
    ) -> Result<StructureId> {
        let has_core = self.has_core(owner);
        if kind.is_core() && has_core {
            return Err(FrenzyError::DuplicateCore(owner));
        }
        if !kind.is_core() && !has_core {
            return Err(FrenzyError::UnknownPlayer(owner));
        }

        let id = StructureId::new(self.next_structure_id);
        self.next_structure_id += 1;
        let structure = Structure::new(id, kind, owner, position, spawn_interval);
        let list = self.structures.entry(owner).or_default();
        if kind.is_core() {
            list.insert(0, structure);
        } else {
            list.push(structure);
        }
        Ok(id)
    }

    // ========================================================================
    // Spatial index
    // ========================================================================

    /// The spatial index as of the last rebuild.
    #[must_use]
    pub fn spatial(&self) -> &SpatialHashGrid<UnitEntry> {
        &self.spatial
    }

    /// Replaces the spatial index with one using a new cell size.
    pub fn reindex(&mut self, cell_size: f32) {
        self.spatial = SpatialHashGrid::new(cell_size);
        self.rebuild_spatial();
    }

    /// Rebuilds the spatial index from the live units.
    pub fn rebuild_spatial(&mut self) {
        self.spatial.rebuild(
            self.units
                .iter()
                .filter(|u| u.is_alive())
                .map(UnitEntry::from),
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(25.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RED: PlayerId = PlayerId::new(1);
    const BLUE: PlayerId = PlayerId::new(2);

    fn registry_with_cores() -> (Registry, StructureId, StructureId) {
        let mut registry = Registry::new(10.0);
        let red = registry
            .add_structure(StructureKind::Hq, RED, Vec2::new(10.0, 10.0), 4.0)
            .unwrap();
        let blue = registry
            .add_structure(StructureKind::Hq, BLUE, Vec2::new(50.0, 50.0), 4.0)
            .unwrap();
        (registry, red, blue)
    }

    mod structure_tests {
        use super::*;

        #[test]
        fn second_core_is_rejected() {
            let (mut registry, _, _) = registry_with_cores();
            let err = registry
                .add_structure(StructureKind::Hq, RED, Vec2::ZERO, 4.0)
                .unwrap_err();
            assert!(matches!(err, FrenzyError::DuplicateCore(p) if p == RED));
        }

        #[test]
        fn factory_requires_core() {
            let mut registry = Registry::new(10.0);
            let err = registry
                .add_structure(StructureKind::Factory, RED, Vec2::ZERO, 4.0)
                .unwrap_err();
            assert!(matches!(err, FrenzyError::UnknownPlayer(_)));
        }

        #[test]
        fn core_stays_first() {
            let (mut registry, red_hq, _) = registry_with_cores();
            registry
                .add_structure(StructureKind::Port, RED, Vec2::new(1.0, 1.0), 4.0)
                .unwrap();

            let list = registry.structures_of(RED);
            assert_eq!(list.len(), 2);
            assert_eq!(list[0].id(), red_hq);
            assert_eq!(registry.core_of(RED).map(Structure::id), Some(red_hq));
        }

        #[test]
        fn unknown_player_has_no_structures() {
            let registry = Registry::new(10.0);
            assert!(registry.structures_of(RED).is_empty());
            assert!(!registry.has_core(RED));
            assert_eq!(registry.unit_count(RED), 0);
        }
    }

    mod unit_tests {
        use super::*;

        #[test]
        fn unit_ids_are_monotonic() {
            let (mut registry, red, blue) = registry_with_cores();
            let a = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            let b = registry.spawn_unit(BLUE, blue, Vec2::ZERO, UnitStats::default()).unwrap();
            let c = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            assert!(a < b && b < c);
        }

        #[test]
        fn spawn_with_foreign_spawner_fails() {
            let (mut registry, red, _) = registry_with_cores();
            assert!(registry
                .spawn_unit(BLUE, red, Vec2::ZERO, UnitStats::default())
                .is_none());
            assert!(registry.is_empty());
        }

        #[test]
        fn lookup_by_id() {
            let (mut registry, red, _) = registry_with_cores();
            let id = registry
                .spawn_unit(RED, red, Vec2::new(3.0, 4.0), UnitStats::default())
                .unwrap();
            assert_eq!(registry.unit(id).map(|u| u.position), Some(Vec2::new(3.0, 4.0)));
            assert!(registry.unit(UnitId::new(999)).is_none());
        }

        #[test]
        fn remove_dead_updates_counts() {
            let (mut registry, red, blue) = registry_with_cores();
            let a = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default());
            registry.spawn_unit(BLUE, blue, Vec2::ZERO, UnitStats::default());

            registry.unit_mut(a).unwrap().health = 0.0;
            let removed = registry.remove_dead();

            assert_eq!(removed, vec![a]);
            assert_eq!(registry.unit_count(RED), 1);
            assert_eq!(registry.unit_count(BLUE), 1);
            assert!(registry.unit(a).is_none());
        }

        #[test]
        fn ids_are_not_reused_after_removal() {
            let (mut registry, red, _) = registry_with_cores();
            let a = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            registry.unit_mut(a).unwrap().health = -1.0;
            registry.remove_dead();
            let b = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            assert!(b > a);
        }
    }

    mod cap_tests {
        use super::*;

        #[test]
        fn trim_removes_newest_first() {
            let (mut registry, red, _) = registry_with_cores();
            let ids: Vec<UnitId> = (0..5)
                .filter_map(|_| registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()))
                .collect();

            let removed = registry.trim_to_cap(2);

            assert_eq!(removed, 3);
            let left: Vec<UnitId> = registry.units().iter().map(Unit::id).collect();
            assert_eq!(left, ids[..2].to_vec());
            assert_eq!(registry.unit_count(RED), 2);
        }

        #[test]
        fn trim_is_per_player() {
            let (mut registry, red, blue) = registry_with_cores();
            for _ in 0..4 {
                registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default());
            }
            registry.spawn_unit(BLUE, blue, Vec2::ZERO, UnitStats::default());

            assert_eq!(registry.trim_to_cap(2), 2);
            assert_eq!(registry.unit_count(RED), 2);
            assert_eq!(registry.unit_count(BLUE), 1);
        }

        #[test]
        fn trim_under_cap_is_noop() {
            let (mut registry, red, _) = registry_with_cores();
            registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default());
            assert_eq!(registry.trim_to_cap(10), 0);
            assert_eq!(registry.len(), 1);
        }

        #[test]
        fn counts_split_across_spawners() {
            let (mut registry, red_hq, _) = registry_with_cores();
            let factory = registry
                .add_structure(StructureKind::Factory, RED, Vec2::ONE, 4.0)
                .unwrap();
            registry.spawn_unit(RED, red_hq, Vec2::ZERO, UnitStats::default());
            registry.spawn_unit(RED, factory, Vec2::ZERO, UnitStats::default());
            registry.spawn_unit(RED, factory, Vec2::ZERO, UnitStats::default());

            // Newest two belong to the factory
            registry.trim_to_cap(1);
            let list = registry.structures_of(RED);
            assert_eq!(list[0].unit_count(), 1);
            assert_eq!(list[1].unit_count(), 0);
        }
    }

    mod spatial_tests {
        use super::*;

        #[test]
        fn rebuild_skips_dead_units() {
            let (mut registry, red, _) = registry_with_cores();
            let a = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            registry.spawn_unit(RED, red, Vec2::ONE, UnitStats::default());
            registry.unit_mut(a).unwrap().health = 0.0;

            registry.rebuild_spatial();
            assert_eq!(registry.spatial().len(), 1);
        }

        #[test]
        fn index_is_stale_until_rebuild() {
            let (mut registry, red, _) = registry_with_cores();
            let a = registry.spawn_unit(RED, red, Vec2::ZERO, UnitStats::default()).unwrap();
            registry.rebuild_spatial();

            registry.unit_mut(a).unwrap().position = Vec2::new(500.0, 500.0);
            assert_eq!(registry.spatial().query_radius(Vec2::ZERO, 1.0).len(), 1);

            registry.rebuild_spatial();
            assert!(registry.spatial().query_radius(Vec2::ZERO, 1.0).is_empty());
        }
    }
}
