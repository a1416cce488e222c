//! Mobile combatants.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{StructureId, UnitId};
use crate::config::FrenzyConfig;
use crate::territory::PlayerId;

/// Combat parameters fixed at spawn time.
///
/// The simple combat model only exercises `damage_per_second` and
/// `attack_range`; projectile fields are carried so the wider game can
/// render and extend shots without a data migration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Health at spawn.
    pub max_health: f32,
    /// Continuous damage applied to the nearest hostile in range.
    pub damage_per_second: f32,
    /// Damage of a single projectile hit.
    pub projectile_damage: f32,
    /// Engagement distance.
    pub attack_range: f32,
    /// Seconds between projectile shots.
    pub fire_interval: f32,
}

impl UnitStats {
    /// Stats for units spawned under `config`.
    #[must_use]
    pub fn from_config(config: &FrenzyConfig) -> Self {
        Self {
            max_health: config.unit_health,
            damage_per_second: config.unit_dps.max(0.0),
            projectile_damage: config.projectile_damage.max(0.0),
            attack_range: config.combat_range,
            fire_interval: config.fire_interval,
        }
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self::from_config(&FrenzyConfig::default())
    }
}

/// A mobile combatant.
///
/// Identity, owner and spawner are fixed at creation. A unit whose health
/// is at or below zero is dead; it is skipped by every later stage of the
/// tick it died in and purged during cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    owner: PlayerId,
    spawner: StructureId,
    /// World position.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Movement target, recomputed every tick.
    pub target: Vec2,
    /// Current health.
    pub health: f32,
    /// Combat parameters.
    pub stats: UnitStats,
}

impl Unit {
    /// Creates a unit at rest at `position` with full health.
    #[must_use]
    pub fn new(
        id: UnitId,
        owner: PlayerId,
        spawner: StructureId,
        position: Vec2,
        stats: UnitStats,
    ) -> Self {
        Self {
            id,
            owner,
            spawner,
            position,
            velocity: Vec2::ZERO,
            target: position,
            health: stats.max_health,
            stats,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Structure that spawned this unit.
    #[must_use]
    pub const fn spawner(&self) -> StructureId {
        self.spawner
    }

    /// Whether the unit is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Subtracts `amount` from health. Negative amounts are ignored.
    pub fn take_damage(&mut self, amount: f32) {
        if amount > 0.0 {
            self.health -= amount;
        }
    }
}
