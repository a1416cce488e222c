//! Read-only views for rendering and telemetry.
//!
//! Views are plain serializable copies; holding one never borrows the
//! simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{Structure, StructureId, StructureKind, Unit, UnitId};
use crate::territory::PlayerId;

/// Snapshot of one live unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit identifier.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// World position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
}

impl From<&Unit> for UnitView {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            owner: unit.owner(),
            position: unit.position,
            health: unit.health,
            max_health: unit.stats.max_health,
        }
    }
}

/// Snapshot of one structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureView {
    /// Structure identifier.
    pub id: StructureId,
    /// Spawner kind.
    pub kind: StructureKind,
    /// Owning player.
    pub owner: PlayerId,
    /// World position.
    pub position: Vec2,
    /// Seconds until the next spawn.
    pub spawn_timer: f32,
    /// Timer reset value.
    pub spawn_interval: f32,
    /// Live units credited to this structure.
    pub unit_count: usize,
}

impl From<&Structure> for StructureView {
    fn from(structure: &Structure) -> Self {
        Self {
            id: structure.id(),
            kind: structure.kind(),
            owner: structure.owner(),
            position: structure.position(),
            spawn_timer: structure.spawn_timer,
            spawn_interval: structure.spawn_interval,
            unit_count: structure.unit_count(),
        }
    }
}
