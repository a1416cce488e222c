//! Stationary spawner structures.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::StructureId;
use crate::territory::PlayerId;

/// Kind of spawner.
///
/// Every player gets exactly one [`StructureKind::Hq`]. Factories and ports
/// belong to the wider building system but share the spawn-timer contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Core building created when the player first owns territory
    Hq,
    /// Land unit factory
    Factory,
    /// Coastal port
    Port,
}

impl StructureKind {
    /// Whether this is the per-player core building.
    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(self, Self::Hq)
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hq => write!(f, "HQ"),
            Self::Factory => write!(f, "Factory"),
            Self::Port => write!(f, "Port"),
        }
    }
}

/// A stationary spawner.
///
/// The position is fixed at creation. `spawn_timer` counts down; when it
/// reaches zero the structure spawns a unit (cap permitting) and the timer is
/// reset to `spawn_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    id: StructureId,
    kind: StructureKind,
    owner: PlayerId,
    position: Vec2,
    /// Seconds until the next spawn.
    pub spawn_timer: f32,
    /// Value the timer resets to after a spawn.
    pub spawn_interval: f32,
    pub(crate) unit_count: usize,
}

impl Structure {
    /// Creates a structure with a full spawn timer and no units.
    #[must_use]
    pub fn new(
        id: StructureId,
        kind: StructureKind,
        owner: PlayerId,
        position: Vec2,
        spawn_interval: f32,
    ) -> Self {
        Self {
            id,
            kind,
            owner,
            position,
            spawn_timer: spawn_interval,
            spawn_interval,
            unit_count: 0,
        }
    }

    /// Structure identifier.
    #[must_use]
    pub const fn id(&self) -> StructureId {
        self.id
    }

    /// Spawner kind.
    #[must_use]
    pub const fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Fixed world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Live units spawned by this structure.
    #[must_use]
    pub const fn unit_count(&self) -> usize {
        self.unit_count
    }

    /// Counts the timer down by `dt`; returns true once it has run out.
    pub fn advance_timer(&mut self, dt: f32) -> bool {
        self.spawn_timer -= dt;
        self.spawn_timer <= 0.0
    }

    /// Restarts the countdown.
    pub fn reset_timer(&mut self) {
        self.spawn_timer = self.spawn_interval;
    }

    /// Adopts a new interval and pulls the timer down to it if needed.
    pub fn set_interval(&mut self, spawn_interval: f32) {
        self.spawn_interval = spawn_interval;
        self.spawn_timer = self.spawn_timer.min(spawn_interval);
    }
}
