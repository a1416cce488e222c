//! State hashing for determinism checks.
//!
//! Two managers fed the same configuration, seed and territory states must
//! produce the same hash after every tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec2;

use crate::entity::{Structure, Unit};
use crate::manager::FrenzyManager;

/// Computes a deterministic hash of the manager's simulation state.
///
/// This hash includes:
/// - Active tick count, seed and current phase
/// - Jitter RNG position
/// - Every unit (identity, kinematics, health)
/// - Every structure (identity, timers, unit count)
///
/// The configuration and the spatial index are not hashed; the index is
/// derived from the units.
#[must_use]
pub fn hash_state(manager: &FrenzyManager) -> u64 {
    let mut hasher = DefaultHasher::new();

    manager.ticks_run().hash(&mut hasher);
    manager.seed().hash(&mut hasher);
    manager.phase().hash(&mut hasher);
    manager.rng_word_pos().hash(&mut hasher);

    manager.units().len().hash(&mut hasher);
    for unit in manager.units() {
        hash_unit(unit, &mut hasher);
    }

    for (player, structures) in manager.structures() {
        player.hash(&mut hasher);
        structures.len().hash(&mut hasher);
        for structure in structures {
            hash_structure(structure, &mut hasher);
        }
    }

    hasher.finish()
}

/// Hash a vector as bit patterns.
fn hash_vec2<H: Hasher>(v: Vec2, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}

fn hash_unit<H: Hasher>(unit: &Unit, hasher: &mut H) {
    unit.id().hash(hasher);
    unit.owner().hash(hasher);
    unit.spawner().hash(hasher);
    hash_vec2(unit.position, hasher);
    hash_vec2(unit.velocity, hasher);
    hash_vec2(unit.target, hasher);
    unit.health.to_bits().hash(hasher);
}

fn hash_structure<H: Hasher>(structure: &Structure, hasher: &mut H) {
    structure.id().hash(hasher);
    structure.kind().hash(hasher);
    hash_vec2(structure.position(), hasher);
    structure.spawn_timer.to_bits().hash(hasher);
    structure.spawn_interval.to_bits().hash(hasher);
    structure.unit_count().hash(hasher);
}
