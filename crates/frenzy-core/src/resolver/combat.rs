//! Combat resolution.
//!
//! Each live unit, in id order, looks for the nearest hostile unit within its
//! attack range and deals `damage_per_second * dt` to it. There is no limit
//! on how many attackers may focus one target.
//!
//! # Ordering
//!
//! Damage is applied immediately, so resolution is order dependent: a unit
//! killed earlier in the pass neither attacks nor gets targeted for the rest
//! of the pass. Ties between equally distant hostiles go to whichever the
//! spatial index visits first.
//!
//! # Stale Index
//!
//! The spatial index still holds positions from before this tick's movement.
//! Callers pass the largest displacement of the tick as `padding`; the grid
//! query is widened by it and every candidate is then checked against its
//! live position, so no hostile that is truly in range is missed.

use frenzy_grid::SpatialHashGrid;
use glam::Vec2;

use crate::entity::{Unit, UnitId};
use crate::registry::{Registry, UnitEntry};

/// Summary of one combat pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CombatOutcome {
    /// Attacks made this tick.
    pub engagements: usize,
    /// Total damage dealt this tick.
    pub damage_dealt: f32,
}

/// Position of `id` in an id-sorted unit slice.
fn index_of(units: &[Unit], id: UnitId) -> Option<usize> {
    units.binary_search_by_key(&id, Unit::id).ok()
}

/// Nearest live hostile of `units[attacker]` within its attack range.
fn nearest_hostile(
    units: &[Unit],
    attacker: usize,
    spatial: &SpatialHashGrid<UnitEntry>,
    padding: f32,
) -> Option<usize> {
    let unit = &units[attacker];
    let range = unit.stats.attack_range;
    let origin: Vec2 = unit.position;

    let mut best: Option<(f32, usize)> = None;
    spatial.visit_nearby(origin, range + padding.max(0.0), |entry| {
        if entry.owner == unit.owner() {
            return;
        }
        let Some(index) = index_of(units, entry.id) else {
            return;
        };
        let candidate = &units[index];
        if !candidate.is_alive() {
            return;
        }
        let distance = origin.distance(candidate.position);
        if distance > range {
            return;
        }
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, index));
        }
    });
    best.map(|(_, index)| index)
}

/// Applies one tick of damage from every live unit.
pub fn resolve_combat(registry: &mut Registry, dt: f32, padding: f32) -> CombatOutcome {
    let mut outcome = CombatOutcome::default();
    if dt <= 0.0 {
        return outcome;
    }

    let (units, spatial) = registry.units_and_spatial();
    for attacker in 0..units.len() {
        if !units[attacker].is_alive() {
            continue;
        }
        let Some(target) = nearest_hostile(units, attacker, spatial, padding) else {
            continue;
        };
        let damage = units[attacker].stats.damage_per_second * dt;
        units[target].take_damage(damage);
        outcome.engagements += 1;
        outcome.damage_dealt += damage.max(0.0);
    }
    outcome
}

// =============================================================================
// Tests
// =============================================================================
