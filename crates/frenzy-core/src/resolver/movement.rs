//! Movement and frontier targeting.
//!
//! Every tick each unit picks a target on its owner's frontier and steps
//! toward it:
//!
//! 1. Owner has no territory: the unit stands still
//! 2. Owner has no border (or no capturable candidate): head for the map centre
//! 3. Otherwise score every capture candidate by
//!    `distance / max(0.1, 1 + weight * cos(candidate_dir, unit_dir))`, where
//!    both directions are taken from the territory centroid, and take the
//!    lowest score
//! 4. Optionally aim `border_advance_distance` past the chosen tile, away
//!    from the centroid, clamped to the map
//!
//! The radial bias keeps a player's units fanned out around the whole
//! frontier instead of all converging on the single nearest weak point.
//!
//! While moving, units are pushed apart from nearby friendlies
//! (separation) using the spatial index from the previous rebuild.

use std::collections::{BTreeMap, BTreeSet};

use frenzy_grid::{Bounds, SpatialHashGrid};
use glam::Vec2;

use crate::config::FrenzyConfig;
use crate::entity::Unit;
use crate::frontier::Frontier;
use crate::registry::{Registry, UnitEntry};
use crate::territory::{PlayerId, Territory};

/// Lower bound of the alignment boost, so opposite-facing candidates are
/// penalised but never divide by zero or flip sign.
const MIN_ALIGNMENT_BOOST: f32 = 0.1;

/// Summary of one movement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementOutcome {
    /// Units that moved this tick.
    pub moving: usize,
    /// Largest distance any unit travelled this tick.
    pub max_displacement: f32,
}

/// Vector length, or `1.0` for (near) zero vectors.
#[inline]
#[must_use]
pub fn safe_length(v: Vec2) -> f32 {
    let length = v.length();
    if length > f32::EPSILON {
        length
    } else {
        1.0
    }
}

/// Cosine similarity with zero vectors treated as orthogonal to everything.
#[inline]
#[must_use]
pub fn cos_similarity(a: Vec2, b: Vec2) -> f32 {
    a.dot(b) / (safe_length(a) * safe_length(b))
}

/// Picks the world position a unit should head for.
///
/// `map_center` is the fallback when the frontier offers nothing to capture.
#[must_use]
pub fn select_target(
    frontier: &Frontier,
    unit_position: Vec2,
    config: &FrenzyConfig,
    bounds: &Bounds,
    map_center: Vec2,
) -> Vec2 {
    if !frontier.has_border() {
        return map_center;
    }

    let unit_dir = unit_position - frontier.centroid;
    let mut best: Option<(f32, Vec2)> = None;
    for candidate in &frontier.candidates {
        let candidate_dir = candidate.position - frontier.centroid;
        let boost = (1.0
            + config.radial_alignment_weight * cos_similarity(candidate_dir, unit_dir))
        .max(MIN_ALIGNMENT_BOOST);
        let score = unit_position.distance(candidate.position) / boost;
        if best.map_or(true, |(best_score, _)| score < best_score) {
            best = Some((score, candidate.position));
        }
    }

    let Some((_, chosen)) = best else {
        return map_center;
    };

    if config.border_advance_distance > 0.0 {
        let outward = chosen - frontier.centroid;
        let direction = outward / safe_length(outward);
        bounds.clamp(chosen + direction * config.border_advance_distance)
    } else {
        chosen
    }
}

/// Velocity pushing `unit` away from nearby friendly units.
///
/// Each neighbour within `separation_radius` contributes a unit vector
/// pointing away from it, weighted by the inverse of its distance (distances
/// under one world unit count as one). The contributions are averaged and
/// scaled by unit speed and separation strength.
#[must_use]
pub fn separation(
    unit: &Unit,
    spatial: &SpatialHashGrid<UnitEntry>,
    config: &FrenzyConfig,
) -> Vec2 {
    let radius = config.separation_radius;
    if radius <= 0.0 {
        return Vec2::ZERO;
    }

    let mut push = Vec2::ZERO;
    let mut neighbours = 0u32;
    spatial.visit_nearby(unit.position, radius, |entry| {
        if entry.id == unit.id() || entry.owner != unit.owner() {
            return;
        }
        let offset = unit.position - entry.position;
        let distance = offset.length();
        if distance > radius {
            return;
        }
        push += offset / safe_length(offset) / distance.max(1.0);
        neighbours += 1;
    });

    if neighbours == 0 {
        return Vec2::ZERO;
    }
    #[allow(clippy::cast_precision_loss)]
    let average = push / neighbours as f32;
    average * config.unit_speed * config.separation_strength
}

/// Frontier of every player that has live units.
///
/// Players without territory map to `None`.
fn frontiers_for<T: Territory + ?Sized>(
    registry: &Registry,
    territory: &T,
) -> BTreeMap<PlayerId, Option<Frontier>> {
    let owners: BTreeSet<PlayerId> = registry
        .units()
        .iter()
        .filter(|u| u.is_alive())
        .map(Unit::owner)
        .collect();
    owners
        .into_iter()
        .map(|player| (player, Frontier::compute(territory, player)))
        .collect()
}

/// Retargets and moves every live unit.
pub fn resolve_movement<T: Territory + ?Sized>(
    registry: &mut Registry,
    territory: &T,
    config: &FrenzyConfig,
    dt: f32,
) -> MovementOutcome {
    let bounds = Bounds::from_map_size(territory.width(), territory.height());
    let map_center = territory.map_center();
    let frontiers = frontiers_for(registry, territory);

    let mut outcome = MovementOutcome::default();
    let (units, spatial) = registry.units_and_spatial();

    for unit in units.iter_mut() {
        if !unit.is_alive() {
            continue;
        }
        let Some(frontier) = frontiers.get(&unit.owner()).and_then(Option::as_ref) else {
            unit.velocity = Vec2::ZERO;
            continue;
        };

        let target = select_target(frontier, unit.position, config, &bounds, map_center);
        unit.target = target;

        let to_target = target - unit.position;
        if to_target.length() <= config.stop_distance {
            unit.velocity = Vec2::ZERO;
            continue;
        }

        let mut velocity = to_target / safe_length(to_target) * config.unit_speed;
        velocity += separation(unit, spatial, config);
        unit.velocity = velocity;

        let start = unit.position;
        unit.position = bounds.clamp(start + velocity * dt);
        outcome.moving += 1;
        outcome.max_displacement = outcome.max_displacement.max(start.distance(unit.position));
    }

    outcome
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{StructureKind, UnitId, UnitStats};
    use crate::territory::TileMap;

    const RED: PlayerId = PlayerId::new(1);
    const BLUE: PlayerId = PlayerId::new(2);
    const EPS: f32 = 1.0e-4;

    fn registry_with(units: &[(PlayerId, Vec2)]) -> Registry {
        let mut registry = Registry::new(10.0);
        for player in [RED, BLUE] {
            registry
                .add_structure(StructureKind::Hq, player, Vec2::ZERO, 4.0)
                .unwrap();
        }
        for &(owner, position) in units {
            let hq = registry.core_of(owner).unwrap().id();
            registry.spawn_unit(owner, hq, position, UnitStats::default());
        }
        registry.rebuild_spatial();
        registry
    }

    mod vector_tests {
        use super::*;

        #[test]
        fn safe_length_of_zero_is_one() {
            assert!((safe_length(Vec2::ZERO) - 1.0).abs() < EPS);
            assert!((safe_length(Vec2::new(3.0, 4.0)) - 5.0).abs() < EPS);
        }

        #[test]
        fn cos_similarity_basics() {
            assert!((cos_similarity(Vec2::X, Vec2::X) - 1.0).abs() < EPS);
            assert!((cos_similarity(Vec2::X, -Vec2::X) + 1.0).abs() < EPS);
            assert!(cos_similarity(Vec2::X, Vec2::Y).abs() < EPS);
        }

        #[test]
        fn cos_similarity_with_zero_vector_is_zero() {
            let c = cos_similarity(Vec2::ZERO, Vec2::new(2.0, 1.0));
            assert!(c.abs() < EPS);
            assert!(c.is_finite());
        }
    }

    mod targeting_tests {
        use super::*;

        fn block_map() -> TileMap {
            let mut map = TileMap::new(40, 40);
            map.fill_rect(15, 15, 25, 25, RED);
            map
        }

        #[test]
        fn picks_candidate_along_own_radial_direction() {
            let map = block_map();
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(40, 40);
            let config = FrenzyConfig::default();

            // Unit east of the centroid should head east
            let target = select_target(
                &frontier,
                Vec2::new(23.0, 20.0),
                &config,
                &bounds,
                map.map_center(),
            );
            assert!((target.x - 26.0).abs() < EPS);
            assert!((target.y - 20.0).abs() < EPS);

            // Unit north of the centroid should head north
            let target = select_target(
                &frontier,
                Vec2::new(20.0, 17.0),
                &config,
                &bounds,
                map.map_center(),
            );
            assert!((target.y - 14.0).abs() < EPS);
        }

        #[test]
        fn zero_weight_picks_nearest_candidate() {
            let map = block_map();
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(40, 40);
            let config = FrenzyConfig {
                radial_alignment_weight: 0.0,
                ..FrenzyConfig::default()
            };

            let target = select_target(
                &frontier,
                Vec2::new(16.0, 19.5),
                &config,
                &bounds,
                map.map_center(),
            );
            // (14,19) and (14,20) tie; the lower tile index wins
            assert_eq!(target, Vec2::new(14.0, 19.0));
        }

        #[test]
        fn advance_distance_projects_past_tile() {
            let map = block_map();
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(40, 40);
            let config = FrenzyConfig {
                border_advance_distance: 5.0,
                ..FrenzyConfig::default()
            };

            let target = select_target(
                &frontier,
                Vec2::new(24.0, 20.0),
                &config,
                &bounds,
                map.map_center(),
            );
            assert!((target.x - 31.0).abs() < EPS);
            assert!((target.y - 20.0).abs() < EPS);
        }

        #[test]
        fn advance_distance_is_clamped_to_map() {
            let mut map = TileMap::new(30, 30);
            map.fill_rect(20, 10, 27, 20, RED);
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(30, 30);
            let config = FrenzyConfig {
                border_advance_distance: 50.0,
                ..FrenzyConfig::default()
            };

            let target = select_target(
                &frontier,
                Vec2::new(27.0, 15.0),
                &config,
                &bounds,
                map.map_center(),
            );
            assert!(bounds.contains(target));
        }

        #[test]
        fn no_border_falls_back_to_center() {
            let mut map = TileMap::new(8, 8);
            map.fill_rect(0, 0, 7, 7, RED);
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(8, 8);

            let target = select_target(
                &frontier,
                Vec2::new(1.0, 1.0),
                &FrenzyConfig::default(),
                &bounds,
                map.map_center(),
            );
            assert_eq!(target, Vec2::new(4.0, 4.0));
        }

        #[test]
        fn no_candidates_falls_back_to_center() {
            let mut map = TileMap::new(10, 10);
            map.set_owner(2, 2, Some(RED));
            for (x, y) in [(2, 1), (1, 2), (3, 2), (2, 3)] {
                map.set_water(x, y, true);
            }
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(10, 10);

            let target = select_target(
                &frontier,
                Vec2::new(2.0, 2.0),
                &FrenzyConfig::default(),
                &bounds,
                map.map_center(),
            );
            assert_eq!(target, Vec2::new(5.0, 5.0));
        }

        #[test]
        fn unit_on_centroid_still_gets_finite_target() {
            let map = block_map();
            let frontier = Frontier::compute(&map, RED).unwrap();
            let bounds = Bounds::from_map_size(40, 40);

            let target = select_target(
                &frontier,
                frontier.centroid,
                &FrenzyConfig::default(),
                &bounds,
                map.map_center(),
            );
            assert!(target.is_finite());
            assert!(frontier.candidates.iter().any(|c| c.position == target));
        }
    }

    mod separation_tests {
        use super::*;

        #[test]
        fn lone_unit_has_no_push() {
            let registry = registry_with(&[(RED, Vec2::new(5.0, 5.0))]);
            let push = separation(&registry.units()[0], registry.spatial(), &FrenzyConfig::default());
            assert_eq!(push, Vec2::ZERO);
        }

        #[test]
        fn pushes_away_from_friend() {
            let registry = registry_with(&[(RED, Vec2::new(5.0, 5.0)), (RED, Vec2::new(7.0, 5.0))]);
            let push = separation(&registry.units()[0], registry.spatial(), &FrenzyConfig::default());
            assert!(push.x < 0.0);
            assert!(push.y.abs() < EPS);
        }

        #[test]
        fn ignores_enemies() {
            let registry = registry_with(&[(RED, Vec2::new(5.0, 5.0)), (BLUE, Vec2::new(6.0, 5.0))]);
            let push = separation(&registry.units()[0], registry.spatial(), &FrenzyConfig::default());
            assert_eq!(push, Vec2::ZERO);
        }

        #[test]
        fn ignores_friends_beyond_radius() {
            let registry =
                registry_with(&[(RED, Vec2::new(5.0, 5.0)), (RED, Vec2::new(25.0, 5.0))]);
            let push = separation(&registry.units()[0], registry.spatial(), &FrenzyConfig::default());
            assert_eq!(push, Vec2::ZERO);
        }

        #[test]
        fn co_located_friend_is_finite() {
            let registry = registry_with(&[(RED, Vec2::new(5.0, 5.0)), (RED, Vec2::new(5.0, 5.0))]);
            let push = separation(&registry.units()[0], registry.spatial(), &FrenzyConfig::default());
            assert!(push.is_finite());
        }

        #[test]
        fn closer_friends_push_harder() {
            let near = registry_with(&[(RED, Vec2::new(5.0, 5.0)), (RED, Vec2::new(7.0, 5.0))]);
            let far = registry_with(&[(RED, Vec2::new(5.0, 5.0)), (RED, Vec2::new(13.0, 5.0))]);
            let config = FrenzyConfig::default();
            let near_push = separation(&near.units()[0], near.spatial(), &config);
            let far_push = separation(&far.units()[0], far.spatial(), &config);
            assert!(near_push.length() > far_push.length());
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn unit_without_territory_stays_put() {
            let map = TileMap::new(40, 40);
            let mut registry = registry_with(&[(RED, Vec2::new(5.0, 5.0))]);

            let outcome = resolve_movement(&mut registry, &map, &FrenzyConfig::default(), 0.1);

            assert_eq!(outcome.moving, 0);
            assert_eq!(registry.units()[0].position, Vec2::new(5.0, 5.0));
            assert_eq!(registry.units()[0].velocity, Vec2::ZERO);
        }

        #[test]
        fn unit_moves_toward_frontier_at_unit_speed() {
            let mut map = TileMap::new(40, 40);
            map.fill_rect(15, 15, 25, 25, RED);
            let mut registry = registry_with(&[(RED, Vec2::new(23.0, 20.0))]);
            let config = FrenzyConfig {
                unit_speed: 10.0,
                stop_distance: 0.5,
                ..FrenzyConfig::default()
            };

            let outcome = resolve_movement(&mut registry, &map, &config, 0.1);

            let unit = &registry.units()[0];
            assert_eq!(outcome.moving, 1);
            assert!((unit.position.x - 24.0).abs() < EPS);
            assert!((unit.position.y - 20.0).abs() < EPS);
            assert!((outcome.max_displacement - 1.0).abs() < EPS);
            assert_eq!(unit.target, Vec2::new(26.0, 20.0));
        }

        #[test]
        fn arrived_unit_stops() {
            let mut map = TileMap::new(40, 40);
            map.fill_rect(15, 15, 25, 25, RED);
            let mut registry = registry_with(&[(RED, Vec2::new(25.5, 20.0))]);

            resolve_movement(&mut registry, &map, &FrenzyConfig::default(), 0.1);

            let unit = &registry.units()[0];
            assert_eq!(unit.velocity, Vec2::ZERO);
            assert_eq!(unit.position, Vec2::new(25.5, 20.0));
        }

        #[test]
        fn positions_stay_within_map() {
            let mut map = TileMap::new(20, 20);
            map.fill_rect(0, 0, 18, 19, RED);
            let mut registry = registry_with(&[(RED, Vec2::new(18.0, 10.0))]);
            let config = FrenzyConfig {
                unit_speed: 500.0,
                border_advance_distance: 100.0,
                ..FrenzyConfig::default()
            };

            resolve_movement(&mut registry, &map, &config, 1.0);

            let bounds = Bounds::from_map_size(20, 20);
            assert!(bounds.contains(registry.units()[0].position));
        }

        #[test]
        fn dead_units_are_skipped() {
            let mut map = TileMap::new(40, 40);
            map.fill_rect(15, 15, 25, 25, RED);
            let mut registry = registry_with(&[(RED, Vec2::new(23.0, 20.0))]);
            registry.unit_mut(UnitId::new(1)).unwrap().health = 0.0;

            let outcome = resolve_movement(&mut registry, &map, &FrenzyConfig::default(), 0.1);
            assert_eq!(outcome.moving, 0);
            assert_eq!(registry.units()[0].position, Vec2::new(23.0, 20.0));
        }
    }
}
