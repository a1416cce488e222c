//! Territory capture.
//!
//! Every live unit claims the tiles in a square of `capture_radius` tiles
//! (Chebyshev distance, at least one) around the tile it stands on. A tile is
//! claimable when it is on the map, is land, is not already the unit owner's,
//! and borders (4-neighbourhood) a tile the owner already holds.
//!
//! Capture runs in two phases so territory grows exactly one ring per tick:
//!
//! 1. **Claim**: units in id order collect claimable tiles against the
//!    ownership at the start of the stage. Each player claims a tile at most
//!    once; several players may claim the same tile.
//! 2. **Conquer**: claims are applied in claim order. Each claim is checked
//!    again right before conquering, because an earlier conquest in the same
//!    pass may have taken the owned tile it bordered. The first claim that
//!    succeeds on a tile wins it; later claims on that tile are dropped.
//!
//! No tile is ever assigned to a player without an owned neighbour at that
//! moment.

use std::collections::BTreeSet;

use crate::config::FrenzyConfig;
use crate::registry::Registry;
use crate::territory::{PlayerId, Territory, TileRef};

/// Summary of one capture pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Distinct (tile, player) claims made in phase one.
    pub claimed: usize,
    /// Tiles that changed owner.
    pub captured: usize,
}

/// Whether `player` may take `tile` given the current ownership.
fn claimable<T: Territory + ?Sized>(territory: &T, tile: TileRef, player: PlayerId) -> bool {
    !territory.is_water(tile)
        && !territory.is_owned_by(tile, player)
        && territory.borders_player(tile, player)
}

/// Runs both capture phases for every live unit.
pub fn resolve_capture<T: Territory + ?Sized>(
    registry: &Registry,
    territory: &mut T,
    config: &FrenzyConfig,
) -> CaptureOutcome {
    let radius = config.effective_capture_radius();

    let mut seen: BTreeSet<(TileRef, PlayerId)> = BTreeSet::new();
    let mut claims: Vec<(TileRef, PlayerId)> = Vec::new();
    for unit in registry.units().iter().filter(|u| u.is_alive()) {
        let Some(home) = territory.tile_at_position(unit.position) else {
            continue;
        };
        let (cx, cy) = territory.tile_xy(home);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let Some(tile) = territory.tile_at(cx + dx, cy + dy) else {
                    continue;
                };
                let claim = (tile, unit.owner());
                if seen.contains(&claim) || !claimable(&*territory, tile, unit.owner()) {
                    continue;
                }
                seen.insert(claim);
                claims.push(claim);
            }
        }
    }

    let mut outcome = CaptureOutcome {
        claimed: claims.len(),
        captured: 0,
    };
    let mut taken: BTreeSet<TileRef> = BTreeSet::new();
    for (tile, player) in claims {
        if !taken.contains(&tile) && claimable(&*territory, tile, player) {
            taken.insert(tile);
            territory.conquer(tile, player);
            outcome.captured += 1;
        }
    }
    outcome
}

// =============================================================================
// Tests
// =============================================================================
