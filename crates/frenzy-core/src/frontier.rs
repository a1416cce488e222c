//! Per-player frontier analysis.
//!
//! A player's frontier is everything movement targeting needs to know about
//! their territory: its centroid, the owned tiles on its edge, and the
//! unowned land tiles just beyond that edge (the capture candidates).
//!
//! The frontier is computed once per player per tick and shared by all of
//! that player's units. Each unit still picks its own target from it every
//! tick.

use glam::Vec2;

use crate::territory::{PlayerId, Territory, TileRef};

/// An unowned, non-water tile adjacent to the player's border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The tile.
    pub tile: TileRef,
    /// World position of the tile.
    pub position: Vec2,
}

/// Snapshot of one player's territory edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontier {
    /// Mean position of all owned tiles.
    pub centroid: Vec2,
    /// Owned tiles with at least one neighbour the player does not own.
    pub border_tiles: Vec<TileRef>,
    /// Capture candidates, sorted by tile and free of duplicates.
    pub candidates: Vec<Candidate>,
}

impl Frontier {
    /// Analyses `player`'s territory.
    ///
    /// Returns `None` when the player owns no tiles.
    ///
    /// # Example
    ///
    /// ```
    /// use frenzy_core::frontier::Frontier;
    /// use frenzy_core::territory::{PlayerId, TileMap};
    /// use glam::Vec2;
    ///
    /// let mut map = TileMap::new(20, 20);
    /// let red = PlayerId::new(1);
    /// map.fill_rect(9, 9, 11, 11, red);
    ///
    /// let frontier = Frontier::compute(&map, red).unwrap();
    /// assert_eq!(frontier.centroid, Vec2::new(10.0, 10.0));
    /// assert_eq!(frontier.border_tiles.len(), 8);
    /// assert_eq!(frontier.candidates.len(), 12);
    /// ```
    #[must_use]
    pub fn compute<T: Territory + ?Sized>(territory: &T, player: PlayerId) -> Option<Self> {
        let owned = territory.owned_tiles(player);
        if owned.is_empty() {
            return None;
        }

        let mut sum = Vec2::ZERO;
        let mut border_tiles = Vec::new();
        let mut candidate_tiles = Vec::new();

        for &tile in &owned {
            sum += territory.tile_position(tile);

            let mut on_border = false;
            territory.for_each_neighbor(tile, &mut |n| {
                if territory.is_owned_by(n, player) {
                    return;
                }
                on_border = true;
                if !territory.is_water(n) {
                    candidate_tiles.push(n);
                }
            });
            if on_border {
                border_tiles.push(tile);
            }
        }

        candidate_tiles.sort_unstable();
        candidate_tiles.dedup();
        let candidates = candidate_tiles
            .into_iter()
            .map(|tile| Candidate {
                tile,
                position: territory.tile_position(tile),
            })
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let centroid = sum / owned.len() as f32;

        Some(Self {
            centroid,
            border_tiles,
            candidates,
        })
    }

    /// Whether the territory has any edge at all.
    #[must_use]
    pub fn has_border(&self) -> bool {
        !self.border_tiles.is_empty()
    }
}
