//! Greyscale ownership snapshots.
//!
//! Water is black, neutral land is dark grey and each player gets its own
//! shade between 80 and 255. Image row zero holds the map's highest `y`, so
//! the picture reads with `y` pointing up.

use std::path::Path;

use anyhow::{Context, Result};
use frenzy_core::{PlayerId, Territory, TileMap};
use image::{GrayImage, Luma};

const WATER: u8 = 0;
const NEUTRAL: u8 = 32;
const OWNED_MIN: u8 = 80;

/// Renders tile ownership, one pixel per tile.
///
/// `players` fixes the shade order; owners not listed are drawn as neutral
/// land.
#[must_use]
pub fn render_ownership(map: &TileMap, players: &[PlayerId]) -> GrayImage {
    let height = map.height();
    GrayImage::from_fn(map.width(), height, |x, row| {
        #[allow(clippy::cast_possible_wrap)]
        let tile = map.tile_at(x as i32, (height - 1 - row) as i32);
        let shade = match tile {
            Some(tile) if map.is_water(tile) => WATER,
            Some(tile) => map
                .owner(tile)
                .and_then(|owner| players.iter().position(|&p| p == owner))
                .map_or(NEUTRAL, |i| player_shade(i, players.len())),
            None => WATER,
        };
        Luma([shade])
    })
}

/// Renders ownership and saves it as a PNG at `path`.
///
/// # Errors
///
/// Fails if the image cannot be encoded or written.
pub fn save_ownership(map: &TileMap, players: &[PlayerId], path: &Path) -> Result<()> {
    render_ownership(map, players)
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

/// Shade of the `index`-th of `count` players, spread over `80..=255`.
#[allow(clippy::cast_possible_truncation)]
fn player_shade(index: usize, count: usize) -> u8 {
    if count <= 1 {
        return u8::MAX;
    }
    let span = usize::from(u8::MAX - OWNED_MIN);
    OWNED_MIN + (span * index / (count - 1)) as u8
}
