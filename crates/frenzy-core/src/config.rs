//! Tunable parameters for Frenzy mode.
//!
//! [`FrenzyConfig`] is the full snapshot read by every tick. It is replaced
//! wholesale only through [`FrenzyManager::update_config`], which takes a
//! [`ConfigOverride`] (every field optional) and merges it onto the current
//! snapshot.
//!
//! Distances are in world units (one tile is one unit), times in seconds.
//!
//! # Example
//!
//! ```
//! use frenzy_core::config::{ConfigOverride, FrenzyConfig};
//!
//! let base = FrenzyConfig::default();
//! let patch = ConfigOverride::from_json_str(r#"{ "max_units_per_player": 10 }"#).unwrap();
//! let merged = base.merged(&patch);
//!
//! assert_eq!(merged.max_units_per_player, 10);
//! assert_eq!(merged.capture_radius, base.capture_radius);
//! ```
//!
//! [`FrenzyManager::update_config`]: crate::manager::FrenzyManager::update_config

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FrenzyError, Result};

/// Complete Frenzy configuration snapshot.
///
/// Missing fields in JSON input take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrenzyConfig {
    /// Seconds between spawns for each spawner structure.
    pub spawn_interval: f32,
    /// Units a structure spawns each time its timer fires (at least one).
    pub units_per_spawn: usize,
    /// Maximum live units per player.
    pub max_units_per_player: usize,
    /// Units created alongside a player's core structure.
    pub starting_units: usize,
    /// Unit movement speed in world units per second.
    pub unit_speed: f32,
    /// Health of a freshly spawned unit.
    pub unit_health: f32,
    /// Continuous damage per second applied to the nearest hostile in range.
    pub unit_dps: f32,
    /// Damage of a single projectile hit.
    pub projectile_damage: f32,
    /// Seconds between projectile shots.
    pub fire_interval: f32,
    /// Distance within which a unit engages hostiles.
    pub combat_range: f32,
    /// Distance within which friendly units push each other apart.
    pub separation_radius: f32,
    /// Scale of the separation push relative to unit speed.
    pub separation_strength: f32,
    /// Half-width, in tiles, of the square a unit can capture each tick.
    pub capture_radius: u32,
    /// How strongly units prefer frontier tiles along their own radial direction.
    pub radial_alignment_weight: f32,
    /// Distance past the chosen frontier tile to aim for; `0` aims at the tile.
    pub border_advance_distance: f32,
    /// Distance to target below which a unit stops.
    pub stop_distance: f32,
    /// Maximum per-axis offset applied to freshly spawned units.
    pub spawn_jitter: f32,
    /// Cell size of the spatial index.
    pub grid_cell_size: f32,
    /// Tick duration above which an overrun warning is logged.
    pub tick_budget_ms: f32,
}

impl Default for FrenzyConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 4.0,
            units_per_spawn: 1,
            max_units_per_player: 100,
            starting_units: 5,
            unit_speed: 20.0,
            unit_health: 100.0,
            unit_dps: 15.0,
            projectile_damage: 10.0,
            fire_interval: 1.0,
            combat_range: 25.0,
            separation_radius: 10.0,
            separation_strength: 0.8,
            capture_radius: 2,
            radial_alignment_weight: 0.75,
            border_advance_distance: 0.0,
            stop_distance: 2.0,
            spawn_jitter: 3.0,
            grid_cell_size: 25.0,
            tick_budget_ms: 100.0,
        }
    }
}

impl FrenzyConfig {
    /// Parses a (possibly partial) JSON document layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FrenzyError::ConfigParse`] if the JSON is malformed or a field
    /// has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a (possibly partial) JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`FrenzyError::ConfigIo`] if the file cannot be read and
    /// [`FrenzyError::ConfigParse`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FrenzyError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Returns a copy of this configuration with `patch` applied.
    #[must_use]
    pub fn merged(&self, patch: &ConfigOverride) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }

    /// Applies every field set in `patch`.
    pub fn apply(&mut self, patch: &ConfigOverride) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    self.$field = value;
                })*
            };
        }
        take!(
            spawn_interval,
            units_per_spawn,
            max_units_per_player,
            starting_units,
            unit_speed,
            unit_health,
            unit_dps,
            projectile_damage,
            fire_interval,
            combat_range,
            separation_radius,
            separation_strength,
            capture_radius,
            radial_alignment_weight,
            border_advance_distance,
            stop_distance,
            spawn_jitter,
            grid_cell_size,
            tick_budget_ms,
        );
    }

    /// Capture radius in tiles, never below one.
    #[must_use]
    pub fn effective_capture_radius(&self) -> i32 {
        i32::try_from(self.capture_radius.max(1)).unwrap_or(i32::MAX)
    }
}

/// Partial configuration update.
///
/// Every field is optional; unset fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ConfigOverride {
    pub spawn_interval: Option<f32>,
    pub units_per_spawn: Option<usize>,
    pub max_units_per_player: Option<usize>,
    pub starting_units: Option<usize>,
    pub unit_speed: Option<f32>,
    pub unit_health: Option<f32>,
    pub unit_dps: Option<f32>,
    pub projectile_damage: Option<f32>,
    pub fire_interval: Option<f32>,
    pub combat_range: Option<f32>,
    pub separation_radius: Option<f32>,
    pub separation_strength: Option<f32>,
    pub capture_radius: Option<u32>,
    pub radial_alignment_weight: Option<f32>,
    pub border_advance_distance: Option<f32>,
    pub stop_distance: Option<f32>,
    pub spawn_jitter: Option<f32>,
    pub grid_cell_size: Option<f32>,
    pub tick_budget_ms: Option<f32>,
}

impl ConfigOverride {
    /// Parses an override from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FrenzyError::ConfigParse`] on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override that only changes the unit cap.
    #[must_use]
    pub fn max_units(max_units_per_player: usize) -> Self {
        Self {
            max_units_per_player: Some(max_units_per_player),
            ..Self::default()
        }
    }

    /// Override that only changes the spawn interval.
    #[must_use]
    pub fn spawn_interval(spawn_interval: f32) -> Self {
        Self {
            spawn_interval: Some(spawn_interval),
            ..Self::default()
        }
    }
}
