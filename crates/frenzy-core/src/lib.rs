//! # Frenzy Core
//!
//! Per-tick simulation engine for Frenzy mode: autonomous units spawned by
//! player structures push out along their territory's frontier, fight the
//! nearest hostile in range, and capture tiles that border their owner's
//! land.
//!
//! ## Architecture
//!
//! - **Entities** ([`entity`]): units and spawner structures
//! - **Registry** ([`registry`]): single owner of all live entities plus the
//!   spatial index
//! - **Resolvers** ([`resolver`]): movement, combat and capture stages
//! - **Manager** ([`manager`]): the tick orchestrator
//! - **Territory** ([`territory`]): the map collaborator trait and a
//!   reference [`TileMap`]
//!
//! ## Usage
//!
//! ```
//! use frenzy_core::{FrenzyConfig, FrenzyManager, PlayerId, TileMap};
//!
//! let mut map = TileMap::new(48, 48);
//! let red = PlayerId::new(1);
//! map.add_player(red);
//! map.fill_disc(24, 24, 2, red);
//! map.set_spawn_phase(false);
//!
//! let mut manager = FrenzyManager::new(FrenzyConfig::default(), 42);
//! manager.initialize();
//! for _ in 0..20 {
//!     manager.tick(&mut map, 0.1);
//! }
//!
//! assert!(map.owned_count(red) > 13);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the spatial substrate
pub use frenzy_grid;

pub mod config;
pub mod entity;
pub mod error;
pub mod frontier;
pub mod hash;
pub mod manager;
pub mod registry;
pub mod resolver;
pub mod snapshot;
pub mod territory;

pub use config::{ConfigOverride, FrenzyConfig};
pub use entity::{Structure, StructureId, StructureKind, Unit, UnitId, UnitStats};
pub use error::{FrenzyError, Result};
pub use manager::{FrenzyManager, SimPhase, TickReport};
pub use snapshot::{StructureView, UnitView};
pub use territory::{PlayerId, Territory, TileMap, TileRef};

#[cfg(test)]
mod tests;
