//! Scenario setup and the fixed-step run loop.
//!
//! A scenario is a blank land map with each player's starting territory
//! stamped as a disc. One player starts at the map centre; several are spaced
//! evenly on a ring around it. The run loop ends the spawn phase, advances
//! the [`FrenzyManager`] at a fixed `dt` and records a [`Sample`] at each
//! requested time.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Result};
use frenzy_core::{FrenzyConfig, FrenzyManager, PlayerId, TileMap};
use serde::Serialize;
use tracing::info;

/// Map and clock settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Number of players.
    pub players: u32,
    /// Radius of each player's starting disc.
    pub initial_radius: i32,
    /// Seed for the manager's jitter RNG.
    pub seed: u64,
    /// Seconds per tick.
    pub dt: f32,
    /// Simulated seconds to run for.
    pub max_time: f32,
    /// Simulated seconds at which to take samples.
    pub times: Vec<f32>,
    /// Also sample at `max_time`.
    pub final_snapshot: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            players: 1,
            initial_radius: 8,
            seed: 0,
            dt: 0.05,
            max_time: 120.0,
            times: vec![10.0, 60.0, 120.0],
            final_snapshot: false,
        }
    }
}

impl Scenario {
    /// Checks the settings can drive a run.
    ///
    /// # Errors
    ///
    /// Fails on an empty map, zero players or a non-positive `dt`.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.width > 0 && self.height > 0, "map must be at least 1x1");
        ensure!(self.players > 0, "need at least one player");
        ensure!(self.dt > 0.0 && self.dt.is_finite(), "dt must be positive");
        ensure!(self.max_time >= 0.0, "max time must not be negative");
        Ok(())
    }

    /// Player ids, numbered from one.
    #[must_use]
    pub fn player_ids(&self) -> Vec<PlayerId> {
        (1..=self.players).map(PlayerId::new).collect()
    }

    /// Tile at the centre of each player's starting disc.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn start_positions(&self) -> Vec<(i32, i32)> {
        let cx = (self.width / 2) as f32;
        let cy = (self.height / 2) as f32;
        if self.players == 1 {
            return vec![(cx as i32, cy as i32)];
        }
        let ring = self.width.min(self.height) as f32 / 3.0;
        (0..self.players)
            .map(|i| {
                let angle = TAU * i as f32 / self.players as f32;
                (
                    (cx + ring * angle.cos()).round() as i32,
                    (cy + ring * angle.sin()).round() as i32,
                )
            })
            .collect()
    }

    /// Builds the starting map with the spawn phase already over.
    #[must_use]
    pub fn build_map(&self) -> TileMap {
        let mut map = TileMap::new(self.width, self.height);
        for (player, (x, y)) in self.player_ids().into_iter().zip(self.start_positions()) {
            map.add_player(player);
            map.fill_disc(x, y, self.initial_radius, player);
        }
        map.set_spawn_phase(false);
        map
    }

    /// Number of ticks covering `max_time`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn total_ticks(&self) -> u64 {
        (self.max_time / self.dt).round() as u64
    }

    /// Sample times in ascending order, limited to the run length.
    #[must_use]
    pub fn sample_times(&self) -> Vec<f32> {
        let mut times: Vec<f32> = self
            .times
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t >= 0.0 && *t <= self.max_time + 1.0e-6)
            .collect();
        if self.final_snapshot {
            times.push(self.max_time);
        }
        times.sort_by(f32::total_cmp);
        times.dedup();
        times
    }
}

/// State of the game at one requested time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Requested time in seconds.
    pub time: f32,
    /// Tick the sample was taken after.
    pub tick: u64,
    /// Tiles owned per player.
    pub owned_tiles: BTreeMap<PlayerId, usize>,
    /// Live units per player.
    pub units: BTreeMap<PlayerId, usize>,
    /// Image written for this sample, if any.
    pub image: Option<PathBuf>,
}

/// Everything a run produced, written out as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Map and clock settings.
    pub scenario: Scenario,
    /// Frenzy configuration used.
    pub config: FrenzyConfig,
    /// Ticks simulated.
    pub ticks: u64,
    /// Wall-clock run time.
    pub wall_time_ms: f64,
    /// Samples in time order.
    pub samples: Vec<Sample>,
}

/// Runs `scenario` under `config`.
///
/// `on_sample` is called at every sample time with the live map and manager;
/// it may write an image and return its path.
///
/// # Errors
///
/// Fails if the scenario is invalid or `on_sample` fails.
pub fn run<F>(scenario: &Scenario, config: FrenzyConfig, mut on_sample: F) -> Result<Summary>
where
    F: FnMut(f32, &TileMap, &FrenzyManager) -> Result<Option<PathBuf>>,
{
    scenario.validate()?;
    let started = Instant::now();
    let players = scenario.player_ids();
    let mut map = scenario.build_map();
    let mut manager = FrenzyManager::new(config.clone(), scenario.seed);
    manager.initialize();

    let total = scenario.total_ticks();
    let mut pending = scenario.sample_times().into_iter().peekable();
    let mut samples = Vec::new();

    // Samples at time zero see the untouched starting map
    let mut tick = 0u64;
    loop {
        #[allow(clippy::cast_precision_loss)]
        let now = tick as f32 * scenario.dt;
        while let Some(&time) = pending.peek() {
            if now + 1.0e-6 < time {
                break;
            }
            pending.next();
            let image = on_sample(time, &map, &manager)?;
            let sample = take_sample(time, tick, &players, &map, &manager, image);
            info!(
                time,
                tick,
                owned = sample.owned_tiles.values().sum::<usize>(),
                units = sample.units.values().sum::<usize>(),
                "Sample taken"
            );
            samples.push(sample);
        }
        if tick >= total {
            break;
        }
        manager.tick(&mut map, scenario.dt);
        map.advance_tick();
        tick += 1;
    }

    Ok(Summary {
        scenario: scenario.clone(),
        config,
        ticks: tick,
        wall_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        samples,
    })
}

fn take_sample(
    time: f32,
    tick: u64,
    players: &[PlayerId],
    map: &TileMap,
    manager: &FrenzyManager,
    image: Option<PathBuf>,
) -> Sample {
    Sample {
        time,
        tick,
        owned_tiles: players.iter().map(|&p| (p, map.owned_count(p))).collect(),
        units: players.iter().map(|&p| (p, manager.unit_count(p))).collect(),
        image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frenzy_core::Territory;

    fn small() -> Scenario {
        Scenario {
            width: 60,
            height: 60,
            players: 1,
            initial_radius: 3,
            seed: 1,
            dt: 0.1,
            max_time: 3.0,
            times: vec![0.0, 1.0, 3.0],
            final_snapshot: false,
        }
    }

    #[test]
    fn single_player_starts_at_centre() {
        let scenario = small();
        assert_eq!(scenario.start_positions(), vec![(30, 30)]);
        let map = scenario.build_map();
        assert_eq!(map.owner_at(30, 30), Some(PlayerId::new(1)));
        assert!(!map.in_spawn_phase());
    }

    #[test]
    fn players_are_spread_on_a_ring() {
        let scenario = Scenario {
            players: 4,
            ..small()
        };
        let positions = scenario.start_positions();
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0], (50, 30));
        assert_eq!(positions[2], (10, 30));

        let map = scenario.build_map();
        for (i, player) in scenario.player_ids().into_iter().enumerate() {
            let (x, y) = positions[i];
            assert_eq!(map.owner_at(x, y), Some(player));
        }
    }

    #[test]
    fn invalid_scenarios_are_rejected() {
        assert!(Scenario { dt: 0.0, ..small() }.validate().is_err());
        assert!(Scenario { players: 0, ..small() }.validate().is_err());
        assert!(Scenario { width: 0, ..small() }.validate().is_err());
        assert!(small().validate().is_ok());
    }

    #[test]
    fn sample_times_are_sorted_and_bounded() {
        let scenario = Scenario {
            times: vec![3.0, 1.0, 99.0, 1.0, -2.0],
            ..small()
        };
        assert_eq!(scenario.sample_times(), vec![1.0, 3.0]);
    }

    #[test]
    fn final_snapshot_adds_the_end_time_once() {
        let scenario = Scenario {
            times: vec![1.0],
            final_snapshot: true,
            ..small()
        };
        assert_eq!(scenario.sample_times(), vec![1.0, 3.0]);

        let overlapping = Scenario {
            times: vec![3.0],
            final_snapshot: true,
            ..small()
        };
        assert_eq!(overlapping.sample_times(), vec![3.0]);
    }

    #[test]
    fn larger_spawn_batches_fill_the_map_faster() {
        let scenario = Scenario {
            dt: 0.25,
            times: vec![2.0],
            ..small()
        };
        let config = |units_per_spawn| FrenzyConfig {
            starting_units: 0,
            spawn_interval: 0.5,
            units_per_spawn,
            ..FrenzyConfig::default()
        };
        let red = PlayerId::new(1);

        let single = run(&scenario, config(1), |_, _, _| Ok(None)).unwrap();
        let batched = run(&scenario, config(8), |_, _, _| Ok(None)).unwrap();

        assert_eq!(single.samples[0].units[&red], 4);
        assert_eq!(batched.samples[0].units[&red], 32);
    }

    #[test]
    fn run_takes_every_sample_and_grows_territory() {
        let scenario = small();
        let mut seen = Vec::new();

        let summary = run(&scenario, FrenzyConfig::default(), |time, _, _| {
            seen.push(time);
            Ok(None)
        })
        .unwrap();

        assert_eq!(seen, vec![0.0, 1.0, 3.0]);
        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.samples.len(), 3);
        let red = PlayerId::new(1);
        let start = summary.samples[0].owned_tiles[&red];
        let end = summary.samples[2].owned_tiles[&red];
        assert!(end > start);
        assert_eq!(summary.samples[0].units[&red], 0);
        assert!(summary.samples[2].units[&red] > 0);
    }

    #[test]
    fn sample_errors_abort_the_run() {
        let result = run(&small(), FrenzyConfig::default(), |_, _, _| {
            anyhow::bail!("disk full")
        });
        assert!(result.is_err());
    }

    #[test]
    fn summary_serializes() {
        let summary = run(&small(), FrenzyConfig::default(), |_, _, _| Ok(None)).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["ticks"], 30);
        assert_eq!(json["samples"].as_array().map(Vec::len), Some(3));
    }
}
