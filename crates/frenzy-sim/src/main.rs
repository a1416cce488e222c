//! Headless Frenzy simulator.
//!
//! Runs the tick pipeline on a blank map and writes ownership snapshots as
//! PNG images plus a JSON summary of territory and unit counts.
//!
//! # Usage
//!
//! ```bash
//! # Default run: 400x400 map, one player, snapshots at 10, 60 and 120 s
//! cargo run -p frenzy-sim --release
//!
//! # Three players, faster spawns in batches of 8, custom snapshot times
//! cargo run -p frenzy-sim --release -- --players 3 --spawn-interval 0.25 --spawn-count 8 --times 5 30 --final
//!
//! # Start from a JSON config file
//! cargo run -p frenzy-sim -- --config frenzy.json --out runs/tuned
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frenzy_core::{ConfigOverride, FrenzyConfig};
use frenzy_sim::{run, save_ownership, Scenario};

#[derive(Parser)]
#[command(name = "frenzy-sim")]
#[command(about = "Headless Frenzy territory simulator")]
#[command(version)]
struct Cli {
    /// Simulated seconds at which to save snapshots
    #[arg(long, num_args = 1.., default_values_t = [10.0, 60.0, 120.0])]
    times: Vec<f32>,

    /// Also save a snapshot at --max-time
    #[arg(long = "final")]
    final_snapshot: bool,

    /// Output prefix for images and the summary
    #[arg(long, default_value = "frenzy_sim")]
    out: PathBuf,

    /// Map width in tiles
    #[arg(long, default_value_t = 400)]
    width: u32,

    /// Map height in tiles
    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    max_time: f32,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Number of players
    #[arg(long, default_value_t = 1)]
    players: u32,

    /// Radius of each starting territory disc
    #[arg(long, default_value_t = 8)]
    initial_radius: i32,

    /// Seed for spawn jitter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON config file to start from
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between spawns per structure
    #[arg(long)]
    spawn_interval: Option<f32>,

    /// Units each structure spawns per spawn event
    #[arg(long)]
    spawn_count: Option<usize>,

    /// Units spawned around each new core
    #[arg(long)]
    starting_units: Option<usize>,

    /// Unit speed in tiles per second
    #[arg(long)]
    speed: Option<f32>,

    /// Capture radius in tiles
    #[arg(long)]
    capture_radius: Option<u32>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn scenario(&self) -> Scenario {
        Scenario {
            width: self.width,
            height: self.height,
            players: self.players,
            initial_radius: self.initial_radius,
            seed: self.seed,
            dt: self.dt,
            max_time: self.max_time,
            times: self.times.clone(),
            final_snapshot: self.final_snapshot,
        }
    }

    fn frenzy_config(&self) -> Result<FrenzyConfig> {
        let base = match &self.config {
            Some(path) => FrenzyConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FrenzyConfig::default(),
        };
        let patch = ConfigOverride {
            spawn_interval: self.spawn_interval,
            units_per_spawn: self.spawn_count,
            starting_units: self.starting_units,
            unit_speed: self.speed,
            capture_radius: self.capture_radius,
            ..ConfigOverride::default()
        };
        Ok(base.merged(&patch))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let scenario = cli.scenario();
    let config = cli.frenzy_config()?;

    if let Some(dir) = cli.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    tracing::info!(
        width = scenario.width,
        height = scenario.height,
        players = scenario.players,
        seed = scenario.seed,
        dt = scenario.dt,
        max_time = scenario.max_time,
        spawn_interval = config.spawn_interval,
        units_per_spawn = config.units_per_spawn,
        unit_speed = config.unit_speed,
        capture_radius = config.capture_radius,
        "Starting frenzy run"
    );

    let players = scenario.player_ids();
    let summary = run(&scenario, config, |time, map, _| {
        let path = image_path(&cli.out, time);
        save_ownership(map, &players, &path)?;
        Ok(Some(path))
    })?;

    let summary_path = with_suffix(&cli.out, "_summary.json");
    let file = File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    tracing::info!(
        ticks = summary.ticks,
        wall_time_ms = format!("{:.1}", summary.wall_time_ms),
        "Run finished"
    );

    for sample in &summary.samples {
        if let Some(path) = &sample.image {
            println!("{}", path.display());
        }
    }
    println!("{}", summary_path.display());
    Ok(())
}

/// `<prefix>_<t>s.png`
fn image_path(prefix: &Path, time: f32) -> PathBuf {
    with_suffix(prefix, &format!("_{time}s.png"))
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
