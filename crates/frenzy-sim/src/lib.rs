//! # Frenzy Sim
//!
//! Headless runner for tuning Frenzy parameters. Builds a blank map with one
//! or more starting discs, runs the tick pipeline at a fixed step and records
//! territory and unit counts, with greyscale ownership images at chosen times.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod scenario;
pub mod snapshot;

pub use scenario::{run, Sample, Scenario, Summary};
pub use snapshot::{render_ownership, save_ownership};
