//! Cross-module tests for the Frenzy tick pipeline.
//!
//! - `determinism.rs`: same seed and inputs give identical state hashes
//! - `integration.rs`: end-to-end scenarios and invariants over many ticks
//! - `helpers.rs`: map and manager setup shared by both

mod helpers;

pub use helpers::*;
