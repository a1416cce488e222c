//! Per-tick pipeline stages.
//!
//! Resolvers are the write phase of a Frenzy tick. The orchestrator runs them
//! in a fixed order, each borrowing the registry (and, where needed, the
//! territory) only for the duration of the call:
//!
//! 1. [`resolve_movement`]: retarget and move every live unit
//! 2. [`resolve_combat`]: nearest-hostile damage
//! 3. [`resolve_capture`]: contiguous territory growth around units
//!
//! # Invariants
//!
//! - Units are visited in id order, so identical inputs give identical results
//! - Dead units (health at or below zero) are skipped by every stage
//! - No stage removes units; the orchestrator purges the dead afterwards
//! - No stage rebuilds the spatial index; they all see unit positions as of
//!   the start of movement

mod capture;
mod combat;
mod movement;

pub use capture::{resolve_capture, CaptureOutcome};
pub use combat::{resolve_combat, CombatOutcome};
pub use movement::{
    cos_similarity, resolve_movement, safe_length, select_target, separation, MovementOutcome,
};
