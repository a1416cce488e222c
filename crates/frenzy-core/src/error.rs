//! Error types for the Frenzy simulation.
//!
//! The tick pipeline itself never fails: unknown players and degenerate
//! geometry are skipped or resolved by fallbacks. Errors only surface from
//! explicit management calls that a caller can misuse.

use std::path::PathBuf;

use thiserror::Error;

use crate::territory::PlayerId;

/// Result type alias using [`FrenzyError`].
pub type Result<T> = std::result::Result<T, FrenzyError>;

/// Errors returned by Frenzy management operations.
#[derive(Debug, Error)]
pub enum FrenzyError {
    /// Configuration JSON could not be parsed.
    #[error("Failed to parse frenzy configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("Failed to read frenzy configuration '{path}': {source}")]
    ConfigIo {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A player already has a core structure.
    #[error("Player {0} already has a core structure")]
    DuplicateCore(PlayerId),

    /// A spawner was requested for a player without a core structure.
    #[error("Player {0} has no core structure")]
    UnknownPlayer(PlayerId),
}
