//! Entity types for Frenzy mode.
//!
//! - [`UnitId`] / [`Unit`]: mobile combatants, owned exclusively by the
//!   [`Registry`](crate::registry::Registry)
//! - [`StructureId`] / [`Structure`]: stationary spawners, one core per player
//!   plus optional factories and ports
//!
//! Structures never hold references to units. They keep a live count that the
//! registry maintains for cap enforcement, and each unit remembers which
//! structure spawned it.
//!
//! # Example
//!
//! ```
//! use frenzy_core::entity::{UnitId, StructureId};
//!
//! let a = UnitId::new(1);
//! let b = UnitId::new(2);
//! assert!(a < b);
//! assert_eq!(StructureId::new(7).as_u64(), 7);
//! ```

pub mod structure;
pub mod unit;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use structure::{Structure, StructureKind};
pub use unit::{Unit, UnitStats};

/// Unique identifier of a unit.
///
/// Assigned from a monotonically increasing counter and never reused within a
/// game, so id order is spawn order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u64);

impl UnitId {
    /// Creates a new `UnitId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a structure.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructureId(u64);

impl StructureId {
    /// Creates a new `StructureId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructureId({})", self.0)
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
