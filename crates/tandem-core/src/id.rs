//! Strongly-typed identifiers.

use std::fmt;

/// Identifies an entity within a single game state.
///
/// Allocated by the game state from a strictly increasing counter starting
/// at 1. The raw value `0` is never allocated and is used as the "no
/// entity" marker in checksums and on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The first identifier a fresh game state hands out.
    pub const FIRST: Self = Self(1);

    /// The identifier following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a participating player (one per connected peer slot).
///
/// Player ids are assigned by the session host, not by the game state, and
/// define the canonical command application order within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing simulation frame counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The frame following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The frame `n` frames after this one.
    pub fn offset(self, n: u64) -> Self {
        Self(self.0 + n)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
