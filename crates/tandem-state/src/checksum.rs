//! The 32-bit state fingerprint exchanged between peers.
//!
//! The fold is a compatibility contract: peers running different builds
//! compare these values directly, so the field order and the arithmetic
//! must never change.
//!
//! ```text
//! sum = frame as u32
//! for entity in entities sorted by id:
//!     sum += id, pos.x, pos.y, vel.x, vel.y, health
//! for player in players sorted by id:
//!     sum += id, score, entity id (0 if none)
//! ```
//!
//! Every addition wraps at 32 bits; fixed-point components contribute
//! their raw two's-complement bits.

use std::fmt;

use tandem_core::FrameId;

use crate::entity::Entity;
use crate::player::Player;

/// A state fingerprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum(pub u32);

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for Checksum {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Compute the checksum of a frame's registries.
///
/// Both slices are sorted by id internally; callers may pass them in any
/// order.
pub fn compute<'a>(
    frame: FrameId,
    entities: impl IntoIterator<Item = &'a Entity>,
    players: impl IntoIterator<Item = &'a Player>,
) -> Checksum {
    let mut entities: Vec<&Entity> = entities.into_iter().collect();
    entities.sort_unstable_by_key(|e| e.id);
    let mut players: Vec<&Player> = players.into_iter().collect();
    players.sort_unstable_by_key(|p| p.id);

    let mut sum = frame.0 as u32;
    for e in entities {
        for v in [
            e.id.0,
            e.position.x.raw() as u32,
            e.position.y.raw() as u32,
            e.velocity.x.raw() as u32,
            e.velocity.y.raw() as u32,
            e.health as u32,
        ] {
            sum = sum.wrapping_add(v);
        }
    }
    for p in players {
        for v in [p.id.0, p.score as u32, p.entity_raw()] {
            sum = sum.wrapping_add(v);
        }
    }
    Checksum(sum)
}
