//! Authoritative simulation state for Tandem lockstep peers.
//!
//! - [`GameState`]: entity, player, and collision body registries for the
//!   current frame, with id allocation, [`Checksum`] computation, and
//!   snapshot/restore via [`GameStateData`].
//! - [`Command`] and [`Action`]: the closed vocabulary of player intents,
//!   applied as a pure transition on [`GameState`].
//! - [`codec`]: the little-endian binary format for states, snapshots, and
//!   command batches.
//! - [`BodyShapes`]: per-kind body templates used to rebuild bodies after a
//!   load, since bodies are never serialized.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checksum;
pub mod codec;
pub mod command;
pub mod entity;
pub mod error;
pub mod player;
pub mod shapes;
pub mod state;

pub use checksum::Checksum;
pub use command::{Action, Command};
pub use entity::{Entity, EntityDef, EntityKind, EntityPayload};
pub use error::{CodecError, CommandError, StateError};
pub use player::Player;
pub use shapes::{BodyShapes, BodyTemplate};
pub use state::{GameState, GameStateData};
