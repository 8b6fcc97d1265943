//! Error types for the state registry, command application, and codec.

use std::error::Error;
use std::fmt;
use std::io;

use tandem_core::{ArithmeticError, EntityId, FrameId, PlayerId};

/// Errors from direct registry calls on [`GameState`](crate::GameState).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateError {
    /// The entity is not live in this state.
    UnknownEntity {
        /// The missing entity.
        id: EntityId,
    },
    /// The player is not registered.
    UnknownPlayer {
        /// The missing player.
        id: PlayerId,
    },
    /// A player with this id is already registered.
    DuplicatePlayer {
        /// The conflicting player.
        id: PlayerId,
    },
    /// A player refers to an entity id this state never allocated.
    DanglingEntityRef {
        /// The player carrying the reference.
        player: PlayerId,
        /// The never-allocated entity id.
        entity: EntityId,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEntity { id } => write!(f, "unknown entity {id}"),
            Self::UnknownPlayer { id } => write!(f, "unknown player {id}"),
            Self::DuplicatePlayer { id } => write!(f, "player {id} already registered"),
            Self::DanglingEntityRef { player, entity } => {
                write!(f, "player {player} refers to never-allocated entity {entity}")
            }
        }
    }
}

impl Error for StateError {}

/// A command that cannot be applied to the current state.
///
/// The state is left untouched when application fails. Callers log and
/// drop the command; they never retry it against a later frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// The command targets a different frame than the state is on.
    FrameMismatch {
        /// Frame stamped on the command.
        command: FrameId,
        /// Frame the state is processing.
        state: FrameId,
    },
    /// The issuing player is not registered.
    UnknownPlayer {
        /// The issuing player.
        player: PlayerId,
    },
    /// `Join` from a player that is already connected.
    PlayerAlreadyJoined {
        /// The issuing player.
        player: PlayerId,
    },
    /// The issuing player has no live controlled entity.
    NoControlledEntity {
        /// The issuing player.
        player: PlayerId,
    },
    /// The targeted entity does not exist.
    UnknownTarget {
        /// The missing target.
        target: EntityId,
    },
    /// The acting or targeted entity is inactive.
    InactiveEntity {
        /// The inactive entity.
        entity: EntityId,
    },
    /// The action's arguments are out of range for the current state.
    InvalidAction {
        /// What was wrong.
        reason: String,
    },
    /// Fixed-point arithmetic failed while applying the action.
    Arithmetic(ArithmeticError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameMismatch { command, state } => {
                write!(f, "command for frame {command} applied at frame {state}")
            }
            Self::UnknownPlayer { player } => write!(f, "unknown player {player}"),
            Self::PlayerAlreadyJoined { player } => {
                write!(f, "player {player} already joined")
            }
            Self::NoControlledEntity { player } => {
                write!(f, "player {player} controls no live entity")
            }
            Self::UnknownTarget { target } => write!(f, "unknown target entity {target}"),
            Self::InactiveEntity { entity } => write!(f, "entity {entity} is inactive"),
            Self::InvalidAction { reason } => write!(f, "invalid action: {reason}"),
            Self::Arithmetic(e) => write!(f, "arithmetic error: {e}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arithmetic(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArithmeticError> for CommandError {
    fn from(e: ArithmeticError) -> Self {
        Self::Arithmetic(e)
    }
}

/// Errors from the binary state/command codec.
///
/// Decoding fails fast: a partially decoded state is never returned.
#[derive(Debug)]
pub enum CodecError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The buffer does not start with the expected magic bytes.
    InvalidMagic {
        /// The magic that was expected.
        expected: [u8; 4],
    },
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the data.
        found: u8,
    },
    /// Structurally invalid data (bad UTF-8, unsorted ids, trailing bytes).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A tagged value carries an unknown tag.
    UnknownTag {
        /// What kind of value was being decoded.
        kind: &'static str,
        /// The unrecognised tag.
        tag: u8,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic { expected } => write!(
                f,
                "invalid magic bytes (expected b\"{}\")",
                String::from_utf8_lossy(expected)
            ),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed data: {detail}"),
            Self::UnknownTag { kind, tag } => write!(f, "unknown {kind} tag {tag}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
