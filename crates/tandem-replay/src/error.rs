//! Error types for recording, replay logs, and replay verification.

use std::fmt;
use std::io;

use tandem_core::FrameId;
use tandem_state::{Checksum, CodecError};

/// Errors that can occur during replay recording, playback, or comparison.
#[derive(Debug)]
pub enum ReplayError {
    /// The log could not be encoded or decoded.
    Codec(CodecError),
    /// The log was recorded with a different session configuration.
    ConfigMismatch {
        /// Hash from the log header.
        recorded: u64,
        /// Hash computed from the current configuration.
        current: u64,
    },
    /// A replayed frame produced a different checksum than was recorded.
    ChecksumMismatch {
        /// The frame the checksum describes.
        frame: FrameId,
        /// Checksum from the recording.
        recorded: Checksum,
        /// Checksum computed during replay.
        replayed: Checksum,
    },
    /// Log frames are not contiguous with the replayed state.
    FrameOutOfOrder {
        /// Frame the replayed state is on.
        expected: FrameId,
        /// Frame found in the log.
        found: FrameId,
    },
    /// No checksum was recorded for a frame being exported.
    MissingChecksum {
        /// The frame lacking a checksum.
        frame: FrameId,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "replay codec error: {e}"),
            Self::ConfigMismatch { recorded, current } => write!(
                f,
                "config hash mismatch: recorded={recorded:#018x}, current={current:#018x}"
            ),
            Self::ChecksumMismatch {
                frame,
                recorded,
                replayed,
            } => write!(
                f,
                "checksum mismatch at frame {frame}: recorded={recorded}, replayed={replayed}"
            ),
            Self::FrameOutOfOrder { expected, found } => {
                write!(f, "log frame {found} does not follow state frame {expected}")
            }
            Self::MissingChecksum { frame } => {
                write!(f, "no checksum recorded for frame {frame}")
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for ReplayError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        Self::Codec(CodecError::Io(e))
    }
}
