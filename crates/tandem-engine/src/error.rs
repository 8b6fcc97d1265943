//! Errors surfaced by the session API.

use std::error::Error;
use std::fmt;

use tandem_replay::ReplayError;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// A failure that stops a [`LockstepSession`](crate::LockstepSession)
/// operation.
///
/// Desyncs, inbound overflow, and full peer queues are not errors: the session recovers from
/// them itself and counts them in [`SessionMetrics`](crate::SessionMetrics).
#[derive(Debug)]
pub enum SessionError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// The transport failed.
    Transport(TransportError),
    /// Rollback replay or replay export failed.
    Replay(ReplayError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Replay(e) => write!(f, "replay: {e}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Replay(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ReplayError> for SessionError {
    fn from(e: ReplayError) -> Self {
        Self::Replay(e)
    }
}
