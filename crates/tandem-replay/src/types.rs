//! Data types for replay recording and playback.

use tandem_core::FrameId;
use tandem_state::{Checksum, Command, GameStateData};

/// Replay header: everything needed to rebuild the starting state.
///
/// Collision bodies are not part of the initial state. They are rebuilt
/// from entity kinds when the replay is loaded.
///
/// # Examples
///
/// ```
/// use tandem_replay::ReplayHeader;
/// use tandem_state::GameState;
///
/// let header = ReplayHeader {
///     config_hash: 0xDEAD_BEEF,
///     initial: GameState::new(42).create_snapshot(),
/// };
/// assert_eq!(header.seed(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayHeader {
    /// Hash of the session configuration the log was recorded under.
    pub config_hash: u64,
    /// State before the first recorded frame.
    pub initial: GameStateData,
}

impl ReplayHeader {
    /// Session seed of the initial state.
    pub fn seed(&self) -> u64 {
        self.initial.seed
    }

    /// Frame of the initial state.
    pub fn start_frame(&self) -> FrameId {
        self.initial.frame
    }
}

/// One recorded simulation step.
///
/// `commands` are the canonical commands applied at `frame`, and
/// `checksum` describes the state at `frame + 1` that they produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame the commands were applied at.
    pub frame: FrameId,
    /// Commands in canonical order.
    pub commands: Vec<Command>,
    /// Checksum of the resulting state.
    pub checksum: Checksum,
}

impl Frame {
    /// Frame the checksum belongs to.
    pub fn result_frame(&self) -> FrameId {
        self.frame.next()
    }
}
