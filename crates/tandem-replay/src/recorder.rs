//! Per-frame command log used for rollback and replay.

use std::collections::BTreeMap;
use std::io::Write;

use tandem_core::{FrameId, PlayerId};
use tandem_state::{Checksum, Command, GameState, GameStateData};
use tracing::{debug, trace};

use crate::error::ReplayError;
use crate::writer::ReplayWriter;

/// Append-only log of commands keyed by target frame.
///
/// Within a frame, commands are stored in arrival order.
/// [`commands_for`](Self::commands_for) returns them in canonical order
/// (ascending player id, arrival order among one player's commands), so
/// peers that received the same set in different orders apply identical
/// sequences.
///
/// Checksums are keyed by the frame they describe, i.e. the state frame
/// after a step.
///
/// # Examples
///
/// ```
/// use tandem_core::{FrameId, PlayerId};
/// use tandem_replay::InputRecorder;
/// use tandem_state::{Action, Command};
///
/// let mut rec = InputRecorder::new();
/// rec.record(Command::new(FrameId(5), PlayerId(2), Action::Idle));
/// rec.record(Command::new(FrameId(5), PlayerId(1), Action::Idle));
///
/// let players: Vec<PlayerId> = rec.commands_for(FrameId(5)).iter().map(|c| c.player).collect();
/// assert_eq!(players, vec![PlayerId(1), PlayerId(2)]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InputRecorder {
    frames: BTreeMap<FrameId, Vec<Command>>,
    checksums: BTreeMap<FrameId, Checksum>,
}

impl InputRecorder {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command under its target frame.
    pub fn record(&mut self, cmd: Command) {
        trace!(frame = %cmd.frame, player = %cmd.player, action = cmd.action.name(), "record");
        self.frames.entry(cmd.frame).or_default().push(cmd);
    }

    /// Append several commands.
    pub fn record_all(&mut self, cmds: impl IntoIterator<Item = Command>) {
        for cmd in cmds {
            self.record(cmd);
        }
    }

    /// Commands for `frame` in canonical order.
    pub fn commands_for(&self, frame: FrameId) -> Vec<Command> {
        let mut cmds = self.frames.get(&frame).cloned().unwrap_or_default();
        // Stable: one player's commands keep their arrival order.
        cmds.sort_by_key(|c| c.player);
        cmds
    }

    /// Commands for `frame` in arrival order.
    pub fn arrivals_for(&self, frame: FrameId) -> &[Command] {
        self.frames.get(&frame).map_or(&[], Vec::as_slice)
    }

    /// Whether `player` has any command recorded for `frame`.
    pub fn has_input(&self, frame: FrameId, player: PlayerId) -> bool {
        self.arrivals_for(frame).iter().any(|c| c.player == player)
    }

    /// Record the checksum of the state at `frame`.
    pub fn record_checksum(&mut self, frame: FrameId, checksum: Checksum) {
        self.checksums.insert(frame, checksum);
    }

    /// The checksum recorded for `frame`.
    pub fn checksum_at(&self, frame: FrameId) -> Option<Checksum> {
        self.checksums.get(&frame).copied()
    }

    /// Earliest frame with recorded commands.
    pub fn first_frame(&self) -> Option<FrameId> {
        self.frames.keys().next().copied()
    }

    /// Latest frame with recorded commands.
    pub fn last_frame(&self) -> Option<FrameId> {
        self.frames.keys().next_back().copied()
    }

    /// Total number of recorded commands.
    pub fn len(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// Whether no commands are recorded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop checksums for frames after `frame`. Commands are kept: they
    /// are inputs and remain valid across a rollback.
    pub fn invalidate_checksums_after(&mut self, frame: FrameId) {
        self.checksums.split_off(&frame.next());
    }

    /// Drop commands and checksums for frames before `frame`.
    pub fn discard_before(&mut self, frame: FrameId) {
        self.frames = self.frames.split_off(&frame);
        self.checksums = self.checksums.split_off(&frame);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.checksums.clear();
    }

    /// Re-drive a state from `initial` up to frame `until`.
    ///
    /// `step` applies one frame's canonical commands and returns the
    /// checksum of the resulting state. Every recomputed checksum is
    /// compared against the recorded one where present; the first
    /// difference aborts with [`ReplayError::ChecksumMismatch`].
    pub fn replay_from(
        &self,
        initial: &GameStateData,
        until: FrameId,
        step: &mut dyn FnMut(&mut GameState, &[Command]) -> Result<Checksum, ReplayError>,
    ) -> Result<GameState, ReplayError> {
        let mut state = GameState::from_snapshot(initial);
        let start = state.frame();
        while state.frame() < until {
            let cmds = self.commands_for(state.frame());
            let replayed = step(&mut state, &cmds)?;
            if let Some(recorded) = self.checksum_at(state.frame()) {
                if recorded != replayed {
                    return Err(ReplayError::ChecksumMismatch {
                        frame: state.frame(),
                        recorded,
                        replayed,
                    });
                }
            }
        }
        debug!(from = %start, to = %state.frame(), "replayed recorded input");
        Ok(state)
    }

    /// Write frames `from..to` to a replay log.
    ///
    /// Each log frame carries frame `f`'s canonical commands and the
    /// checksum recorded for `f + 1`. Every such checksum must be present.
    pub fn export<W: Write>(
        &self,
        writer: &mut ReplayWriter<W>,
        from: FrameId,
        to: FrameId,
    ) -> Result<(), ReplayError> {
        let mut frame = from;
        while frame < to {
            let checksum = self
                .checksum_at(frame.next())
                .ok_or(ReplayError::MissingChecksum { frame: frame.next() })?;
            writer.write_frame(frame, &self.commands_for(frame), checksum)?;
            frame = frame.next();
        }
        Ok(())
    }
}
