//! Checksum exchange and desync detection.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use tandem_core::{FrameId, PlayerId};
use tandem_state::{Checksum, GameState};

/// A state fingerprint as exchanged between peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateChecksum {
    /// Frame the fingerprinted state is on.
    pub frame: FrameId,
    /// The fingerprint.
    pub checksum: Checksum,
}

impl StateChecksum {
    /// Fingerprint `state` at its current frame.
    pub fn capture(state: &GameState) -> Self {
        Self {
            frame: state.frame(),
            checksum: state.calculate_checksum(),
        }
    }
}

impl fmt::Display for StateChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.checksum, self.frame)
    }
}

/// A peer reported a different checksum for a frame than was computed
/// locally.
///
/// Recoverable: the session rolls back to an agreed snapshot and replays,
/// or requests a snapshot from the peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DesyncDetected {
    /// The disputed frame.
    pub frame: FrameId,
    /// Locally computed checksum.
    pub local: Checksum,
    /// Checksum the peer reported.
    pub remote: Checksum,
    /// The peer that reported it.
    pub peer: PlayerId,
}

impl fmt::Display for DesyncDetected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "desync at frame {}: local={}, peer {} reported {}",
            self.frame, self.local, self.peer, self.remote
        )
    }
}

impl Error for DesyncDetected {}

/// Pairs local and remote checksums by frame.
///
/// Whichever side arrives second triggers the comparison. Remote checksums
/// for frames not yet simulated locally wait until the local one is
/// recorded.
#[derive(Clone, Debug, Default)]
pub struct ChecksumLedger {
    local: BTreeMap<FrameId, Checksum>,
    remote: BTreeMap<FrameId, BTreeMap<PlayerId, Checksum>>,
    last_agreed: Option<FrameId>,
}

impl ChecksumLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a locally computed checksum and compare it against any peer
    /// reports already waiting for that frame.
    pub fn record_local(&mut self, sum: StateChecksum) -> Result<(), DesyncDetected> {
        self.local.insert(sum.frame, sum.checksum);
        let Some(peers) = self.remote.get(&sum.frame) else {
            return Ok(());
        };
        for (&peer, &remote) in peers {
            if remote != sum.checksum {
                return Err(DesyncDetected {
                    frame: sum.frame,
                    local: sum.checksum,
                    remote,
                    peer,
                });
            }
        }
        self.agree(sum.frame);
        Ok(())
    }

    /// Record a checksum reported by `peer`.
    pub fn record_remote(&mut self, peer: PlayerId, sum: StateChecksum) -> Result<(), DesyncDetected> {
        self.remote
            .entry(sum.frame)
            .or_default()
            .insert(peer, sum.checksum);
        let Some(&local) = self.local.get(&sum.frame) else {
            return Ok(());
        };
        if local != sum.checksum {
            return Err(DesyncDetected {
                frame: sum.frame,
                local,
                remote: sum.checksum,
                peer,
            });
        }
        self.agree(sum.frame);
        Ok(())
    }

    fn agree(&mut self, frame: FrameId) {
        if self.last_agreed.map_or(true, |f| f < frame) {
            self.last_agreed = Some(frame);
        }
    }

    /// Latest frame at which some peer confirmed the local checksum.
    pub fn last_agreed(&self) -> Option<FrameId> {
        self.last_agreed
    }

    /// The local checksum recorded for `frame`.
    pub fn local_at(&self, frame: FrameId) -> Option<Checksum> {
        self.local.get(&frame).copied()
    }

    /// The checksum `peer` reported for `frame`.
    pub fn remote_at(&self, peer: PlayerId, frame: FrameId) -> Option<Checksum> {
        self.remote.get(&frame)?.get(&peer).copied()
    }

    /// Forget local checksums after `frame`. Used after a rollback, since
    /// the rolled-back frames will be recomputed.
    pub fn rewind(&mut self, frame: FrameId) {
        self.local.split_off(&frame.next());
        if self.last_agreed.is_some_and(|f| f > frame) {
            self.last_agreed = Some(frame);
        }
    }

    /// Forget everything about frames before `frame`.
    pub fn prune_before(&mut self, frame: FrameId) {
        self.local = self.local.split_off(&frame);
        self.remote = self.remote.split_off(&frame);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.local.clear();
        self.remote.clear();
        self.last_agreed = None;
    }
}
