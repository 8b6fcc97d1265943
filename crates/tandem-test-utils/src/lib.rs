//! Test fixtures and multi-peer harnesses for Tandem development.
//!
//! Provides prebuilt worlds and seeded input scripts ([`fixtures`]) and a
//! [`SessionMesh`] that runs several [`LockstepSession`]s in one thread
//! over an in-process [`ChannelTransport`] mesh.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::BTreeMap;

use tandem_core::{FrameId, PlayerId};
use tandem_engine::{ChannelTransport, LockstepSession, SessionConfig, SessionError};
use tandem_state::{Action, Checksum, GameState};

pub use fixtures::{arena, joined, ScriptedInput, FIXTURE_SEED};

/// Transport queue depth used by [`SessionMesh`].
pub const MESH_CAPACITY: usize = 1024;

/// A set of peers that tick in ascending player order.
pub struct SessionMesh {
    sessions: BTreeMap<PlayerId, LockstepSession<ChannelTransport>>,
}

impl SessionMesh {
    /// Peers for `players` starting from an empty world.
    pub fn new(seed: u64, players: &[PlayerId]) -> Result<Self, SessionError> {
        Self::with_world(&GameState::new(seed), players, |_| {})
    }

    /// Peers starting from copies of `world`, with per-peer config tweaks.
    pub fn with_world(
        world: &GameState,
        players: &[PlayerId],
        configure: impl Fn(&mut SessionConfig),
    ) -> Result<Self, SessionError> {
        let mut mesh = ChannelTransport::mesh(players, MESH_CAPACITY);
        let mut sessions = BTreeMap::new();
        for &p in players {
            let Some(transport) = mesh.remove(&p) else {
                continue;
            };
            let mut config = SessionConfig::new(world.seed(), p, players.to_vec());
            configure(&mut config);
            sessions.insert(
                p,
                LockstepSession::with_state(config, transport, world.clone())?,
            );
        }
        Ok(Self { sessions })
    }

    pub fn session(&self, player: PlayerId) -> Option<&LockstepSession<ChannelTransport>> {
        self.sessions.get(&player)
    }

    pub fn session_mut(
        &mut self,
        player: PlayerId,
    ) -> Option<&mut LockstepSession<ChannelTransport>> {
        self.sessions.get_mut(&player)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &LockstepSession<ChannelTransport>> {
        self.sessions.values()
    }

    /// Queue `action` on `player`'s peer.
    pub fn submit(&mut self, player: PlayerId, action: Action) -> Option<FrameId> {
        self.sessions.get_mut(&player).map(|s| s.submit(action))
    }

    /// Tick every peer once. Returns how many advanced a frame.
    pub fn tick_all(&mut self) -> Result<usize, SessionError> {
        let mut advanced = 0;
        for session in self.sessions.values_mut() {
            if session.tick()?.is_some() {
                advanced += 1;
            }
        }
        Ok(advanced)
    }

    /// Tick until every peer reaches `frame` or `max_rounds` pass.
    ///
    /// Returns whether every peer got there.
    pub fn run_until(&mut self, frame: FrameId, max_rounds: usize) -> Result<bool, SessionError> {
        for _ in 0..max_rounds {
            if self.min_frame() >= frame {
                return Ok(true);
            }
            self.tick_all()?;
        }
        Ok(self.min_frame() >= frame)
    }

    /// The lowest frame across peers.
    pub fn min_frame(&self) -> FrameId {
        self.sessions
            .values()
            .map(|s| s.frame())
            .min()
            .unwrap_or_default()
    }

    /// Current frame and checksum per peer.
    pub fn checksums(&self) -> BTreeMap<PlayerId, (FrameId, Checksum)> {
        self.sessions
            .iter()
            .map(|(&p, s)| (p, (s.frame(), s.state().calculate_checksum())))
            .collect()
    }

    /// Whether every peer recorded the same checksum for `frame`.
    pub fn agree_at(&self, frame: FrameId) -> bool {
        let mut recorded = self
            .sessions
            .values()
            .map(|s| s.recorder().checksum_at(frame));
        match recorded.next() {
            Some(Some(first)) => recorded.all(|c| c == Some(first)),
            Some(None) => false,
            None => true,
        }
    }

    /// Whether every peer is on the same frame with the same checksum.
    pub fn converged(&self) -> bool {
        let mut values = self.checksums().into_values();
        match values.next() {
            Some(first) => values.all(|v| v == first),
            None => true,
        }
    }
}
