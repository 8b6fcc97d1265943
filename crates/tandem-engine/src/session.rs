//! Lockstep peer session.
//!
//! [`LockstepSession`] drives one peer of a lockstep match. Each
//! [`tick()`](LockstepSession::tick) drains the transport into a bounded
//! inbound buffer, schedules pending local input `input_delay` frames
//! ahead, and advances the simulation once every player in the roster
//! has delivered its batch for the current frame. A batch may be empty;
//! what matters is that it arrived.
//!
//! Outgoing messages go through an outbox. A message a peer's transport
//! refuses as full stays queued, unchanged and in order, until a later
//! tick delivers it; a local batch is recorded exactly once.
//!
//! # Desync recovery
//!
//! Checksums are broadcast every `checksum_interval` frames. On a
//! mismatch the session restores the latest retained snapshot that both
//! sides are known to share, replays the recorded input on top of it, and
//! re-broadcasts the recomputed checksums. If the mismatch survives the
//! replay, the higher player id asks the lower one for a snapshot and
//! resyncs from it; the lower id keeps its state. The request names the
//! earliest frame the requester can still replay from, and the lower id
//! answers with its current state once it has reached that frame.
//!
//! # Ownership model
//!
//! The session owns its state, recorder, and transport. Every mutating
//! method takes `&mut self`; nothing runs in the background.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::Write;
use std::time::Instant;

use tandem_core::{FrameId, PlayerId};
use tandem_replay::{InputRecorder, ReplayHeader, ReplayWriter};
use tandem_state::{Action, Command, GameState, GameStateData};
use tracing::{debug, error, info, trace, warn};

use crate::checksum::{ChecksumLedger, DesyncDetected, StateChecksum};
use crate::config::{ConfigError, SessionConfig};
use crate::error::SessionError;
use crate::metrics::SessionMetrics;
use crate::ring::RingBuffer;
use crate::step::{FrameReport, FrameStepper};
use crate::transport::{ChannelTransport, PeerMessage, Transport, TransportError};

// Compile-time assertion: an in-process session can move to another thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LockstepSession<ChannelTransport>>();
    }
};

// ── LockstepSession ────────────────────────────────────────────────

/// One peer of a lockstep session.
///
/// # Example
///
/// ```ignore
/// let mut mesh = ChannelTransport::mesh(&players, 256);
/// let transport = mesh.remove(&me).unwrap();
/// let mut session = LockstepSession::new(SessionConfig::new(seed, me, players), transport)?;
/// session.submit(Action::Join { name: "ada".into() });
/// loop {
///     if let Some(report) = session.tick()? {
///         render(session.state(), &report);
///     }
/// }
/// ```
pub struct LockstepSession<T: Transport> {
    config: SessionConfig,
    config_hash: u64,
    /// Latest frame whose state is known to be shared without a checksum
    /// exchange: the initial state or an accepted resync snapshot.
    trusted: FrameId,
    state: GameState,
    stepper: FrameStepper,
    recorder: InputRecorder,
    /// Which players delivered a batch for each pending frame.
    batches: BTreeMap<FrameId, BTreeSet<PlayerId>>,
    ledger: ChecksumLedger,
    snapshots: VecDeque<GameStateData>,
    inbound: RingBuffer<PeerMessage>,
    /// A message received while the inbound buffer was full.
    stalled: Option<PeerMessage>,
    /// Messages not yet accepted by the addressed peer, oldest first.
    outbox: VecDeque<(PlayerId, PeerMessage)>,
    /// Peers waiting for a resync snapshot, with the earliest frame each
    /// can replay from.
    snapshot_requests: BTreeMap<PlayerId, FrameId>,
    pending_local: Vec<Action>,
    next_local_frame: FrameId,
    awaiting_snapshot: Option<PlayerId>,
    last_desync: Option<DesyncDetected>,
    metrics: SessionMetrics,
    transport: T,
}

impl<T: Transport> LockstepSession<T> {
    /// Start a session from an empty world seeded with `config.seed`.
    pub fn new(config: SessionConfig, transport: T) -> Result<Self, SessionError> {
        let state = GameState::new(config.seed);
        Self::with_state(config, transport, state)
    }

    /// Start a session from a prepared world, e.g. a level with platforms.
    ///
    /// Every peer must start from an identical `state`. The empty batches
    /// covering the input delay are broadcast immediately.
    pub fn with_state(
        config: SessionConfig,
        transport: T,
        state: GameState,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if state.seed() != config.seed {
            return Err(ConfigError::SeedMismatch {
                config: config.seed,
                state: state.seed(),
            }
            .into());
        }
        let stepper = FrameStepper::new(config.physics, config.collision.clone())?;
        let start = state.frame();
        let mut snapshots = VecDeque::with_capacity(config.max_snapshots);
        snapshots.push_back(state.create_snapshot());

        let mut session = Self {
            config_hash: config.config_hash(),
            trusted: start,
            inbound: RingBuffer::new(config.inbound_capacity),
            next_local_frame: start,
            state,
            stepper,
            recorder: InputRecorder::new(),
            batches: BTreeMap::new(),
            ledger: ChecksumLedger::new(),
            snapshots,
            stalled: None,
            outbox: VecDeque::new(),
            snapshot_requests: BTreeMap::new(),
            pending_local: Vec::new(),
            awaiting_snapshot: None,
            last_desync: None,
            metrics: SessionMetrics::default(),
            transport,
            config,
        };
        for _ in 0..session.config.input_delay {
            session.schedule_local_batch(Vec::new());
        }
        session.flush_outbox()?;
        info!(
            player = %session.config.local_player,
            players = session.config.players.len(),
            frame = %start,
            config_hash = session.config_hash,
            "lockstep session started"
        );
        Ok(session)
    }

    // ── Input ──────────────────────────────────────────────────────

    /// Queue a local action.
    ///
    /// Returns the frame it is scheduled for: the next local batch, which
    /// is sent once the simulation is within `input_delay` frames of it.
    pub fn submit(&mut self, action: Action) -> FrameId {
        trace!(action = action.name(), frame = %self.next_local_frame, "local action queued");
        self.pending_local.push(action);
        self.next_local_frame
    }

    // ── Tick ───────────────────────────────────────────────────────

    /// Exchange messages and advance at most one frame.
    ///
    /// Returns `None` while some player's batch for the current frame is
    /// still missing. A full peer queue is not an error; the messages
    /// wait in the outbox.
    pub fn tick(&mut self) -> Result<Option<FrameReport>, SessionError> {
        self.poll()?;
        if self.next_local_frame <= self.state.frame().offset(self.config.input_delay) {
            let actions = std::mem::take(&mut self.pending_local);
            self.schedule_local_batch(actions);
        }
        let report = if self.is_ready() {
            Some(self.advance()?)
        } else {
            None
        };
        self.serve_snapshot_requests();
        self.flush_outbox()?;
        Ok(report)
    }

    /// Whether every player's batch for the current frame has arrived.
    pub fn is_ready(&self) -> bool {
        self.batches
            .get(&self.state.frame())
            .is_some_and(|got| self.config.players.iter().all(|p| got.contains(p)))
    }

    /// Record the next local batch and queue it for every remote player.
    fn schedule_local_batch(&mut self, actions: Vec<Action>) {
        let frame = self.next_local_frame;
        let from = self.config.local_player;
        let commands: Vec<Command> = actions
            .into_iter()
            .map(|a| Command::new(frame, from, a))
            .collect();
        self.accept_batch(from, frame, commands.clone());
        self.queue_broadcast(PeerMessage::Commands {
            from,
            frame,
            commands,
        });
        self.next_local_frame = frame.next();
    }

    fn queue_broadcast(&mut self, msg: PeerMessage) {
        for peer in self.config.remote_players() {
            self.outbox.push_back((peer, msg.clone()));
        }
    }

    /// Hand queued messages to the transport, oldest first.
    ///
    /// Once a peer reports a full queue, the rest of its messages stay
    /// queued so they keep their order; other peers are still served.
    fn flush_outbox(&mut self) -> Result<(), SessionError> {
        let mut full = BTreeSet::new();
        let mut kept = VecDeque::new();
        while let Some((to, msg)) = self.outbox.pop_front() {
            if full.contains(&to) {
                kept.push_back((to, msg));
                continue;
            }
            match self.transport.send(to, msg.clone()) {
                Ok(()) => {}
                Err(TransportError::PeerFull { .. }) => {
                    full.insert(to);
                    kept.push_back((to, msg));
                }
                Err(e) => {
                    kept.push_back((to, msg));
                    kept.append(&mut self.outbox);
                    self.outbox = kept;
                    return Err(e.into());
                }
            }
        }
        if !kept.is_empty() {
            self.metrics.outbound_deferred += kept.len() as u64;
            debug!(peers = full.len(), queued = kept.len(), "peer queue full, sends deferred");
        }
        self.outbox = kept;
        Ok(())
    }

    /// Record a batch unless it is stale or a duplicate.
    fn accept_batch(&mut self, from: PlayerId, frame: FrameId, commands: Vec<Command>) -> bool {
        if frame < self.state.frame() {
            return false;
        }
        if !self.batches.entry(frame).or_default().insert(from) {
            return false;
        }
        self.recorder.record_all(commands);
        true
    }

    fn poll(&mut self) -> Result<(), SessionError> {
        if self.config.players.len() > 1 {
            loop {
                let msg = match self.stalled.take() {
                    Some(msg) => msg,
                    None => match self.transport.try_recv()? {
                        Some(msg) => msg,
                        None => break,
                    },
                };
                if let Err(e) = self.inbound.push(msg) {
                    self.metrics.inbound_overflows += 1;
                    warn!(capacity = e.capacity, "inbound buffer full, deferring transport reads");
                    self.stalled = Some(e.into_inner());
                    break;
                }
            }
        }
        while let Some(msg) = self.inbound.pop() {
            self.handle(msg)?;
        }
        Ok(())
    }

    fn handle(&mut self, msg: PeerMessage) -> Result<(), SessionError> {
        let from = msg.sender();
        if from == self.config.local_player || !self.config.players.contains(&from) {
            self.drop_message(from, "sender is not a remote player");
            return Ok(());
        }
        match msg {
            PeerMessage::Commands {
                from,
                frame,
                commands,
            } => {
                if commands.iter().any(|c| c.player != from || c.frame != frame) {
                    self.drop_message(from, "batch envelope mismatch");
                } else if !self.accept_batch(from, frame, commands) {
                    self.drop_message(from, "stale or duplicate batch");
                }
            }
            PeerMessage::Checksum { from, sum } => {
                if let Err(desync) = self.ledger.record_remote(from, sum) {
                    self.recover(desync)?;
                }
            }
            PeerMessage::SnapshotRequest {
                from,
                history_start,
            } => {
                debug!(peer = %from, %history_start, "snapshot requested");
                self.snapshot_requests.insert(from, history_start);
            }
            PeerMessage::Snapshot { from, data } => {
                if self.awaiting_snapshot != Some(from) {
                    self.drop_message(from, "unsolicited snapshot");
                } else if data.validate().is_err() {
                    self.drop_message(from, "snapshot with dangling references");
                } else {
                    self.resync(data)?;
                }
            }
        }
        Ok(())
    }

    fn drop_message(&mut self, from: PlayerId, reason: &'static str) {
        self.metrics.messages_dropped += 1;
        debug!(peer = %from, reason, "peer message dropped");
    }

    fn advance(&mut self) -> Result<FrameReport, SessionError> {
        let commands = self.recorder.commands_for(self.state.frame());
        let started = Instant::now();
        let report = self.stepper.advance(&mut self.state, &commands);
        self.metrics.last_step_us = started.elapsed().as_micros() as u64;
        self.metrics.frames_advanced += 1;
        self.metrics.commands_applied += report.applied as u64;
        self.metrics.commands_rejected += report.rejected.len() as u64;
        self.recorder.record_checksum(report.frame, report.checksum);

        if report.frame.0 % self.config.snapshot_interval == 0 {
            self.take_snapshot();
        }
        if report.frame.0 % self.config.checksum_interval == 0 {
            let sum = StateChecksum {
                frame: report.frame,
                checksum: report.checksum,
            };
            self.queue_broadcast(PeerMessage::Checksum {
                from: self.config.local_player,
                sum,
            });
            if let Err(desync) = self.ledger.record_local(sum) {
                self.recover(desync)?;
            }
        }
        Ok(report)
    }

    // ── Snapshots ──────────────────────────────────────────────────

    fn take_snapshot(&mut self) {
        self.snapshots.push_back(self.state.create_snapshot());
        while self.snapshots.len() > self.config.max_snapshots {
            self.snapshots.pop_front();
        }
        if let Some(floor) = self.snapshots.front().map(|s| s.frame) {
            self.recorder.discard_before(floor);
            self.ledger.prune_before(floor);
            self.batches = self.batches.split_off(&floor);
        }
    }

    /// Earliest frame that can still be replayed.
    pub fn history_start(&self) -> FrameId {
        self.snapshots
            .front()
            .map_or(self.state.frame(), |s| s.frame)
    }

    /// Latest frame both sides are known to agree on.
    fn agreed_frame(&self) -> FrameId {
        self.ledger
            .last_agreed()
            .map_or(self.trusted, |f| f.max(self.trusted))
    }

    /// The newest retained snapshot before `before` that predates any
    /// possible divergence.
    fn rollback_point(&self, before: FrameId) -> Option<&GameStateData> {
        let agreed = self.agreed_frame();
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.frame < before && s.frame <= agreed)
    }

    // ── Recovery ───────────────────────────────────────────────────

    fn recover(&mut self, desync: DesyncDetected) -> Result<(), SessionError> {
        self.metrics.desyncs_detected += 1;
        self.last_desync = Some(desync);
        error!(
            frame = %desync.frame,
            local = %desync.local,
            remote = %desync.remote,
            peer = %desync.peer,
            "desync detected"
        );
        if self.awaiting_snapshot.is_some() {
            return Ok(());
        }
        let Some(base) = self.rollback_point(desync.frame).cloned() else {
            self.escalate(desync);
            return Ok(());
        };

        let current = self.state.frame();
        self.snapshots.retain(|s| s.frame <= base.frame);
        self.recorder.invalidate_checksums_after(base.frame);
        self.ledger.rewind(base.frame);
        let mismatches = self.replay(&base, current)?;
        self.metrics.rollbacks += 1;
        info!(
            restored = %base.frame,
            replayed = current.0 - base.frame.0,
            "rolled back and replayed"
        );
        if let Some(persisting) = mismatches.into_iter().find(|d| d.peer == desync.peer) {
            self.escalate(persisting);
        }
        Ok(())
    }

    /// A replay did not remove the divergence: the higher id resyncs.
    fn escalate(&mut self, desync: DesyncDetected) {
        if self.config.local_player < desync.peer {
            warn!(peer = %desync.peer, "desync persists, peer is expected to resync from us");
            return;
        }
        warn!(peer = %desync.peer, frame = %desync.frame, "requesting snapshot");
        self.request_snapshot(desync.peer);
    }

    fn request_snapshot(&mut self, peer: PlayerId) {
        let history_start = self.history_start();
        self.outbox.push_back((
            peer,
            PeerMessage::SnapshotRequest {
                from: self.config.local_player,
                history_start,
            },
        ));
        self.awaiting_snapshot = Some(peer);
        self.metrics.snapshots_requested += 1;
    }

    /// Answer the snapshot requests the current state can satisfy.
    ///
    /// A request whose history starts past the current frame waits until
    /// this peer gets there.
    fn serve_snapshot_requests(&mut self) {
        let frame = self.state.frame();
        let ready: Vec<PlayerId> = self
            .snapshot_requests
            .iter()
            .filter(|&(_, &start)| start <= frame)
            .map(|(&peer, _)| peer)
            .collect();
        if ready.is_empty() {
            return;
        }
        let data = self.state.create_snapshot();
        for peer in ready {
            self.snapshot_requests.remove(&peer);
            info!(peer = %peer, frame = %frame, "sending snapshot");
            self.outbox.push_back((
                peer,
                PeerMessage::Snapshot {
                    from: self.config.local_player,
                    data: data.clone(),
                },
            ));
            self.metrics.snapshots_sent += 1;
        }
    }

    fn resync(&mut self, data: GameStateData) -> Result<(), SessionError> {
        let Some(peer) = self.awaiting_snapshot.take() else {
            return Ok(());
        };
        let history_start = self.history_start();
        if data.frame < history_start {
            warn!(
                peer = %peer,
                frame = %data.frame,
                %history_start,
                "snapshot predates retained input, requesting again"
            );
            self.request_snapshot(peer);
            return Ok(());
        }
        let current = self.state.frame().max(data.frame);
        self.trusted = data.frame;
        self.snapshots.clear();
        self.snapshots.push_back(data.clone());
        self.recorder.invalidate_checksums_after(data.frame);
        self.ledger.rewind(data.frame);

        let mismatches = self.replay(&data, current)?;
        if !mismatches.is_empty() {
            debug!(count = mismatches.len(), "stale peer checksums after resync");
        }
        self.recorder.discard_before(data.frame);
        self.ledger.prune_before(data.frame);
        self.batches = self.batches.split_off(&data.frame);
        self.next_local_frame = self.next_local_frame.max(self.state.frame());
        self.metrics.resyncs += 1;
        info!(
            frame = %data.frame,
            replayed = current.0 - data.frame.0,
            "resynced from peer snapshot"
        );
        Ok(())
    }

    /// Re-drive the state from `base` to `until` with recorded input,
    /// then record and re-broadcast the recomputed checksums.
    fn replay(
        &mut self,
        base: &GameStateData,
        until: FrameId,
    ) -> Result<Vec<DesyncDetected>, SessionError> {
        let mut computed = Vec::new();
        let stepper = &mut self.stepper;
        let state = self.recorder.replay_from(base, until, &mut |state, commands| {
            let report = stepper.advance(state, commands);
            computed.push(StateChecksum {
                frame: report.frame,
                checksum: report.checksum,
            });
            Ok(report.checksum)
        })?;
        self.state = state;
        self.metrics.frames_replayed += computed.len() as u64;

        let mut mismatches = Vec::new();
        for sum in computed {
            self.recorder.record_checksum(sum.frame, sum.checksum);
            if sum.frame.0 % self.config.checksum_interval == 0 {
                self.queue_broadcast(PeerMessage::Checksum {
                    from: self.config.local_player,
                    sum,
                });
                if let Err(desync) = self.ledger.record_local(sum) {
                    mismatches.push(desync);
                }
            }
        }
        Ok(mismatches)
    }

    // ── Replay export ──────────────────────────────────────────────

    /// Write the retained history as a replay log.
    ///
    /// The log starts at the oldest retained snapshot and ends at the
    /// current frame. Returns the sink after flushing.
    pub fn write_replay<W: Write>(&self, sink: W) -> Result<W, SessionError> {
        let initial = match self.snapshots.front() {
            Some(s) => s.clone(),
            None => self.state.create_snapshot(),
        };
        let header = ReplayHeader {
            config_hash: self.config_hash,
            initial,
        };
        let from = header.start_frame();
        let mut writer = ReplayWriter::new(sink, &header)?;
        self.recorder.export(&mut writer, from, self.state.frame())?;
        writer.flush()?;
        debug!(from = %from, to = %self.state.frame(), "replay exported");
        Ok(writer.into_inner())
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The simulation state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access to the simulation state.
    ///
    /// Changes made here bypass command application and desynchronize
    /// this peer. Intended for tooling and fault injection.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// The current frame.
    pub fn frame(&self) -> FrameId {
        self.state.frame()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fingerprint of the simulation-relevant configuration.
    pub fn config_hash(&self) -> u64 {
        self.config_hash
    }

    /// Counters since the session started.
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Recorded input and checksums.
    pub fn recorder(&self) -> &InputRecorder {
        &self.recorder
    }

    /// Local and remote checksums awaiting comparison.
    pub fn ledger(&self) -> &ChecksumLedger {
        &self.ledger
    }

    /// The most recent desync, if any was seen.
    pub fn last_desync(&self) -> Option<DesyncDetected> {
        self.last_desync
    }

    /// Whether a resync snapshot has been requested and not yet received.
    pub fn is_awaiting_snapshot(&self) -> bool {
        self.awaiting_snapshot.is_some()
    }

    /// Number of retained rollback snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Messages received but not yet processed.
    pub fn inbound_len(&self) -> usize {
        self.inbound.len() + usize::from(self.stalled.is_some())
    }

    /// Messages queued for peers whose transport has not accepted them.
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_replay::{replay_and_compare, ReplayReader};

    fn solo_config() -> SessionConfig {
        SessionConfig::new(99, PlayerId(1), vec![PlayerId(1)])
    }

    fn solo(config: SessionConfig) -> LockstepSession<ChannelTransport> {
        let transport = ChannelTransport::mesh(&[PlayerId(1)], 8)
            .remove(&PlayerId(1))
            .unwrap();
        LockstepSession::new(config, transport).unwrap()
    }

    #[test]
    fn solo_session_advances_every_tick() {
        let mut s = solo(solo_config());
        for expected in 1..=5 {
            let report = s.tick().unwrap().expect("solo peer is always ready");
            assert_eq!(report.frame, FrameId(expected));
        }
        assert_eq!(s.metrics().frames_advanced, 5);
    }

    #[test]
    fn local_input_is_delayed() {
        let mut s = solo(solo_config());
        let scheduled = s.submit(Action::Join {
            name: "solo".into(),
        });
        assert_eq!(scheduled, FrameId(2));

        s.tick().unwrap();
        s.tick().unwrap();
        assert!(s.state().controlled_entity(PlayerId(1)).is_none());
        s.tick().unwrap();
        assert_eq!(s.frame(), FrameId(3));
        assert!(s.state().controlled_entity(PlayerId(1)).is_some());
        assert_eq!(s.metrics().commands_applied, 1);
    }

    #[test]
    fn seed_mismatch_is_rejected() {
        let transport = ChannelTransport::mesh(&[PlayerId(1)], 8)
            .remove(&PlayerId(1))
            .unwrap();
        let err = LockstepSession::with_state(solo_config(), transport, GameState::new(7))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            SessionError::Config(ConfigError::SeedMismatch { config: 99, state: 7 })
        ));
    }

    #[test]
    fn snapshots_are_bounded_and_prune_history() {
        let mut config = solo_config();
        config.snapshot_interval = 2;
        config.max_snapshots = 3;
        let mut s = solo(config);
        for _ in 0..20 {
            s.tick().unwrap();
        }
        assert_eq!(s.snapshot_count(), 3);
        assert_eq!(s.history_start(), FrameId(16));
        assert!(s.recorder().first_frame().unwrap() >= FrameId(16));
    }

    #[test]
    fn waits_for_remote_batches() {
        let players = [PlayerId(1), PlayerId(2)];
        let mut mesh = ChannelTransport::mesh(&players, 64);
        let t1 = mesh.remove(&PlayerId(1)).unwrap();
        let mut s = LockstepSession::new(SessionConfig::new(5, PlayerId(1), players.to_vec()), t1)
            .unwrap();
        assert!(s.tick().unwrap().is_none());
        assert!(!s.is_ready());
        assert_eq!(s.frame(), FrameId(0));
    }

    #[test]
    fn foreign_and_unsolicited_messages_are_dropped() {
        let mut mesh = ChannelTransport::mesh(&[PlayerId(1), PlayerId(2), PlayerId(3)], 64);
        let t1 = mesh.remove(&PlayerId(1)).unwrap();
        let mut t2 = mesh.remove(&PlayerId(2)).unwrap();
        let mut t3 = mesh.remove(&PlayerId(3)).unwrap();
        let config = SessionConfig::new(5, PlayerId(1), vec![PlayerId(1), PlayerId(2)]);
        let mut s = LockstepSession::new(config, t1).unwrap();

        t3.send(PlayerId(1), PeerMessage::Commands {
            from: PlayerId(3),
            frame: FrameId(0),
            commands: Vec::new(),
        })
        .unwrap();
        t2.send(PlayerId(1), PeerMessage::Snapshot {
            from: PlayerId(2),
            data: GameState::new(5).create_snapshot(),
        })
        .unwrap();
        t2.send(PlayerId(1), PeerMessage::Commands {
            from: PlayerId(2),
            frame: FrameId(0),
            commands: Vec::new(),
        })
        .unwrap();
        t2.send(PlayerId(1), PeerMessage::Commands {
            from: PlayerId(2),
            frame: FrameId(0),
            commands: Vec::new(),
        })
        .unwrap();

        let report = s.tick().unwrap();
        assert_eq!(report.map(|r| r.frame), Some(FrameId(1)));
        // player 3 is outside the roster, the snapshot was never requested,
        // and the second frame-0 batch is a duplicate
        assert_eq!(s.metrics().messages_dropped, 3);
        assert!(!s.is_awaiting_snapshot());
    }

    #[test]
    fn snapshot_request_waits_for_requested_history() {
        let players = [PlayerId(1), PlayerId(2)];
        let mut mesh = ChannelTransport::mesh(&players, 64);
        let t1 = mesh.remove(&PlayerId(1)).unwrap();
        let mut t2 = mesh.remove(&PlayerId(2)).unwrap();
        let mut s = LockstepSession::new(SessionConfig::new(5, PlayerId(1), players.to_vec()), t1)
            .unwrap();

        t2.send(PlayerId(1), PeerMessage::SnapshotRequest {
            from: PlayerId(2),
            history_start: FrameId(3),
        })
        .unwrap();
        for f in 0..6 {
            t2.send(PlayerId(1), PeerMessage::Commands {
                from: PlayerId(2),
                frame: FrameId(f),
                commands: Vec::new(),
            })
            .unwrap();
        }

        let mut sent = Vec::new();
        for _ in 0..6 {
            s.tick().unwrap();
            while let Some(msg) = t2.try_recv().unwrap() {
                if let PeerMessage::Snapshot { data, .. } = msg {
                    sent.push((s.frame(), data.frame));
                }
            }
        }
        assert_eq!(sent, vec![(FrameId(3), FrameId(3))]);
        assert_eq!(s.metrics().snapshots_sent, 1);
    }

    #[test]
    fn exported_replay_verifies() {
        let mut s = solo(solo_config());
        s.submit(Action::Join { name: "a".into() });
        for _ in 0..12 {
            s.tick().unwrap();
        }
        let bytes = s.write_replay(Vec::new()).unwrap();

        let reader = ReplayReader::open_checked(bytes.as_slice(), s.config_hash()).unwrap();
        let mut state = GameState::from_snapshot(&reader.header().initial);
        let mut stepper = FrameStepper::new(
            s.config().physics,
            s.config().collision.clone(),
        )
        .unwrap();
        let divergence = replay_and_compare(reader, &mut |_, commands| {
            Ok(stepper.advance(&mut state, &commands).checksum)
        })
        .unwrap();
        assert_eq!(divergence, None);
    }
}
