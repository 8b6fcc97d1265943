//! The boundary between a session and the network.
//!
//! [`Transport`] moves [`PeerMessage`]s between peers. Reliability,
//! retransmission, and sockets belong to implementations; the session only
//! needs per-message delivery. Arrival order across players does not
//! matter since commands are re-ordered canonically on receipt.
//!
//! [`ChannelTransport`] connects in-process peers over bounded
//! `crossbeam_channel` queues.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use tandem_core::{FrameId, PlayerId};
use tandem_state::codec::{
    decode_commands, encode_commands, read_length_prefixed_bytes, read_u32_le, read_u64_le,
    read_u8, write_length_prefixed_bytes, write_u32_le, write_u64_le, write_u8,
};
use tandem_state::{Checksum, CodecError, Command, GameStateData};

use crate::checksum::StateChecksum;

/// A message exchanged between peers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerMessage {
    /// One player's complete input for one frame. May be empty.
    Commands {
        /// The sending player.
        from: PlayerId,
        /// Frame the commands are scheduled for.
        frame: FrameId,
        /// The player's commands for that frame.
        commands: Vec<Command>,
    },
    /// A state fingerprint for desync detection.
    Checksum {
        /// The sending player.
        from: PlayerId,
        /// The fingerprint.
        sum: StateChecksum,
    },
    /// Ask a peer for a resync snapshot.
    SnapshotRequest {
        /// The requesting player.
        from: PlayerId,
        /// Earliest frame the requester still has input for. A snapshot
        /// older than this cannot be replayed forward.
        history_start: FrameId,
    },
    /// A full state for resync, bodies included.
    Snapshot {
        /// The sending player.
        from: PlayerId,
        /// The state.
        data: GameStateData,
    },
}

const TAG_COMMANDS: u8 = 0;
const TAG_CHECKSUM: u8 = 1;
const TAG_SNAPSHOT_REQUEST: u8 = 2;
const TAG_SNAPSHOT: u8 = 3;

impl PeerMessage {
    /// The sending player.
    pub fn sender(&self) -> PlayerId {
        match self {
            Self::Commands { from, .. }
            | Self::Checksum { from, .. }
            | Self::SnapshotRequest { from, .. }
            | Self::Snapshot { from, .. } => *from,
        }
    }

    /// Encode for a byte-oriented transport.
    ///
    /// Fails only if a snapshot does not pass
    /// [`GameStateData::validate`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    fn encode(&self, w: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            Self::Commands {
                from,
                frame,
                commands,
            } => {
                write_u8(w, TAG_COMMANDS)?;
                write_u32_le(w, from.0)?;
                write_u64_le(w, frame.0)?;
                encode_commands(w, commands)?;
            }
            Self::Checksum { from, sum } => {
                write_u8(w, TAG_CHECKSUM)?;
                write_u32_le(w, from.0)?;
                write_u64_le(w, sum.frame.0)?;
                write_u32_le(w, sum.checksum.0)?;
            }
            Self::SnapshotRequest {
                from,
                history_start,
            } => {
                write_u8(w, TAG_SNAPSHOT_REQUEST)?;
                write_u32_le(w, from.0)?;
                write_u64_le(w, history_start.0)?;
            }
            Self::Snapshot { from, data } => {
                write_u8(w, TAG_SNAPSHOT)?;
                write_u32_le(w, from.0)?;
                write_length_prefixed_bytes(w, &data.to_bytes()?)?;
            }
        }
        Ok(())
    }

    /// Decode a message produced by [`to_bytes`](Self::to_bytes).
    ///
    /// The whole slice must be consumed. Command batches must be
    /// consistent with the sender and frame in the envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = bytes;
        let msg = match read_u8(&mut r)? {
            TAG_COMMANDS => {
                let from = PlayerId(read_u32_le(&mut r)?);
                let frame = FrameId(read_u64_le(&mut r)?);
                let commands = decode_commands(&mut r)?;
                if let Some(c) = commands
                    .iter()
                    .find(|c| c.player != from || c.frame != frame)
                {
                    return Err(CodecError::Malformed {
                        detail: format!(
                            "command {c} does not belong to batch of player {from} at frame {frame}"
                        ),
                    });
                }
                Self::Commands {
                    from,
                    frame,
                    commands,
                }
            }
            TAG_CHECKSUM => Self::Checksum {
                from: PlayerId(read_u32_le(&mut r)?),
                sum: StateChecksum {
                    frame: FrameId(read_u64_le(&mut r)?),
                    checksum: Checksum(read_u32_le(&mut r)?),
                },
            },
            TAG_SNAPSHOT_REQUEST => Self::SnapshotRequest {
                from: PlayerId(read_u32_le(&mut r)?),
                history_start: FrameId(read_u64_le(&mut r)?),
            },
            TAG_SNAPSHOT => {
                let from = PlayerId(read_u32_le(&mut r)?);
                let data = GameStateData::from_bytes(&read_length_prefixed_bytes(&mut r)?)?;
                Self::Snapshot { from, data }
            }
            tag => {
                return Err(CodecError::UnknownTag {
                    kind: "peer message",
                    tag,
                })
            }
        };
        if !r.is_empty() {
            return Err(CodecError::Malformed {
                detail: format!("{} trailing bytes after peer message", r.len()),
            });
        }
        Ok(msg)
    }
}

// ── TransportError ─────────────────────────────────────────────────

/// Failures at the transport boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// No route to the peer.
    UnknownPeer {
        /// The addressed player.
        peer: PlayerId,
    },
    /// The peer's inbound queue is full. Retry later.
    PeerFull {
        /// The addressed player.
        peer: PlayerId,
    },
    /// The peer (or every peer, for receive) has gone away.
    Disconnected {
        /// The peer, when known.
        peer: Option<PlayerId>,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeer { peer } => write!(f, "no route to peer {peer}"),
            Self::PeerFull { peer } => write!(f, "inbound queue of peer {peer} is full"),
            Self::Disconnected { peer: Some(peer) } => write!(f, "peer {peer} disconnected"),
            Self::Disconnected { peer: None } => write!(f, "all peers disconnected"),
        }
    }
}

impl Error for TransportError {}

// ── Transport ──────────────────────────────────────────────────────

/// Message delivery between peers.
pub trait Transport {
    /// Send `msg` to one peer.
    fn send(&mut self, to: PlayerId, msg: PeerMessage) -> Result<(), TransportError>;

    /// Every peer this transport can reach, excluding the local one.
    fn peers(&self) -> Vec<PlayerId>;

    /// Send `msg` to every peer.
    fn broadcast(&mut self, msg: PeerMessage) -> Result<(), TransportError> {
        for peer in self.peers() {
            self.send(peer, msg.clone())?;
        }
        Ok(())
    }

    /// The next delivered message, if one is waiting. Never blocks.
    fn try_recv(&mut self) -> Result<Option<PeerMessage>, TransportError>;
}

/// In-process transport over bounded crossbeam channels.
///
/// # Examples
///
/// ```
/// use tandem_core::{FrameId, PlayerId};
/// use tandem_engine::{ChannelTransport, PeerMessage, Transport};
///
/// let mut mesh = ChannelTransport::mesh(&[PlayerId(1), PlayerId(2)], 16);
/// let mut b = mesh.remove(&PlayerId(2)).unwrap();
/// let mut a = mesh.remove(&PlayerId(1)).unwrap();
///
/// let ask = PeerMessage::SnapshotRequest { from: PlayerId(1), history_start: FrameId(0) };
/// a.send(PlayerId(2), ask).unwrap();
/// assert_eq!(b.try_recv().unwrap().unwrap().sender(), PlayerId(1));
/// assert!(b.try_recv().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct ChannelTransport {
    local: PlayerId,
    inbox: crossbeam_channel::Receiver<PeerMessage>,
    routes: BTreeMap<PlayerId, crossbeam_channel::Sender<PeerMessage>>,
}

impl ChannelTransport {
    /// Fully connect `players`, each with an inbox of `capacity` messages.
    pub fn mesh(players: &[PlayerId], capacity: usize) -> BTreeMap<PlayerId, ChannelTransport> {
        let channels: BTreeMap<PlayerId, _> = players
            .iter()
            .map(|&p| (p, crossbeam_channel::bounded::<PeerMessage>(capacity)))
            .collect();
        channels
            .iter()
            .map(|(&local, (_, rx))| {
                let routes = channels
                    .iter()
                    .filter(|&(&p, _)| p != local)
                    .map(|(&p, (tx, _))| (p, tx.clone()))
                    .collect();
                let transport = ChannelTransport {
                    local,
                    inbox: rx.clone(),
                    routes,
                };
                (local, transport)
            })
            .collect()
    }

    /// The player this endpoint belongs to.
    pub fn local(&self) -> PlayerId {
        self.local
    }

    /// Messages waiting in this endpoint's inbox.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, to: PlayerId, msg: PeerMessage) -> Result<(), TransportError> {
        let tx = self
            .routes
            .get(&to)
            .ok_or(TransportError::UnknownPeer { peer: to })?;
        tx.try_send(msg).map_err(|e| match e {
            crossbeam_channel::TrySendError::Full(_) => TransportError::PeerFull { peer: to },
            crossbeam_channel::TrySendError::Disconnected(_) => {
                TransportError::Disconnected { peer: Some(to) }
            }
        })
    }

    fn peers(&self) -> Vec<PlayerId> {
        self.routes.keys().copied().collect()
    }

    fn try_recv(&mut self) -> Result<Option<PeerMessage>, TransportError> {
        match self.inbox.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(crossbeam_channel::TryRecvError::Empty) => Ok(None),
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                Err(TransportError::Disconnected { peer: None })
            }
        }
    }
}
