//! State comparison and replay verification.
//!
//! Checksum comparison is the fast path. When two full states are at hand,
//! [`compare_states`] reports exactly which records and fields differ.

use std::collections::BTreeMap;
use std::io::Read;

use tandem_core::{EntityId, FrameId, PlayerId};
use tandem_state::{Checksum, Command, Entity, GameStateData, Player};
use tracing::warn;

use crate::error::ReplayError;
use crate::reader::ReplayReader;

/// Which side of a comparison a record is missing from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The recorded state.
    Recorded,
    /// The replayed state.
    Replayed,
}

/// A single difference between two states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateDivergence {
    /// The states are on different frames.
    Frame {
        /// Recorded frame.
        recorded: FrameId,
        /// Replayed frame.
        replayed: FrameId,
    },
    /// The states were created with different seeds.
    Seed {
        /// Recorded seed.
        recorded: u64,
        /// Replayed seed.
        replayed: u64,
    },
    /// An entity exists on only one side.
    MissingEntity {
        /// The entity.
        id: EntityId,
        /// The side it is absent from.
        missing_from: Side,
    },
    /// An entity exists on both sides but a field differs.
    EntityField {
        /// The entity.
        id: EntityId,
        /// Name of the differing field.
        field: &'static str,
    },
    /// A player exists on only one side.
    MissingPlayer {
        /// The player.
        id: PlayerId,
        /// The side it is absent from.
        missing_from: Side,
    },
    /// A player exists on both sides but a field differs.
    PlayerField {
        /// The player.
        id: PlayerId,
        /// Name of the differing field.
        field: &'static str,
    },
}

/// The first frame at which a replay disagreed with its recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivergenceReport {
    /// Frame of the state whose checksum disagreed.
    pub frame: FrameId,
    /// Checksum from the recording.
    pub recorded: Checksum,
    /// Checksum from the replay.
    pub replayed: Checksum,
}

/// Field-level diff of two states, in id order.
///
/// Collision bodies are not compared; they are derived data.
pub fn compare_states(recorded: &GameStateData, replayed: &GameStateData) -> Vec<StateDivergence> {
    let mut out = Vec::new();
    if recorded.frame != replayed.frame {
        out.push(StateDivergence::Frame {
            recorded: recorded.frame,
            replayed: replayed.frame,
        });
    }
    if recorded.seed != replayed.seed {
        out.push(StateDivergence::Seed {
            recorded: recorded.seed,
            replayed: replayed.seed,
        });
    }

    for (id, pair) in pair_up(&recorded.entities, &replayed.entities, |e| e.id) {
        match pair {
            (Some(a), Some(b)) => {
                for field in entity_fields(a, b) {
                    out.push(StateDivergence::EntityField { id, field });
                }
            }
            (Some(_), None) => out.push(StateDivergence::MissingEntity {
                id,
                missing_from: Side::Replayed,
            }),
            (None, Some(_)) => out.push(StateDivergence::MissingEntity {
                id,
                missing_from: Side::Recorded,
            }),
            (None, None) => {}
        }
    }

    for (id, pair) in pair_up(&recorded.players, &replayed.players, |p| p.id) {
        match pair {
            (Some(a), Some(b)) => {
                for field in player_fields(a, b) {
                    out.push(StateDivergence::PlayerField { id, field });
                }
            }
            (Some(_), None) => out.push(StateDivergence::MissingPlayer {
                id,
                missing_from: Side::Replayed,
            }),
            (None, Some(_)) => out.push(StateDivergence::MissingPlayer {
                id,
                missing_from: Side::Recorded,
            }),
            (None, None) => {}
        }
    }
    out
}

type Pair<'a, T> = (Option<&'a T>, Option<&'a T>);

fn pair_up<'a, T, K: Ord>(
    left: &'a [T],
    right: &'a [T],
    key: impl Fn(&T) -> K,
) -> BTreeMap<K, Pair<'a, T>> {
    let mut map: BTreeMap<K, Pair<'a, T>> = BTreeMap::new();
    for l in left {
        map.entry(key(l)).or_default().0 = Some(l);
    }
    for r in right {
        map.entry(key(r)).or_default().1 = Some(r);
    }
    map
}

fn entity_fields(a: &Entity, b: &Entity) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if a.kind != b.kind {
        fields.push("kind");
    }
    if a.position != b.position {
        fields.push("position");
    }
    if a.velocity != b.velocity {
        fields.push("velocity");
    }
    if a.health != b.health {
        fields.push("health");
    }
    if a.active != b.active {
        fields.push("active");
    }
    if a.payload != b.payload {
        fields.push("payload");
    }
    fields
}

fn player_fields(a: &Player, b: &Player) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if a.entity != b.entity {
        fields.push("entity");
    }
    if a.name != b.name {
        fields.push("name");
    }
    if a.score != b.score {
        fields.push("score");
    }
    if a.connected != b.connected {
        fields.push("connected");
    }
    fields
}

/// Replay a log through a caller-provided step function and compare
/// checksums at every frame.
///
/// `step_fn` receives a frame number and that frame's commands, advances
/// the caller's simulation by one frame, and returns the checksum of the
/// resulting state.
///
/// Returns `Ok(None)` if every frame matches, or the first divergence.
pub fn replay_and_compare<R: Read>(
    mut reader: ReplayReader<R>,
    step_fn: &mut dyn FnMut(FrameId, Vec<Command>) -> Result<Checksum, ReplayError>,
) -> Result<Option<DivergenceReport>, ReplayError> {
    let mut expected = reader.header().start_frame();
    while let Some(frame) = reader.next_frame()? {
        if frame.frame != expected {
            return Err(ReplayError::FrameOutOfOrder {
                expected,
                found: frame.frame,
            });
        }
        let at = frame.result_frame();
        let replayed = step_fn(frame.frame, frame.commands)?;
        if replayed != frame.checksum {
            warn!(frame = %at, recorded = %frame.checksum, %replayed, "replay diverged");
            return Ok(Some(DivergenceReport {
                frame: at,
                recorded: frame.checksum,
                replayed,
            }));
        }
        expected = at;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Frame, ReplayHeader};
    use crate::writer::ReplayWriter;
    use tandem_core::Vec2;
    use tandem_state::{EntityDef, EntityKind, GameState};

    fn world() -> GameState {
        let mut s = GameState::new(3);
        s.add_entity(EntityDef::new(EntityKind::Ship).moving(Vec2::from_ints(1, 0)));
        s.add_entity(EntityDef::new(EntityKind::Pickup));
        s.add_player(Player::new(PlayerId(1), "a").with_entity(EntityId(1)))
            .unwrap();
        s
    }

    fn drift(state: &mut GameState) -> Checksum {
        for e in state.entities_mut() {
            e.position += e.velocity;
        }
        state.next_frame();
        state.calculate_checksum()
    }

    fn log(frames: u64) -> Vec<u8> {
        let mut live = world();
        let header = ReplayHeader {
            config_hash: 0,
            initial: live.create_snapshot(),
        };
        let mut w = ReplayWriter::new(Vec::new(), &header).unwrap();
        for f in 0..frames {
            let sum = drift(&mut live);
            w.write_frame(FrameId(f), &[], sum).unwrap();
        }
        w.into_inner()
    }

    #[test]
    fn identical_states_have_no_divergence() {
        let s = world().create_snapshot();
        assert!(compare_states(&s, &s).is_empty());
    }

    #[test]
    fn reports_field_and_record_differences() {
        let a = world();
        let mut b = world();
        b.entity_mut(EntityId(1)).unwrap().health = 5;
        b.remove_entity(EntityId(2));
        b.player_mut(PlayerId(1)).unwrap().score = 9;
        b.add_player(Player::new(PlayerId(4), "late")).unwrap();
        b.set_frame(FrameId(2));

        let diff = compare_states(&a.create_snapshot(), &b.create_snapshot());
        assert_eq!(
            diff,
            vec![
                StateDivergence::Frame {
                    recorded: FrameId(0),
                    replayed: FrameId(2)
                },
                StateDivergence::EntityField {
                    id: EntityId(1),
                    field: "health"
                },
                StateDivergence::MissingEntity {
                    id: EntityId(2),
                    missing_from: Side::Replayed
                },
                StateDivergence::PlayerField {
                    id: PlayerId(1),
                    field: "score"
                },
                StateDivergence::MissingPlayer {
                    id: PlayerId(4),
                    missing_from: Side::Recorded
                },
            ]
        );
    }

    #[test]
    fn faithful_replay_matches() {
        let buf = log(10);
        let reader = ReplayReader::open(buf.as_slice()).unwrap();
        let mut state = GameState::from_snapshot(&reader.header().initial);
        let result = replay_and_compare(reader, &mut |_, _| Ok(drift(&mut state))).unwrap();
        assert_eq!(result, None);
        assert_eq!(state.frame(), FrameId(10));
    }

    #[test]
    fn perturbed_replay_reports_first_divergence() {
        let buf = log(10);
        let reader = ReplayReader::open(buf.as_slice()).unwrap();
        let mut state = GameState::from_snapshot(&reader.header().initial);
        let report = replay_and_compare(reader, &mut |frame, _| {
            if frame == FrameId(4) {
                state.entity_mut(EntityId(2)).unwrap().health -= 1;
            }
            Ok(drift(&mut state))
        })
        .unwrap()
        .unwrap();
        assert_eq!(report.frame, FrameId(5));
        assert_ne!(report.recorded, report.replayed);
    }

    #[test]
    fn gap_in_log_is_rejected() {
        let header = ReplayHeader {
            config_hash: 0,
            initial: world().create_snapshot(),
        };
        let mut buf = Vec::new();
        crate::codec::encode_header(&mut buf, &header).unwrap();
        for f in [0u64, 2] {
            crate::codec::encode_frame(
                &mut buf,
                &Frame {
                    frame: FrameId(f),
                    commands: vec![],
                    checksum: Checksum(0),
                },
            )
            .unwrap();
        }
        let reader = ReplayReader::open(buf.as_slice()).unwrap();
        let mut state = world();
        let err = replay_and_compare(reader, &mut |_, _| {
            state.next_frame();
            Ok(Checksum(0))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ReplayError::FrameOutOfOrder {
                expected: FrameId(1),
                found: FrameId(2)
            }
        ));
    }
}
