//! Replay logs exported from a live session verify against a fresh
//! simulation, and tampering is caught.

use tandem_core::{FrameId, PlayerId};
use tandem_engine::FrameStepper;
use tandem_replay::{replay_and_compare, ReplayError, ReplayReader};
use tandem_state::{Action, GameState};
use tandem_test_utils::{arena, ScriptedInput, SessionMesh, FIXTURE_SEED};

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

fn played_mesh() -> SessionMesh {
    let mut mesh = SessionMesh::with_world(&arena(FIXTURE_SEED), &[P1, P2], |_| {}).unwrap();
    mesh.submit(P1, Action::Join { name: "one".into() });
    mesh.submit(P2, Action::Join { name: "two".into() });
    let mut s1 = ScriptedInput::new(7, P1);
    let mut s2 = ScriptedInput::new(7, P2);
    while mesh.min_frame() < FrameId(50) {
        if let Some(a) = s1.next_action() {
            mesh.submit(P1, a);
        }
        if let Some(a) = s2.next_action() {
            mesh.submit(P2, a);
        }
        mesh.tick_all().unwrap();
    }
    mesh
}

fn verify(bytes: &[u8], config_hash: u64, mesh: &SessionMesh) -> Result<Option<FrameId>, ReplayError> {
    let config = mesh.session(P1).unwrap().config();
    let reader = ReplayReader::open_checked(bytes, config_hash)?;
    let mut state = GameState::from_snapshot(&reader.header().initial);
    let mut stepper = FrameStepper::new(config.physics, config.collision.clone()).unwrap();
    let report = replay_and_compare(reader, &mut |_, commands| {
        Ok(stepper.advance(&mut state, &commands).checksum)
    })?;
    Ok(report.map(|r| r.frame))
}

#[test]
fn both_peers_export_verifiable_logs() {
    let mesh = played_mesh();
    for p in [P1, P2] {
        let session = mesh.session(p).unwrap();
        let bytes = session.write_replay(Vec::new()).unwrap();
        assert_eq!(verify(&bytes, session.config_hash(), &mesh).unwrap(), None);
    }
}

#[test]
fn foreign_config_is_refused() {
    let mesh = played_mesh();
    let session = mesh.session(P1).unwrap();
    let bytes = session.write_replay(Vec::new()).unwrap();
    let err = verify(&bytes, session.config_hash() ^ 1, &mesh).unwrap_err();
    assert!(matches!(err, ReplayError::ConfigMismatch { .. }));
}

#[test]
fn tampered_log_reports_divergence() {
    let mesh = played_mesh();
    let session = mesh.session(P1).unwrap();
    let mut bytes = session.write_replay(Vec::new()).unwrap();
    // the last four bytes are the final frame's checksum
    let n = bytes.len();
    bytes[n - 1] ^= 0xFF;
    let diverged = verify(&bytes, session.config_hash(), &mesh).unwrap();
    assert_eq!(diverged, Some(session.frame()));
}
