//! Inbound buffer overflow.
//!
//! A peer with a tiny inbound buffer falls behind a busy peer. Overflowing
//! messages stay queued in the transport instead of being dropped, so the
//! slow peer catches up without losing a batch.

use tandem_core::{FrameId, PlayerId};
use tandem_test_utils::{SessionMesh, FIXTURE_SEED};
use tandem_state::GameState;

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

#[test]
fn overflow_defers_reads_without_loss() {
    let mut mesh = SessionMesh::with_world(&GameState::new(FIXTURE_SEED), &[P1, P2], |c| {
        if c.local_player == P1 {
            c.inbound_capacity = 2;
        }
    })
    .unwrap();

    for _ in 0..3 {
        mesh.session_mut(P2).unwrap().tick().unwrap();
    }
    let p1 = mesh.session_mut(P1).unwrap();
    p1.tick().unwrap();
    assert!(p1.metrics().inbound_overflows >= 1);
    assert!(p1.transport().pending() > 0);

    assert!(mesh.run_until(FrameId(40), 400).unwrap());
    let p1 = mesh.session(P1).unwrap();
    assert_eq!(p1.metrics().messages_dropped, 0);
    assert_eq!(p1.metrics().desyncs_detected, 0);
    assert!(mesh.agree_at(FrameId(40)));
}

#[test]
fn stalled_message_is_delivered_first() {
    let mut mesh = SessionMesh::with_world(&GameState::new(FIXTURE_SEED), &[P1, P2], |c| {
        if c.local_player == P1 {
            c.inbound_capacity = 1;
        }
    })
    .unwrap();
    mesh.session_mut(P2).unwrap().tick().unwrap();

    // capacity 1: every tick handles one message and defers the next
    let p1 = mesh.session_mut(P1).unwrap();
    let mut frames = Vec::new();
    for _ in 0..6 {
        p1.tick().unwrap();
        frames.push(p1.frame());
    }
    assert!(p1.metrics().inbound_overflows >= 1);
    assert!(frames.windows(2).all(|w| w[0] <= w[1]));
    assert!(p1.frame() >= FrameId(2));
    assert_eq!(p1.metrics().messages_dropped, 0);
}
