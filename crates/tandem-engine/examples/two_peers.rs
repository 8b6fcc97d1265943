//! Two lockstep peers on separate threads.
//!
//! Demonstrates:
//!   1. Building an in-process transport mesh
//!   2. Starting one LockstepSession per thread from a shared level
//!   3. Submitting input that lands `input_delay` frames later
//!   4. Comparing final checksums and exporting a replay log
//!
//! Run with:
//!   RUST_LOG=info cargo run --example two_peers

use std::thread;
use std::time::Duration;

use tandem_core::{Fixed, FrameId, PlayerId, Vec2};
use tandem_engine::{ChannelTransport, LockstepSession, SessionConfig, SessionError};
use tandem_state::{Action, EntityDef, EntityKind, EntityPayload, GameState};
use tracing_subscriber::EnvFilter;

const SEED: u64 = 2024;
const FRAMES: u64 = 300;

// ─── Level ──────────────────────────────────────────────────────

fn level() -> GameState {
    let mut s = GameState::new(SEED);
    s.add_entity(EntityDef::platform(
        Vec2::from_ints(0, 400),
        Vec2::from_ints(1200, 40),
    ));
    for i in 0..8 {
        s.add_entity(
            EntityDef::new(EntityKind::Pickup)
                .at(Vec2::from_ints(60 + 140 * i, 370))
                .with_payload(EntityPayload::Pickup { points: 5 }),
        );
    }
    s
}

// ─── Peer loop ──────────────────────────────────────────────────

fn input_for(player: PlayerId, frame: FrameId) -> Option<Action> {
    let dir = if player.0 % 2 == 0 { -2 } else { 2 };
    match frame.0 % 60 {
        0 => Some(Action::Move {
            velocity: Vec2::from_ints(dir, 0),
        }),
        20 => Some(Action::Jump {
            impulse: Fixed::from_int(7),
        }),
        40 => Some(Action::Fire {
            velocity: Vec2::from_ints(dir * 3, 0),
            ttl: 45,
        }),
        _ => None,
    }
}

fn run_peer(
    mut session: LockstepSession<ChannelTransport>,
) -> Result<LockstepSession<ChannelTransport>, SessionError> {
    let me = session.config().local_player;
    session.submit(Action::Join {
        name: format!("peer-{me}"),
    });
    let mut last_input = None;
    while session.frame() < FrameId(FRAMES) {
        let frame = session.frame();
        if last_input != Some(frame) {
            if let Some(action) = input_for(me, frame) {
                session.submit(action);
            }
            last_input = Some(frame);
        }
        if session.tick()?.is_none() {
            thread::sleep(Duration::from_micros(200));
        }
    }
    Ok(session)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let players = vec![PlayerId(1), PlayerId(2)];
    let mut mesh = ChannelTransport::mesh(&players, 1024);
    let world = level();

    let mut handles = Vec::new();
    for &p in &players {
        let transport = mesh.remove(&p).ok_or("missing transport")?;
        let config = SessionConfig::new(SEED, p, players.clone());
        let session = LockstepSession::with_state(config, transport, world.clone())?;
        handles.push(thread::spawn(move || run_peer(session)));
    }

    let mut finished = Vec::new();
    for h in handles {
        let session = h.join().map_err(|_| "peer thread panicked")??;
        finished.push(session);
    }

    println!("=== Tandem two-peer demo ===\n");
    for s in &finished {
        let me = s.config().local_player;
        let score = s.state().player(me).map_or(0, |p| p.score);
        let m = s.metrics();
        println!(
            "peer {me}: frame {} checksum@{FRAMES} {} score {score} (applied {}, rejected {}, desyncs {})",
            s.frame(),
            s.recorder()
                .checksum_at(FrameId(FRAMES))
                .map(|c| c.to_string())
                .unwrap_or_default(),
            m.commands_applied,
            m.commands_rejected,
            m.desyncs_detected,
        );
    }

    let replay = finished[0].write_replay(Vec::new())?;
    println!("\nreplay log: {} bytes from frame {}", replay.len(), finished[0].history_start());
    Ok(())
}
