//! Criterion benchmarks for whole-frame simulation and rollback replay.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tandem_bench::{crowded_world, join_all};
use tandem_core::{FrameId, PlayerId};
use tandem_engine::{
    ChannelTransport, CollisionConfig, FrameStepper, LockstepSession, PhysicsConfig,
    SessionConfig,
};
use tandem_replay::InputRecorder;
use tandem_state::{Action, Command};

/// Benchmark: advance a 300-body world by one frame.
fn bench_step_300(c: &mut Criterion) {
    let mut base = crowded_world(21, 20, 300);
    join_all(&mut base, 4);
    let mut stepper = FrameStepper::new(PhysicsConfig::default(), CollisionConfig::default()).unwrap();

    c.bench_function("step_300", |b| {
        let mut state = base.clone();
        b.iter(|| {
            let report = stepper.advance(&mut state, &[]);
            black_box(report.checksum)
        });
    });
}

/// Benchmark: replay 60 recorded frames from a snapshot.
fn bench_replay_60(c: &mut Criterion) {
    let mut live = crowded_world(22, 20, 200);
    join_all(&mut live, 4);
    let mut stepper = FrameStepper::new(PhysicsConfig::default(), CollisionConfig::default()).unwrap();
    let initial = live.create_snapshot();
    let mut recorder = InputRecorder::new();
    for f in 0..60u64 {
        let frame = live.frame();
        if f % 5 == 0 {
            recorder.record(Command::new(frame, PlayerId(1), Action::Idle));
        }
        let report = stepper.advance(&mut live, &recorder.commands_for(frame));
        recorder.record_checksum(report.frame, report.checksum);
    }
    let until = live.frame();

    c.bench_function("replay_60", |b| {
        b.iter(|| {
            let state = recorder
                .replay_from(&initial, until, &mut |s, cmds| {
                    Ok(stepper.advance(s, cmds).checksum)
                })
                .unwrap();
            black_box(state.frame())
        });
    });
}

/// Benchmark: a solo session tick, including scheduling and bookkeeping.
fn bench_session_tick(c: &mut Criterion) {
    let transport = ChannelTransport::mesh(&[PlayerId(1)], 16)
        .remove(&PlayerId(1))
        .unwrap();
    let world = crowded_world(23, 20, 200);
    let config = SessionConfig::new(world.seed(), PlayerId(1), vec![PlayerId(1)]);
    let mut session = LockstepSession::with_state(config, transport, world).unwrap();
    session.submit(Action::Join {
        name: "bench".into(),
    });

    c.bench_function("session_tick_200", |b| {
        b.iter(|| {
            let report = session.tick().unwrap();
            black_box(report.map_or(FrameId(0), |r| r.frame))
        });
    });
}

criterion_group!(benches, bench_step_300, bench_replay_60, bench_session_tick);
criterion_main!(benches);
