//! Criterion micro-benchmarks for checksums, snapshots, and the state codec.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tandem_bench::{crowded_world, join_all};
use tandem_state::GameState;

/// Benchmark: checksum a world of ~1K entities.
fn bench_checksum_1k(c: &mut Criterion) {
    let mut state = crowded_world(11, 40, 1_000);
    join_all(&mut state, 8);

    c.bench_function("checksum_1k", |b| {
        b.iter(|| black_box(state.calculate_checksum()));
    });
}

/// Benchmark: snapshot and restore a world of ~1K entities.
fn bench_snapshot_restore_1k(c: &mut Criterion) {
    let mut state = crowded_world(12, 40, 1_000);
    join_all(&mut state, 8);
    let mut scratch = GameState::new(0);

    c.bench_function("snapshot_restore_1k", |b| {
        b.iter(|| {
            let snap = state.create_snapshot();
            scratch.restore_snapshot(&snap);
            black_box(scratch.entity_count())
        });
    });
}

/// Benchmark: serialize then deserialize a world of ~1K entities.
fn bench_codec_1k(c: &mut Criterion) {
    let mut state = crowded_world(13, 40, 1_000);
    join_all(&mut state, 8);

    c.bench_function("serialize_1k", |b| {
        b.iter(|| black_box(state.serialize().unwrap().len()));
    });

    let bytes = state.serialize().unwrap();
    c.bench_function("deserialize_1k", |b| {
        b.iter(|| black_box(GameState::deserialize(&bytes).unwrap().entity_count()));
    });
}

criterion_group!(
    benches,
    bench_checksum_1k,
    bench_snapshot_restore_1k,
    bench_codec_1k
);
criterion_main!(benches);
