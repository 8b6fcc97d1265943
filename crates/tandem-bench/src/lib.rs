//! Benchmark profiles for the Tandem lockstep core.
//!
//! - [`crowded_world`]: a level with many moving bodies
//! - [`random_bounds`]: deterministic AABB corners for broad-phase benches

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tandem_core::{DeterministicRng, Fixed, PlayerId, Vec2};
use tandem_state::{Action, Command, Entity, EntityDef, EntityKind, EntityPayload, GameState};

/// Side length of the square region bench entities are placed in.
pub const WORLD_SIZE: i32 = 2048;

/// A level with a floor, `platforms` ledges, and `movers` entities split
/// between falling avatars, drifting ships, and pickups.
///
/// Placement is derived from `seed`, so two calls with the same arguments
/// build identical worlds.
pub fn crowded_world(seed: u64, platforms: usize, movers: usize) -> GameState {
    let mut rng = DeterministicRng::with_stream(seed, 1);
    let mut s = GameState::new(seed);
    s.add_entity(EntityDef::platform(
        Vec2::from_ints(0, WORLD_SIZE - 32),
        Vec2::from_ints(WORLD_SIZE, 32),
    ));
    for _ in 0..platforms {
        let x = rng.next_int_range(0, WORLD_SIZE - 200);
        let y = rng.next_int_range(200, WORLD_SIZE - 100);
        s.add_entity(EntityDef::platform(
            Vec2::from_ints(x, y),
            Vec2::from_ints(rng.next_int_range(64, 200), 16),
        ));
    }
    for i in 0..movers {
        let at = Vec2::from_ints(
            rng.next_int_range(0, WORLD_SIZE),
            rng.next_int_range(0, WORLD_SIZE - 64),
        );
        let def = match i % 3 {
            0 => EntityDef::new(EntityKind::Avatar)
                .with_payload(Entity::avatar_payload()),
            1 => EntityDef::new(EntityKind::Ship).moving(Vec2::new(
                Fixed::from_int(rng.next_int_range(-3, 4)),
                Fixed::from_int(rng.next_int_range(-3, 4)),
            )),
            _ => EntityDef::new(EntityKind::Pickup).with_payload(EntityPayload::Pickup { points: 1 }),
        };
        s.add_entity(def.at(at));
    }
    s
}

/// Join `players` into `state` at its current frame.
pub fn join_all(state: &mut GameState, players: u32) {
    for p in 1..=players {
        let join = Command::new(
            state.frame(),
            PlayerId(p),
            Action::Join {
                name: format!("bench-{p}"),
            },
        );
        // a duplicate join is rejected and harmless here
        let _ = join.apply(state);
    }
}

/// `count` pairs of corners inside the bench region, for building AABBs.
pub fn random_bounds(seed: u64, count: usize, max_extent: i32) -> Vec<(Vec2, Vec2)> {
    let mut rng = DeterministicRng::new(seed);
    (0..count)
        .map(|_| {
            let x = rng.next_int_range(0, WORLD_SIZE);
            let y = rng.next_int_range(0, WORLD_SIZE);
            let w = rng.next_int_range(1, max_extent);
            let h = rng.next_int_range(1, max_extent);
            (Vec2::from_ints(x, y), Vec2::from_ints(x + w, y + h))
        })
        .collect()
}
