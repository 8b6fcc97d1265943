//! Reusable worlds and input scripts.
//!
//! - [`arena()`]: a floor, two ledges, and a row of pickups.
//! - [`joined()`]: an empty world with avatars for the given players.
//! - [`ScriptedInput`]: seeded pseudo-random player input.

use tandem_core::{DeterministicRng, FrameId, Fixed, PlayerId, Vec2};
use tandem_state::{Action, Command, EntityDef, EntityKind, EntityPayload, GameState};

/// Seed used by fixtures that take none.
pub const FIXTURE_SEED: u64 = 0x5EED_7A4D;

/// A small level: floor, two ledges, and five pickups above the floor.
pub fn arena(seed: u64) -> GameState {
    let mut s = GameState::new(seed);
    s.add_entity(EntityDef::platform(
        Vec2::from_ints(0, 400),
        Vec2::from_ints(800, 32),
    ));
    s.add_entity(EntityDef::platform(
        Vec2::from_ints(120, 300),
        Vec2::from_ints(160, 16),
    ));
    s.add_entity(EntityDef::platform(
        Vec2::from_ints(520, 300),
        Vec2::from_ints(160, 16),
    ));
    for i in 0..5 {
        s.add_entity(
            EntityDef::new(EntityKind::Pickup)
                .at(Vec2::from_ints(100 + 150 * i, 360))
                .with_payload(EntityPayload::Pickup { points: 10 }),
        );
    }
    s
}

/// An empty world in which every player in `players` has joined.
pub fn joined(seed: u64, players: &[PlayerId]) -> GameState {
    let mut s = GameState::new(seed);
    for &p in players {
        Command::new(FrameId(0), p, Action::Join { name: format!("p{p}") })
            .apply(&mut s)
            .expect("fresh join is valid");
    }
    s
}

/// Seeded pseudo-random input for one player.
///
/// Two scripts with the same seed and player produce the same sequence.
pub struct ScriptedInput {
    rng: DeterministicRng,
}

impl ScriptedInput {
    pub fn new(seed: u64, player: PlayerId) -> Self {
        Self {
            rng: DeterministicRng::with_stream(seed, u64::from(player.0)),
        }
    }

    /// The next action, or `None` for a frame without input.
    pub fn next_action(&mut self) -> Option<Action> {
        match self.rng.next_int_range(0, 8) {
            0 => Some(Action::Jump {
                impulse: Fixed::from_int(6),
            }),
            1 | 2 => {
                let dx = self.rng.next_int_range(-3, 4);
                Some(Action::Move {
                    velocity: Vec2::from_ints(dx, 0),
                })
            }
            3 => {
                let dx = if self.rng.next_bool() { 4 } else { -4 };
                Some(Action::Fire {
                    velocity: Vec2::from_ints(dx, 0),
                    ttl: 30,
                })
            }
            _ => None,
        }
    }
}
