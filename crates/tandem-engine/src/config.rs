//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the input for constructing a
//! [`LockstepSession`](crate::LockstepSession).
//! [`validate()`](SessionConfig::validate) checks structural invariants at
//! startup. Every peer of a session must use configurations with the same
//! [`config_hash()`](SessionConfig::config_hash).

use std::error::Error;
use std::fmt;

use tandem_core::{Fixed, PlayerId, Vec2};
use tandem_replay::hash::Fnv1a;
use tandem_space::SpaceError;
use tandem_state::{BodyShapes, EntityKind};

// ── PhysicsConfig ──────────────────────────────────────────────────

/// Per-frame motion parameters.
///
/// Screen coordinates: positive y points down, so gravity is positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicsConfig {
    /// Velocity added each frame to entities whose kind falls.
    /// Default: (0, 0.5).
    pub gravity: Vec2,
    /// Downward speed cap applied after gravity. Default: 12.
    pub max_fall_speed: Fixed,
    /// Health removed by a projectile hit. Default: 25.
    pub projectile_damage: i32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(Fixed::ZERO, Fixed::HALF),
            max_fall_speed: Fixed::from_int(12),
            projectile_damage: 25,
        }
    }
}

// ── CollisionConfig ────────────────────────────────────────────────

/// Broad-phase grid and body templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionConfig {
    /// Spatial hash cell edge length. Default: 64.
    pub cell_size: Fixed,
    /// Body template per entity kind.
    pub shapes: BodyShapes,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            cell_size: Fixed::from_int(64),
            shapes: BodyShapes::default(),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The player roster is empty.
    NoPlayers,
    /// The local player is not in the roster.
    UnknownLocalPlayer {
        /// The configured local player.
        player: PlayerId,
    },
    /// A player appears twice in the roster.
    DuplicatePlayer {
        /// The repeated player.
        player: PlayerId,
    },
    /// Inbound buffer capacity is zero.
    InboundCapacityZero,
    /// A frame interval is zero.
    ZeroInterval {
        /// Which interval.
        name: &'static str,
    },
    /// `max_snapshots` is zero.
    NoSnapshotSlots,
    /// Maximum fall speed is not positive.
    InvalidFallSpeed {
        /// The rejected value.
        value: Fixed,
    },
    /// An initial state was created with a different seed.
    SeedMismatch {
        /// Seed in the configuration.
        config: u64,
        /// Seed of the supplied state.
        state: u64,
    },
    /// The collision grid cannot be built.
    Space(SpaceError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPlayers => write!(f, "player roster is empty"),
            Self::UnknownLocalPlayer { player } => {
                write!(f, "local player {player} is not in the roster")
            }
            Self::DuplicatePlayer { player } => {
                write!(f, "player {player} appears twice in the roster")
            }
            Self::InboundCapacityZero => write!(f, "inbound_capacity must be at least 1"),
            Self::ZeroInterval { name } => write!(f, "{name} must be at least 1"),
            Self::NoSnapshotSlots => write!(f, "max_snapshots must be at least 1"),
            Self::InvalidFallSpeed { value } => {
                write!(f, "max_fall_speed must be > 0, got {value}")
            }
            Self::SeedMismatch { config, state } => {
                write!(f, "state seed {state} does not match configured seed {config}")
            }
            Self::Space(e) => write!(f, "collision: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for ConfigError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

// ── SessionConfig ──────────────────────────────────────────────────

/// Everything a peer needs to join a lockstep session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// World seed. Determines every RNG-driven outcome.
    pub seed: u64,
    /// The player this peer submits input for.
    pub local_player: PlayerId,
    /// Every participating player, local included.
    pub players: Vec<PlayerId>,
    /// Frames between local input and the frame it is scheduled for.
    /// Default: 2.
    pub input_delay: u64,
    /// Capacity of the inbound command buffer. Default: 64.
    pub inbound_capacity: usize,
    /// Checksums are exchanged every this many frames. Default: 1.
    pub checksum_interval: u64,
    /// A rollback snapshot is kept every this many frames. Default: 10.
    pub snapshot_interval: u64,
    /// Rollback snapshots retained. Default: 8.
    pub max_snapshots: usize,
    /// Motion parameters.
    pub physics: PhysicsConfig,
    /// Broad-phase parameters and body templates.
    pub collision: CollisionConfig,
}

impl SessionConfig {
    /// Defaults for a session of `players`, seen from `local_player`.
    pub fn new(seed: u64, local_player: PlayerId, players: Vec<PlayerId>) -> Self {
        Self {
            seed,
            local_player,
            players,
            input_delay: 2,
            inbound_capacity: 64,
            checksum_interval: 1,
            snapshot_interval: 10,
            max_snapshots: 8,
            physics: PhysicsConfig::default(),
            collision: CollisionConfig::default(),
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players.is_empty() {
            return Err(ConfigError::NoPlayers);
        }
        let mut seen = self.players.clone();
        seen.sort_unstable();
        if let Some(w) = seen.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigError::DuplicatePlayer { player: w[0] });
        }
        if !self.players.contains(&self.local_player) {
            return Err(ConfigError::UnknownLocalPlayer {
                player: self.local_player,
            });
        }
        if self.inbound_capacity == 0 {
            return Err(ConfigError::InboundCapacityZero);
        }
        if self.checksum_interval == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "checksum_interval",
            });
        }
        if self.snapshot_interval == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "snapshot_interval",
            });
        }
        if self.max_snapshots == 0 {
            return Err(ConfigError::NoSnapshotSlots);
        }
        if self.physics.max_fall_speed <= Fixed::ZERO {
            return Err(ConfigError::InvalidFallSpeed {
                value: self.physics.max_fall_speed,
            });
        }
        if self.collision.cell_size <= Fixed::ZERO {
            return Err(SpaceError::InvalidCellSize {
                cell_size: self.collision.cell_size,
            }
            .into());
        }
        Ok(())
    }

    /// Fingerprint of every setting that affects simulation results.
    ///
    /// Scheduling settings (input delay, buffer sizes, intervals) and the
    /// local player are excluded; peers legitimately differ there.
    pub fn config_hash(&self) -> u64 {
        let mut h = Fnv1a::new();
        h.write_u64(self.seed);

        let mut players = self.players.clone();
        players.sort_unstable();
        h.write_u32(players.len() as u32);
        for p in players {
            h.write_u32(p.0);
        }

        h.write_i32(self.physics.gravity.x.raw());
        h.write_i32(self.physics.gravity.y.raw());
        h.write_i32(self.physics.max_fall_speed.raw());
        h.write_i32(self.physics.projectile_damage);

        h.write_i32(self.collision.cell_size.raw());
        for kind in EntityKind::ALL {
            match self.collision.shapes.template(kind) {
                Some(t) => {
                    h.write_u8(1);
                    h.write_u8(t.kind.tag());
                    for v in [t.shape.min, t.shape.max] {
                        h.write_i32(v.x.raw());
                        h.write_i32(v.y.raw());
                    }
                }
                None => h.write_u8(0),
            }
        }
        h.finish()
    }

    /// Peers other than the local one.
    pub fn remote_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .copied()
            .filter(move |&p| p != self.local_player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_space::BodyKind;
    use tandem_state::BodyTemplate;

    fn two() -> SessionConfig {
        SessionConfig::new(1, PlayerId(1), vec![PlayerId(1), PlayerId(2)])
    }

    #[test]
    fn defaults_validate() {
        assert_eq!(two().validate(), Ok(()));
    }

    #[test]
    fn roster_errors() {
        let mut c = two();
        c.players.clear();
        assert_eq!(c.validate(), Err(ConfigError::NoPlayers));

        let mut c = two();
        c.players.push(PlayerId(2));
        assert_eq!(
            c.validate(),
            Err(ConfigError::DuplicatePlayer {
                player: PlayerId(2)
            })
        );

        let mut c = two();
        c.local_player = PlayerId(3);
        assert_eq!(
            c.validate(),
            Err(ConfigError::UnknownLocalPlayer {
                player: PlayerId(3)
            })
        );
    }

    #[test]
    fn numeric_errors() {
        let mut c = two();
        c.inbound_capacity = 0;
        assert_eq!(c.validate(), Err(ConfigError::InboundCapacityZero));

        let mut c = two();
        c.checksum_interval = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ZeroInterval { .. })));

        let mut c = two();
        c.max_snapshots = 0;
        assert_eq!(c.validate(), Err(ConfigError::NoSnapshotSlots));

        let mut c = two();
        c.collision.cell_size = Fixed::ZERO;
        let err = c.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Space(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn hash_ignores_local_view_but_not_physics() {
        let a = two();
        let mut b = SessionConfig::new(1, PlayerId(2), vec![PlayerId(2), PlayerId(1)]);
        b.input_delay = 5;
        assert_eq!(a.config_hash(), b.config_hash());

        b.physics.gravity = Vec2::from_ints(0, 1);
        assert_ne!(a.config_hash(), b.config_hash());

        let mut c = two();
        c.collision.shapes = c.collision.shapes.with(
            EntityKind::Ship,
            Some(BodyTemplate::sized(Vec2::from_ints(8, 8), BodyKind::Trigger)),
        );
        assert_ne!(a.config_hash(), c.config_hash());
    }

    #[test]
    fn remote_players_excludes_local() {
        let remotes: Vec<PlayerId> = two().remote_players().collect();
        assert_eq!(remotes, vec![PlayerId(2)]);
    }
}
