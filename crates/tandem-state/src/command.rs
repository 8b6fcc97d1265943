//! Player commands and their application to [`GameState`].
//!
//! A [`Command`] is a closed [`Action`] plus the issuing player and the
//! frame it targets. [`Command::apply`] is a pure transition: the same
//! command applied to the same state always yields the same state, and a
//! rejected command leaves the state untouched.

use std::fmt;

use tandem_core::{EntityId, Fixed, FrameId, PlayerId, Vec2};

use crate::entity::{Entity, EntityDef, EntityKind, EntityPayload};
use crate::error::CommandError;
use crate::player::Player;
use crate::state::GameState;

/// Largest speed, in units per frame, a command may request on either axis.
pub const MAX_COMMAND_SPEED: Fixed = Fixed::from_int(64);
/// Longest projectile lifetime a `Fire` may request, in frames.
pub const MAX_PROJECTILE_TTL: u16 = 600;
/// Health given to avatars spawned by `Join`.
pub const AVATAR_HEALTH: i32 = 100;

/// Horizontal spacing between spawn columns.
const SPAWN_SPACING: i32 = 48;
/// Number of spawn columns; later players spawn one row higher.
const SPAWN_COLUMNS: u32 = 8;
/// Random horizontal jitter added within a spawn column.
const SPAWN_JITTER: i32 = 16;

/// What a player wants to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Enter the session (or reconnect) and spawn an avatar.
    Join {
        /// Display name.
        name: String,
    },
    /// Leave the session; the avatar is removed.
    Leave,
    /// Set movement. Avatars take the horizontal component only.
    Move {
        /// Requested velocity.
        velocity: Vec2,
    },
    /// Jump with an upward impulse. Avatars only.
    Jump {
        /// Upward speed, positive.
        impulse: Fixed,
    },
    /// Damage another entity.
    Attack {
        /// Entity to damage.
        target: EntityId,
        /// Health removed, positive.
        damage: i32,
    },
    /// Spawn a projectile at the controlled entity.
    Fire {
        /// Projectile velocity.
        velocity: Vec2,
        /// Frames before the projectile expires.
        ttl: u16,
    },
    /// Explicit no-op; keeps a player's per-frame input slot filled.
    Idle,
}

impl Action {
    /// Wire tag.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Join { .. } => 0,
            Self::Leave => 1,
            Self::Move { .. } => 2,
            Self::Jump { .. } => 3,
            Self::Attack { .. } => 4,
            Self::Fire { .. } => 5,
            Self::Idle => 6,
        }
    }

    /// Short lowercase name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Move { .. } => "move",
            Self::Jump { .. } => "jump",
            Self::Attack { .. } => "attack",
            Self::Fire { .. } => "fire",
            Self::Idle => "idle",
        }
    }
}

/// A player intent bound to a frame.
///
/// # Examples
///
/// ```
/// use tandem_core::{FrameId, PlayerId};
/// use tandem_state::{Action, Command, GameState};
///
/// let mut state = GameState::new(1);
/// let join = Command::new(FrameId(0), PlayerId(1), Action::Join { name: "A".into() });
/// join.apply(&mut state).unwrap();
///
/// assert!(state.controlled_entity(PlayerId(1)).is_some());
/// // A second join from a connected player is rejected and changes nothing.
/// let before = state.calculate_checksum();
/// assert!(join.apply(&mut state).is_err());
/// assert_eq!(state.calculate_checksum(), before);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// Frame the command must be applied in.
    pub frame: FrameId,
    /// Issuing player.
    pub player: PlayerId,
    /// The action.
    pub action: Action,
}

impl Command {
    /// Construct a command.
    pub fn new(frame: FrameId, player: PlayerId, action: Action) -> Self {
        Self {
            frame,
            player,
            action,
        }
    }

    /// Apply to `state`, or reject without mutating it.
    pub fn apply(&self, state: &mut GameState) -> Result<(), CommandError> {
        if self.frame != state.frame() {
            return Err(CommandError::FrameMismatch {
                command: self.frame,
                state: state.frame(),
            });
        }
        match &self.action {
            Action::Join { name } => self.join(state, name),
            Action::Leave => self.leave(state),
            Action::Move { velocity } => self.set_velocity(state, *velocity),
            Action::Jump { impulse } => self.jump(state, *impulse),
            Action::Attack { target, damage } => self.attack(state, *target, *damage),
            Action::Fire { velocity, ttl } => self.fire(state, *velocity, *ttl),
            Action::Idle => self.connected_player(state).map(|_| ()),
        }
    }

    fn join(&self, state: &mut GameState, name: &str) -> Result<(), CommandError> {
        if name.is_empty() {
            return Err(invalid("join requires a non-empty name"));
        }
        if let Some(p) = state.player(self.player) {
            if p.connected {
                return Err(CommandError::PlayerAlreadyJoined {
                    player: self.player,
                });
            }
        }

        let column = (self.player.0 % SPAWN_COLUMNS) as i32;
        let row = (self.player.0 / SPAWN_COLUMNS) as i32;
        let jitter = state
            .keyed_rng(self.player.0)
            .next_int_range(0, SPAWN_JITTER);
        let spawn = Vec2::from_ints(column * SPAWN_SPACING + jitter, -row * SPAWN_SPACING);
        let avatar = state.add_entity(
            EntityDef::new(EntityKind::Avatar)
                .at(spawn)
                .with_health(AVATAR_HEALTH)
                .with_payload(Entity::avatar_payload()),
        );

        match state.player_mut(self.player) {
            Some(p) => {
                p.connected = true;
                p.name = name.to_owned();
                p.entity = Some(avatar);
            }
            None => {
                let player = Player::new(self.player, name).with_entity(avatar);
                // The avatar id was just allocated and the id is free.
                state
                    .add_player(player)
                    .map_err(|e| invalid(&e.to_string()))?;
            }
        }
        Ok(())
    }

    fn leave(&self, state: &mut GameState) -> Result<(), CommandError> {
        let entity = self.connected_player(state)?.entity;
        if let Some(id) = entity {
            state.remove_entity(id);
        }
        if let Some(p) = state.player_mut(self.player) {
            p.connected = false;
            p.entity = None;
        }
        Ok(())
    }

    fn set_velocity(&self, state: &mut GameState, velocity: Vec2) -> Result<(), CommandError> {
        check_speed(velocity.x)?;
        check_speed(velocity.y)?;
        let id = self.acting_entity(state)?;
        let Some(e) = state.entity_mut(id) else {
            return Err(CommandError::NoControlledEntity {
                player: self.player,
            });
        };
        if e.kind == EntityKind::Avatar {
            e.velocity.x = velocity.x;
            if let Some(EntityPayload::Avatar { facing, .. }) = &mut e.payload {
                if !velocity.x.is_zero() {
                    *facing = if velocity.x.is_negative() { -1 } else { 1 };
                }
            }
        } else {
            e.velocity = velocity;
        }
        Ok(())
    }

    fn jump(&self, state: &mut GameState, impulse: Fixed) -> Result<(), CommandError> {
        if impulse <= Fixed::ZERO {
            return Err(invalid("jump impulse must be positive"));
        }
        check_speed(impulse)?;
        let id = self.acting_entity(state)?;
        let Some(e) = state.entity_mut(id) else {
            return Err(CommandError::NoControlledEntity {
                player: self.player,
            });
        };
        match &mut e.payload {
            Some(EntityPayload::Avatar { jumps_left, .. }) if e.kind == EntityKind::Avatar => {
                if *jumps_left == 0 {
                    return Err(invalid("no jumps left"));
                }
                *jumps_left -= 1;
                // Screen coordinates: up is negative y.
                e.velocity.y = -impulse;
                Ok(())
            }
            _ => Err(invalid("only avatars can jump")),
        }
    }

    fn attack(&self, state: &mut GameState, target: EntityId, damage: i32) -> Result<(), CommandError> {
        if damage <= 0 {
            return Err(invalid("attack damage must be positive"));
        }
        let attacker = self.acting_entity(state)?;
        if attacker == target {
            return Err(invalid("cannot attack own entity"));
        }
        let Some(t) = state.entity_mut(target) else {
            return Err(CommandError::UnknownTarget { target });
        };
        if !t.active {
            return Err(CommandError::InactiveEntity { entity: target });
        }

        t.health = t.health.saturating_sub(damage);
        if t.health > 0 {
            return Ok(());
        }
        t.health = 0;
        t.active = false;
        if let Some(p) = state.player_mut(self.player) {
            p.score = p.score.saturating_add(1);
        }
        Ok(())
    }

    fn fire(&self, state: &mut GameState, velocity: Vec2, ttl: u16) -> Result<(), CommandError> {
        if ttl == 0 || ttl > MAX_PROJECTILE_TTL {
            return Err(invalid(&format!(
                "projectile ttl must be in 1..={MAX_PROJECTILE_TTL}, got {ttl}"
            )));
        }
        check_speed(velocity.x)?;
        check_speed(velocity.y)?;
        let shooter = self.acting_entity(state)?;
        let origin = state
            .entity(shooter)
            .map(|e| e.position)
            .ok_or(CommandError::NoControlledEntity {
                player: self.player,
            })?;
        state.add_entity(
            EntityDef::new(EntityKind::Projectile)
                .at(origin)
                .moving(velocity)
                .with_health(1)
                .with_payload(EntityPayload::Projectile {
                    owner: self.player,
                    ttl,
                }),
        );
        Ok(())
    }

    fn connected_player<'s>(&self, state: &'s GameState) -> Result<&'s Player, CommandError> {
        let p = state.player(self.player).ok_or(CommandError::UnknownPlayer {
            player: self.player,
        })?;
        if !p.connected {
            return Err(invalid("player is disconnected"));
        }
        Ok(p)
    }

    /// The live, active entity the issuing player controls.
    fn acting_entity(&self, state: &GameState) -> Result<EntityId, CommandError> {
        self.connected_player(state)?;
        let e = state
            .controlled_entity(self.player)
            .ok_or(CommandError::NoControlledEntity {
                player: self.player,
            })?;
        if !e.active {
            return Err(CommandError::InactiveEntity { entity: e.id });
        }
        Ok(e.id)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by player {} @ frame {}",
            self.action.name(),
            self.player,
            self.frame
        )
    }
}

fn invalid(reason: &str) -> CommandError {
    CommandError::InvalidAction {
        reason: reason.to_owned(),
    }
}

fn check_speed(v: Fixed) -> Result<(), CommandError> {
    if v.abs() > MAX_COMMAND_SPEED || v == Fixed::MIN {
        return Err(invalid(&format!(
            "speed {v} exceeds limit {MAX_COMMAND_SPEED}"
        )));
    }
    Ok(())
}
