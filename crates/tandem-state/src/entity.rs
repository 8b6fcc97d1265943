//! Entities: the simulated objects a [`GameState`](crate::GameState) owns.

use tandem_core::{EntityId, PlayerId, Vec2};

/// Closed set of entity types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A player-controlled platformer character. Subject to gravity.
    Avatar,
    /// A free-flying craft. Not subject to gravity.
    Ship,
    /// A short-lived shot fired by a player.
    Projectile,
    /// A collectible that awards points on contact.
    Pickup,
    /// Static level geometry.
    Platform,
}

impl EntityKind {
    /// Number of kinds.
    pub const COUNT: usize = 5;

    /// Every kind, in tag order.
    pub const ALL: [EntityKind; Self::COUNT] = [
        Self::Avatar,
        Self::Ship,
        Self::Projectile,
        Self::Pickup,
        Self::Platform,
    ];

    /// Wire tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Avatar => 0,
            Self::Ship => 1,
            Self::Projectile => 2,
            Self::Pickup => 3,
            Self::Platform => 4,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Whether gravity applies to this kind.
    pub fn falls(self) -> bool {
        matches!(self, Self::Avatar | Self::Pickup)
    }
}

/// Per-kind extension data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityPayload {
    /// Character state.
    Avatar {
        /// `1` facing right, `-1` facing left.
        facing: i8,
        /// Jumps available before landing again.
        jumps_left: u8,
    },
    /// Shot state.
    Projectile {
        /// The player who fired it.
        owner: PlayerId,
        /// Frames remaining before it expires.
        ttl: u16,
    },
    /// Collectible value.
    Pickup {
        /// Score awarded on collection.
        points: i32,
    },
    /// Platform geometry.
    Platform {
        /// Extent of the platform, measured from its position (top-left).
        size: Vec2,
    },
}

/// A simulated object.
///
/// Entities are created through [`GameState::add_entity`](crate::GameState::add_entity),
/// which assigns the id. Health is a plain integer so that it folds into
/// the checksum without conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    /// Allocated identifier.
    pub id: EntityId,
    /// Type tag.
    pub kind: EntityKind,
    /// World position.
    pub position: Vec2,
    /// Per-frame displacement.
    pub velocity: Vec2,
    /// Hit points. An entity at zero health is deactivated.
    pub health: i32,
    /// Inactive entities are skipped by physics, collision, and commands.
    pub active: bool,
    /// Optional kind-specific data.
    pub payload: Option<EntityPayload>,
}

impl Entity {
    /// Jumps an avatar gets after landing.
    pub const AVATAR_JUMPS: u8 = 2;

    /// Default avatar payload: facing right with full jumps.
    pub fn avatar_payload() -> EntityPayload {
        EntityPayload::Avatar {
            facing: 1,
            jumps_left: Self::AVATAR_JUMPS,
        }
    }
}

/// Everything needed to create an entity except its id.
///
/// # Examples
///
/// ```
/// use tandem_core::Vec2;
/// use tandem_state::{EntityDef, EntityKind, GameState};
///
/// let mut state = GameState::new(12345);
/// let id = state.add_entity(
///     EntityDef::new(EntityKind::Ship)
///         .at(Vec2::from_ints(0, 0))
///         .moving(Vec2::from_ints(1, 0))
///         .with_health(100),
/// );
/// assert_eq!(state.entity(id).unwrap().health, 100);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDef {
    /// Type tag.
    pub kind: EntityKind,
    /// Initial position.
    pub position: Vec2,
    /// Initial velocity.
    pub velocity: Vec2,
    /// Initial health.
    pub health: i32,
    /// Initial active flag.
    pub active: bool,
    /// Initial payload.
    pub payload: Option<EntityPayload>,
}

impl EntityDef {
    /// An active entity of `kind` at the origin with 100 health.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            health: 100,
            active: true,
            payload: None,
        }
    }

    /// Set the position.
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set the velocity.
    pub fn moving(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the health.
    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: EntityPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Start inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// A platform of `size` with its top-left corner at `position`.
    pub fn platform(position: Vec2, size: Vec2) -> Self {
        Self::new(EntityKind::Platform)
            .at(position)
            .with_payload(EntityPayload::Platform { size })
    }

    pub(crate) fn into_entity(self, id: EntityId) -> Entity {
        Entity {
            id,
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
            health: self.health,
            active: self.active,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EntityKind::from_tag(5), None);
    }

    #[test]
    fn def_builder_sets_fields() {
        let e = EntityDef::new(EntityKind::Pickup)
            .at(Vec2::from_ints(3, 4))
            .with_health(1)
            .with_payload(EntityPayload::Pickup { points: 10 })
            .inactive()
            .into_entity(EntityId(7));
        assert_eq!(e.id, EntityId(7));
        assert_eq!(e.position, Vec2::from_ints(3, 4));
        assert!(!e.active);
        assert_eq!(e.payload, Some(EntityPayload::Pickup { points: 10 }));
    }

    #[test]
    fn only_avatars_and_pickups_fall() {
        assert!(EntityKind::Avatar.falls());
        assert!(!EntityKind::Ship.falls());
        assert!(!EntityKind::Platform.falls());
    }
}
