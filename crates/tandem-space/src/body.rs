//! Collision bodies and the per-frame proxies the collision system works on.

use tandem_core::{EntityId, Vec2};

use crate::aabb::Aabb;

/// How a body participates in collision resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyKind {
    /// Moves under velocity and is pushed out of solid bodies.
    Dynamic,
    /// Never moves during resolution (platforms, walls).
    Static,
    /// Reports overlaps but is never resolved (pickups, sensors).
    Trigger,
}

impl BodyKind {
    /// Whether overlaps with this body produce push-out.
    pub fn is_solid(self) -> bool {
        !matches!(self, Self::Trigger)
    }

    /// Wire tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Dynamic => 0,
            Self::Static => 1,
            Self::Trigger => 2,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Dynamic),
            1 => Some(Self::Static),
            2 => Some(Self::Trigger),
            _ => None,
        }
    }
}

/// Collision geometry attached to one entity.
///
/// `shape` is expressed relative to the entity's position, so a body does
/// not need updating when its entity moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionBody {
    /// The owning entity.
    pub entity: EntityId,
    /// Entity-local bounds.
    pub shape: Aabb,
    /// Resolution behaviour.
    pub kind: BodyKind,
}

impl CollisionBody {
    /// Construct a body.
    pub fn new(entity: EntityId, shape: Aabb, kind: BodyKind) -> Self {
        Self {
            entity,
            shape,
            kind,
        }
    }

    /// Bounds in world space for an entity at `position`.
    pub fn world_bounds(&self, position: Vec2) -> Aabb {
        self.shape.translate(position)
    }

    /// Build the proxy the collision system resolves this frame.
    pub fn proxy(&self, position: Vec2, velocity: Vec2) -> BodyProxy {
        BodyProxy {
            entity: self.entity,
            kind: self.kind,
            bounds: self.world_bounds(position),
            velocity,
        }
    }
}

/// World-space view of a body for a single resolution pass.
///
/// The collision system mutates `bounds` and `velocity` in place; the
/// caller maps the bounds' displacement back onto entity positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyProxy {
    /// The owning entity.
    pub entity: EntityId,
    /// Resolution behaviour.
    pub kind: BodyKind,
    /// Current world-space bounds.
    pub bounds: Aabb,
    /// Current velocity.
    pub velocity: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_bounds_follow_position() {
        let body = CollisionBody::new(
            EntityId(3),
            Aabb::new(Vec2::from_ints(-1, -2), Vec2::from_ints(1, 0)),
            BodyKind::Dynamic,
        );
        let proxy = body.proxy(Vec2::from_ints(10, 20), Vec2::from_ints(1, 0));
        assert_eq!(
            proxy.bounds,
            Aabb::new(Vec2::from_ints(9, 18), Vec2::from_ints(11, 20))
        );
        assert_eq!(proxy.entity, EntityId(3));
    }

    #[test]
    fn kind_tags_roundtrip() {
        for kind in [BodyKind::Dynamic, BodyKind::Static, BodyKind::Trigger] {
            assert_eq!(BodyKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(BodyKind::from_tag(9), None);
        assert!(!BodyKind::Trigger.is_solid());
    }
}
