//! Per-kind collision body templates.
//!
//! Bodies are never serialized. After a load or resync they are rebuilt
//! from entity state through [`BodyShapes`].

use tandem_core::Vec2;
use tandem_space::{Aabb, BodyKind, CollisionBody};

use crate::entity::{Entity, EntityKind, EntityPayload};

/// Shape and behaviour shared by every entity of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyTemplate {
    /// Entity-local bounds.
    pub shape: Aabb,
    /// Resolution behaviour.
    pub kind: BodyKind,
}

impl BodyTemplate {
    /// A box of `size` whose top-left corner sits at the entity position.
    pub fn sized(size: Vec2, kind: BodyKind) -> Self {
        Self {
            shape: Aabb::from_origin_size(Vec2::ZERO, size),
            kind,
        }
    }
}

/// Template table indexed by [`EntityKind`].
///
/// Platforms carry their own size in [`EntityPayload::Platform`]; for them
/// the payload wins over the table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyShapes {
    templates: [Option<BodyTemplate>; EntityKind::COUNT],
}

impl BodyShapes {
    /// A table with no templates. Nothing gets a body.
    pub fn empty() -> Self {
        Self {
            templates: [None; EntityKind::COUNT],
        }
    }

    /// Replace the template for `kind`.
    pub fn with(mut self, kind: EntityKind, template: Option<BodyTemplate>) -> Self {
        self.templates[kind.tag() as usize] = template;
        self
    }

    /// The template for `kind`.
    pub fn template(&self, kind: EntityKind) -> Option<BodyTemplate> {
        self.templates[kind.tag() as usize]
    }

    /// The body `entity` should carry, if any.
    pub fn body_for(&self, entity: &Entity) -> Option<CollisionBody> {
        if let Some(EntityPayload::Platform { size }) = entity.payload {
            let shape = Aabb::from_origin_size(Vec2::ZERO, size);
            return Some(CollisionBody::new(entity.id, shape, BodyKind::Static));
        }
        self.template(entity.kind)
            .map(|t| CollisionBody::new(entity.id, t.shape, t.kind))
    }
}

impl Default for BodyShapes {
    /// 16x24 avatars, 16x16 ships, 4x4 projectile and 8x8 pickup triggers,
    /// 32x8 platforms when no size payload is present.
    fn default() -> Self {
        Self::empty()
            .with(
                EntityKind::Avatar,
                Some(BodyTemplate::sized(Vec2::from_ints(16, 24), BodyKind::Dynamic)),
            )
            .with(
                EntityKind::Ship,
                Some(BodyTemplate::sized(Vec2::from_ints(16, 16), BodyKind::Dynamic)),
            )
            .with(
                EntityKind::Projectile,
                Some(BodyTemplate::sized(Vec2::from_ints(4, 4), BodyKind::Trigger)),
            )
            .with(
                EntityKind::Pickup,
                Some(BodyTemplate::sized(Vec2::from_ints(8, 8), BodyKind::Trigger)),
            )
            .with(
                EntityKind::Platform,
                Some(BodyTemplate::sized(Vec2::from_ints(32, 8), BodyKind::Static)),
            )
    }
}
