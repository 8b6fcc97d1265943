//! Per-frame collision detection and push-out resolution.
//!
//! Every frame the system rebuilds its [`SpatialHash`] from the supplied
//! proxies, collects exact overlaps as `(lower id, higher id)` pairs, and
//! processes them in ascending pair order. Because pair order is derived
//! from ids alone, two peers holding the same bodies resolve simultaneous
//! pushes identically regardless of how their registries are laid out in
//! memory.
//!
//! Resolution rules:
//!
//! | Pair                | Outcome                                          |
//! |---------------------|--------------------------------------------------|
//! | trigger + anything  | contact reported, nothing moves                  |
//! | static + static     | ignored                                          |
//! | dynamic + static    | dynamic body takes the full push                 |
//! | dynamic + dynamic   | push split in half, lower id takes the remainder |
//!
//! A moved body loses the velocity component that points back into the
//! body it was pushed out of. Every pair is re-tested against the bounds
//! as they stand when it is reached, so a pair an earlier push separated
//! is neither resolved nor reported, whatever its kind.

use tandem_core::{EntityId, Fixed, Vec2};

use crate::aabb::Aabb;
use crate::body::{BodyKind, BodyProxy};
use crate::error::SpaceError;
use crate::spatial_hash::SpatialHash;

/// Whether a contact was resolved or only reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    /// Both bodies solid; push-out applied.
    Solid,
    /// At least one body is a trigger; no push-out.
    Trigger,
}

/// One overlapping pair found during a resolution pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    /// Lower entity id of the pair.
    pub a: EntityId,
    /// Higher entity id of the pair.
    pub b: EntityId,
    /// Resolved or reported only.
    pub kind: ContactKind,
    /// Displacement applied to `a`.
    pub push_a: Vec2,
    /// Displacement applied to `b`.
    pub push_b: Vec2,
}

impl Contact {
    /// Whether `entity` is one side of this contact.
    pub fn involves(&self, entity: EntityId) -> bool {
        self.a == entity || self.b == entity
    }

    /// The other side of the contact, if `entity` is one side.
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }

    /// Displacement applied to `entity`, if it is one side.
    pub fn push_for(&self, entity: EntityId) -> Option<Vec2> {
        if self.a == entity {
            Some(self.push_a)
        } else if self.b == entity {
            Some(self.push_b)
        } else {
            None
        }
    }
}

/// Deterministic collision resolver.
///
/// Holds its spatial hash and scratch buffers between frames so a steady
/// state pass does not allocate.
#[derive(Clone, Debug)]
pub struct CollisionSystem {
    hash: SpatialHash,
    scratch: Vec<EntityId>,
    pairs: Vec<(usize, usize)>,
}

impl CollisionSystem {
    /// Create a resolver whose broad phase uses cells of side `cell_size`.
    pub fn new(cell_size: Fixed) -> Result<Self, SpaceError> {
        Ok(Self {
            hash: SpatialHash::new(cell_size)?,
            scratch: Vec::new(),
            pairs: Vec::new(),
        })
    }

    /// The broad-phase index as of the last pass.
    pub fn spatial_hash(&self) -> &SpatialHash {
        &self.hash
    }

    /// Overlapping pairs among `bodies`, ascending by `(a, b)`.
    ///
    /// `bodies` is sorted by entity id in place. Ids must be unique.
    pub fn detect(&mut self, bodies: &mut [BodyProxy]) -> Vec<(EntityId, EntityId)> {
        self.collect_pairs(bodies);
        self.pairs
            .iter()
            .map(|&(i, j)| (bodies[i].entity, bodies[j].entity))
            .collect()
    }

    /// Detect and resolve all overlaps, mutating bounds and velocities.
    ///
    /// `bodies` is sorted by entity id in place. Ids must be unique.
    /// Returns the contacts in canonical pair order. Pairs that an earlier
    /// push already separated are not reported.
    pub fn resolve(&mut self, bodies: &mut [BodyProxy]) -> Vec<Contact> {
        self.collect_pairs(bodies);
        let mut contacts = Vec::with_capacity(self.pairs.len());

        for &(i, j) in &self.pairs {
            let (a, b) = (bodies[i], bodies[j]);
            if !a.kind.is_solid() || !b.kind.is_solid() {
                if !a.bounds.overlaps(&b.bounds) {
                    continue;
                }
                contacts.push(Contact {
                    a: a.entity,
                    b: b.entity,
                    kind: ContactKind::Trigger,
                    push_a: Vec2::ZERO,
                    push_b: Vec2::ZERO,
                });
                continue;
            }

            let (push_a, push_b) = match (a.kind, b.kind) {
                (BodyKind::Static, BodyKind::Static) => continue,
                (BodyKind::Dynamic, BodyKind::Static) => match a.bounds.penetration(&b.bounds) {
                    Some(mtv) => (mtv, Vec2::ZERO),
                    None => continue,
                },
                (BodyKind::Static, BodyKind::Dynamic) => match b.bounds.penetration(&a.bounds) {
                    Some(mtv) => (Vec2::ZERO, mtv),
                    None => continue,
                },
                _ => match a.bounds.penetration(&b.bounds) {
                    Some(mtv) => split_push(mtv),
                    None => continue,
                },
            };

            apply_push(&mut bodies[i], push_a);
            apply_push(&mut bodies[j], push_b);
            contacts.push(Contact {
                a: a.entity,
                b: b.entity,
                kind: ContactKind::Solid,
                push_a,
                push_b,
            });
        }

        contacts
    }

    fn collect_pairs(&mut self, bodies: &mut [BodyProxy]) {
        bodies.sort_by_key(|b| b.entity);
        self.hash.clear();
        for body in bodies.iter() {
            self.hash.insert(body.entity, body.bounds);
        }

        self.pairs.clear();
        for (i, body) in bodies.iter().enumerate() {
            self.hash.query_into(&body.bounds, &mut self.scratch);
            for &other in self.scratch.iter().filter(|&&id| id > body.entity) {
                let Ok(j) = bodies.binary_search_by_key(&other, |b| b.entity) else {
                    continue;
                };
                if body.bounds.overlaps(&bodies[j].bounds) {
                    self.pairs.push((i, j));
                }
            }
        }
    }
}

/// Split `mtv` between two dynamic bodies. The first receives the larger
/// half when the raw value is odd; the pair separates by exactly `mtv`.
fn split_push(mtv: Vec2) -> (Vec2, Vec2) {
    // Truncating division keeps the remainder on the first body for either sign.
    let half = Vec2::new(
        Fixed::from_raw(mtv.x.raw() / 2),
        Fixed::from_raw(mtv.y.raw() / 2),
    );
    (mtv - half, -half)
}

fn apply_push(body: &mut BodyProxy, push: Vec2) {
    if push == Vec2::ZERO {
        return;
    }
    body.bounds = body.bounds.translate(push);
    body.velocity = Vec2::new(
        cancel_opposing(body.velocity.x, push.x),
        cancel_opposing(body.velocity.y, push.y),
    );
}

fn cancel_opposing(velocity: Fixed, push: Fixed) -> Fixed {
    if !push.is_zero() && !velocity.is_zero() && velocity.is_negative() != push.is_negative() {
        Fixed::ZERO
    } else {
        velocity
    }
}

/// Bounds after resolution minus bounds before: the displacement to apply
/// to the owning entity's position.
pub fn displacement(before: &Aabb, after: &Aabb) -> Vec2 {
    after.min - before.min
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn proxy(id: u32, kind: BodyKind, x0: i32, y0: i32, x1: i32, y1: i32) -> BodyProxy {
        BodyProxy {
            entity: EntityId(id),
            kind,
            bounds: Aabb::new(Vec2::from_ints(x0, y0), Vec2::from_ints(x1, y1)),
            velocity: Vec2::ZERO,
        }
    }

    fn system() -> CollisionSystem {
        CollisionSystem::new(Fixed::from_int(8)).unwrap()
    }

    #[test]
    fn dynamic_lands_on_static_floor() {
        let mut bodies = vec![
            proxy(2, BodyKind::Static, -50, 10, 50, 20),
            proxy(1, BodyKind::Dynamic, 0, 8, 4, 12),
        ];
        bodies[1].velocity = Vec2::from_ints(1, 3);

        let contacts = system().resolve(&mut bodies);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].a, EntityId(1));
        assert_eq!(contacts[0].push_a, Vec2::from_ints(0, -2));
        assert_eq!(contacts[0].push_b, Vec2::ZERO);

        // Sorted by id; dynamic body now resting on the floor.
        assert_eq!(bodies[0].entity, EntityId(1));
        assert_eq!(bodies[0].bounds.max.y, Fixed::from_int(10));
        assert_eq!(bodies[0].velocity, Vec2::from_ints(1, 0));
        assert_eq!(bodies[1].bounds.min.y, Fixed::from_int(10));
    }

    #[test]
    fn touching_bodies_do_not_collide() {
        let mut bodies = vec![
            proxy(1, BodyKind::Dynamic, 0, 0, 4, 10),
            proxy(2, BodyKind::Static, -50, 10, 50, 20),
        ];
        assert!(system().resolve(&mut bodies).is_empty());
    }

    #[test]
    fn dynamic_pair_split_with_remainder_on_lower_id() {
        let mut bodies = vec![
            proxy(1, BodyKind::Dynamic, 0, 0, 10, 10),
            proxy(2, BodyKind::Dynamic, 7, -20, 17, 30),
        ];
        // Shift b right by one raw unit so the overlap is odd.
        bodies[1].bounds = bodies[1].bounds.translate(Vec2::new(Fixed::EPSILON, Fixed::ZERO));
        let contacts = system().resolve(&mut bodies);
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert_eq!(c.push_a.x - c.push_b.x, -(Fixed::from_int(3) - Fixed::EPSILON));
        assert!(c.push_a.x.abs() >= c.push_b.x.abs());
        assert!(!bodies[0].bounds.overlaps(&bodies[1].bounds));
    }

    #[test]
    fn triggers_report_without_moving() {
        let mut bodies = vec![
            proxy(1, BodyKind::Dynamic, 0, 0, 4, 4),
            proxy(2, BodyKind::Trigger, 2, 2, 6, 6),
        ];
        let before = bodies.clone();
        let contacts = system().resolve(&mut bodies);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].kind, ContactKind::Trigger);
        assert_eq!(bodies, before);
    }

    #[test]
    fn trigger_missed_after_push_out_is_not_reported() {
        let mut bodies = vec![
            proxy(1, BodyKind::Dynamic, 0, 8, 4, 12),
            proxy(2, BodyKind::Static, -50, 10, 50, 20),
            proxy(3, BodyKind::Trigger, 0, 11, 4, 13),
        ];
        let contacts = system().resolve(&mut bodies);
        let pairs: Vec<(EntityId, EntityId)> = contacts.iter().map(|c| (c.a, c.b)).collect();
        // (1, 3) overlapped before the floor pushed body 1 up to y = 10
        assert_eq!(
            pairs,
            vec![(EntityId(1), EntityId(2)), (EntityId(2), EntityId(3))]
        );
        assert_eq!(contacts[1].kind, ContactKind::Trigger);
    }

    #[test]
    fn static_pairs_are_ignored() {
        let mut bodies = vec![
            proxy(1, BodyKind::Static, 0, 0, 4, 4),
            proxy(2, BodyKind::Static, 2, 2, 6, 6),
        ];
        assert!(system().resolve(&mut bodies).is_empty());
        assert_eq!(system().detect(&mut bodies).len(), 1);
    }

    #[test]
    fn contact_accessors() {
        let c = Contact {
            a: EntityId(1),
            b: EntityId(4),
            kind: ContactKind::Solid,
            push_a: Vec2::from_ints(0, -1),
            push_b: Vec2::ZERO,
        };
        assert!(c.involves(EntityId(4)));
        assert_eq!(c.other(EntityId(1)), Some(EntityId(4)));
        assert_eq!(c.push_for(EntityId(1)), Some(Vec2::from_ints(0, -1)));
        assert_eq!(c.push_for(EntityId(9)), None);
    }

    #[test]
    fn displacement_is_min_corner_delta() {
        let before = Aabb::new(Vec2::from_ints(0, 0), Vec2::from_ints(2, 2));
        let after = before.translate(Vec2::from_ints(3, -1));
        assert_eq!(displacement(&before, &after), Vec2::from_ints(3, -1));
    }

    proptest! {
        #[test]
        fn outcome_ignores_input_order(
            raw in prop::collection::vec((0i32..60, 0i32..60, 2i32..12, 2i32..12, 0u8..3), 2..16),
            seed in any::<u64>(),
        ) {
            let bodies: Vec<BodyProxy> = raw
                .iter()
                .enumerate()
                .map(|(i, &(x, y, w, h, k))| {
                    let kind = BodyKind::from_tag(k).unwrap();
                    proxy(i as u32 + 1, kind, x, y, x + w, y + h)
                })
                .collect();
            let mut shuffled = bodies.clone();
            tandem_core::DeterministicRng::new(seed).shuffle_in_place(&mut shuffled);

            let mut a = bodies;
            let mut b = shuffled;
            let ca = system().resolve(&mut a);
            let cb = system().resolve(&mut b);
            prop_assert_eq!(ca, cb);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn contacts_are_in_canonical_order(
            raw in prop::collection::vec((0i32..40, 0i32..40, 2i32..12, 2i32..12), 2..16),
        ) {
            let mut bodies: Vec<BodyProxy> = raw
                .iter()
                .enumerate()
                .map(|(i, &(x, y, w, h))| proxy(i as u32 + 1, BodyKind::Trigger, x, y, x + w, y + h))
                .collect();
            let contacts = system().resolve(&mut bodies);
            for c in &contacts {
                prop_assert!(c.a < c.b);
            }
            for w in contacts.windows(2) {
                prop_assert!((w[0].a, w[0].b) < (w[1].a, w[1].b));
            }
        }
    }
}
