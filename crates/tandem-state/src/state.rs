//! The authoritative per-peer registry of entities, players, and bodies.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tandem_core::{DeterministicRng, EntityId, FrameId, PlayerId};
use tandem_space::CollisionBody;

use crate::checksum::{self, Checksum};
use crate::codec;
use crate::entity::{Entity, EntityDef};
use crate::error::{CodecError, StateError};
use crate::player::Player;
use crate::shapes::BodyShapes;

/// Odd multiplier that spreads [`GameState::keyed_rng`] keys over seeds.
const KEYED_RNG_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Simulation state for one frame.
///
/// Registries are `IndexMap`s kept in ascending id order, so iteration is
/// stable and cheap and matches the canonical order the checksum uses.
/// Entity ids come from a strictly increasing counter and are never
/// reused within one instance.
///
/// # Examples
///
/// ```
/// use tandem_core::{PlayerId, Vec2};
/// use tandem_state::{EntityDef, EntityKind, GameState, Player};
///
/// let build = || {
///     let mut state = GameState::new(12345);
///     let ship = state.add_entity(
///         EntityDef::new(EntityKind::Ship)
///             .moving(Vec2::from_ints(1, 0))
///             .with_health(100),
///     );
///     state.add_player(Player::new(PlayerId(1), "A").with_entity(ship)).unwrap();
///     state.next_frame();
///     state
/// };
///
/// assert_eq!(build().calculate_checksum(), build().calculate_checksum());
/// ```
#[derive(Clone, Debug)]
pub struct GameState {
    frame: FrameId,
    seed: u64,
    next_entity_id: EntityId,
    entities: IndexMap<EntityId, Entity>,
    players: IndexMap<PlayerId, Player>,
    bodies: IndexMap<EntityId, CollisionBody>,
}

impl GameState {
    /// An empty state at frame 0.
    pub fn new(seed: u64) -> Self {
        Self {
            frame: FrameId(0),
            seed,
            next_entity_id: EntityId::FIRST,
            entities: IndexMap::new(),
            players: IndexMap::new(),
            bodies: IndexMap::new(),
        }
    }

    /// Rebuild a state from a snapshot.
    pub fn from_snapshot(data: &GameStateData) -> Self {
        let mut state = Self::new(data.seed);
        state.restore_snapshot(data);
        state
    }

    // ── Frame control ───────────────────────────────────────────

    /// The world seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The current frame.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Jump to `frame`.
    pub fn set_frame(&mut self, frame: FrameId) {
        self.frame = frame;
    }

    /// Advance one frame and return the new frame number.
    pub fn next_frame(&mut self) -> FrameId {
        self.frame = self.frame.next();
        self.frame
    }

    /// A generator private to the current frame.
    ///
    /// Derived from `(seed, frame)` alone, so rolling back to a snapshot
    /// reproduces the same draws without storing generator state.
    pub fn frame_rng(&self) -> DeterministicRng {
        DeterministicRng::with_stream(self.seed, self.frame.0)
    }

    /// A generator private to the current frame and `key`.
    ///
    /// Like [`frame_rng`](Self::frame_rng), but distinct keys draw
    /// independently within one frame, so several commands of the same
    /// frame do not share draws.
    pub fn keyed_rng(&self, key: u32) -> DeterministicRng {
        let salt = KEYED_RNG_SALT.wrapping_mul(u64::from(key) + 1);
        DeterministicRng::with_stream(self.seed ^ salt, self.frame.0)
    }

    // ── Entities ────────────────────────────────────────────────

    /// The id the next [`add_entity`](Self::add_entity) will return.
    pub fn next_entity_id(&self) -> EntityId {
        self.next_entity_id
    }

    /// Register a new entity and return its id.
    pub fn add_entity(&mut self, def: EntityDef) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = id.next();
        self.entities.insert(id, def.into_entity(id));
        id
    }

    /// Remove an entity and its body. Players referring to it keep the
    /// stale id.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.shift_remove(&id)?;
        self.bodies.shift_remove(&id);
        Some(removed)
    }

    /// Look up a live entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Look up a live entity for mutation.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Live entities in ascending id order, mutably.
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ── Players ─────────────────────────────────────────────────

    /// Register a player.
    ///
    /// Fails if the id is taken or the player refers to an entity id this
    /// state has never allocated. A reference to an entity that existed
    /// but was removed is accepted.
    pub fn add_player(&mut self, player: Player) -> Result<(), StateError> {
        if self.players.contains_key(&player.id) {
            return Err(StateError::DuplicatePlayer { id: player.id });
        }
        if let Some(entity) = player.entity {
            if entity.0 == 0 || entity >= self.next_entity_id {
                return Err(StateError::DanglingEntityRef {
                    player: player.id,
                    entity,
                });
            }
        }
        self.players.insert(player.id, player);
        self.players.sort_unstable_keys();
        Ok(())
    }

    /// Unregister a player. Its entity is left in place.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.shift_remove(&id)
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Look up a player for mutation.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Players in ascending id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The live entity `player` controls, if any.
    pub fn controlled_entity(&self, player: PlayerId) -> Option<&Entity> {
        let id = self.players.get(&player)?.entity?;
        self.entities.get(&id)
    }

    // ── Bodies ──────────────────────────────────────────────────

    /// Attach (or replace) the collision body of a live entity.
    pub fn attach_body(&mut self, body: CollisionBody) -> Result<(), StateError> {
        if !self.entities.contains_key(&body.entity) {
            return Err(StateError::UnknownEntity { id: body.entity });
        }
        let out_of_order = self
            .bodies
            .last()
            .is_some_and(|(last, _)| *last > body.entity);
        self.bodies.insert(body.entity, body);
        if out_of_order {
            self.bodies.sort_unstable_keys();
        }
        Ok(())
    }

    /// Detach an entity's body.
    pub fn detach_body(&mut self, entity: EntityId) -> Option<CollisionBody> {
        self.bodies.shift_remove(&entity)
    }

    /// The body attached to `entity`.
    pub fn body(&self, entity: EntityId) -> Option<&CollisionBody> {
        self.bodies.get(&entity)
    }

    /// Attached bodies in ascending entity order.
    pub fn bodies(&self) -> impl Iterator<Item = &CollisionBody> {
        self.bodies.values()
    }

    /// Attach template bodies to every entity that lacks one.
    ///
    /// Existing bodies are kept. Returns the number attached. This is how
    /// bodies come back after [`deserialize`](Self::deserialize).
    pub fn sync_bodies(&mut self, shapes: &BodyShapes) -> usize {
        let missing: Vec<CollisionBody> = self
            .entities
            .values()
            .filter(|e| !self.bodies.contains_key(&e.id))
            .filter_map(|e| shapes.body_for(e))
            .collect();
        let attached = missing.len();
        for body in missing {
            self.bodies.insert(body.entity, body);
        }
        if attached > 0 {
            self.bodies.sort_unstable_keys();
        }
        attached
    }

    /// Drop every entity, player, and body and return to frame 0.
    ///
    /// The seed is kept. The entity id counter restarts at 1.
    pub fn clear(&mut self) {
        *self = Self::new(self.seed);
    }

    // ── Checksum, snapshot, serialization ───────────────────────

    /// The 32-bit fingerprint of this frame. See [`checksum`](crate::checksum).
    pub fn calculate_checksum(&self) -> Checksum {
        checksum::compute(self.frame, self.entities.values(), self.players.values())
    }

    /// Deep copy of every registry plus frame and seed.
    pub fn create_snapshot(&self) -> GameStateData {
        GameStateData {
            frame: self.frame,
            seed: self.seed,
            entities: self.entities.values().cloned().collect(),
            players: self.players.values().cloned().collect(),
            bodies: self.bodies.values().copied().collect(),
        }
    }

    /// Replace all state with the contents of `data`.
    ///
    /// The entity id counter is recomputed as one past the largest live
    /// id (or 1 when there are none); no stored counter is trusted.
    ///
    /// References that [`GameStateData::validate`] would reject are not
    /// carried over: a player reference at or past the recomputed counter
    /// is cleared, since the next spawned entity would otherwise take it,
    /// and bodies of entities not in `data` are dropped.
    pub fn restore_snapshot(&mut self, data: &GameStateData) {
        let mut entities = data.entities.clone();
        entities.sort_unstable_by_key(|e| e.id);
        let mut players = data.players.clone();
        players.sort_unstable_by_key(|p| p.id);
        let mut bodies = data.bodies.clone();
        bodies.sort_unstable_by_key(|b| b.entity);

        let next = entities.last().map_or(EntityId::FIRST, |e| e.id.next());
        for p in &mut players {
            if p.entity.is_some_and(|e| e.0 == 0 || e >= next) {
                p.entity = None;
            }
        }

        self.frame = data.frame;
        self.seed = data.seed;
        self.next_entity_id = next;
        self.entities = entities.into_iter().map(|e| (e.id, e)).collect();
        self.players = players.into_iter().map(|p| (p.id, p)).collect();
        self.bodies = bodies
            .into_iter()
            .filter(|b| self.entities.contains_key(&b.entity))
            .map(|b| (b.entity, b))
            .collect();
    }

    /// Encode frame, seed, entities, and players. Bodies are excluded.
    ///
    /// Fails if a player refers to an entity id past the largest live one,
    /// which only direct [`remove_entity`](Self::remove_entity) calls can
    /// produce.
    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        codec::encode_state_data(&mut buf, &self.create_snapshot(), false)?;
        Ok(buf)
    }

    /// Decode a state produced by [`serialize`](Self::serialize).
    ///
    /// The result has no bodies; call [`sync_bodies`](Self::sync_bodies)
    /// to rebuild them. Fails on any structural problem, including
    /// trailing bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut data = codec::decode_state_data_exact(bytes)?;
        data.bodies.clear();
        Ok(Self::from_snapshot(&data))
    }
}

/// An immutable point-in-time copy of a [`GameState`].
///
/// Independent of the live state once created. Vectors are in ascending
/// id order when produced by [`GameState::create_snapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameStateData {
    /// Frame number.
    pub frame: FrameId,
    /// World seed.
    pub seed: u64,
    /// Entities.
    pub entities: Vec<Entity>,
    /// Players.
    pub players: Vec<Player>,
    /// Collision bodies.
    pub bodies: Vec<CollisionBody>,
}

impl GameStateData {
    /// The checksum the captured state had.
    pub fn checksum(&self) -> Checksum {
        checksum::compute(self.frame, &self.entities, &self.players)
    }

    /// Check the references between registries.
    ///
    /// A player may refer to a removed entity, but not to an id at or
    /// past the one a restore would allocate next. Every body must belong
    /// to an entity in `entities`.
    pub fn validate(&self) -> Result<(), StateError> {
        let next = self
            .entities
            .iter()
            .map(|e| e.id)
            .max()
            .map_or(EntityId::FIRST, EntityId::next);
        for p in &self.players {
            if let Some(entity) = p.entity.filter(|e| e.0 == 0 || *e >= next) {
                return Err(StateError::DanglingEntityRef {
                    player: p.id,
                    entity,
                });
            }
        }
        let live: BTreeSet<EntityId> = self.entities.iter().map(|e| e.id).collect();
        match self.bodies.iter().find(|b| !live.contains(&b.entity)) {
            Some(b) => Err(StateError::UnknownEntity { id: b.entity }),
            None => Ok(()),
        }
    }

    /// Encode including bodies, for snapshot transfer to a diverged peer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        codec::encode_state_data(&mut buf, self, true)?;
        Ok(buf)
    }

    /// Decode bytes from [`to_bytes`](Self::to_bytes) or
    /// [`GameState::serialize`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode_state_data_exact(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, EntityPayload};
    use proptest::prelude::*;
    use tandem_core::{Fixed, Vec2};
    use tandem_space::{Aabb, BodyKind};

    fn ship(x: i32, vx: i32) -> EntityDef {
        EntityDef::new(EntityKind::Ship)
            .at(Vec2::from_ints(x, 0))
            .moving(Vec2::from_ints(vx, 0))
    }

    fn unit_body(entity: EntityId) -> CollisionBody {
        CollisionBody::new(
            entity,
            Aabb::new(Vec2::ZERO, Vec2::from_ints(1, 1)),
            BodyKind::Dynamic,
        )
    }

    fn populated() -> GameState {
        let mut s = GameState::new(99);
        let a = s.add_entity(ship(0, 1));
        let b = s.add_entity(
            EntityDef::new(EntityKind::Avatar).with_payload(Entity::avatar_payload()),
        );
        s.attach_body(unit_body(b)).unwrap();
        s.attach_body(unit_body(a)).unwrap();
        s.add_player(Player::new(PlayerId(2), "B").with_entity(b))
            .unwrap();
        s.add_player(Player::new(PlayerId(1), "A").with_entity(a))
            .unwrap();
        s.set_frame(FrameId(17));
        s
    }

    #[test]
    fn scenario_identical_construction_identical_checksum() {
        let build = || {
            let mut s = GameState::new(12345);
            let id = s.add_entity(ship(0, 1).with_health(100));
            s.add_player(Player::new(PlayerId(1), "A").with_entity(id))
                .unwrap();
            s.next_frame();
            s
        };
        let (a, b) = (build(), build());
        assert_eq!(a.frame(), FrameId(1));
        assert_eq!(a.calculate_checksum(), b.calculate_checksum());
        assert_eq!(a.calculate_checksum(), Checksum(65_640));
    }

    #[test]
    fn entity_ids_increase_and_are_not_reused() {
        let mut s = GameState::new(0);
        let a = s.add_entity(ship(0, 0));
        let b = s.add_entity(ship(0, 0));
        assert_eq!((a, b), (EntityId(1), EntityId(2)));
        s.remove_entity(b);
        assert_eq!(s.add_entity(ship(0, 0)), EntityId(3));
    }

    #[test]
    fn remove_entity_cascades_body() {
        let mut s = populated();
        assert!(s.body(EntityId(1)).is_some());
        let removed = s.remove_entity(EntityId(1)).unwrap();
        assert_eq!(removed.kind, EntityKind::Ship);
        assert!(s.body(EntityId(1)).is_none());
        // Weak reference survives.
        assert_eq!(s.player(PlayerId(1)).unwrap().entity, Some(EntityId(1)));
        assert!(s.controlled_entity(PlayerId(1)).is_none());
    }

    #[test]
    fn player_validation() {
        let mut s = populated();
        assert_eq!(
            s.add_player(Player::new(PlayerId(1), "dup")),
            Err(StateError::DuplicatePlayer { id: PlayerId(1) })
        );
        assert_eq!(
            s.add_player(Player::new(PlayerId(3), "C").with_entity(EntityId(50))),
            Err(StateError::DanglingEntityRef {
                player: PlayerId(3),
                entity: EntityId(50)
            })
        );
        s.remove_entity(EntityId(2));
        assert!(s
            .add_player(Player::new(PlayerId(4), "D").with_entity(EntityId(2)))
            .is_ok());
    }

    #[test]
    fn attach_body_requires_live_entity() {
        let mut s = GameState::new(0);
        assert_eq!(
            s.attach_body(unit_body(EntityId(1))),
            Err(StateError::UnknownEntity { id: EntityId(1) })
        );
    }

    #[test]
    fn registries_iterate_in_id_order() {
        let s = populated();
        let players: Vec<PlayerId> = s.players().map(|p| p.id).collect();
        assert_eq!(players, vec![PlayerId(1), PlayerId(2)]);
        let bodies: Vec<EntityId> = s.bodies().map(|b| b.entity).collect();
        assert_eq!(bodies, vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn snapshot_is_independent_of_live_state() {
        let mut s = populated();
        let snap = s.create_snapshot();
        s.entity_mut(EntityId(1)).unwrap().health = 1;
        s.next_frame();
        assert_eq!(snap.frame, FrameId(17));
        assert_eq!(snap.entities[0].health, 100);
        assert_ne!(snap.checksum(), s.calculate_checksum());
    }

    #[test]
    fn restore_recomputes_next_id() {
        let mut s = populated();
        let snap = s.create_snapshot();
        s.add_entity(ship(0, 0));
        s.add_entity(ship(0, 0));
        assert_eq!(s.next_entity_id(), EntityId(5));
        s.restore_snapshot(&snap);
        assert_eq!(s.next_entity_id(), EntityId(3));

        let mut empty = GameStateData {
            entities: Vec::new(),
            ..snap
        };
        empty.players.clear();
        s.restore_snapshot(&empty);
        assert_eq!(s.next_entity_id(), EntityId::FIRST);
    }

    #[test]
    fn restore_never_hands_a_referenced_id_to_a_new_entity() {
        let data = GameStateData {
            frame: FrameId(3),
            seed: 1,
            entities: Vec::new(),
            players: vec![Player::new(PlayerId(1), "A").with_entity(EntityId(2))],
            bodies: vec![unit_body(EntityId(9))],
        };
        assert_eq!(
            data.validate(),
            Err(StateError::DanglingEntityRef {
                player: PlayerId(1),
                entity: EntityId(2)
            })
        );

        let mut s = GameState::from_snapshot(&data);
        assert!(s.body(EntityId(9)).is_none());
        assert_eq!(s.player(PlayerId(1)).unwrap().entity, None);
        s.add_entity(ship(0, 0));
        let second = s.add_entity(EntityDef::new(EntityKind::Pickup));
        assert_eq!(second, EntityId(2));
        assert!(s.controlled_entity(PlayerId(1)).is_none());
    }

    #[test]
    fn validate_accepts_refs_to_removed_entities() {
        let mut s = populated();
        s.remove_entity(EntityId(1));
        assert_eq!(s.create_snapshot().validate(), Ok(()));

        // Removing the highest referenced id leaves nothing to anchor it.
        s.remove_entity(EntityId(2));
        let data = s.create_snapshot();
        assert!(matches!(
            data.validate(),
            Err(StateError::DanglingEntityRef { .. })
        ));
        assert!(s.serialize().is_err());
        assert!(data.to_bytes().is_err());
    }

    #[test]
    fn clear_keeps_seed() {
        let mut s = populated();
        s.clear();
        assert_eq!(s.seed(), 99);
        assert_eq!(s.frame(), FrameId(0));
        assert_eq!(s.entity_count(), 0);
        assert_eq!(s.next_entity_id(), EntityId::FIRST);
    }

    #[test]
    fn serialize_excludes_bodies() {
        let s = populated();
        let back = GameState::deserialize(&s.serialize().unwrap()).unwrap();
        assert_eq!(back.frame(), s.frame());
        assert_eq!(back.seed(), s.seed());
        assert!(back.entities().eq(s.entities()));
        assert!(back.players().eq(s.players()));
        assert_eq!(back.bodies().count(), 0);
        assert_eq!(back.calculate_checksum(), s.calculate_checksum());
    }

    #[test]
    fn sync_bodies_rebuilds_from_templates() {
        let s = populated();
        let mut back = GameState::deserialize(&s.serialize().unwrap()).unwrap();
        assert_eq!(back.sync_bodies(&BodyShapes::default()), 2);
        assert_eq!(back.sync_bodies(&BodyShapes::default()), 0);
        let kinds: Vec<BodyKind> = back.bodies().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BodyKind::Dynamic, BodyKind::Dynamic]);
    }

    #[test]
    fn snapshot_bytes_include_bodies() {
        let s = populated();
        let data = s.create_snapshot();
        let back = GameStateData::from_bytes(&data.to_bytes().unwrap()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn frame_rng_depends_on_frame() {
        let mut s = GameState::new(5);
        let a = s.frame_rng().next_int();
        assert_eq!(a, s.frame_rng().next_int());
        s.next_frame();
        assert_ne!(a, s.frame_rng().next_int());
    }

    #[test]
    fn keyed_rng_separates_keys_within_a_frame() {
        let mut s = GameState::new(5);
        let draws = |s: &GameState, key| -> Vec<u32> {
            let mut rng = s.keyed_rng(key);
            (0..4).map(|_| rng.next_int()).collect()
        };
        let one = draws(&s, 1);
        assert_eq!(one, draws(&s, 1));
        assert_ne!(one, draws(&s, 9));
        let mut frame = s.frame_rng();
        assert_ne!(one, (0..4).map(|_| frame.next_int()).collect::<Vec<_>>());
        s.next_frame();
        assert_ne!(one, draws(&s, 1));
    }

    fn arb_def() -> impl Strategy<Value = EntityDef> {
        (
            0u8..5,
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<bool>(),
        )
            .prop_map(|(k, px, py, vx, vy, health, active)| {
                let kind = EntityKind::from_tag(k).unwrap();
                let mut def = EntityDef::new(kind)
                    .at(Vec2::new(Fixed::from_raw(px), Fixed::from_raw(py)))
                    .moving(Vec2::new(Fixed::from_raw(vx), Fixed::from_raw(vy)))
                    .with_health(health);
                if kind == EntityKind::Pickup {
                    def = def.with_payload(EntityPayload::Pickup { points: health });
                }
                if !active {
                    def = def.inactive();
                }
                def
            })
    }

    proptest! {
        #[test]
        fn snapshot_roundtrip_preserves_everything(
            defs in prop::collection::vec(arb_def(), 0..12),
            scores in prop::collection::vec(any::<i32>(), 0..6),
            frame in any::<u64>(),
            seed in any::<u64>(),
        ) {
            let mut s = GameState::new(seed);
            let ids: Vec<EntityId> = defs.into_iter().map(|d| s.add_entity(d)).collect();
            for (i, score) in scores.into_iter().enumerate() {
                let mut p = Player::new(PlayerId(i as u32 + 1), format!("p{i}"));
                p.score = score;
                p.entity = ids.get(i).copied();
                s.add_player(p).unwrap();
            }
            s.set_frame(FrameId(frame));

            let before = s.calculate_checksum();
            let snap = s.create_snapshot();
            s.add_entity(EntityDef::new(EntityKind::Ship));
            s.next_frame();
            s.restore_snapshot(&snap);

            prop_assert_eq!(s.calculate_checksum(), before);
            prop_assert_eq!(s.frame(), FrameId(frame));
            prop_assert_eq!(s.create_snapshot(), snap);
        }

        #[test]
        fn checksum_ignores_storage_order(
            defs in prop::collection::vec(arb_def(), 1..12),
            stream in any::<u64>(),
        ) {
            let mut s = GameState::new(1);
            for d in defs {
                s.add_entity(d);
            }
            s.add_player(Player::new(PlayerId(3), "c")).unwrap();
            s.add_player(Player::new(PlayerId(1), "a")).unwrap();

            let canonical = s.create_snapshot();
            let mut shuffled = canonical.clone();
            let mut rng = DeterministicRng::with_stream(7, stream);
            rng.shuffle_in_place(&mut shuffled.entities);
            rng.shuffle_in_place(&mut shuffled.players);

            prop_assert_eq!(shuffled.checksum(), canonical.checksum());
            prop_assert_eq!(
                GameState::from_snapshot(&shuffled).calculate_checksum(),
                s.calculate_checksum()
            );
        }

        #[test]
        fn serialize_roundtrip(
            defs in prop::collection::vec(arb_def(), 0..12),
            frame in any::<u64>(),
            seed in any::<u64>(),
        ) {
            let mut s = GameState::new(seed);
            for d in defs {
                s.add_entity(d);
            }
            s.set_frame(FrameId(frame));
            let back = GameState::deserialize(&s.serialize().unwrap()).unwrap();
            prop_assert_eq!(back.frame(), s.frame());
            prop_assert_eq!(back.seed(), s.seed());
            prop_assert!(back.entities().eq(s.entities()));
            prop_assert_eq!(back.next_entity_id(), s.next_entity_id());
        }
    }
}
