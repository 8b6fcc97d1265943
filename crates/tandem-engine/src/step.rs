//! One deterministic simulation frame.
//!
//! [`FrameStepper::advance`] runs the fixed phase order every peer must
//! agree on:
//!
//! 1. apply the frame's commands in canonical order (ascending player id)
//! 2. age projectiles and drop expired ones
//! 3. apply gravity to falling kinds, clamp fall speed, integrate velocity
//! 4. rebuild missing bodies, resolve collisions in canonical pair order
//! 5. apply contact effects (landing, pickups, projectile hits)
//! 6. advance the frame counter and fingerprint the result

use tandem_core::{EntityId, FrameId, PlayerId};
use tandem_space::{collision::displacement, BodyProxy, CollisionSystem, Contact, ContactKind};
use tandem_state::{
    Checksum, Command, CommandError, Entity, EntityKind, EntityPayload, GameState,
};
use tracing::{debug, warn};

use crate::config::{CollisionConfig, ConfigError, PhysicsConfig};

/// A command that failed validation and was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedCommand {
    /// The dropped command.
    pub command: Command,
    /// Why it was rejected.
    pub error: CommandError,
}

/// Outcome of one [`FrameStepper::advance`] call.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    /// Frame the state is on after the step.
    pub frame: FrameId,
    /// Checksum of the state after the step.
    pub checksum: Checksum,
    /// Number of commands applied.
    pub applied: usize,
    /// Commands that were dropped, in application order.
    pub rejected: Vec<RejectedCommand>,
    /// Contacts in canonical pair order.
    pub contacts: Vec<Contact>,
    /// Projectiles whose lifetime ran out.
    pub expired: Vec<EntityId>,
    /// Pickups collected and projectiles spent on a hit.
    pub consumed: Vec<EntityId>,
}

/// Advances a [`GameState`] by one frame.
///
/// Holds the collision system between frames; all simulation state lives
/// in the `GameState` passed to [`advance`](Self::advance), so the same
/// stepper can re-drive a restored snapshot during rollback.
#[derive(Clone, Debug)]
pub struct FrameStepper {
    physics: PhysicsConfig,
    collision: CollisionConfig,
    system: CollisionSystem,
    proxies: Vec<BodyProxy>,
}

impl FrameStepper {
    /// Build a stepper. Fails if the collision grid is invalid.
    pub fn new(physics: PhysicsConfig, collision: CollisionConfig) -> Result<Self, ConfigError> {
        let system = CollisionSystem::new(collision.cell_size)?;
        Ok(Self {
            physics,
            collision,
            system,
            proxies: Vec::new(),
        })
    }

    /// Motion parameters.
    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Collision parameters.
    pub fn collision(&self) -> &CollisionConfig {
        &self.collision
    }

    /// Run one frame of `commands` against `state`.
    ///
    /// Commands may be given in any order; they are applied sorted by
    /// player, keeping the given order among one player's commands. A
    /// rejected command is logged and skipped without touching the state.
    pub fn advance(&mut self, state: &mut GameState, commands: &[Command]) -> FrameReport {
        let mut report = FrameReport::default();

        let mut ordered: Vec<&Command> = commands.iter().collect();
        ordered.sort_by_key(|c| c.player);
        for cmd in ordered {
            match cmd.apply(state) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!(frame = %cmd.frame, player = %cmd.player, action = cmd.action.name(), %error, "command rejected");
                    report.rejected.push(RejectedCommand {
                        command: cmd.clone(),
                        error,
                    });
                }
            }
        }

        report.expired = expire_projectiles(state);
        self.integrate(state);
        report.contacts = self.collide(state);
        report.consumed = self.apply_contacts(state, &report.contacts);

        report.frame = state.next_frame();
        report.checksum = state.calculate_checksum();
        debug!(
            frame = %report.frame,
            checksum = %report.checksum,
            applied = report.applied,
            rejected = report.rejected.len(),
            contacts = report.contacts.len(),
            "frame advanced"
        );
        report
    }

    fn integrate(&self, state: &mut GameState) {
        let PhysicsConfig {
            gravity,
            max_fall_speed,
            ..
        } = self.physics;
        for e in state.entities_mut().filter(|e| e.active) {
            if e.kind.falls() {
                e.velocity += gravity;
                e.velocity.y = e.velocity.y.min(max_fall_speed);
            }
            e.position += e.velocity;
        }
    }

    fn collide(&mut self, state: &mut GameState) -> Vec<Contact> {
        state.sync_bodies(&self.collision.shapes);

        self.proxies.clear();
        for body in state.bodies() {
            if let Some(e) = state.entity(body.entity).filter(|e| e.active) {
                self.proxies.push(body.proxy(e.position, e.velocity));
            }
        }
        let before: Vec<BodyProxy> = self.proxies.clone();
        let contacts = self.system.resolve(&mut self.proxies);

        // `resolve` sorts by entity id; `bodies()` is already in id order.
        for (old, new) in before.iter().zip(&self.proxies) {
            if old == new {
                continue;
            }
            if let Some(e) = state.entity_mut(new.entity) {
                e.position += displacement(&old.bounds, &new.bounds);
                e.velocity = new.velocity;
            }
        }
        contacts
    }

    fn apply_contacts(&self, state: &mut GameState, contacts: &[Contact]) -> Vec<EntityId> {
        let mut consumed = Vec::new();
        for c in contacts {
            match c.kind {
                ContactKind::Solid => {
                    for id in [c.a, c.b] {
                        let landed = c.push_for(id).is_some_and(|p| p.y.is_negative());
                        if landed {
                            refill_jumps(state, id);
                        }
                    }
                }
                ContactKind::Trigger => {
                    for (this, other) in [(c.a, c.b), (c.b, c.a)] {
                        if let Some(id) = self.trigger(state, this, other) {
                            consumed.push(id);
                        }
                    }
                }
            }
        }
        consumed
    }

    /// Effect of trigger entity `this` touching `other`. Returns `this` if
    /// it was consumed.
    fn trigger(&self, state: &mut GameState, this: EntityId, other: EntityId) -> Option<EntityId> {
        let trigger = state.entity(this).filter(|e| e.active)?.clone();
        let target = state.entity(other).filter(|e| e.active)?.clone();
        match trigger.payload? {
            EntityPayload::Pickup { points } if target.kind == EntityKind::Avatar => {
                let collector = controller_of(state, other)?;
                if let Some(p) = state.player_mut(collector) {
                    p.score = p.score.saturating_add(points);
                }
                state.remove_entity(this);
                Some(this)
            }
            EntityPayload::Projectile { owner, .. } => {
                self.projectile_hit(state, &trigger, owner, &target)
            }
            _ => None,
        }
    }

    fn projectile_hit(
        &self,
        state: &mut GameState,
        projectile: &Entity,
        owner: PlayerId,
        target: &Entity,
    ) -> Option<EntityId> {
        match target.kind {
            EntityKind::Platform => {
                state.remove_entity(projectile.id);
                Some(projectile.id)
            }
            EntityKind::Avatar | EntityKind::Ship => {
                if controller_of(state, target.id) == Some(owner) {
                    return None;
                }
                let defeated = {
                    let t = state.entity_mut(target.id)?;
                    t.health = t.health.saturating_sub(self.physics.projectile_damage);
                    if t.health <= 0 {
                        t.health = 0;
                        t.active = false;
                    }
                    !t.active
                };
                if defeated {
                    if let Some(p) = state.player_mut(owner) {
                        p.score = p.score.saturating_add(1);
                    }
                }
                state.remove_entity(projectile.id);
                Some(projectile.id)
            }
            EntityKind::Projectile | EntityKind::Pickup => None,
        }
    }
}

/// Decrement every projectile's lifetime and remove those that reach zero.
fn expire_projectiles(state: &mut GameState) -> Vec<EntityId> {
    let mut expired = Vec::new();
    for e in state.entities_mut() {
        if let Some(EntityPayload::Projectile { ttl, .. }) = &mut e.payload {
            *ttl = ttl.saturating_sub(1);
            if *ttl == 0 {
                expired.push(e.id);
            }
        }
    }
    for &id in &expired {
        state.remove_entity(id);
    }
    expired
}

fn refill_jumps(state: &mut GameState, id: EntityId) {
    if let Some(e) = state.entity_mut(id) {
        if let Some(EntityPayload::Avatar { jumps_left, .. }) = &mut e.payload {
            *jumps_left = Entity::AVATAR_JUMPS;
        }
    }
}

/// The connected player whose controlled entity is `entity`.
fn controller_of(state: &GameState, entity: EntityId) -> Option<PlayerId> {
    state
        .players()
        .find(|p| p.connected && p.entity == Some(entity))
        .map(|p| p.id)
}
