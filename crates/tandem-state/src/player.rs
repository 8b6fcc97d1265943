//! Players: one per connected peer slot.

use tandem_core::{EntityId, PlayerId};

/// A participant in the session.
///
/// `entity` is a weak reference: the entity may be removed while the
/// player keeps the stale id. Look it up through the state before use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    /// Session-assigned identifier.
    pub id: PlayerId,
    /// Controlled entity, if any.
    pub entity: Option<EntityId>,
    /// Display name.
    pub name: String,
    /// Accumulated score.
    pub score: i32,
    /// Whether the player is currently connected.
    pub connected: bool,
}

impl Player {
    /// A connected player with no entity and zero score.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            entity: None,
            name: name.into(),
            score: 0,
            connected: true,
        }
    }

    /// Set the controlled entity.
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Raw entity id for checksums and the wire; `0` when unset.
    pub fn entity_raw(&self) -> u32 {
        self.entity.map_or(0, |e| e.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entity_folds_as_zero() {
        let p = Player::new(PlayerId(1), "A");
        assert_eq!(p.entity_raw(), 0);
        assert_eq!(p.with_entity(EntityId(4)).entity_raw(), 4);
    }
}
