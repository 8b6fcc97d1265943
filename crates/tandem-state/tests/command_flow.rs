//! End-to-end command application over several frames, followed by a
//! save/load cycle that must reproduce the checksum.

use tandem_core::{Fixed, FrameId, PlayerId, Vec2};
use tandem_state::{
    Action, BodyShapes, CodecError, Command, CommandError, EntityDef, GameState,
};

fn cmd(state: &GameState, player: u32, action: Action) -> Command {
    Command::new(state.frame(), PlayerId(player), action)
}

fn lobby() -> GameState {
    let mut s = GameState::new(4242);
    s.add_entity(EntityDef::platform(
        Vec2::from_ints(0, 300),
        Vec2::from_ints(600, 20),
    ));
    for p in [2, 1] {
        cmd(&s, p, Action::Join { name: format!("p{p}") })
            .apply(&mut s)
            .unwrap();
    }
    s.sync_bodies(&BodyShapes::default());
    s
}

#[test]
fn commands_over_frames_then_save_and_load() {
    let mut s = lobby();
    s.next_frame();
    cmd(&s, 1, Action::Move { velocity: Vec2::from_ints(3, 9) })
        .apply(&mut s)
        .unwrap();
    cmd(&s, 2, Action::Jump { impulse: Fixed::from_int(5) })
        .apply(&mut s)
        .unwrap();
    s.next_frame();
    cmd(&s, 2, Action::Fire { velocity: Vec2::from_ints(-4, 0), ttl: 10 })
        .apply(&mut s)
        .unwrap();
    s.next_frame();

    let mover = s.controlled_entity(PlayerId(1)).unwrap();
    // avatars only take the horizontal component
    assert_eq!(mover.velocity.x, Fixed::from_int(3));
    assert_eq!(mover.velocity.y, Fixed::ZERO);

    let bytes = s.serialize().unwrap();
    let mut loaded = GameState::deserialize(&bytes).unwrap();
    assert_eq!(loaded.frame(), FrameId(3));
    assert_eq!(loaded.seed(), 4242);
    assert_eq!(loaded.bodies().count(), 0);
    assert_eq!(loaded.calculate_checksum(), s.calculate_checksum());

    loaded.sync_bodies(&BodyShapes::default());
    assert_eq!(loaded.bodies().count(), s.bodies().count());
}

#[test]
fn stale_and_invalid_commands_are_rejected_without_side_effects() {
    let mut s = lobby();
    let before = s.calculate_checksum();

    let stale = Command::new(FrameId(9), PlayerId(1), Action::Idle);
    assert!(matches!(
        stale.apply(&mut s),
        Err(CommandError::FrameMismatch { .. })
    ));
    let stranger = cmd(&s, 7, Action::Leave);
    assert!(matches!(
        stranger.apply(&mut s),
        Err(CommandError::UnknownPlayer { .. })
    ));
    let rejoin = cmd(&s, 1, Action::Join { name: "again".into() });
    assert!(matches!(
        rejoin.apply(&mut s),
        Err(CommandError::PlayerAlreadyJoined { .. })
    ));
    assert_eq!(s.calculate_checksum(), before);
}

#[test]
fn truncated_state_fails_fast() {
    let bytes = lobby().serialize().unwrap();
    for cut in [0, 3, bytes.len() / 2, bytes.len() - 1] {
        let err = GameState::deserialize(&bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, CodecError::Io(_) | CodecError::Malformed { .. }),
            "cut at {cut}: {err}"
        );
    }

    let mut bad = bytes.clone();
    bad[0] ^= 0xFF;
    assert!(GameState::deserialize(&bad).is_err());
}
