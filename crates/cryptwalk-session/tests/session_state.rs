//! Integration tests for the session aggregate.

use cryptwalk_session::{DoorKey, Session, SessionConfig, Velocity};
use cryptwalk_types::{Direction, Identity, KeyColor, PassageType, Position};

fn config() -> SessionConfig {
    SessionConfig {
        passage_access: Some(PassageType::Bookcase),
        starting_keys: vec![KeyColor::Red, KeyColor::Red, KeyColor::Blue],
    }
}

#[test]
fn test_new_session_applies_starting_config() {
    let session = Session::new(config());

    assert_eq!(session.inventory().key_count(KeyColor::Red), 2);
    assert_eq!(session.inventory().key_count(KeyColor::Blue), 1);
    assert_eq!(session.inventory().consumed_count(KeyColor::Red), 0);
    assert!(session.traveler().can_operate(PassageType::Bookcase));
    assert_eq!(session.tracker().collected_count(), 0);
}

#[test]
fn test_new_game_restores_starting_state() {
    let mut session = Session::new(config());
    let fresh = session.clone();

    session
        .inventory_mut()
        .consume_key(KeyColor::Red)
        .expect("red key held");
    session
        .doors_mut()
        .mark_unlocked(DoorKey::new("castle_hall", Direction::North));
    session
        .tracker_mut()
        .mark_collected(Identity::new("basement_treasure", "ACG_A", (0, 0)));
    session
        .tracker_mut()
        .mark_killed(Identity::new("crypt", "wraith", (3, 3)));
    session.traveler_mut().place(Position::new(9, 9));
    session.traveler_mut().velocity = Velocity { x: 1.0, y: 0.0 };
    assert_ne!(session, fresh);

    session.new_game();

    assert_eq!(session, fresh);
}

#[test]
fn test_clone_snapshot_detects_any_mutation() {
    // The engine's "no partial change" guarantee is checked by comparing
    // snapshots, so a single flipped flag must be visible.
    let mut session = Session::new(config());
    let snapshot = session.clone();

    session
        .doors_mut()
        .reveal(DoorKey::new("library", Direction::East));

    assert_ne!(session, snapshot);
}
