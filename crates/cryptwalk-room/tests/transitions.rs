//! Integration tests for the transition engine, its guards, and the spawn
//! director, driven tick by tick against the stock castle.

use std::sync::Arc;

use cryptwalk_room::{
    Catalog, CatalogBuilder, Denial, EngineConfig, EngineError, GuardOutcome, RoomEvent,
    SpawnConfig, SpawnDirector, TransitionEngine, TransitionPhase,
};
use cryptwalk_session::{DoorKey, Session, SessionConfig};
use cryptwalk_types::{
    Direction, DoorEdge, EnemySpawnDecl, FloorKind, Identity, KeyColor, PassageType, Position,
    RoomId, RoomNode, RoomType,
};

// =========================================================================
// Helpers
// =========================================================================

fn castle_engine(config: SessionConfig) -> TransitionEngine {
    let catalog = Catalog::castle().expect("stock castle should build");
    TransitionEngine::new(Arc::new(catalog), Session::new(config), EngineConfig::default())
}

fn with_keys(keys: &[KeyColor]) -> SessionConfig {
    SessionConfig {
        passage_access: Some(PassageType::Barrel),
        starting_keys: keys.to_vec(),
    }
}

/// Pumps the director and ticks the engine until neither has work left.
fn settle(engine: &mut TransitionEngine, director: &mut SpawnDirector, now: u64) {
    loop {
        let handled = director.pump(now, engine.session().tracker());
        engine.tick(now).expect("no collaborator failures");
        if handled == 0 {
            break;
        }
    }
}

fn room(engine: &TransitionEngine) -> &str {
    engine.current_room_id().expect("engine started").as_str()
}

// =========================================================================
// Locked doors and keys
// =========================================================================

#[test]
fn test_red_door_denied_without_key_then_passes_with_one() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let mut events = engine.subscribe();
    let before = engine.session().clone();

    let outcome = engine.request_door_transition(Direction::North).unwrap();

    assert_eq!(outcome, GuardOutcome::Denied(Denial::MissingKey(KeyColor::Red)));
    assert_eq!(engine.session(), &before);
    assert_eq!(room(&engine), "castle_hall");
    assert!(matches!(
        events.try_next(),
        Some(RoomEvent::AccessDenied { denial: Denial::MissingKey(KeyColor::Red), .. })
    ));

    engine.session_mut().inventory_mut().grant_key(KeyColor::Red);
    drop(events);
    let outcome = engine.request_door_transition(Direction::North).unwrap();

    assert_eq!(outcome, GuardOutcome::Passed);
    assert_eq!(room(&engine), "throne_room");
    assert_eq!(engine.session().inventory().key_count(KeyColor::Red), 0);
    assert!(
        engine
            .session()
            .doors()
            .is_unlocked(&DoorKey::new("castle_hall", Direction::North))
    );
}

#[test]
fn test_unlocked_door_stays_open_without_spending_more_keys() {
    let mut engine = castle_engine(with_keys(&[KeyColor::Red, KeyColor::Red]));
    engine.start().unwrap();

    for _ in 0..3 {
        assert!(engine.request_door_transition(Direction::North).unwrap().is_passed());
        assert!(engine.request_door_transition(Direction::South).unwrap().is_passed());
    }

    assert_eq!(room(&engine), "castle_hall");
    assert_eq!(engine.session().inventory().key_count(KeyColor::Red), 1);
    assert_eq!(engine.session().inventory().consumed_count(KeyColor::Red), 1);
}

#[test]
fn test_red_key_spent_on_hall_cannot_open_tower() {
    let mut engine = castle_engine(with_keys(&[KeyColor::Red]));
    engine.start().unwrap();

    engine.request_door_transition(Direction::North).unwrap();
    engine.request_floor_transition(FloorKind::StairsUp).unwrap();
    engine.request_door_transition(Direction::North).unwrap();
    assert_eq!(room(&engine), "tower_stair");

    let outcome = engine.request_door_transition(Direction::North).unwrap();
    assert_eq!(outcome, GuardOutcome::Denied(Denial::MissingKey(KeyColor::Red)));
    assert_eq!(room(&engine), "tower_stair");
}

// =========================================================================
// Concurrency: one transition at a time
// =========================================================================

#[test]
fn test_second_request_in_same_tick_is_blocked() {
    let mut engine = castle_engine(with_keys(&[KeyColor::Red]));
    engine.start().unwrap();
    let mut director = SpawnDirector::new(engine.subscribe(), SpawnConfig::default());
    settle(&mut engine, &mut director, 0);

    let first = engine.request_door_transition(Direction::East).unwrap();
    let snapshot = engine.session().clone();
    let second = engine.request_door_transition(Direction::North).unwrap();

    assert_eq!(first, GuardOutcome::Passed);
    assert_eq!(second, GuardOutcome::Blocked);
    assert_eq!(engine.session(), &snapshot);
    assert_eq!(engine.session().inventory().key_count(KeyColor::Red), 1);

    settle(&mut engine, &mut director, 1);
    assert_eq!(room(&engine), "east_gallery");
    assert_eq!(engine.phase(), TransitionPhase::Idle);
}

#[test]
fn test_events_arrive_in_lifecycle_order() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let mut events = engine.subscribe();

    engine.request_door_transition(Direction::South).unwrap();

    let mut names = Vec::new();
    while !names.contains(&"traveler_placed") {
        let event = events.try_next().expect("transition still waiting on holds");
        names.push(event.name());
        drop(event);
        engine.advance().unwrap();
    }

    assert_eq!(names, vec!["room_unloading", "room_loaded", "traveler_placed"]);
}

#[test]
fn test_floor_change_is_flagged() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    engine.request_door_transition(Direction::South).unwrap();
    let mut events = engine.subscribe();

    engine.request_floor_transition(FloorKind::StairsDown).unwrap();
    drop(events.try_next());
    engine.advance().unwrap();

    let Some(RoomEvent::Loaded { room, previous, floor_changed, .. }) = events.try_next() else {
        panic!("expected RoomLoaded");
    };
    assert_eq!(room.room_id.as_str(), "basement_hall");
    assert_eq!(previous, Some(RoomId::new("gatehouse")));
    assert!(floor_changed);
}

// =========================================================================
// Arrival placement
// =========================================================================

#[test]
fn test_arrival_zeroes_velocity() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    engine.session_mut().traveler_mut().velocity.x = 3.0;

    engine.request_door_transition(Direction::West).unwrap();

    let traveler = engine.session().traveler();
    assert!(traveler.velocity.is_zero());
    // Through the hall's west door, onto west_gallery's east entry.
    assert_eq!(traveler.position, Position::new(9, 4));
}

#[test]
fn test_stairs_arrive_beside_counterpart() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    engine.request_door_transition(Direction::South).unwrap();

    engine.request_floor_transition(FloorKind::StairsDown).unwrap();

    // basement_hall's stairs up sit at (9, 1); arrivals step one tile off.
    assert_eq!(engine.session().traveler().position, Position::new(9, 2));
}

#[test]
fn test_secret_passage_needs_access() {
    let mut engine = castle_engine(SessionConfig {
        passage_access: Some(PassageType::Clock),
        starting_keys: vec![],
    });
    engine.start().unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    assert_eq!(room(&engine), "library");

    let outcome = engine
        .request_secret_transition(PassageType::Bookcase, &RoomId::new("study"))
        .unwrap();
    assert_eq!(outcome, GuardOutcome::Denied(Denial::NoPassageAccess(PassageType::Bookcase)));

    let missing = engine
        .request_secret_transition(PassageType::Clock, &RoomId::new("study"))
        .unwrap();
    assert_eq!(missing, GuardOutcome::Denied(Denial::NoEdge));
}

#[test]
fn test_secret_passage_arrives_at_return_passage() {
    let mut engine = castle_engine(SessionConfig {
        passage_access: Some(PassageType::Bookcase),
        starting_keys: vec![],
    });
    engine.start().unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    engine.request_door_transition(Direction::West).unwrap();

    let outcome = engine
        .request_secret_transition(PassageType::Bookcase, &RoomId::new("study"))
        .unwrap();

    assert_eq!(outcome, GuardOutcome::Passed);
    assert_eq!(room(&engine), "study");
    assert_eq!(engine.session().traveler().position, Position::new(2, 1));
}

// =========================================================================
// Hidden and one-way doors
// =========================================================================

#[test]
fn test_hidden_door_passable_after_reveal() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    engine.request_door_transition(Direction::North).unwrap();
    assert_eq!(room(&engine), "chapel");

    assert_eq!(
        engine.request_door_transition(Direction::East).unwrap(),
        GuardOutcome::Denied(Denial::Hidden)
    );

    assert!(engine.reveal_door(&RoomId::new("chapel"), Direction::East).unwrap());
    assert!(!engine.reveal_door(&RoomId::new("chapel"), Direction::East).unwrap());
    assert!(engine.request_door_transition(Direction::East).unwrap().is_passed());
    assert_eq!(room(&engine), "throne_room");
}

#[test]
fn test_one_way_door_refuses_reverse_travel() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    engine.request_door_transition(Direction::South).unwrap();
    engine.request_floor_transition(FloorKind::StairsDown).unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    assert_eq!(room(&engine), "ossuary");

    assert_eq!(
        engine.request_door_transition(Direction::South).unwrap(),
        GuardOutcome::Denied(Denial::WrongWay)
    );

    // The other way round is fine.
    engine.request_door_transition(Direction::East).unwrap();
    engine.request_door_transition(Direction::South).unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    engine.request_door_transition(Direction::West).unwrap();
    assert_eq!(room(&engine), "well_room");
    assert!(engine.request_door_transition(Direction::North).unwrap().is_passed());
    assert_eq!(room(&engine), "ossuary");
}

// =========================================================================
// Aborts and failures
// =========================================================================

fn dangling_catalog() -> Catalog {
    CatalogBuilder::new()
        .room(
            RoomNode::new("hall", 1, RoomType::Hall)
                .start_room()
                .door(Direction::North, DoorEdge::locked("nowhere", KeyColor::Red)),
        )
        .build_unchecked()
}

#[test]
fn test_missing_destination_aborts_with_no_side_effects() {
    let mut engine = TransitionEngine::new(
        Arc::new(dangling_catalog()),
        Session::new(with_keys(&[KeyColor::Red])),
        EngineConfig::default(),
    );
    engine.start().unwrap();
    let mut events = engine.subscribe();
    let before = engine.session().clone();

    let result = engine.request_door_transition(Direction::North);

    assert!(matches!(
        result,
        Err(EngineError::DestinationNotFound(id)) if id.as_str() == "nowhere"
    ));
    assert_eq!(engine.session(), &before);
    assert_eq!(engine.phase(), TransitionPhase::Idle);
    assert_eq!(room(&engine), "hall");
    assert!(events.try_next().is_none());
}

#[test]
fn test_failed_unload_returns_to_old_room_without_spending_key() {
    let mut engine = castle_engine(with_keys(&[KeyColor::Red]));
    engine.start().unwrap();
    let mut events = engine.subscribe();
    let before = engine.session().clone();

    engine.request_door_transition(Direction::North).unwrap();
    let Some(RoomEvent::Unloading { hold, .. }) = events.try_next() else {
        panic!("expected RoomUnloading");
    };
    hold.fail("teardown crashed");

    let result = engine.tick(1);

    assert!(matches!(
        result,
        Err(EngineError::CollaboratorFailed { phase: TransitionPhase::Unloading, .. })
    ));
    assert_eq!(room(&engine), "castle_hall");
    // The old room is reloaded under a fresh hold before anything else.
    assert_eq!(engine.phase(), TransitionPhase::Loading);
    assert_eq!(engine.request_door_transition(Direction::North).unwrap(), GuardOutcome::Blocked);
    assert!(matches!(
        events.try_next(),
        Some(RoomEvent::Loaded { room, .. }) if room.room_id.as_str() == "castle_hall"
    ));
    engine.advance().unwrap();
    assert_eq!(engine.phase(), TransitionPhase::Idle);
    assert_eq!(engine.session(), &before);
    assert!(events.try_next().is_none());

    // The engine is usable afterwards.
    drop(events);
    assert!(engine.request_door_transition(Direction::North).unwrap().is_passed());
    assert_eq!(room(&engine), "throne_room");
}

#[test]
fn test_retry_after_failed_unload_waits_for_old_room_to_repopulate() {
    let catalog = CatalogBuilder::new()
        .room(
            RoomNode::new("a", 1, RoomType::Hall)
                .start_room()
                .door(Direction::East, DoorEdge::open("b"))
                .enemy(EnemySpawnDecl::new("rat", (2, 2))),
        )
        .room(
            RoomNode::new("b", 1, RoomType::Hall)
                .door(Direction::West, DoorEdge::open("a"))
                .enemy(EnemySpawnDecl::new("bat", (3, 3))),
        )
        .build()
        .unwrap();
    let mut engine =
        TransitionEngine::new(Arc::new(catalog), Session::default(), EngineConfig::default());
    let mut director = SpawnDirector::new(
        engine.subscribe(),
        SpawnConfig {
            spawn_delay_ticks: 3,
            ..SpawnConfig::default()
        },
    );
    engine.start().unwrap();
    for now in 0..=3 {
        settle(&mut engine, &mut director, now);
    }
    assert_eq!(director.live_in(&RoomId::new("a")), 1);

    let mut saboteur = engine.subscribe();
    engine.request_door_transition(Direction::East).unwrap();
    let Some(RoomEvent::Unloading { hold, .. }) = saboteur.try_next() else {
        panic!("expected RoomUnloading");
    };
    hold.fail("teardown crashed");
    drop(saboteur);

    director.pump(4, engine.session().tracker());
    assert!(matches!(
        engine.tick(4),
        Err(EngineError::CollaboratorFailed { phase: TransitionPhase::Unloading, .. })
    ));

    // Room a is being repopulated; a retry now must not race it.
    assert_eq!(engine.request_door_transition(Direction::East).unwrap(), GuardOutcome::Blocked);
    for now in 4..=7 {
        settle(&mut engine, &mut director, now);
    }
    assert!(!engine.is_transitioning());
    assert_eq!(director.live_in(&RoomId::new("a")), 1);

    assert!(engine.request_door_transition(Direction::East).unwrap().is_passed());
    for now in 8..=12 {
        settle(&mut engine, &mut director, now);
    }
    assert_eq!(room(&engine), "b");
    assert_eq!(director.live_in(&RoomId::new("a")), 0);
    assert_eq!(director.live_in(&RoomId::new("b")), 1);
}

#[test]
fn test_failed_load_still_completes_transition() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let mut events = engine.subscribe();

    engine.request_door_transition(Direction::East).unwrap();
    drop(events.try_next());
    engine.tick(1).unwrap();
    let Some(RoomEvent::Loaded { hold, .. }) = events.try_next() else {
        panic!("expected RoomLoaded");
    };
    hold.fail("spawn table missing");

    let result = engine.tick(2);

    assert!(matches!(
        result,
        Err(EngineError::CollaboratorFailed { phase: TransitionPhase::Loading, .. })
    ));
    assert_eq!(room(&engine), "east_gallery");
    assert_eq!(engine.phase(), TransitionPhase::Idle);
    assert!(matches!(events.try_next(), Some(RoomEvent::TravelerPlaced { .. })));
}

#[test]
fn test_stalled_collaborator_keeps_engine_waiting() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let _silent = engine.subscribe();

    engine.request_door_transition(Direction::East).unwrap();
    engine.tick(10_000).unwrap();

    assert_eq!(engine.phase(), TransitionPhase::Unloading);
    assert_eq!(room(&engine), "castle_hall");
    assert_eq!(engine.outstanding_holds(), 1);
}

// =========================================================================
// Persistence across visits
// =========================================================================

#[test]
fn test_collected_acg_a_is_gone_on_reentry() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let mut director = SpawnDirector::new(
        engine.subscribe(),
        SpawnConfig {
            rng_seed: Some(42),
            ..SpawnConfig::default()
        },
    );
    settle(&mut engine, &mut director, 0);

    let mut now = 0;
    let mut walk = |engine: &mut TransitionEngine, director: &mut SpawnDirector, step: Step| {
        now += 1;
        let outcome = match step {
            Step::Door(dir) => engine.request_door_transition(dir),
            Step::Floor(kind) => engine.request_floor_transition(kind),
        };
        assert_eq!(outcome.unwrap(), GuardOutcome::Passed);
        settle(engine, director, now);
    };

    walk(&mut engine, &mut director, Step::Door(Direction::South));
    walk(&mut engine, &mut director, Step::Floor(FloorKind::StairsDown));
    walk(&mut engine, &mut director, Step::Door(Direction::South));
    walk(&mut engine, &mut director, Step::Door(Direction::West));
    assert_eq!(room(&engine), "basement_treasure");

    let acg = director.find("ACG_A", (0, 0)).expect("ACG_A spawned on first visit");
    director
        .collect(acg, engine.session_mut().tracker_mut())
        .unwrap();
    assert!(
        engine
            .session()
            .tracker()
            .is_collected(&Identity::new("basement_treasure", "ACG_A", (0, 0)))
    );

    walk(&mut engine, &mut director, Step::Door(Direction::East));
    walk(&mut engine, &mut director, Step::Door(Direction::West));

    assert_eq!(room(&engine), "basement_treasure");
    assert!(director.find("ACG_A", (0, 0)).is_none());
    assert!(director.find("gold_coin", (6, 6)).is_some());
}

#[test]
fn test_unique_enemy_never_respawns() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let mut director = SpawnDirector::new(engine.subscribe(), SpawnConfig::default());
    settle(&mut engine, &mut director, 0);

    engine.request_door_transition(Direction::East).unwrap();
    settle(&mut engine, &mut director, 1);
    engine.request_door_transition(Direction::North).unwrap();
    settle(&mut engine, &mut director, 2);
    assert_eq!(room(&engine), "armory");

    let armor = director.find("animated_armor", (5, 4)).unwrap();
    director.kill(armor, engine.session_mut().tracker_mut()).unwrap();

    for now in 3..6 {
        engine.request_door_transition(Direction::South).unwrap();
        settle(&mut engine, &mut director, now * 2);
        engine.request_door_transition(Direction::North).unwrap();
        settle(&mut engine, &mut director, now * 2 + 1);
        assert!(director.find("animated_armor", (5, 4)).is_none());
    }
}

#[test]
fn test_deferred_despawn_and_spawn_span_ticks() {
    let mut engine = castle_engine(with_keys(&[]));
    engine.start().unwrap();
    let mut director = SpawnDirector::new(
        engine.subscribe(),
        SpawnConfig {
            spawn_delay_ticks: 2,
            despawn_delay_ticks: 3,
            rng_seed: Some(1),
        },
    );
    settle(&mut engine, &mut director, 0);
    settle(&mut engine, &mut director, 2);
    assert!(!engine.is_transitioning());

    engine.request_door_transition(Direction::East).unwrap();
    settle(&mut engine, &mut director, 3);
    assert_eq!(engine.phase(), TransitionPhase::Unloading);

    settle(&mut engine, &mut director, 6);
    assert_eq!(engine.phase(), TransitionPhase::Loading);
    assert_eq!(room(&engine), "east_gallery");

    settle(&mut engine, &mut director, 8);
    assert_eq!(engine.phase(), TransitionPhase::Idle);
}

#[test]
fn test_new_game_forgets_progress_and_returns_to_start() {
    let mut engine = castle_engine(with_keys(&[KeyColor::Red]));
    engine.start().unwrap();
    engine.request_door_transition(Direction::North).unwrap();
    engine
        .session_mut()
        .tracker_mut()
        .mark_killed(Identity::new("armory", "animated_armor", (5, 4)));

    engine.new_game().unwrap();

    assert_eq!(room(&engine), "castle_hall");
    assert_eq!(engine.session().inventory().key_count(KeyColor::Red), 1);
    assert_eq!(engine.session().tracker().killed_count(), 0);
    assert!(
        !engine
            .session()
            .doors()
            .is_unlocked(&DoorKey::new("castle_hall", Direction::North))
    );
}

#[derive(Clone, Copy)]
enum Step {
    Door(Direction),
    Floor(FloorKind),
}
