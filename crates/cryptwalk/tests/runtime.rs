//! Integration tests for the async runtime.
//!
//! Uses `start_paused = true` so tokio's clock auto-advances while the
//! test awaits, and scheduled ticks fire without real waiting.

use std::time::Duration;

use cryptwalk::prelude::*;

fn castle() -> Game {
    Game::builder()
        .session_config(SessionConfig {
            passage_access: Some(PassageType::Barrel),
            starting_keys: vec![KeyColor::Red],
        })
        .build()
        .expect("stock castle should build")
}

#[tokio::test(start_paused = true)]
async fn test_timed_runtime_finishes_transition_on_tick() {
    let runtime = GameRuntime::new(castle(), TickConfig::with_rate(20)).unwrap();
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    assert_eq!(handle.go(Direction::North).await.unwrap(), GuardOutcome::Passed);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.room, Some(RoomId::new("throne_room")));
    assert_eq!(snapshot.phase, TransitionPhase::Idle);
    assert_eq!(snapshot.keys_held, 0);
    assert!(snapshot.tick >= 1);

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_event_driven_request_spends_one_tick() {
    let runtime = GameRuntime::new(castle(), TickConfig::default()).unwrap();
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.go(Direction::South).await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.room, Some(RoomId::new("gatehouse")));
    assert_eq!(snapshot.tick, 1);

    // Reads and pickups never move the clock.
    handle.reveal_door(RoomId::new("chapel"), Direction::East).await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().tick, 1);

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_handles_share_one_game() {
    let runtime = GameRuntime::new(castle(), TickConfig::default()).unwrap();
    let first = runtime.handle();
    let second = first.clone();
    let task = tokio::spawn(runtime.run());

    first.go(Direction::East).await.unwrap();
    second.go(Direction::North).await.unwrap();

    let snapshot = first.snapshot().await.unwrap();
    assert_eq!(snapshot.room, Some(RoomId::new("armory")));
    assert_eq!(snapshot.live_entities, 2);
    assert!(second.kill("animated_armor", Position::new(5, 4)).await.unwrap());
    assert_eq!(first.snapshot().await.unwrap().killed, 1);

    first.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_handles() {
    let runtime = GameRuntime::new(castle(), TickConfig::with_rate(10)).unwrap();
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.shutdown();
    let last = task.await.unwrap().unwrap();

    assert_eq!(last.room, None);
    assert_eq!(last.live_entities, 0);
    assert!(handle.is_closed());
    assert!(matches!(
        handle.go(Direction::South).await,
        Err(CryptwalkError::Closed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_lets_in_flight_transition_finish() {
    let game = Game::builder()
        .spawn_config(SpawnConfig {
            despawn_delay_ticks: 4,
            ..Default::default()
        })
        .build()
        .unwrap();
    let runtime = GameRuntime::new(game, TickConfig::default()).unwrap();
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.go(Direction::South).await.unwrap();
    assert!(handle.snapshot().await.unwrap().phase.is_transitioning());

    handle.shutdown();
    let last = task.await.unwrap().unwrap();

    assert_eq!(last.phase, TransitionPhase::Idle);
    assert!(last.tick >= 4);
}

fn is_unload_failure<T>(result: &Result<T, CryptwalkError>) -> bool {
    matches!(
        result,
        Err(CryptwalkError::Engine(EngineError::CollaboratorFailed {
            phase: TransitionPhase::Unloading,
            ..
        }))
    )
}

#[tokio::test(start_paused = true)]
async fn test_event_driven_request_reports_failed_hold() {
    let mut game = castle();
    game.start().unwrap();
    let mut saboteur = game.engine_mut().subscribe();
    let runtime = GameRuntime::new(game, TickConfig::default()).unwrap();
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    assert_eq!(handle.go(Direction::South).await.unwrap(), GuardOutcome::Passed);
    let Some(RoomEvent::Unloading { hold, .. }) = saboteur.try_next() else {
        panic!("expected RoomUnloading");
    };
    hold.fail("teardown crashed");
    drop(saboteur);

    // The next request's tick is the one that sees the failure.
    assert!(is_unload_failure(&handle.go(Direction::East).await));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.room, Some(RoomId::new("castle_hall")));
    assert_eq!(snapshot.phase, TransitionPhase::Idle);

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timed_runtime_stops_on_failed_hold() {
    let mut game = castle();
    game.start().unwrap();
    let mut saboteur = game.engine_mut().subscribe();
    let runtime = GameRuntime::new(game, TickConfig::with_rate(20)).unwrap();
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    assert_eq!(handle.go(Direction::South).await.unwrap(), GuardOutcome::Passed);
    let Some(RoomEvent::Unloading { hold, .. }) = saboteur.try_next() else {
        panic!("expected RoomUnloading");
    };
    hold.fail("teardown crashed");
    drop(saboteur);

    assert!(is_unload_failure(&task.await.unwrap()));
    assert!(handle.is_closed());
    assert!(matches!(handle.snapshot().await, Err(CryptwalkError::Closed)));
}
