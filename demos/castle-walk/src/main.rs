use std::fmt;
use std::time::Duration;

use cryptwalk::prelude::*;

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Step {
    Go(Direction),
    Stairs(FloorKind),
    Passage(PassageType, &'static str),
    GrantKey(KeyColor),
    Collect(&'static str, (i32, i32)),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Go(dir) => write!(f, "go {dir}"),
            Step::Stairs(kind) => write!(f, "take {kind:?}"),
            Step::Passage(passage, to) => write!(f, "open {passage:?} to {to}"),
            Step::GrantKey(color) => write!(f, "pick up {color} key"),
            Step::Collect(template, (x, y)) => write!(f, "collect {template} at ({x}, {y})"),
        }
    }
}

/// Hall → throne room and back, down to the cellars, through the barrel
/// passage to the treasure room, and back in after looting it.
const SCRIPT: &[Step] = &[
    Step::Go(Direction::North),
    Step::GrantKey(KeyColor::Red),
    Step::Go(Direction::North),
    Step::Go(Direction::South),
    Step::Go(Direction::South),
    Step::Stairs(FloorKind::StairsDown),
    Step::Go(Direction::East),
    Step::Go(Direction::North),
    Step::Passage(PassageType::Barrel, "basement_treasure"),
    Step::Collect("ACG_A", (0, 0)),
    Step::Go(Direction::East),
    Step::Go(Direction::West),
    Step::Collect("ACG_A", (0, 0)),
];

/// One line of the walk log.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    step: String,
    result: String,
    room: Option<RoomId>,
}

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

fn describe(outcome: GuardOutcome) -> String {
    match outcome {
        GuardOutcome::Passed => "passed".into(),
        GuardOutcome::Denied(denial) => format!("denied: {denial}"),
        GuardOutcome::Blocked => "blocked".into(),
    }
}

async fn play(handle: &GameHandle, step: Step) -> Result<String, CryptwalkError> {
    let result = match step {
        Step::Go(dir) => describe(handle.go(dir).await?),
        Step::Stairs(kind) => describe(handle.take_stairs(kind).await?),
        Step::Passage(passage, to) => describe(handle.use_passage(passage, RoomId::new(to)).await?),
        Step::GrantKey(color) => {
            handle.grant_key(color).await?;
            "ok".into()
        }
        Step::Collect(template, at) => match handle.collect(template, at.into()).await? {
            true => "collected".into(),
            false => "nothing there".into(),
        },
    };
    Ok(result)
}

/// Waits for the in-flight transition (if any) to finish.
async fn settle(handle: &GameHandle, event_driven: bool) -> Result<GameSnapshot, CryptwalkError> {
    loop {
        let snapshot = handle.snapshot().await?;
        if !snapshot.phase.is_transitioning() {
            return Ok(snapshot);
        }
        if event_driven {
            handle.advance(1).await?;
        } else {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

async fn walk(
    handle: &GameHandle,
    script: &[Step],
    event_driven: bool,
) -> Result<Vec<Entry>, CryptwalkError> {
    let mut log = Vec::with_capacity(script.len());
    for step in script {
        let result = play(handle, *step).await?;
        let snapshot = settle(handle, event_driven).await?;
        tracing::info!(step = %step, result = %result, room = ?snapshot.room, "step done");
        log.push(Entry {
            step: step.to_string(),
            result,
            room: snapshot.room,
        });
    }
    Ok(log)
}

fn default_config() -> GameConfig {
    GameConfig {
        session: SessionConfig {
            passage_access: Some(PassageType::Barrel),
            starting_keys: Vec::new(),
        },
        tick_rate_hz: 30,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cryptwalk::init_tracing("info");

    // An optional JSON config path replaces the defaults.
    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_json(&tokio::fs::read(path).await?)?,
        None => default_config(),
    };
    let tick = config.tick_config();
    let event_driven = tick.tick_duration().is_none();

    let game = Game::builder().config(config).build()?;
    let runtime = GameRuntime::new(game, tick)?;
    let handle = runtime.handle();

    let walker = tokio::spawn(async move {
        let log = walk(&handle, SCRIPT, event_driven).await;
        handle.shutdown();
        log
    });
    let last = runtime.run().await?;

    for entry in walker.await?? {
        let room = entry.room.as_ref().map_or("-", RoomId::as_str);
        println!("{:<36} {:<28} {room}", entry.step, entry.result);
    }
    println!("{}", serde_json::to_string_pretty(&last)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(config: GameConfig) -> (Vec<Entry>, GameSnapshot) {
        let tick = config.tick_config();
        let event_driven = tick.tick_duration().is_none();
        let game = Game::builder().config(config).build().unwrap();
        let runtime = GameRuntime::new(game, tick).unwrap();
        let handle = runtime.handle();

        let walker = tokio::spawn(async move {
            let log = walk(&handle, SCRIPT, event_driven).await;
            handle.shutdown();
            log
        });
        let last = runtime.run().await.unwrap();
        (walker.await.unwrap().unwrap(), last)
    }

    fn results(log: &[Entry]) -> Vec<&str> {
        log.iter().map(|entry| entry.result.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_walks_to_treasure() {
        let (log, last) = run(default_config()).await;

        assert_eq!(log.len(), SCRIPT.len());
        assert_eq!(log[0].result, "denied: the door needs a red key");
        assert_eq!(log[2].room, Some(RoomId::new("throne_room")));
        assert_eq!(log[5].room, Some(RoomId::new("basement_hall")));
        assert_eq!(log[8].room, Some(RoomId::new("basement_treasure")));
        assert_eq!(log[9].result, "collected");
        assert_eq!(log[12].result, "nothing there");
        assert_eq!(last.collected, 1);
        assert_eq!(last.room, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_driven_matches_timed_walk() {
        let timed = run(default_config()).await.0;
        let event_driven = run(GameConfig {
            tick_rate_hz: 0,
            ..default_config()
        })
        .await
        .0;

        assert_eq!(results(&timed), results(&event_driven));
    }

    #[tokio::test(start_paused = true)]
    async fn test_east_door_of_basement_hall_is_locked() {
        let (log, _) = run(default_config()).await;

        assert_eq!(log[6].result, "denied: the door needs a green key");
        assert_eq!(log[6].room, Some(RoomId::new("basement_hall")));
    }
}
