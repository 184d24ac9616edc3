//! `GameRuntime` tick loop and the `GameHandle` request surface.
//!
//! The runtime paces a [`Game`] with a [`TickScheduler`]. Handles share the
//! same game behind a `tokio::sync::Mutex`, so input tasks and the tick loop
//! never touch the engine at the same time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cryptwalk_room::GuardOutcome;
use cryptwalk_tick::{TickConfig, TickScheduler};
use cryptwalk_types::{Direction, FloorKind, KeyColor, PassageType, Position, RoomId};
use tokio::sync::{Mutex, Notify};

use crate::{CryptwalkError, Game, GameSnapshot};

/// State shared between the runtime loop and every handle.
struct Shared {
    game: Mutex<Game>,
    event_driven: bool,
    stop: Notify,
    closed: AtomicBool,
}

/// Drives a [`Game`] on a fixed tick.
///
/// # Example
///
/// ```rust,no_run
/// use cryptwalk::prelude::*;
///
/// # async fn demo() -> Result<(), CryptwalkError> {
/// let game = Game::builder().build()?;
/// let runtime = GameRuntime::new(game, TickConfig::with_rate(30))?;
/// let handle = runtime.handle();
///
/// tokio::spawn(async move {
///     let _ = handle.go(Direction::South).await;
///     handle.shutdown();
/// });
/// let last = runtime.run().await?;
/// println!("stopped in {:?}", last.room);
/// # Ok(())
/// # }
/// ```
pub struct GameRuntime {
    shared: Arc<Shared>,
    scheduler: TickScheduler,
}

impl GameRuntime {
    /// Wraps `game`, starting it first if it hasn't been.
    ///
    /// With a tick rate of 0 the scheduler never fires; every request made
    /// through a handle then advances the game by one tick instead.
    ///
    /// # Errors
    /// Anything [`Game::start`] returns.
    pub fn new(mut game: Game, tick: TickConfig) -> Result<Self, CryptwalkError> {
        if game.current_room_id().is_none() {
            game.start()?;
        }
        let scheduler = TickScheduler::new(tick);
        let shared = Arc::new(Shared {
            game: Mutex::new(game),
            event_driven: scheduler.is_event_driven(),
            stop: Notify::new(),
            closed: AtomicBool::new(false),
        });
        Ok(Self { shared, scheduler })
    }

    /// Returns a new handle to the running game.
    pub fn handle(&self) -> GameHandle {
        GameHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Runs the tick loop until a handle calls
    /// [`shutdown`](GameHandle::shutdown).
    ///
    /// On shutdown any in-flight transition is allowed to finish, then the
    /// game is shut down and its last snapshot returned.
    ///
    /// # Errors
    /// The first error a tick reports, such as a collaborator failing a
    /// hold. The loop stops there and the game is wound down the same way
    /// as on shutdown.
    pub async fn run(mut self) -> Result<GameSnapshot, CryptwalkError> {
        tracing::info!(rate_hz = self.scheduler.tick_rate_hz(), "game runtime running");
        let shared = Arc::clone(&self.shared);

        let failure = loop {
            tokio::select! {
                _ = shared.stop.notified() => break None,
                info = self.scheduler.wait_for_tick() => {
                    let mut game = shared.game.lock().await;
                    if let Err(e) = game.advance_to(info.tick) {
                        tracing::error!(tick = info.tick, error = %e, "tick failed, stopping");
                        break Some(e);
                    }
                }
            }
        };

        let mut game = shared.game.lock().await;
        shared.closed.store(true, Ordering::Release);
        let wound_down = wind_down(&mut game);
        tracing::info!(tick = game.now(), "game runtime stopped");

        match failure {
            Some(e) => {
                if let Err(later) = wound_down {
                    tracing::warn!(error = %later, "shutdown after a failed tick also failed");
                }
                Err(e)
            }
            None => wound_down.map(|()| game.snapshot()),
        }
    }
}

/// Lets an in-flight transition finish, then shuts the game down.
fn wind_down(game: &mut Game) -> Result<(), CryptwalkError> {
    let budget = game.config().engine.stall_warning_ticks;
    match game.run_until_idle(budget) {
        Ok(true) => {}
        Ok(false) => tracing::warn!("transition still in flight at shutdown"),
        Err(e) => tracing::error!(error = %e, "transition failed during shutdown"),
    }
    game.shutdown()
}

/// A cloneable handle for issuing requests to a running game.
///
/// Every call returns [`CryptwalkError::Closed`] once the runtime has
/// stopped.
#[derive(Clone)]
pub struct GameHandle {
    shared: Arc<Shared>,
}

impl GameHandle {
    /// Asks to leave through the door in `direction`.
    pub async fn go(&self, direction: Direction) -> Result<GuardOutcome, CryptwalkError> {
        self.request(|game| game.go(direction)).await
    }

    pub async fn take_stairs(&self, kind: FloorKind) -> Result<GuardOutcome, CryptwalkError> {
        self.request(|game| game.take_stairs(kind)).await
    }

    pub async fn use_passage(
        &self,
        passage: PassageType,
        destination: RoomId,
    ) -> Result<GuardOutcome, CryptwalkError> {
        self.request(|game| game.use_passage(passage, &destination)).await
    }

    /// Resets the session and walks back to the start room.
    pub async fn new_game(&self) -> Result<(), CryptwalkError> {
        self.request(Game::new_game).await
    }

    pub async fn reveal_door(
        &self,
        room: RoomId,
        direction: Direction,
    ) -> Result<bool, CryptwalkError> {
        self.query(|game| game.reveal_door(&room, direction)).await
    }

    pub async fn grant_key(&self, color: KeyColor) -> Result<(), CryptwalkError> {
        self.query(|game| {
            game.grant_key(color);
            Ok(())
        })
        .await
    }

    /// Picks up an item in the current room. `Ok(false)` if there is no
    /// such item.
    pub async fn collect(
        &self,
        template: &str,
        position: Position,
    ) -> Result<bool, CryptwalkError> {
        self.query(|game| Ok(game.collect(template, position).is_some()))
            .await
    }

    /// Kills an enemy in the current room. `Ok(false)` if there is no
    /// such enemy.
    pub async fn kill(&self, template: &str, position: Position) -> Result<bool, CryptwalkError> {
        self.query(|game| Ok(game.kill(template, position).is_some()))
            .await
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, CryptwalkError> {
        self.query(|game| Ok(game.snapshot())).await
    }

    /// Advances the game by `ticks` by hand. Meant for event-driven
    /// runtimes whose work spans several ticks.
    pub async fn advance(&self, ticks: u64) -> Result<GameSnapshot, CryptwalkError> {
        self.query(|game| {
            for _ in 0..ticks {
                game.tick()?;
            }
            Ok(game.snapshot())
        })
        .await
    }

    /// Asks the runtime loop to stop. Returns immediately.
    pub fn shutdown(&self) {
        self.shared.stop.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    async fn query<T>(
        &self,
        f: impl FnOnce(&mut Game) -> Result<T, CryptwalkError>,
    ) -> Result<T, CryptwalkError> {
        let mut game = self.shared.game.lock().await;
        if self.is_closed() {
            return Err(CryptwalkError::Closed);
        }
        f(&mut *game)
    }

    // Event-driven runtimes have no loop to move a transition along, so
    // each request spends one tick itself. An error from that tick wins
    // over the request's own outcome.
    async fn request<T>(
        &self,
        f: impl FnOnce(&mut Game) -> Result<T, CryptwalkError>,
    ) -> Result<T, CryptwalkError> {
        let event_driven = self.shared.event_driven;
        self.query(|game| {
            let value = f(game)?;
            if event_driven {
                game.tick()?;
            }
            Ok(value)
        })
        .await
    }
}
