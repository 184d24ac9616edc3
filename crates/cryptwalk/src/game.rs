//! `Game` builder and the synchronous game loop.
//!
//! A [`Game`] owns the transition engine and the spawn director and keeps
//! the tick counter they share. Requests (doors, stairs, passages) only
//! start a transition; [`Game::tick`] is what moves it through its phases.

use std::sync::Arc;

use cryptwalk_room::{
    Catalog, CatalogConfig, EngineConfig, EntityHandle, GuardOutcome, SpawnConfig, SpawnDirector,
    Spawned, TransitionEngine, TransitionPhase,
};
use cryptwalk_session::{Session, SessionConfig};
use cryptwalk_types::{
    Direction, FloorKind, JsonCodec, KeyColor, PassageType, Position, RoomId, RoomNode,
};
use serde::Serialize;

use crate::{CryptwalkError, GameConfig};

/// Builder for configuring a [`Game`].
///
/// # Example
///
/// ```rust
/// use cryptwalk::prelude::*;
///
/// let mut game = Game::builder()
///     .session_config(SessionConfig {
///         starting_keys: vec![KeyColor::Red],
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
/// game.start().unwrap();
/// assert_eq!(game.current_room_id().unwrap().as_str(), "castle_hall");
/// ```
pub struct GameBuilder {
    config: GameConfig,
    catalog: Option<Catalog>,
    records: Option<Vec<u8>>,
}

impl GameBuilder {
    /// Creates a builder for the stock castle with default settings.
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            catalog: None,
            records: None,
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn catalog_config(mut self, config: CatalogConfig) -> Self {
        self.config.catalog = config;
        self
    }

    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.config.engine = config;
        self
    }

    pub fn spawn_config(mut self, config: SpawnConfig) -> Self {
        self.config.spawn = config;
        self
    }

    /// Plays on an already-built catalog instead of the stock castle.
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self.records = None;
        self
    }

    /// Plays on a catalog decoded from JSON room records at build time.
    pub fn catalog_json(mut self, records: impl Into<Vec<u8>>) -> Self {
        self.records = Some(records.into());
        self.catalog = None;
        self
    }

    /// Builds the game. The engine is not started yet.
    ///
    /// # Errors
    /// [`CryptwalkError::Catalog`] if the catalog fails validation.
    pub fn build(self) -> Result<Game, CryptwalkError> {
        let config = self.config;
        let catalog = match (self.catalog, self.records) {
            (Some(catalog), _) => catalog,
            (None, Some(records)) => {
                Catalog::from_records(&JsonCodec, &records, config.catalog.clone())?
            }
            (None, None) => Catalog::castle_with(config.catalog.clone())?,
        };

        let mut engine = TransitionEngine::new(
            Arc::new(catalog),
            Session::new(config.session.clone()),
            config.engine.clone(),
        );
        let spawner = SpawnDirector::new(engine.subscribe(), config.spawn.clone());

        tracing::debug!(rooms = engine.catalog().len(), "game built");
        Ok(Game {
            engine,
            spawner,
            config,
            now: 0,
        })
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time summary of a running game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub room: Option<RoomId>,
    pub floor: Option<u8>,
    pub phase: TransitionPhase,
    pub position: Position,
    pub keys_held: u32,
    pub live_entities: usize,
    pub collected: usize,
    pub killed: usize,
}

/// The transition engine and its spawn director, driven tick by tick.
pub struct Game {
    engine: TransitionEngine,
    spawner: SpawnDirector,
    config: GameConfig,
    now: u64,
}

impl Game {
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Loads the start room and runs until it is populated.
    ///
    /// # Errors
    /// [`CryptwalkError::Engine`] if the game was already started or a
    /// collaborator failed while loading.
    pub fn start(&mut self) -> Result<(), CryptwalkError> {
        self.engine.start()?;
        self.settle()
    }

    /// Resets the session and walks back to the start room. Call
    /// [`tick`](Self::tick) to finish the walk.
    pub fn new_game(&mut self) -> Result<(), CryptwalkError> {
        self.engine.new_game()?;
        Ok(())
    }

    /// Unloads the current room and releases every live entity.
    ///
    /// # Errors
    /// [`CryptwalkError::Engine`] while a transition is in flight.
    pub fn shutdown(&mut self) -> Result<(), CryptwalkError> {
        self.engine.shutdown()?;
        let despawned = self.spawner.shutdown();
        tracing::info!(tick = self.now, despawned, "game shut down");
        Ok(())
    }

    // -- ticking ------------------------------------------------------------

    /// Advances one tick and runs everything due on it.
    pub fn tick(&mut self) -> Result<(), CryptwalkError> {
        self.now += 1;
        self.settle()
    }

    /// Jumps to `tick` (never backwards) and runs everything due on it.
    pub fn advance_to(&mut self, tick: u64) -> Result<(), CryptwalkError> {
        self.now = self.now.max(tick);
        self.settle()
    }

    /// Ticks until the engine is idle, at most `max_ticks` times.
    ///
    /// Returns whether the engine reached idle. The first collaborator
    /// failure stops the walk and is returned.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> Result<bool, CryptwalkError> {
        for _ in 0..max_ticks {
            if !self.engine.is_transitioning() {
                return Ok(true);
            }
            self.tick()?;
        }
        Ok(!self.engine.is_transitioning())
    }

    /// Runs the director and the engine against each other until neither
    /// makes progress on the current tick.
    ///
    /// A collaborator failure doesn't stop the exchange; the first one is
    /// returned once the tick has settled.
    fn settle(&mut self) -> Result<(), CryptwalkError> {
        let mut failure = None;
        loop {
            let handled = self.spawner.pump(self.now, self.engine.session().tracker());
            let before = self.engine.phase();
            if let Err(err) = self.engine.tick(self.now) {
                tracing::error!(tick = self.now, error = %err, "transition step failed");
                failure.get_or_insert(err);
            }
            if handled == 0 && self.engine.phase() == before {
                break;
            }
        }
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    // -- requests -----------------------------------------------------------

    /// Asks to leave through the door in `direction`.
    pub fn go(&mut self, direction: Direction) -> Result<GuardOutcome, CryptwalkError> {
        Ok(self.engine.request_door_transition(direction)?)
    }

    /// Asks to take the stairs (or trapdoor) of `kind`.
    pub fn take_stairs(&mut self, kind: FloorKind) -> Result<GuardOutcome, CryptwalkError> {
        Ok(self.engine.request_floor_transition(kind)?)
    }

    /// Asks to operate the `passage` leading to `destination`.
    pub fn use_passage(
        &mut self,
        passage: PassageType,
        destination: &RoomId,
    ) -> Result<GuardOutcome, CryptwalkError> {
        Ok(self.engine.request_secret_transition(passage, destination)?)
    }

    /// Reveals a hidden door. Returns `false` if it was already revealed.
    pub fn reveal_door(
        &mut self,
        room: &RoomId,
        direction: Direction,
    ) -> Result<bool, CryptwalkError> {
        Ok(self.engine.reveal_door(room, direction)?)
    }

    pub fn grant_key(&mut self, color: KeyColor) {
        self.engine.session_mut().inventory_mut().grant_key(color);
    }

    /// Picks up the item spawned from `template` at `position`.
    pub fn collect(&mut self, template: &str, position: impl Into<Position>) -> Option<Spawned> {
        let handle = self.spawner.find(template, position)?;
        self.collect_handle(handle)
    }

    pub fn collect_handle(&mut self, handle: EntityHandle) -> Option<Spawned> {
        self.spawner
            .collect(handle, self.engine.session_mut().tracker_mut())
    }

    /// Kills the enemy spawned from `template` at `position`.
    pub fn kill(&mut self, template: &str, position: impl Into<Position>) -> Option<Spawned> {
        let handle = self.spawner.find(template, position)?;
        self.kill_handle(handle)
    }

    pub fn kill_handle(&mut self, handle: EntityHandle) -> Option<Spawned> {
        self.spawner.kill(handle, self.engine.session_mut().tracker_mut())
    }

    // -- queries ------------------------------------------------------------

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn phase(&self) -> TransitionPhase {
        self.engine.phase()
    }

    pub fn is_transitioning(&self) -> bool {
        self.engine.is_transitioning()
    }

    pub fn current_room(&self) -> Option<&Arc<RoomNode>> {
        self.engine.current_room()
    }

    pub fn current_room_id(&self) -> Option<&RoomId> {
        self.engine.current_room_id()
    }

    pub fn session(&self) -> &Session {
        self.engine.session()
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TransitionEngine {
        &mut self.engine
    }

    pub fn spawner(&self) -> &SpawnDirector {
        &self.spawner
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let session = self.engine.session();
        let room = self.engine.current_room();
        GameSnapshot {
            tick: self.now,
            room: room.map(|room| room.room_id.clone()),
            floor: room.map(|room| room.floor_number),
            phase: self.engine.phase(),
            position: session.traveler().position,
            keys_held: session.inventory().total_keys(),
            live_entities: self.spawner.live_count(),
            collected: session.tracker().collected_count(),
            killed: session.tracker().killed_count(),
        }
    }
}
