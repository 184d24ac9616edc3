//! # Cryptwalk
//!
//! Room graph and transition runtime for a tile-based dungeon crawler.
//!
//! Cryptwalk moves a single traveler through a static graph of rooms joined
//! by doors, stairs, and secret passages. The sub-crates each own one layer:
//!
//! - `cryptwalk-types`: room records, identities, the record codec.
//! - `cryptwalk-session`: inventory, door ledger, persistence tracker.
//! - `cryptwalk-room`: catalog, edge guards, the transition engine, and
//!   the spawn director.
//! - `cryptwalk-tick`: fixed-timestep scheduler and deferred work.
//!
//! This crate wires them into a [`Game`] and an async [`GameRuntime`].
//!
//! ## Quick Start
//!
//! ```rust
//! use cryptwalk::prelude::*;
//!
//! let mut game = Game::builder().build()?;
//! game.start()?;
//!
//! assert!(game.go(Direction::South)?.is_passed());
//! game.tick()?;
//! assert_eq!(game.current_room_id().unwrap().as_str(), "gatehouse");
//! # Ok::<(), CryptwalkError>(())
//! ```

mod config;
mod error;
mod game;
mod runtime;

pub use config::GameConfig;
pub use error::CryptwalkError;
pub use game::{Game, GameBuilder, GameSnapshot};
pub use runtime::{GameHandle, GameRuntime};

pub use cryptwalk_room as room;
pub use cryptwalk_session as session;
pub use cryptwalk_tick as tick;
pub use cryptwalk_types as types;

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (for example `"info"`) when it is unset.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything needed to build and drive a game.
pub mod prelude {
    pub use crate::{
        CryptwalkError, Game, GameBuilder, GameConfig, GameHandle, GameRuntime, GameSnapshot,
    };

    pub use cryptwalk_room::{
        Catalog, CatalogBuilder, CatalogConfig, Denial, EngineConfig, EngineError, GuardOutcome,
        RoomEvent, SpawnConfig, TransitionPhase,
    };
    pub use cryptwalk_session::{Session, SessionConfig};
    pub use cryptwalk_tick::TickConfig;
    pub use cryptwalk_types::{
        Direction, FloorKind, KeyColor, PassageType, Position, RoomId, RoomNode,
    };
}
