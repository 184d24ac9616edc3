//! Room graph and transition subsystem for Cryptwalk.
//!
//! The room graph is built once into a [`Catalog`]. At runtime a single
//! [`TransitionEngine`] owns the session and moves the traveler between
//! rooms, publishing lifecycle events that entity collaborators (such as
//! the [`SpawnDirector`]) react to.
//!
//! # Key types
//!
//! - [`Catalog`] / [`CatalogBuilder`]: the validated, immutable room graph
//! - [`DoorGuard`], [`FloorGuard`], [`SecretGuard`]: per-edge access control
//! - [`TransitionEngine`]: the room-swap state machine
//! - [`RoomEvent`] / [`Subscription`] / [`Hold`]: the typed event bus
//! - [`SpawnDirector`] / [`EntityHandle`]: live entities tagged by room
//! - [`TransitionPhase`]: Idle → Unloading → Loading → Idle

mod castle;
mod catalog;
mod config;
mod engine;
mod error;
mod events;
mod guard;
mod spawner;

pub use catalog::{Catalog, CatalogBuilder};
pub use config::{CatalogConfig, EngineConfig, SpawnConfig, TransitionPhase};
pub use engine::TransitionEngine;
pub use error::{CatalogError, EngineError};
pub use events::{Hold, RoomEvent, Subscription, SubscriptionId};
pub use guard::{
    Attempt, Denial, DoorGuard, EdgeGuard, FloorGuard, GuardOutcome, SecretGuard, Toll,
};
pub use spawner::{EntityHandle, EntityKind, SpawnDirector, Spawned};
