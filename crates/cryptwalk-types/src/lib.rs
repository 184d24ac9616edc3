//! Room-graph data model for Cryptwalk.
//!
//! This crate defines the plain data the rest of the workspace agrees on:
//!
//! - **Identities** ([`RoomId`], [`TemplateId`], [`Position`], [`Identity`]):
//!   stable keys for rooms and spawn declarations.
//! - **Graph records** ([`RoomNode`], [`DoorEdge`], [`FloorEdge`],
//!   [`SecretEdge`], spawn declarations): immutable values authored once and
//!   shared behind `Arc` by the catalog.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how catalog records are
//!   turned into/out of bytes.
//! - **Errors** ([`CodecError`]).
//!
//! Nothing here has behavior beyond small accessors. Gating, persistence, and
//! transitions live in the crates above.
//!
//! ```text
//! Room (catalog, guards, engine) → Session (inventory, tracker) → Types (this crate)
//! ```

mod codec;
mod error;
mod graph;
mod ids;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::CodecError;
pub use graph::{
    AmbientMeta, DoorEdge, DoorKind, Doors, EdgeLabel, EnemySpawnDecl,
    FloorEdge, Floors, HazardSpawnDecl, ItemSpawnDecl, PlayerSpawn, RoomNode,
    RoomType, SecretEdge, SpawnDecl,
};
pub use ids::{
    Direction, FloorKind, Identity, KeyColor, PassageType, Position, RoomId,
    TemplateId,
};
