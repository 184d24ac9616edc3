//! Error types for the catalog and the transition engine.

use cryptwalk_session::SessionError;
use cryptwalk_types::{CodecError, Direction, EdgeLabel, RoomId, TemplateId};

use crate::TransitionPhase;

/// Errors raised while building a [`Catalog`](crate::Catalog).
///
/// These are authoring mistakes. A catalog that builds never produces them
/// again at runtime.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("room {0} is registered more than once")]
    DuplicateRoom(RoomId),

    #[error("{edge} of room {room} leads to unknown room {destination}")]
    DanglingEdge {
        room: RoomId,
        edge: EdgeLabel,
        destination: RoomId,
    },

    #[error("no room is marked as the start room")]
    MissingStartRoom,

    #[error("more than one start room: {}", join(.0))]
    MultipleStartRooms(Vec<RoomId>),

    #[error("locked {direction} door of room {room} names no key")]
    LockedWithoutKey { room: RoomId, direction: Direction },

    #[error("{template} in room {room} has spawn probability {probability}, expected 0..=1")]
    InvalidProbability {
        room: RoomId,
        template: TemplateId,
        probability: f64,
    },

    #[error("{direction} door of room {room} has no door leading back")]
    AsymmetricDoor { room: RoomId, direction: Direction },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors raised by the [`TransitionEngine`](crate::TransitionEngine).
///
/// A refused edge is not an error: it comes back as
/// [`GuardOutcome::Denied`](crate::GuardOutcome::Denied). These variants
/// cover broken data, misuse, and collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An edge points at a room the catalog doesn't have. The transition
    /// is aborted before anything is torn down.
    #[error("destination room {0} is not in the catalog")]
    DestinationNotFound(RoomId),

    #[error("room {0} is not in the catalog")]
    RoomNotFound(RoomId),

    #[error("the catalog has no start room")]
    NoStartRoom,

    #[error("the engine has not been started")]
    NotStarted,

    #[error("the engine is already running")]
    AlreadyStarted,

    /// Lifecycle calls (new game, shutdown) wait for the in-flight
    /// transition; transitions are never cancelled.
    #[error("a transition is in flight")]
    TransitionInFlight,

    #[error("room {room} has no hidden door on its {direction} wall")]
    NoHiddenDoor { room: RoomId, direction: Direction },

    /// A collaborator released its hold with a failure.
    #[error("collaborator failed while {phase}: {reason}")]
    CollaboratorFailed {
        phase: TransitionPhase,
        reason: String,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

fn join(ids: &[RoomId]) -> String {
    ids.iter()
        .map(RoomId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
