//! Edge guards: who may traverse which edge, and what it costs.
//!
//! A guard never mutates session state while deciding. [`EdgeGuard::authorize`]
//! returns either a [`Denial`] or a [`Toll`], and the toll is committed
//! separately. The engine authorizes when a transition is requested and
//! commits at the point the room actually swaps, so an aborted transition
//! never spends a key.
//!
//! ```text
//! authorize(edge, attempt, &session) ──→ Err(Denial)       (nothing changed)
//!                                   └──→ Ok(Toll) ── commit(&mut session)
//! ```

use std::fmt;

use cryptwalk_session::{DoorKey, Session, SessionError};
use cryptwalk_types::{
    DoorEdge, DoorKind, EdgeLabel, FloorEdge, KeyColor, PassageType, RoomId, SecretEdge,
};
use tracing::debug;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an edge refused passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// The slot is a wall, or no such edge is authored.
    NoEdge,
    /// A locked door and no key of its colour in the inventory.
    MissingKey(KeyColor),
    /// A locked door whose record names no key. Never passable.
    Sealed,
    /// A hidden door that has not been revealed yet.
    Hidden,
    /// A one-way door approached against its direction of travel.
    WrongWay,
    /// A secret passage the traveler can't operate.
    NoPassageAccess(PassageType),
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEdge => write!(f, "there is no way through"),
            Self::MissingKey(color) => write!(f, "the door needs a {color} key"),
            Self::Sealed => write!(f, "the door is sealed"),
            Self::Hidden => write!(f, "there is no way through"),
            Self::WrongWay => write!(f, "the door only opens from the other side"),
            Self::NoPassageAccess(passage) => write!(f, "the {passage} won't budge"),
        }
    }
}

/// The result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The edge admitted the traveler and the transition has begun.
    Passed,
    /// The edge refused. No state changed.
    Denied(Denial),
    /// Another transition is already in flight. No state changed.
    Blocked,
}

impl GuardOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// The session mutation owed for crossing an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toll {
    /// Nothing to pay.
    Free,
    /// Spend one key of `key` colour and record `door` as unlocked.
    UnlockDoor { door: DoorKey, key: KeyColor },
}

impl Toll {
    /// Applies the toll to the session.
    ///
    /// Committing an unlock for a door the ledger already has open is a
    /// no-op, so a toll can never spend two keys on one door.
    ///
    /// # Errors
    /// Returns [`SessionError::MissingKey`] if the key was spent elsewhere
    /// between authorize and commit. The session is unchanged in that case.
    pub fn commit(self, session: &mut Session) -> Result<(), SessionError> {
        match self {
            Toll::Free => Ok(()),
            Toll::UnlockDoor { door, key } => {
                if session.doors().is_unlocked(&door) {
                    return Ok(());
                }
                session.inventory_mut().consume_key(key)?;
                debug!(%door, %key, "door unlocked");
                session.doors_mut().mark_unlocked(door);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EdgeGuard
// ---------------------------------------------------------------------------

/// Which edge of which room the traveler is trying to cross.
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub from: &'a RoomId,
    pub label: EdgeLabel,
}

impl<'a> Attempt<'a> {
    pub fn new(from: &'a RoomId, label: EdgeLabel) -> Self {
        Self { from, label }
    }
}

/// Access control for one kind of edge.
///
/// Implement [`authorize`](Self::authorize); the other two methods are
/// derived from it.
pub trait EdgeGuard {
    type Edge;

    /// Decides whether `attempt` may cross `edge`, without touching the
    /// session.
    fn authorize(
        &self,
        edge: &Self::Edge,
        attempt: &Attempt<'_>,
        session: &Session,
    ) -> Result<Toll, Denial>;

    /// Side-effect-free check.
    fn can_traverse(&self, edge: &Self::Edge, attempt: &Attempt<'_>, session: &Session) -> bool {
        self.authorize(edge, attempt, session).is_ok()
    }

    /// Authorizes and immediately commits the toll.
    fn try_consume(
        &self,
        edge: &Self::Edge,
        attempt: &Attempt<'_>,
        session: &mut Session,
    ) -> GuardOutcome {
        match self.authorize(edge, attempt, session) {
            Ok(toll) => match toll.commit(session) {
                Ok(()) => GuardOutcome::Passed,
                Err(SessionError::MissingKey(color)) => {
                    GuardOutcome::Denied(Denial::MissingKey(color))
                }
            },
            Err(denial) => GuardOutcome::Denied(denial),
        }
    }
}

/// Guards the four door slots.
///
/// The attempt's label must be a `Door(direction)`; the direction is both
/// the slot and the direction of travel.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoorGuard;

impl EdgeGuard for DoorGuard {
    type Edge = DoorEdge;

    fn authorize(
        &self,
        edge: &DoorEdge,
        attempt: &Attempt<'_>,
        session: &Session,
    ) -> Result<Toll, Denial> {
        let EdgeLabel::Door(direction) = attempt.label else {
            return Err(Denial::NoEdge);
        };
        if !edge.exists {
            return Err(Denial::NoEdge);
        }

        let door = DoorKey::new(attempt.from.clone(), direction);
        match edge.kind {
            DoorKind::Open => Ok(Toll::Free),
            DoorKind::Hidden => {
                if session.doors().is_revealed(&door) {
                    Ok(Toll::Free)
                } else {
                    Err(Denial::Hidden)
                }
            }
            DoorKind::OneWay => {
                if edge.one_way_travel.unwrap_or(direction) == direction {
                    Ok(Toll::Free)
                } else {
                    Err(Denial::WrongWay)
                }
            }
            DoorKind::Locked => {
                if session.doors().is_unlocked(&door) {
                    return Ok(Toll::Free);
                }
                let Some(key) = edge.required_key else {
                    return Err(Denial::Sealed);
                };
                if session.inventory().has_key(key) {
                    Ok(Toll::UnlockDoor { door, key })
                } else {
                    Err(Denial::MissingKey(key))
                }
            }
        }
    }
}

/// Guards stairs and trapdoors. Existence is the only gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloorGuard;

impl EdgeGuard for FloorGuard {
    type Edge = FloorEdge;

    fn authorize(&self, edge: &FloorEdge, _: &Attempt<'_>, _: &Session) -> Result<Toll, Denial> {
        if edge.exists {
            Ok(Toll::Free)
        } else {
            Err(Denial::NoEdge)
        }
    }
}

/// Guards secret passages by the traveler's passage-access capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretGuard;

impl EdgeGuard for SecretGuard {
    type Edge = SecretEdge;

    fn authorize(
        &self,
        edge: &SecretEdge,
        _: &Attempt<'_>,
        session: &Session,
    ) -> Result<Toll, Denial> {
        if session.traveler().can_operate(edge.passage_type) {
            Ok(Toll::Free)
        } else {
            Err(Denial::NoPassageAccess(edge.passage_type))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptwalk_session::SessionConfig;
    use cryptwalk_types::Direction;

    fn session_with_keys(keys: &[KeyColor]) -> Session {
        Session::new(SessionConfig {
            passage_access: Some(PassageType::Clock),
            starting_keys: keys.to_vec(),
        })
    }

    fn door_attempt(room: &RoomId, direction: Direction) -> Attempt<'_> {
        Attempt::new(room, EdgeLabel::Door(direction))
    }

    #[test]
    fn test_open_door_passes_without_toll() {
        let room = RoomId::new("castle_hall");
        let session = session_with_keys(&[]);
        let attempt = door_attempt(&room, Direction::South);
        let toll = DoorGuard
            .authorize(&DoorEdge::open("gatehouse"), &attempt, &session)
            .unwrap();
        assert_eq!(toll, Toll::Free);
    }

    #[test]
    fn test_wall_is_denied() {
        let room = RoomId::new("castle_hall");
        let session = session_with_keys(&[]);
        let attempt = door_attempt(&room, Direction::East);
        let result = DoorGuard.authorize(&DoorEdge::absent(), &attempt, &session);
        assert_eq!(result, Err(Denial::NoEdge));
    }

    #[test]
    fn test_locked_door_without_key_is_denied_and_session_untouched() {
        let room = RoomId::new("castle_hall");
        let mut session = session_with_keys(&[KeyColor::Blue]);
        let before = session.clone();

        let outcome = DoorGuard.try_consume(
            &DoorEdge::locked("throne_room", KeyColor::Red),
            &door_attempt(&room, Direction::North),
            &mut session,
        );

        assert_eq!(outcome, GuardOutcome::Denied(Denial::MissingKey(KeyColor::Red)));
        assert_eq!(session, before);
    }

    #[test]
    fn test_locked_door_consumes_exactly_one_key() {
        let room = RoomId::new("castle_hall");
        let mut session = session_with_keys(&[KeyColor::Red, KeyColor::Red]);
        let door = DoorEdge::locked("throne_room", KeyColor::Red);
        let attempt = door_attempt(&room, Direction::North);

        assert!(DoorGuard.try_consume(&door, &attempt, &mut session).is_passed());
        assert_eq!(session.inventory().key_count(KeyColor::Red), 1);

        // Already unlocked: free from now on.
        assert!(DoorGuard.try_consume(&door, &attempt, &mut session).is_passed());
        assert!(DoorGuard.try_consume(&door, &attempt, &mut session).is_passed());
        assert_eq!(session.inventory().key_count(KeyColor::Red), 1);
        assert_eq!(session.inventory().consumed_count(KeyColor::Red), 1);
    }

    #[test]
    fn test_unlocked_door_passes_with_no_key_left() {
        let room = RoomId::new("castle_hall");
        let mut session = session_with_keys(&[KeyColor::Red]);
        let door = DoorEdge::locked("throne_room", KeyColor::Red);
        let attempt = door_attempt(&room, Direction::North);

        DoorGuard.try_consume(&door, &attempt, &mut session);
        assert_eq!(session.inventory().key_count(KeyColor::Red), 0);
        assert_eq!(DoorGuard.authorize(&door, &attempt, &session), Ok(Toll::Free));
    }

    #[test]
    fn test_key_opens_only_one_door() {
        let hall = RoomId::new("castle_hall");
        let stair = RoomId::new("tower_stair");
        let mut session = session_with_keys(&[KeyColor::Red]);

        let first = DoorGuard.try_consume(
            &DoorEdge::locked("throne_room", KeyColor::Red),
            &door_attempt(&hall, Direction::North),
            &mut session,
        );
        let second = DoorGuard.try_consume(
            &DoorEdge::locked("tower_top", KeyColor::Red),
            &door_attempt(&stair, Direction::North),
            &mut session,
        );

        assert_eq!(first, GuardOutcome::Passed);
        assert_eq!(second, GuardOutcome::Denied(Denial::MissingKey(KeyColor::Red)));
    }

    #[test]
    fn test_toll_commit_is_idempotent_for_unlocked_door() {
        let mut session = session_with_keys(&[KeyColor::Red, KeyColor::Red]);
        let toll = Toll::UnlockDoor {
            door: DoorKey::new("castle_hall", Direction::North),
            key: KeyColor::Red,
        };

        toll.clone().commit(&mut session).unwrap();
        toll.commit(&mut session).unwrap();

        assert_eq!(session.inventory().key_count(KeyColor::Red), 1);
    }

    #[test]
    fn test_locked_door_with_no_key_named_is_sealed() {
        let room = RoomId::new("vault");
        let session = session_with_keys(&[KeyColor::Red]);
        let mut door = DoorEdge::locked("beyond", KeyColor::Red);
        door.required_key = None;

        let result = DoorGuard.authorize(&door, &door_attempt(&room, Direction::West), &session);
        assert_eq!(result, Err(Denial::Sealed));
    }

    #[test]
    fn test_hidden_door_needs_reveal() {
        let room = RoomId::new("chapel");
        let mut session = session_with_keys(&[]);
        let door = DoorEdge::hidden("throne_room");
        let attempt = door_attempt(&room, Direction::East);

        assert_eq!(DoorGuard.authorize(&door, &attempt, &session), Err(Denial::Hidden));

        session.doors_mut().reveal(DoorKey::new("chapel", Direction::East));
        assert_eq!(DoorGuard.authorize(&door, &attempt, &session), Ok(Toll::Free));
    }

    #[test]
    fn test_one_way_door_admits_authored_direction_only() {
        let well = RoomId::new("well_room");
        let ossuary = RoomId::new("ossuary");
        let session = session_with_keys(&[]);

        let forward = DoorEdge::one_way("ossuary");
        let backward = DoorEdge::one_way("well_room").admitting(Direction::West);

        assert!(DoorGuard.can_traverse(&forward, &door_attempt(&well, Direction::West), &session));
        assert_eq!(
            DoorGuard.authorize(&backward, &door_attempt(&ossuary, Direction::East), &session),
            Err(Denial::WrongWay)
        );
    }

    #[test]
    fn test_floor_edge_gated_by_existence_only() {
        let room = RoomId::new("pantry");
        let session = session_with_keys(&[]);
        let attempt = Attempt::new(&room, EdgeLabel::Floor(cryptwalk_types::FloorKind::StairsDown));

        assert!(FloorGuard.can_traverse(&FloorEdge::to("wine_cellar", (2, 2)), &attempt, &session));
        assert!(!FloorGuard.can_traverse(&FloorEdge::absent(), &attempt, &session));
    }

    #[test]
    fn test_secret_passage_needs_matching_access() {
        let room = RoomId::new("treasury");
        let session = session_with_keys(&[]);
        let attempt = Attempt::new(&room, EdgeLabel::Secret(0));

        let clock = SecretEdge::new(PassageType::Clock, "master_bedchamber", (1, 1));
        let bookcase = SecretEdge::new(PassageType::Bookcase, "library", (1, 1));

        assert!(SecretGuard.can_traverse(&clock, &attempt, &session));
        assert_eq!(
            SecretGuard.authorize(&bookcase, &attempt, &session),
            Err(Denial::NoPassageAccess(PassageType::Bookcase))
        );
    }
}
