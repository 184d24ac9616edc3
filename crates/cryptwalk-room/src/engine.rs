//! The room transition engine.
//!
//! One engine per game. It owns the session, the current room, and the
//! event bus, and it is the only thing that swaps rooms.
//!
//! ## A door transition, tick by tick
//!
//! ```text
//! request_door_transition(East)
//!   ├─ Blocked if a transition is in flight
//!   ├─ DoorGuard::authorize ──→ Denied (+ AccessDenied event), nothing changes
//!   ├─ resolve destination  ──→ DestinationNotFound, nothing changes
//!   ├─ arrival position computed and stored
//!   └─ phase = Unloading, publish RoomUnloading{hold}
//!
//! tick(n): holds for Unloading all dropped?
//!   ├─ a hold failed ──→ back to Idle in the old room, no key spent
//!   └─ commit toll (spend key), current = destination,
//!      phase = Loading, publish RoomLoaded{hold}
//!
//! tick(m): holds for Loading all dropped?
//!   └─ place traveler, zero velocity, publish TravelerPlaced,
//!      phase = Idle
//! ```
//!
//! With no subscribers (or subscribers that drop events immediately) all of
//! this completes inside the request call.

use std::sync::Arc;

use cryptwalk_session::{DoorKey, Session};
use cryptwalk_types::{
    Direction, DoorKind, EdgeLabel, FloorKind, PassageType, Position, RoomId, RoomNode,
};
use tracing::{debug, error, info, warn};

use crate::catalog::describe_edges;
use crate::events::{Barrier, EventBus};
use crate::{
    Attempt, Catalog, Denial, DoorGuard, EdgeGuard, EngineConfig, EngineError, FloorGuard,
    GuardOutcome, RoomEvent, SecretGuard, Subscription, SubscriptionId, Toll, TransitionPhase,
};

/// A transition between its request and its completion.
struct InFlight {
    from: Option<Arc<RoomNode>>,
    to: Arc<RoomNode>,
    via: Option<EdgeLabel>,
    toll: Toll,
    barrier: Barrier,
    phase_started: u64,
    stall_warned: bool,
    /// Reloading the room an aborted transition started from. The traveler
    /// stays where it was.
    returning: bool,
}

/// Moves the traveler between rooms.
///
/// All mutation goes through `&mut self`: the engine lives on the tick loop
/// and never shares its state across threads.
pub struct TransitionEngine {
    catalog: Arc<Catalog>,
    session: Session,
    config: EngineConfig,
    bus: EventBus,
    phase: TransitionPhase,
    current: Option<Arc<RoomNode>>,
    pending_arrival: Option<Position>,
    in_flight: Option<InFlight>,
    now: u64,
}

impl TransitionEngine {
    pub fn new(catalog: Arc<Catalog>, session: Session, config: EngineConfig) -> Self {
        Self {
            catalog,
            session,
            config,
            bus: EventBus::default(),
            phase: TransitionPhase::Idle,
            current: None,
            pending_arrival: None,
            in_flight: None,
            now: 0,
        }
    }

    // -- subscriptions ------------------------------------------------------

    pub fn subscribe(&mut self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.len()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Loads the start room and places the traveler at its default spawn.
    ///
    /// # Errors
    /// [`EngineError::AlreadyStarted`] if a room is already loaded,
    /// [`EngineError::NoStartRoom`] for a catalog built without one.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.current.is_some() || self.phase.is_transitioning() {
            return Err(EngineError::AlreadyStarted);
        }
        let start = self
            .catalog
            .start_room()
            .cloned()
            .ok_or(EngineError::NoStartRoom)?;

        info!(room = %start.room_id, "starting game");
        self.pending_arrival = Some(start.default_spawn().unwrap_or(Position::ORIGIN));
        self.begin_loading(None, start, None);
        self.advance()
    }

    /// Resets the session and transitions back to the start room.
    ///
    /// # Errors
    /// [`EngineError::TransitionInFlight`] while a transition is running.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        if self.phase.is_transitioning() {
            return Err(EngineError::TransitionInFlight);
        }
        let start = self
            .catalog
            .start_room()
            .cloned()
            .ok_or(EngineError::NoStartRoom)?;

        self.session.new_game();
        let Some(from) = self.current.clone() else {
            return self.start();
        };

        info!(from = %from.room_id, to = %start.room_id, "new game, returning to start room");
        let arrival = start.default_spawn().unwrap_or(Position::ORIGIN);
        self.begin_unloading(from, start, None, Toll::Free, arrival);
        self.advance()
    }

    /// Unloads the current room and closes every subscription.
    ///
    /// Collaborators receive a final `RoomUnloading`; the engine does not
    /// wait for its holds.
    ///
    /// # Errors
    /// [`EngineError::TransitionInFlight`] while a transition is running.
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.phase.is_transitioning() {
            return Err(EngineError::TransitionInFlight);
        }
        if let Some(room) = self.current.take() {
            let barrier = Barrier::new();
            self.bus.publish_held(&barrier, |hold| RoomEvent::Unloading {
                room: room.room_id.clone(),
                hold,
            });
            info!(room = %room.room_id, "engine shut down");
        }
        self.bus.close();
        self.pending_arrival = None;
        Ok(())
    }

    // -- requests -----------------------------------------------------------

    /// Tries to leave the current room through the door in `direction`.
    ///
    /// # Errors
    /// [`EngineError::NotStarted`] before [`start`](Self::start),
    /// [`EngineError::DestinationNotFound`] if the door leads nowhere.
    /// Refusals are `Ok(GuardOutcome::Denied(_))`, not errors.
    pub fn request_door_transition(
        &mut self,
        direction: Direction,
    ) -> Result<GuardOutcome, EngineError> {
        let label = EdgeLabel::Door(direction);
        let Some(room) = self.accepting(label)? else {
            return Ok(GuardOutcome::Blocked);
        };

        let edge = room.doors.get(direction);
        let attempt = Attempt::new(&room.room_id, label);
        let toll = match DoorGuard.authorize(edge, &attempt, &self.session) {
            Ok(toll) => toll,
            Err(denial) => return Ok(self.deny(&room.room_id, Some(label), denial)),
        };

        let offset = edge.arrival_offset;
        let destination = edge.destination.clone();
        self.begin(room, label, destination, toll, move |to| {
            door_arrival(to, direction, offset)
        })
    }

    /// Tries to take the stairs or trapdoor of `kind`.
    pub fn request_floor_transition(
        &mut self,
        kind: FloorKind,
    ) -> Result<GuardOutcome, EngineError> {
        let label = EdgeLabel::Floor(kind);
        let Some(room) = self.accepting(label)? else {
            return Ok(GuardOutcome::Blocked);
        };

        let edge = room.floors.get(kind);
        let attempt = Attempt::new(&room.room_id, label);
        let toll = match FloorGuard.authorize(edge, &attempt, &self.session) {
            Ok(toll) => toll,
            Err(denial) => return Ok(self.deny(&room.room_id, Some(label), denial)),
        };

        let offset = edge.arrival_offset;
        let destination = edge.destination.clone();
        let from = room.room_id.clone();
        self.begin(room, label, destination, toll, move |to| {
            floor_arrival(to, kind, &from, offset)
        })
    }

    /// Tries to use the secret passage of `passage_type` leading to
    /// `destination`.
    pub fn request_secret_transition(
        &mut self,
        passage_type: PassageType,
        destination: &RoomId,
    ) -> Result<GuardOutcome, EngineError> {
        let Some(room) = self.accepting(EdgeLabel::Secret(0))? else {
            return Ok(GuardOutcome::Blocked);
        };

        let Some(index) = room
            .secrets
            .iter()
            .position(|s| s.passage_type == passage_type && &s.destination == destination)
        else {
            return Ok(self.deny(&room.room_id, None, Denial::NoEdge));
        };

        let label = EdgeLabel::Secret(index);
        let edge = &room.secrets[index];
        let attempt = Attempt::new(&room.room_id, label);
        let toll = match SecretGuard.authorize(edge, &attempt, &self.session) {
            Ok(toll) => toll,
            Err(denial) => return Ok(self.deny(&room.room_id, Some(label), denial)),
        };

        let from = room.room_id.clone();
        self.begin(room, label, destination.clone(), toll, move |to| {
            secret_arrival(to, passage_type, &from)
        })
    }

    /// Reveals the hidden door on `direction` wall of `room`.
    ///
    /// Returns `false` if it was already revealed.
    ///
    /// # Errors
    /// [`EngineError::RoomNotFound`] or [`EngineError::NoHiddenDoor`].
    pub fn reveal_door(
        &mut self,
        room: &RoomId,
        direction: Direction,
    ) -> Result<bool, EngineError> {
        let node = self
            .catalog
            .get_room(room)
            .ok_or_else(|| EngineError::RoomNotFound(room.clone()))?;
        let door = node.doors.get(direction);
        if !door.exists || door.kind != DoorKind::Hidden {
            return Err(EngineError::NoHiddenDoor {
                room: room.clone(),
                direction,
            });
        }

        let fresh = self
            .session
            .doors_mut()
            .reveal(DoorKey::new(room.clone(), direction));
        if fresh {
            info!(%room, %direction, "hidden door revealed");
        }
        Ok(fresh)
    }

    // -- driving ------------------------------------------------------------

    /// Records the current tick and moves the in-flight transition along as
    /// far as released holds allow.
    pub fn tick(&mut self, now: u64) -> Result<(), EngineError> {
        self.now = self.now.max(now);
        self.advance()
    }

    /// Moves the in-flight transition along without changing the clock.
    ///
    /// # Errors
    /// [`EngineError::CollaboratorFailed`] when a phase clears with a failed
    /// hold. A failed unload aborts back to the old room, which is reloaded
    /// under its own holds before the engine accepts requests again; a
    /// failed load still completes the transition.
    pub fn advance(&mut self) -> Result<(), EngineError> {
        loop {
            let Some(flight) = self.in_flight.as_mut() else {
                return Ok(());
            };
            if !flight.barrier.is_clear() {
                let waited = self.now.saturating_sub(flight.phase_started);
                if waited > self.config.stall_warning_ticks && !flight.stall_warned {
                    flight.stall_warned = true;
                    warn!(
                        phase = %self.phase,
                        to = %flight.to.room_id,
                        waited,
                        holds = flight.barrier.outstanding(),
                        "transition stalled waiting on collaborators"
                    );
                }
                return Ok(());
            }

            let failures = flight.barrier.take_failures();
            match self.phase {
                TransitionPhase::Unloading => {
                    if let Err(err) = self.finish_unloading(failures) {
                        // The return trip may already be clear.
                        if let Err(later) = self.advance() {
                            warn!(error = %later, "reloading the old room failed too");
                        }
                        return Err(err);
                    }
                }
                TransitionPhase::Loading => return self.finish_loading(failures),
                TransitionPhase::Idle => {
                    self.in_flight = None;
                    return Ok(());
                }
            }
        }
    }

    // -- queries ------------------------------------------------------------

    pub fn is_transitioning(&self) -> bool {
        self.phase.is_transitioning()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// The room the traveler is in. During `Loading` this is already the
    /// destination.
    pub fn current_room(&self) -> Option<&Arc<RoomNode>> {
        self.current.as_ref()
    }

    pub fn current_room_id(&self) -> Option<&RoomId> {
        self.current.as_ref().map(|room| &room.room_id)
    }

    /// Where the traveler will be placed when the in-flight transition
    /// completes.
    pub fn pending_arrival(&self) -> Option<Position> {
        self.pending_arrival
    }

    /// Holds still outstanding for the current phase.
    pub fn outstanding_holds(&self) -> usize {
        self.in_flight
            .as_ref()
            .map_or(0, |flight| flight.barrier.outstanding())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable session access for gameplay outside the room graph (picking
    /// up keys, granting passage access).
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    // -- internals ----------------------------------------------------------

    /// The room a request starts from, or `None` if it must be blocked.
    fn accepting(&self, label: EdgeLabel) -> Result<Option<Arc<RoomNode>>, EngineError> {
        if self.phase.is_transitioning() {
            debug!(edge = %label, phase = %self.phase, "request blocked, transition in flight");
            return Ok(None);
        }
        self.current
            .clone()
            .map(Some)
            .ok_or(EngineError::NotStarted)
    }

    fn deny(&mut self, room: &RoomId, edge: Option<EdgeLabel>, denial: Denial) -> GuardOutcome {
        debug!(%room, ?edge, ?denial, "transition denied");
        self.bus.publish(|| RoomEvent::AccessDenied {
            room: room.clone(),
            denial,
        });
        GuardOutcome::Denied(denial)
    }

    fn begin(
        &mut self,
        from: Arc<RoomNode>,
        via: EdgeLabel,
        destination: RoomId,
        toll: Toll,
        arrival: impl FnOnce(&RoomNode) -> Position,
    ) -> Result<GuardOutcome, EngineError> {
        let Some(to) = self.catalog.get_room(&destination).cloned() else {
            error!(
                from = %from.room_id,
                edge = %via,
                %destination,
                "destination not in catalog, transition aborted"
            );
            return Err(EngineError::DestinationNotFound(destination));
        };

        let position = arrival(&to);
        info!(from = %from.room_id, to = %to.room_id, edge = %via, "transition started");
        self.begin_unloading(from, to, Some(via), toll, position);
        self.advance()?;
        Ok(GuardOutcome::Passed)
    }

    fn begin_unloading(
        &mut self,
        from: Arc<RoomNode>,
        to: Arc<RoomNode>,
        via: Option<EdgeLabel>,
        toll: Toll,
        arrival: Position,
    ) {
        self.pending_arrival = Some(arrival);
        self.set_phase(TransitionPhase::Unloading);

        let barrier = Barrier::new();
        self.bus.publish_held(&barrier, |hold| RoomEvent::Unloading {
            room: from.room_id.clone(),
            hold,
        });
        self.in_flight = Some(InFlight {
            from: Some(from),
            to,
            via,
            toll,
            barrier,
            phase_started: self.now,
            stall_warned: false,
            returning: false,
        });
    }

    fn begin_loading(
        &mut self,
        from: Option<Arc<RoomNode>>,
        to: Arc<RoomNode>,
        via: Option<EdgeLabel>,
    ) {
        self.set_phase(TransitionPhase::Loading);
        self.current = Some(Arc::clone(&to));

        let previous = from.as_ref().map(|room| room.room_id.clone());
        let floor_changed = from
            .as_ref()
            .is_some_and(|room| room.floor_number != to.floor_number);
        if floor_changed {
            info!(room = %to.room_id, floor = to.floor_number, "changed floor");
        }
        debug!(room = %to.room_id, edges = ?describe_edges(&to), "room loaded");

        let barrier = Barrier::new();
        self.bus.publish_held(&barrier, |hold| RoomEvent::Loaded {
            room: Arc::clone(&to),
            previous: previous.clone(),
            floor_changed,
            hold,
        });
        self.in_flight = Some(InFlight {
            from,
            to,
            via,
            toll: Toll::Free,
            barrier,
            phase_started: self.now,
            stall_warned: false,
            returning: false,
        });
    }

    fn finish_unloading(&mut self, failures: Vec<String>) -> Result<(), EngineError> {
        let Some(InFlight {
            from, to, via, toll, ..
        }) = self.in_flight.take()
        else {
            return Ok(());
        };

        if !failures.is_empty() {
            let reason = failures.join("; ");
            error!(to = %to.room_id, %reason, "unloading failed, transition aborted");
            self.abort(from);
            return Err(EngineError::CollaboratorFailed {
                phase: TransitionPhase::Unloading,
                reason,
            });
        }

        if let Err(err) = toll.commit(&mut self.session) {
            error!(to = %to.room_id, %err, "toll could not be paid, transition aborted");
            self.abort(from);
            return Err(err.into());
        }

        self.begin_loading(from, to, via);
        Ok(())
    }

    fn finish_loading(&mut self, failures: Vec<String>) -> Result<(), EngineError> {
        let Some(flight) = self.in_flight.take() else {
            return Ok(());
        };

        if flight.returning {
            self.set_phase(TransitionPhase::Idle);
            info!(room = %flight.to.room_id, "back in the room the aborted transition left");
            return if failures.is_empty() {
                Ok(())
            } else {
                let reason = failures.join("; ");
                error!(room = %flight.to.room_id, %reason, "collaborator failed reloading room");
                Err(EngineError::CollaboratorFailed {
                    phase: TransitionPhase::Loading,
                    reason,
                })
            };
        }

        let position = self
            .pending_arrival
            .take()
            .or_else(|| flight.to.default_spawn())
            .unwrap_or(Position::ORIGIN);
        self.session.traveler_mut().place(position);
        self.set_phase(TransitionPhase::Idle);

        let room = flight.to.room_id.clone();
        let settle_ticks = self.config.settle_ticks;
        self.bus.publish(|| RoomEvent::TravelerPlaced {
            room: room.clone(),
            position,
            settle_ticks,
        });
        info!(%room, %position, "traveler placed");

        if failures.is_empty() {
            Ok(())
        } else {
            let reason = failures.join("; ");
            error!(%room, %reason, "collaborator failed while loading");
            Err(EngineError::CollaboratorFailed {
                phase: TransitionPhase::Loading,
                reason,
            })
        }
    }

    /// Heads back into the room being left. Collaborators get a fresh held
    /// `RoomLoaded` for it so they can rebuild what they tore down, and the
    /// engine stays in `Loading` until every hold is released.
    fn abort(&mut self, from: Option<Arc<RoomNode>>) {
        self.pending_arrival = None;
        let Some(room) = from else {
            self.set_phase(TransitionPhase::Idle);
            return;
        };

        self.set_phase(TransitionPhase::Loading);
        let barrier = Barrier::new();
        self.bus.publish_held(&barrier, |hold| RoomEvent::Loaded {
            room: Arc::clone(&room),
            previous: Some(room.room_id.clone()),
            floor_changed: false,
            hold,
        });
        self.in_flight = Some(InFlight {
            from: None,
            to: room,
            via: None,
            toll: Toll::Free,
            barrier,
            phase_started: self.now,
            stall_warned: false,
            returning: true,
        });
    }

    fn set_phase(&mut self, next: TransitionPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase change {} -> {}",
            self.phase,
            next
        );
        debug!(from = %self.phase, to = %next, "transition phase");
        self.phase = next;
    }
}

// ---------------------------------------------------------------------------
// Arrival positions
// ---------------------------------------------------------------------------

/// Leaving through `direction` arrives through the destination's opposite
/// wall. Destinations without a matching entry spawn fall back to their
/// default spawn.
fn door_arrival(to: &RoomNode, direction: Direction, offset: Position) -> Position {
    let wall = direction.opposite();
    let base = to.entry_spawn(wall).or_else(|| {
        debug!(room = %to.room_id, %wall, "no entry spawn for wall, using default spawn");
        to.default_spawn()
    });
    base.unwrap_or(Position::ORIGIN) + offset
}

/// Stairs arrive beside the destination's matching stairs, if they lead back.
fn floor_arrival(to: &RoomNode, kind: FloorKind, from: &RoomId, offset: Position) -> Position {
    let base = kind
        .counterpart()
        .map(|back| to.floors.get(back))
        .filter(|edge| edge.exists && &edge.destination == from)
        .map(|edge| edge.position)
        .or_else(|| to.default_spawn());
    base.unwrap_or(Position::ORIGIN) + offset
}

/// Secret passages arrive at the destination's passage leading back.
fn secret_arrival(to: &RoomNode, passage_type: PassageType, from: &RoomId) -> Position {
    to.secrets
        .iter()
        .find(|s| s.passage_type == passage_type && &s.destination == from)
        .map(|s| s.position)
        .or_else(|| to.default_spawn())
        .unwrap_or(Position::ORIGIN)
}
