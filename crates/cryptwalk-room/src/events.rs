//! Typed room lifecycle events and the bus that delivers them.
//!
//! Every subscriber gets its own unbounded channel and receives every
//! event. Subscribers are collaborators living on the same tick loop: they
//! drain their [`Subscription`] once per tick and act on what they find.
//!
//! # Holds
//!
//! `RoomUnloading` and `RoomLoaded` each carry a [`Hold`]. The engine does
//! not move to the next phase until every hold handed out for the current
//! phase has been dropped. A collaborator that needs several ticks to
//! finish (a despawn animation, a deferred spawn) keeps its hold until it
//! is done. A collaborator that doesn't care simply drops the event.
//!
//! ```text
//! engine ──RoomUnloading{hold}──→ subscriber A ─ (tick 1) ─ drop(hold)
//!        └─RoomUnloading{hold}──→ subscriber B ─ (tick 3) ─ drop(hold)
//!                                                            │
//! engine: barrier clear on tick 3 ───────────────────────────┘
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use cryptwalk_types::{Position, RoomId, RoomNode};
use tokio::sync::mpsc;
use tracing::debug;

use crate::Denial;

// ---------------------------------------------------------------------------
// Hold / Barrier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BarrierState {
    failures: Mutex<Vec<String>>,
}

/// A collaborator's claim on the current transition phase.
///
/// Dropping the hold (or calling [`release`](Self::release)) signals that
/// the collaborator is done with the phase. [`fail`](Self::fail) signals
/// done-but-broken.
#[derive(Debug)]
pub struct Hold {
    state: Arc<BarrierState>,
}

impl Hold {
    /// Releases the hold. Same as dropping it.
    pub fn release(self) {}

    /// Releases the hold and records that the collaborator could not do its
    /// job for this phase.
    pub fn fail(self, reason: impl Into<String>) {
        self.state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reason.into());
    }
}

/// The engine's side of a phase: hands out holds and reports when all of
/// them are gone.
#[derive(Debug, Default)]
pub(crate) struct Barrier {
    state: Arc<BarrierState>,
}

impl Barrier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn hold(&self) -> Hold {
        Hold {
            state: Arc::clone(&self.state),
        }
    }

    /// Holds still outstanding.
    pub(crate) fn outstanding(&self) -> usize {
        Arc::strong_count(&self.state) - 1
    }

    pub(crate) fn is_clear(&self) -> bool {
        self.outstanding() == 0
    }

    /// Failure reasons recorded so far, leaving the list empty.
    pub(crate) fn take_failures(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .state
                .failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

// ---------------------------------------------------------------------------
// RoomEvent
// ---------------------------------------------------------------------------

/// Events published by the [`TransitionEngine`](crate::TransitionEngine).
///
/// Ordering per transition is always `Unloading` (absent on game start),
/// then `Loaded`, then `TravelerPlaced`. `AccessDenied` is published for a
/// refused request and never starts a transition.
#[derive(Debug)]
pub enum RoomEvent {
    /// The traveler is leaving `room`. Tear down what belongs to it.
    Unloading { room: RoomId, hold: Hold },

    /// `room` is now the current room. Populate it.
    Loaded {
        room: Arc<RoomNode>,
        previous: Option<RoomId>,
        /// The floor number differs from the previous room's.
        floor_changed: bool,
        hold: Hold,
    },

    /// The traveler stands at `position` with zero velocity. The transition
    /// is over.
    TravelerPlaced {
        room: RoomId,
        position: Position,
        settle_ticks: u32,
    },

    /// A request from `room` was refused.
    AccessDenied { room: RoomId, denial: Denial },
}

impl RoomEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unloading { .. } => "room_unloading",
            Self::Loaded { .. } => "room_loaded",
            Self::TravelerPlaced { .. } => "traveler_placed",
            Self::AccessDenied { .. } => "access_denied",
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Identifies one subscription on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A subscriber's end of the bus.
///
/// Dropping the subscription unsubscribes; any holds still queued in it
/// are released with it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<RoomEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Takes the next queued event without waiting.
    pub fn try_next(&mut self) -> Option<RoomEvent> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next event. Returns `None` once the engine has shut
    /// down and the queue is drained.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.receiver.recv().await
    }
}

/// Fan-out of room events to every live subscription.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<(SubscriptionId, mpsc::UnboundedSender<RoomEvent>)>,
    next_id: u64,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (tx, receiver) = mpsc::unbounded_channel();
        self.subscribers.push((id, tx));
        debug!(subscription = %id, "subscribed to room events");
        Subscription { id, receiver }
    }

    /// Returns `false` if `id` wasn't subscribed.
    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Publishes an event built per subscriber, each copy carrying its own
    /// hold on `barrier`.
    pub(crate) fn publish_held(&mut self, barrier: &Barrier, make: impl Fn(Hold) -> RoomEvent) {
        self.deliver(|| make(barrier.hold()));
    }

    pub(crate) fn publish(&mut self, make: impl Fn() -> RoomEvent) {
        self.deliver(make);
    }

    /// Drops every sender. Subscribers see the end of their stream once
    /// they drain what's queued.
    pub(crate) fn close(&mut self) {
        self.subscribers.clear();
    }

    // A send only fails when the receiver is gone. The event (and any hold
    // in it) is dropped with the error, and the subscriber is pruned.
    fn deliver(&mut self, make: impl Fn() -> RoomEvent) {
        self.subscribers.retain(|(id, tx)| {
            let event = make();
            let name = event.name();
            match tx.send(event) {
                Ok(()) => true,
                Err(_) => {
                    debug!(subscription = %id, event = name, "subscriber gone, pruning");
                    false
                }
            }
        });
    }
}
