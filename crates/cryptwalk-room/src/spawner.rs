//! Entity lifecycle for the current room.
//!
//! The [`SpawnDirector`] subscribes to room events. On `RoomUnloading` it
//! clears every entity that belongs to the room being left; on
//! `RoomLoaded` it populates the new room from its spawn declarations,
//! skipping anything the session has already collected or killed. Both may
//! be deferred by a configurable number of ticks, during which the director
//! keeps the phase's hold so the engine waits.
//!
//! Entities live in a `SlotMap` keyed by [`EntityHandle`] and are tagged
//! with the room they belong to. Entities of two rooms never coexist: a load that finds
//! entities of another room still alive fails its hold instead of
//! populating.

use std::collections::HashSet;
use std::sync::Arc;

use cryptwalk_session::PersistenceTracker;
use cryptwalk_tick::Continuations;
use cryptwalk_types::{Identity, Position, RoomId, RoomNode, SpawnDecl, TemplateId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::{SlotMap, new_key_type};
use tracing::{debug, info, trace, warn};

use crate::{Hold, RoomEvent, SpawnConfig, Subscription};

new_key_type! {
    /// A handle to a live entity. Stale once the entity is gone, even if
    /// its slot is reused.
    pub struct EntityHandle;
}

/// What kind of declaration an entity was spawned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Enemy,
    Item,
    Hazard,
}

/// A live entity in the current room.
#[derive(Debug, Clone, PartialEq)]
pub struct Spawned {
    pub kind: EntityKind,
    pub identity: Identity,
    /// Whether collecting or killing this entity is remembered.
    pub tracked: bool,
}

impl Spawned {
    pub fn room(&self) -> &RoomId {
        &self.identity.room
    }

    pub fn template(&self) -> &TemplateId {
        &self.identity.template
    }

    pub fn position(&self) -> Position {
        self.identity.position
    }
}

#[derive(Debug)]
enum Job {
    Clear { room: RoomId, hold: Hold },
    Populate { room: Arc<RoomNode>, hold: Hold },
}

/// Spawns and despawns the entities of whichever room is current.
#[derive(Debug)]
pub struct SpawnDirector {
    subscription: Subscription,
    arena: SlotMap<EntityHandle, Spawned>,
    jobs: Continuations<Job>,
    config: SpawnConfig,
    rng: StdRng,
}

impl SpawnDirector {
    pub fn new(subscription: Subscription, config: SpawnConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            subscription,
            arena: SlotMap::with_key(),
            jobs: Continuations::new(),
            config,
            rng,
        }
    }

    /// Drains queued room events and runs every job due by `now`.
    ///
    /// Returns how many events and jobs were handled, so a driver can loop
    /// until nothing moves.
    pub fn pump(&mut self, now: u64, tracker: &PersistenceTracker) -> usize {
        let mut handled = 0;

        while let Some(event) = self.subscription.try_next() {
            handled += 1;
            match event {
                RoomEvent::Unloading { room, hold } => {
                    let delay = self.config.despawn_delay_ticks;
                    self.jobs.schedule_after(now, delay, Job::Clear { room, hold });
                }
                RoomEvent::Loaded { room, hold, .. } => {
                    let delay = self.config.spawn_delay_ticks;
                    self.jobs.schedule_after(now, delay, Job::Populate { room, hold });
                }
                RoomEvent::TravelerPlaced { .. } | RoomEvent::AccessDenied { .. } => {}
            }
        }

        for job in self.jobs.drain_due(now) {
            handled += 1;
            match job {
                Job::Clear { room, hold } => {
                    self.clear_room(&room);
                    hold.release();
                }
                Job::Populate { room, hold } => self.populate(&room, tracker, hold),
            }
        }

        handled
    }

    /// Picks up an item. Persistent items are marked collected so they
    /// never spawn again this session.
    ///
    /// Returns `None` for stale handles and for entities that aren't items.
    pub fn collect(
        &mut self,
        handle: EntityHandle,
        tracker: &mut PersistenceTracker,
    ) -> Option<Spawned> {
        self.resolve(handle, EntityKind::Item, |identity| tracker.mark_collected(identity))
    }

    /// Kills an enemy. Unique enemies are marked killed so they never spawn
    /// again this session.
    pub fn kill(
        &mut self,
        handle: EntityHandle,
        tracker: &mut PersistenceTracker,
    ) -> Option<Spawned> {
        self.resolve(handle, EntityKind::Enemy, |identity| tracker.mark_killed(identity))
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Spawned> {
        self.arena.get(handle)
    }

    /// Finds the live entity spawned from `template` at `position`.
    pub fn find(&self, template: &str, position: impl Into<Position>) -> Option<EntityHandle> {
        let position = position.into();
        self.arena
            .iter()
            .find(|(_, spawned)| {
                spawned.template().as_str() == template && spawned.position() == position
            })
            .map(|(handle, _)| handle)
    }

    pub fn live(&self) -> impl Iterator<Item = (EntityHandle, &Spawned)> {
        self.arena.iter()
    }

    pub fn live_count(&self) -> usize {
        self.arena.len()
    }

    pub fn live_in(&self, room: &RoomId) -> usize {
        self.arena.iter().filter(|(_, spawned)| spawned.room() == room).count()
    }

    /// Jobs waiting for a later tick.
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Despawns everything now, ignoring any configured delay.
    ///
    /// Pending clears run immediately and pending populates are dropped;
    /// either way their holds are released. Returns how many entities were
    /// despawned.
    pub fn shutdown(&mut self) -> usize {
        while let Some(event) = self.subscription.try_next() {
            match event {
                RoomEvent::Unloading { hold, .. } | RoomEvent::Loaded { hold, .. } => {
                    hold.release()
                }
                RoomEvent::TravelerPlaced { .. } | RoomEvent::AccessDenied { .. } => {}
            }
        }
        for job in self.jobs.drain_due(u64::MAX) {
            match job {
                Job::Clear { room, hold } => {
                    self.clear_room(&room);
                    hold.release();
                }
                Job::Populate { hold, .. } => hold.release(),
            }
        }

        let despawned = self.arena.len();
        self.arena.clear();
        if despawned > 0 {
            debug!(despawned, "spawn director shut down with entities still alive");
        }
        despawned
    }

    fn resolve(
        &mut self,
        handle: EntityHandle,
        kind: EntityKind,
        mark: impl FnOnce(Identity) -> bool,
    ) -> Option<Spawned> {
        if self.arena.get(handle)?.kind != kind {
            return None;
        }
        let spawned = self.arena.remove(handle)?;
        if spawned.tracked && mark(spawned.identity.clone()) {
            info!(identity = %spawned.identity, ?kind, "resolved for the rest of the session");
        }
        Some(spawned)
    }

    fn clear_room(&mut self, room: &RoomId) {
        let before = self.arena.len();
        self.arena.retain(|_, spawned| spawned.room() != room);
        debug!(%room, despawned = before - self.arena.len(), "room entities cleared");
    }

    fn populate(&mut self, room: &RoomNode, tracker: &PersistenceTracker, hold: Hold) {
        let stale: HashSet<&RoomId> = self
            .arena
            .iter()
            .map(|(_, spawned)| spawned.room())
            .filter(|owner| *owner != &room.room_id)
            .collect();
        if !stale.is_empty() {
            let owners: Vec<&str> = stale.iter().map(|id| id.as_str()).collect();
            warn!(
                room = %room.room_id,
                ?owners,
                "entities of another room still alive, not populating"
            );
            hold.fail(format!(
                "entities of {} still alive while loading {}",
                owners.join(", "),
                room.room_id
            ));
            return;
        }

        // Re-entering the same room (an aborted transition) starts fresh.
        self.clear_room(&room.room_id);

        let mut spawned = 0;
        spawned += self.spawn_all(&room.room_id, &room.enemies, EntityKind::Enemy, tracker);
        spawned += self.spawn_all(&room.room_id, &room.items, EntityKind::Item, tracker);
        spawned += self.spawn_all(&room.room_id, &room.hazards, EntityKind::Hazard, tracker);
        debug!(room = %room.room_id, spawned, "room populated");
        hold.release();
    }

    fn spawn_all<D: SpawnDecl>(
        &mut self,
        room: &RoomId,
        decls: &[D],
        kind: EntityKind,
        tracker: &PersistenceTracker,
    ) -> usize {
        let mut count = 0;
        for decl in decls {
            let identity = decl.identity(room);
            let resolved = match kind {
                EntityKind::Item => tracker.is_collected(&identity),
                EntityKind::Enemy => tracker.is_killed(&identity),
                EntityKind::Hazard => false,
            };
            if decl.tracked() && resolved {
                trace!(%identity, "already resolved, skipping");
                continue;
            }
            if !self.roll(decl.probability()) {
                trace!(%identity, "spawn roll failed");
                continue;
            }
            self.arena.insert(Spawned {
                kind,
                identity,
                tracked: decl.tracked(),
            });
            count += 1;
        }
        count
    }

    fn roll(&mut self, probability: f64) -> bool {
        if probability >= 1.0 {
            true
        } else if probability <= 0.0 || probability.is_nan() {
            false
        } else {
            self.rng.random_bool(probability)
        }
    }
}
