//! Per-door-instance flags that outlive a single traversal.
//!
//! The catalog is immutable, so the two door flags that *can* change at
//! runtime live here instead, keyed by the door's position in the graph.
//! Both flags are monotonic: they flip false → true once and never back
//! (short of a new game).

use std::collections::HashSet;
use std::fmt;

use cryptwalk_types::{Direction, RoomId};

/// Addresses one door instance: the wall slot `direction` of room `room`.
///
/// The door from A to B and the door from B back to A are two different
/// instances. Unlocking one says nothing about the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DoorKey {
    pub room: RoomId,
    pub direction: Direction,
}

impl DoorKey {
    pub fn new(room: impl Into<RoomId>, direction: Direction) -> Self {
        Self {
            room: room.into(),
            direction,
        }
    }
}

impl fmt::Display for DoorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.room, self.direction)
    }
}

/// Session record of unlocked `Locked` doors and revealed `Hidden` doors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoorLedger {
    unlocked: HashSet<DoorKey>,
    revealed: HashSet<DoorKey>,
}

impl DoorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, door: &DoorKey) -> bool {
        self.unlocked.contains(door)
    }

    /// Flips the door's `unlocked` flag. Returns `false` if it was already set.
    pub fn mark_unlocked(&mut self, door: DoorKey) -> bool {
        self.unlocked.insert(door)
    }

    pub fn is_revealed(&self, door: &DoorKey) -> bool {
        self.revealed.contains(door)
    }

    /// Flips the door's `revealed` flag. Returns `false` if it was already set.
    pub fn reveal(&mut self, door: DoorKey) -> bool {
        self.revealed.insert(door)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }
}
