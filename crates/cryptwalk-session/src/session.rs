//! The session aggregate and its configuration.

use cryptwalk_types::{KeyColor, PassageType};
use serde::{Deserialize, Serialize};

use crate::{DoorLedger, Inventory, PersistenceTracker, Traveler};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// How a fresh session starts out.
///
/// Kept around by the [`Session`] so a "new game" can rebuild the exact
/// same starting state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The secret-passage type the character can operate.
    pub passage_access: Option<PassageType>,

    /// Keys in the inventory at the start of a game.
    pub starting_keys: Vec<KeyColor>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// All session-scoped state the room graph reads or writes.
///
/// Every refusal and abort path leaves the session equal (`PartialEq`) to
/// a `clone` taken before the attempt.
///
/// ## Lifecycle
///
/// ```text
/// Session::new(config) ──→ play (guards + engine mutate) ──→ new_game() ──→ play ...
/// ```
///
/// Nothing else resets state. There is no partial reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    inventory: Inventory,
    traveler: Traveler,
    doors: DoorLedger,
    tracker: PersistenceTracker,
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let mut inventory = Inventory::new();
        for color in &config.starting_keys {
            inventory.grant_key(*color);
        }
        Self {
            inventory,
            traveler: Traveler::new(config.passage_access),
            doors: DoorLedger::new(),
            tracker: PersistenceTracker::new(),
            config,
        }
    }

    /// Discards everything and rebuilds the starting state from the
    /// original config.
    pub fn new_game(&mut self) {
        *self = Self::new(self.config.clone());
        tracing::info!("session reset for new game");
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn traveler(&self) -> &Traveler {
        &self.traveler
    }

    pub fn traveler_mut(&mut self) -> &mut Traveler {
        &mut self.traveler
    }

    pub fn doors(&self) -> &DoorLedger {
        &self.doors
    }

    pub fn doors_mut(&mut self) -> &mut DoorLedger {
        &mut self.doors
    }

    pub fn tracker(&self) -> &PersistenceTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PersistenceTracker {
        &mut self.tracker
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
