//! The persistence tracker: which spawn identities are already resolved.
//!
//! Two independent sets, one for collected pickups and one for killed
//! enemies. Entity-lifecycle collaborators consult it when a room loads so
//! a persistent item is never re-granted and a one-time enemy never
//! respawns within a session.
//!
//! Only declarations that opt in (`persists_across_visits` items,
//! `!respawns_on_reentry` enemies) are ever marked; everything else
//! re-resolves on every room entry with no memory.

use std::collections::HashSet;

use cryptwalk_types::Identity;

/// Session-scoped record of resolved spawn identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceTracker {
    collected: HashSet<Identity>,
    killed: HashSet<Identity>,
}

impl PersistenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collected(&self, identity: &Identity) -> bool {
        self.collected.contains(identity)
    }

    /// Records a pickup. Idempotent: marking twice is a no-op and returns
    /// `false` the second time.
    pub fn mark_collected(&mut self, identity: Identity) -> bool {
        let fresh = self.collected.insert(identity);
        if fresh {
            tracing::debug!(collected = self.collected.len(), "item marked collected");
        }
        fresh
    }

    pub fn is_killed(&self, identity: &Identity) -> bool {
        self.killed.contains(identity)
    }

    /// Records a one-time kill. Idempotent, like [`mark_collected`](Self::mark_collected).
    pub fn mark_killed(&mut self, identity: Identity) -> bool {
        let fresh = self.killed.insert(identity);
        if fresh {
            tracing::debug!(killed = self.killed.len(), "enemy marked killed");
        }
        fresh
    }

    /// Forgets everything. Only a new game calls this.
    pub fn reset_all(&mut self) {
        self.collected.clear();
        self.killed.clear();
    }

    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }

    pub fn killed_count(&self) -> usize {
        self.killed.len()
    }

    /// The collected set, for a save layer to serialize.
    pub fn collected(&self) -> impl Iterator<Item = &Identity> {
        self.collected.iter()
    }

    /// The killed set, for a save layer to serialize.
    pub fn killed(&self) -> impl Iterator<Item = &Identity> {
        self.killed.iter()
    }
}
