//! Key inventory.
//!
//! Only keys matter to the room graph. Everything else the traveler carries
//! belongs to the inventory UI collaborator and never passes through here.

use std::collections::HashMap;

use cryptwalk_types::KeyColor;

use crate::SessionError;

/// Keys the traveler holds, plus a record of every key spent on a door.
///
/// Both sides are multisets: holding two red keys is `keys[Red] == 2`.
/// A colour with zero keys is removed from the map rather than kept at
/// zero, so two inventories with the same contents always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    keys: HashMap<KeyColor, u32>,
    consumed: HashMap<KeyColor, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one key of `color`.
    pub fn grant_key(&mut self, color: KeyColor) {
        *self.keys.entry(color).or_insert(0) += 1;
        tracing::debug!(%color, held = self.key_count(color), "key granted");
    }

    /// How many keys of `color` are held.
    pub fn key_count(&self, color: KeyColor) -> u32 {
        self.keys.get(&color).copied().unwrap_or(0)
    }

    /// `true` if at least one key of `color` is held.
    pub fn has_key(&self, color: KeyColor) -> bool {
        self.key_count(color) > 0
    }

    /// Spends exactly one key of `color`.
    ///
    /// # Errors
    /// Returns [`SessionError::MissingKey`] if none is held. The inventory
    /// is left untouched in that case.
    pub fn consume_key(&mut self, color: KeyColor) -> Result<(), SessionError> {
        let held = self
            .keys
            .get_mut(&color)
            .ok_or(SessionError::MissingKey(color))?;
        *held -= 1;
        if *held == 0 {
            self.keys.remove(&color);
        }
        *self.consumed.entry(color).or_insert(0) += 1;
        Ok(())
    }

    /// How many keys of `color` have been spent this session.
    pub fn consumed_count(&self, color: KeyColor) -> u32 {
        self.consumed.get(&color).copied().unwrap_or(0)
    }

    /// Total keys held across all colours.
    pub fn total_keys(&self) -> u32 {
        self.keys.values().sum()
    }
}
