//! Session state for Cryptwalk.
//!
//! A session lives from "new game" to "game over". This crate holds every
//! piece of mutable state the room graph is allowed to touch:
//!
//! 1. **Inventory**: keys held and keys spent ([`Inventory`])
//! 2. **Traveler**: position, motion, and the passage-access capability ([`Traveler`])
//! 3. **Door ledger**: which door instances are unlocked or revealed ([`DoorLedger`])
//! 4. **Persistence**: which pickups and one-time enemies are already
//!    resolved ([`PersistenceTracker`])
//!
//! [`Session`] bundles the four so a transition can snapshot, compare, and
//! reset them as one value.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← guards read and mutate the session, the engine owns it
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Types Layer (below)  ← provides RoomId, KeyColor, Identity
//! ```

mod error;
mod inventory;
mod ledger;
mod session;
mod tracker;
mod traveler;

pub use error::SessionError;
pub use inventory::Inventory;
pub use ledger::{DoorKey, DoorLedger};
pub use session::{Session, SessionConfig};
pub use tracker::PersistenceTracker;
pub use traveler::{Traveler, Velocity};
