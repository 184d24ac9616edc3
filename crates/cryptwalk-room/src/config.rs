//! Catalog, engine, and spawn configuration, plus the transition state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// How strict the catalog is when it validates authored rooms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Refuse to build when a door has no door leading back. When `false`
    /// the asymmetry is only logged and reported by
    /// [`Catalog::asymmetric_doors`](crate::Catalog::asymmetric_doors).
    pub require_reciprocal_doors: bool,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for the [`TransitionEngine`](crate::TransitionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks the traveler's physics should stay settled after placement.
    /// Carried on `TravelerPlaced` for the movement collaborator.
    pub settle_ticks: u32,

    /// A phase that waits longer than this on collaborator holds gets a
    /// warning in the log. The engine keeps waiting either way.
    pub stall_warning_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_ticks: 30,
            stall_warning_ticks: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// SpawnConfig
// ---------------------------------------------------------------------------

/// Configuration for the [`SpawnDirector`](crate::SpawnDirector).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Ticks between a room loading and its entities appearing.
    pub spawn_delay_ticks: u64,

    /// Ticks between a room unloading and its entities being cleared.
    pub despawn_delay_ticks: u64,

    /// Seed for spawn-probability rolls. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// TransitionPhase
// ---------------------------------------------------------------------------

/// Where the engine is in a room swap.
///
/// ```text
/// Idle → Unloading → Loading → Idle
/// ```
///
/// - **Idle**: the traveler is in a room; requests are accepted.
/// - **Unloading**: the old room's collaborators are tearing down. The
///   current room has not changed yet.
/// - **Loading**: the current room is the destination; collaborators are
///   populating it. The traveler is placed when this phase clears.
///
/// A game start skips `Unloading` (there is no old room).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionPhase {
    #[default]
    Idle,
    Unloading,
    Loading,
}

impl TransitionPhase {
    /// Returns the next phase in the cycle.
    pub fn next(self) -> TransitionPhase {
        match self {
            Self::Idle => Self::Unloading,
            Self::Unloading => Self::Loading,
            Self::Loading => Self::Idle,
        }
    }

    /// Whether the engine may move from `self` to `target`.
    ///
    /// `Idle → Loading` is the game-start path. A collaborator that fails to
    /// tear down sends the engine from `Unloading` back to `Loading` the
    /// room it was leaving; `Unloading → Idle` covers an abort with no
    /// room to return to.
    pub fn can_transition_to(self, target: TransitionPhase) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Unloading)
                | (Self::Idle, Self::Loading)
                | (Self::Unloading, Self::Loading)
                | (Self::Unloading, Self::Idle)
                | (Self::Loading, Self::Idle)
        )
    }

    /// `true` in every phase except `Idle`.
    pub fn is_transitioning(self) -> bool {
        self != Self::Idle
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Unloading => write!(f, "unloading"),
            Self::Loading => write!(f, "loading"),
        }
    }
}
