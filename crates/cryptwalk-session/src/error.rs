//! Error types for the session layer.

use cryptwalk_types::KeyColor;

/// Errors that can occur while mutating session state.
///
/// Gameplay refusals ("you lack the key") are not errors at the guard
/// level; this variant only surfaces when code tries to spend a key
/// without checking first.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No key of this colour is held.
    #[error("no {0} key in inventory")]
    MissingKey(KeyColor),
}
