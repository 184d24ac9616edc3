//! Unified error type for Cryptwalk.

use cryptwalk_room::{CatalogError, EngineError};
use cryptwalk_session::SessionError;
use cryptwalk_types::CodecError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CryptwalkError {
    /// Catalog records or config could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A session-level error (missing key).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The room catalog failed validation.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A transition was aborted or a collaborator failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The runtime driving the game has shut down.
    #[error("game runtime has shut down")]
    Closed,
}
