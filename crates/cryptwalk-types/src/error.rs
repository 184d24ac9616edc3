//! Error types for record encoding and decoding.
//!
//! Each crate in Cryptwalk defines its own error enum. A `CodecError` always
//! means "these bytes and these records disagree", never a gameplay problem.

/// Errors that can occur while converting records to or from bytes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed (records into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed input, missing fields, or
    /// values of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The bytes decoded, but the record breaks a data-model rule
    /// (for example a spawn probability of 1.5).
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
