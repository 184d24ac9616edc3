//! Codec trait and implementations for catalog records.
//!
//! Room data is authored as plain records and loaded once at startup. The
//! loader doesn't care HOW the records are stored. It just needs something
//! that implements [`Codec`]. [`JsonCodec`] is the stock implementation;
//! a binary format can be slotted in later without touching the catalog.

use serde::{Serialize, de::DeserializeOwned};

use crate::CodecError;

/// Encodes records to bytes and decodes bytes back into records.
///
/// `Send + Sync + 'static` so a codec can live inside long-lived services
/// that may be moved to another thread by a multi-threaded host.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`CodecError::Decode`] if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON keeps authored room data diffable and easy to hand-edit. This is
/// behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use cryptwalk_types::{Codec, JsonCodec, RoomId, RoomNode, RoomType};
///
/// let codec = JsonCodec;
/// let room = RoomNode::new("castle_hall", 2, RoomType::Hall).start_room();
///
/// let bytes = codec.encode(&room).unwrap();
/// let decoded: RoomNode = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded.room_id, RoomId::from("castle_hall"));
/// assert!(decoded.is_start_room);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(data).map_err(CodecError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Direction, DoorEdge, KeyColor, RoomNode, RoomType};

    #[test]
    fn test_decode_minimal_room_fills_defaults() {
        // Authored data only needs the identity fields; every edge slot
        // defaults to "absent" and every spawn list to empty.
        let json = br#"{ "room_id": "cellar", "floor_number": 1, "room_type": "Cellar" }"#;
        let room: RoomNode = JsonCodec.decode(json).expect("should decode");

        assert_eq!(room.room_id.as_str(), "cellar");
        assert!(!room.is_start_room);
        assert!(room.doors.iter().all(|(_, door)| !door.exists));
        assert!(room.secrets.is_empty());
        assert!(room.enemies.is_empty());
    }

    #[test]
    fn test_decode_locked_door_keeps_key() {
        let room = RoomNode::new("hall", 2, RoomType::Hall).door(
            Direction::East,
            DoorEdge::locked("vault", KeyColor::Red),
        );
        let bytes = JsonCodec.encode(&room).expect("should encode");
        let decoded: RoomNode = JsonCodec.decode(&bytes).expect("should decode");

        let door = decoded.doors.get(Direction::East);
        assert!(door.exists);
        assert_eq!(door.required_key, Some(KeyColor::Red));
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<RoomNode, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
