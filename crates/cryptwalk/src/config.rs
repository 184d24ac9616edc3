//! Aggregate configuration for a [`Game`](crate::Game).

use cryptwalk_room::{CatalogConfig, EngineConfig, SpawnConfig};
use cryptwalk_session::SessionConfig;
use cryptwalk_tick::TickConfig;
use cryptwalk_types::{Codec, JsonCodec};
use serde::{Deserialize, Serialize};

use crate::CryptwalkError;

/// Every knob a game exposes, in one serializable struct.
///
/// Missing sections fall back to their defaults, so `{}` is a valid config.
///
/// ```rust
/// use cryptwalk::GameConfig;
///
/// let config = GameConfig::from_json(br#"{ "tick_rate_hz": 30 }"#).unwrap();
/// assert_eq!(config.tick_rate_hz, 30);
/// assert_eq!(config.engine.settle_ticks, 30);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub catalog: CatalogConfig,
    pub engine: EngineConfig,
    pub spawn: SpawnConfig,
    /// Tick rate for [`GameRuntime`](crate::GameRuntime). 0 = event driven.
    pub tick_rate_hz: u32,
    /// Random jitter (µs) added to the first tick only.
    pub initial_jitter_us: u64,
}

impl GameConfig {
    /// Decodes a config from JSON.
    ///
    /// # Errors
    /// [`CryptwalkError::Codec`] if the JSON is malformed.
    pub fn from_json(data: &[u8]) -> Result<Self, CryptwalkError> {
        Ok(JsonCodec.decode(data)?)
    }

    /// The scheduler settings for the runtime loop.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            tick_rate_hz: self.tick_rate_hz,
            initial_jitter_us: self.initial_jitter_us,
        }
    }
}
