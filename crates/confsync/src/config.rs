//! Discovery engine configuration.

use std::time::Duration;

use confsync_core::Name;
use confsync_sync::SyncConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Broadcast namespace every peer serves and queries.
pub const DEFAULT_BROADCAST_PREFIX: &str = "/ndn/broadcast/conference-discovery";

/// Configuration for a [`crate::ConferenceDiscovery`].
///
/// Durations are written in milliseconds. A JSON document only needs the
/// fields it changes:
///
/// ```rust
/// use confsync::DiscoveryConfig;
///
/// let config = DiscoveryConfig::from_json_str(r#"{"keep_period": 5000}"#).unwrap();
/// assert_eq!(config.keep_period.as_millis(), 5000);
/// assert_eq!(config.heartbeat_interval.as_millis(), 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Namespace of the discovery queries.
    pub broadcast_prefix: Name,
    /// Lifetime of each liveness query.
    #[serde(with = "confsync_core::duration_ms")]
    pub liveness_lifetime: Duration,
    /// How long a liveness reply may be served from cache.
    #[serde(with = "confsync_core::duration_ms")]
    pub liveness_freshness: Duration,
    /// Delay between a confirmed liveness query and the next one.
    #[serde(with = "confsync_core::duration_ms")]
    pub heartbeat_interval: Duration,
    /// How long a stopped conference keeps answering liveness queries.
    #[serde(with = "confsync_core::duration_ms")]
    pub keep_period: Duration,
    /// Synchronizer settings.
    pub sync: SyncConfig,
}

impl DiscoveryConfig {
    /// Load a configuration from JSON, taking defaults for missing fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            broadcast_prefix: Name::parse(DEFAULT_BROADCAST_PREFIX).unwrap_or_default(),
            liveness_lifetime: Duration::from_millis(2000),
            liveness_freshness: Duration::from_millis(2000),
            heartbeat_interval: Duration::from_millis(2000),
            keep_period: Duration::from_millis(3000),
            sync: SyncConfig::default(),
        }
    }
}
