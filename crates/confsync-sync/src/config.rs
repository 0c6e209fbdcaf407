//! Synchronizer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and sizing knobs for [`crate::DigestSync`].
///
/// Durations serialize as whole milliseconds. Missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Lifetime of each outgoing discovery query.
    #[serde(with = "confsync_core::duration_ms")]
    pub query_lifetime: Duration,
    /// How long a discovery response may be served from cache.
    #[serde(with = "confsync_core::duration_ms")]
    pub response_freshness: Duration,
    /// Pause between a discovery response and the next query.
    #[serde(with = "confsync_core::duration_ms")]
    pub query_interval: Duration,
    /// Capacity of the pending request table.
    pub max_pending: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            query_lifetime: Duration::from_millis(2000),
            response_freshness: Duration::from_millis(4000),
            query_interval: Duration::from_millis(500),
            max_pending: 256,
        }
    }
}
