//! Error types for conference discovery.

use confsync_core::{CoreError, NodeId};
use confsync_face::FaceError;
use confsync_sync::SyncError;
use thiserror::Error;

/// Errors that can occur during discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The engine was shut down and cannot be restarted.
    #[error("discovery engine is shut down")]
    ShutDown,

    /// No engine runs on this node.
    #[error("unknown peer: {0}")]
    UnknownPeer(NodeId),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Face error.
    #[error("face error: {0}")]
    Face(#[from] FaceError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
