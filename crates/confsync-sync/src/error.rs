//! Error types for the sync module.

use thiserror::Error;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A payload or name could not be decoded.
    #[error("core error: {0}")]
    Core(#[from] confsync_core::CoreError),

    /// The synchronizer was shut down and cannot be restarted.
    #[error("synchronizer is shut down")]
    ShutDown,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
