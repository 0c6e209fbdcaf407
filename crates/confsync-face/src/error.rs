//! Error types for the face module.

use confsync_core::NodeId;
use thiserror::Error;

/// Errors that can occur when addressing a network.
#[derive(Debug, Error)]
pub enum FaceError {
    /// No node with this id is attached.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}

/// Result type for face operations.
pub type Result<T> = std::result::Result<T, FaceError>;
