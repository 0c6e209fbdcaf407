//! Error types for confsync core.

use thiserror::Error;

/// Errors raised while building or decoding core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid name component {component:?}: {reason}")]
    InvalidComponent {
        component: String,
        reason: &'static str,
    },

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid digest: {0:?}")]
    InvalidDigest(String),

    #[error("malformed object list: {0}")]
    MalformedPayload(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
