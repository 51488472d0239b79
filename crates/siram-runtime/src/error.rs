//! Error types for the runtime crate.

use siram_store::StoreError;
use thiserror::Error;

use crate::chat::ChatError;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Chat error.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// A user document could not be decoded.
    #[error("invalid user record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    /// The user has no phone number to send to.
    #[error("no phone number for {0}")]
    NoPhone(String),

    /// Service already started.
    #[error("service already started")]
    AlreadyStarted,

    /// Service not started.
    #[error("service not started")]
    NotStarted,
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
