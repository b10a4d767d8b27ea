//! Error types for the runtime crate.

use std::time::Duration;

use thiserror::Error;

/// A message could not be delivered to one recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The send did not finish in time.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// The transport cannot address this recipient.
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    /// The transport reported a failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A bot was registered with a zero poll interval.
    #[error("poll interval for bot '{0}' must be greater than zero")]
    InvalidInterval(String),

    /// Runner not started.
    #[error("runner not started")]
    NotStarted,

    /// Runner already started.
    #[error("runner already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
