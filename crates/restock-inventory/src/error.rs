//! Inventory lookup errors.

use std::time::Duration;

use thiserror::Error;

/// Errors from a single (store, item) lookup.
///
/// All of them are recoverable: the monitor keeps the cached state and
/// retries on a later tick.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The lookup did not finish in time.
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The stock checker exited unsuccessfully.
    #[error("stock checker failed: {0}")]
    CommandFailed(String),

    /// The stock checker could not be spawned.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The report could not be understood.
    #[error("malformed stock report: {0}")]
    Parse(String),

    /// The report did not mention the requested item.
    #[error("unknown item: {0}")]
    UnknownItem(String),
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Http(format!("timed out: {}", e))
        } else {
            LookupError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        LookupError::Parse(e.to_string())
    }
}
