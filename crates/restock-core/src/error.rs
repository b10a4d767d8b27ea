//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// None of these has a safe default; the binary aborts startup on any of them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has wrong field types.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// No store id configured.
    #[error("store_id is not set. Set it in config.toml or RESTOCK_STORE_ID.")]
    MissingStore,

    /// No items configured.
    #[error("item_ids is empty. Configure at least one item to track.")]
    NoItems,

    /// An item id is empty.
    #[error("item_ids contains a blank entry")]
    BlankItem,

    /// The same item is listed twice.
    #[error("item {0} is listed more than once")]
    DuplicateItem(String),

    /// No recipients configured.
    #[error("recipients is empty. Configure at least one chat address to notify.")]
    NoRecipients,

    /// The same recipient is listed twice.
    #[error("recipient {0} is listed more than once")]
    DuplicateRecipient(String),

    /// A recipient address is empty.
    #[error("recipients contains a blank entry")]
    BlankRecipient,

    /// Poll interval is zero.
    #[error("poll_interval_seconds must be greater than zero")]
    InvalidInterval,

    /// A timeout is zero.
    #[error("{0} must be greater than zero")]
    InvalidTimeout(&'static str),

    /// Chat credentials missing.
    #[error("Telegram bot token not set. Set credentials.telegram_bot_token or TELEGRAM_BOT_TOKEN.")]
    MissingToken,

    /// Lookup backend misconfigured.
    #[error("invalid lookup configuration: {0}")]
    InvalidLookup(String),

    /// Environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
