//! Error types for the Telegram binary.

use thiserror::Error;

/// Errors that can stop the Telegram bot from starting.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] restock_core::ConfigError),

    /// Inventory backend could not be built.
    #[error("Inventory backend error: {0}")]
    Lookup(#[from] restock_inventory::LookupError),

    /// Runner error.
    #[error("Runtime error: {0}")]
    Runtime(#[from] restock_runtime::RuntimeError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;
