//! Telegram transport for the restock notifier.
//!
//! Recipients are Telegram chat ids (or `@channel` usernames). Every inbound
//! text message is forwarded to the runner, which answers `status` (or
//! `<bot> status`) from authorized chats.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather (unless set in config.toml)
//!
//! Optional:
//! - `RESTOCK_STORE_ID`, `RESTOCK_ITEM_IDS`, `RESTOCK_RECIPIENTS`,
//!   `RESTOCK_POLL_INTERVAL`: override config.toml values

pub mod bot;
pub mod error;
pub mod notifier;

pub use bot::{DispatcherHandle, TelegramBot};
pub use error::{Result, TelegramError};
pub use notifier::{parse_recipient, split_message, TelegramNotifier, MAX_MESSAGE_LEN};
