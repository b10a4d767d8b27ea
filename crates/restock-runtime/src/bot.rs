//! The capability set every bot hosted by the runner provides.

use std::time::Duration;

use async_trait::async_trait;
use restock_models::Address;

/// Command keyword that asks a bot for its cached status.
pub const STATUS_COMMAND: &str = "status";

/// A pollable, respondable bot.
///
/// The runner drives `poll` on a timer and hands every routed inbound
/// command to `handle_command`.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Lower-case name used to address the bot in chat.
    fn name(&self) -> &str;

    /// How often the runner calls `poll`.
    fn poll_interval(&self) -> Duration;

    /// Run one poll cycle. Must not fail; errors are handled inside.
    async fn poll(&self);

    /// Handle a normalized command from `sender`.
    ///
    /// Returns true if the command was recognized.
    async fn handle_command(&self, sender: &Address, command: &str) -> bool;
}
