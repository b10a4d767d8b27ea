//! Outbound Telegram messages.

use async_trait::async_trait;
use restock_models::Address;
use restock_runtime::{DeliveryError, Notifier};
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::debug;

/// Telegram's per-message text limit.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Turn a configured address into a Telegram recipient.
///
/// Numeric addresses are chat ids; `@name` addresses are public channels.
pub fn parse_recipient(address: &Address) -> Result<Recipient, DeliveryError> {
    let raw = address.as_str().trim();
    if let Some(channel) = raw.strip_prefix('@') {
        if channel.is_empty() {
            return Err(DeliveryError::InvalidAddress(raw.to_string()));
        }
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    raw.parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| DeliveryError::InvalidAddress(raw.to_string()))
}

/// Split `text` into chunks of at most `limit` characters, preferring line
/// boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Sends plain-text messages through the Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: &Address, text: &str) -> Result<(), DeliveryError> {
        let target = parse_recipient(recipient)?;

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.bot
                .send_message(target.clone(), chunk)
                .await
                .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        }

        debug!(recipient = %recipient, "message delivered");
        Ok(())
    }
}
