//! Inbound chat messages.

use serde::{Deserialize, Serialize};

use crate::ids::Address;

/// A text message received from a chat contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: Address,
    pub text: String,
}

impl InboundMessage {
    pub fn new(sender: impl Into<Address>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Normalized command text: trimmed, lower-cased, leading `/` removed.
    pub fn command(&self) -> String {
        let text = self.text.trim();
        text.strip_prefix('/').unwrap_or(text).trim().to_lowercase()
    }
}
