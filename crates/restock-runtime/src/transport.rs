//! Chat transport seams.
//!
//! The monitor only needs to push text to an address and to read inbound
//! messages; connection setup, credentials and encryption belong to the
//! concrete transport.

use async_trait::async_trait;
use restock_models::{Address, InboundMessage};
use tokio::sync::mpsc;

use crate::error::DeliveryError;

/// Outbound side of a chat transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `recipient`.
    async fn send(&self, recipient: &Address, text: &str) -> Result<(), DeliveryError>;
}

/// Inbound side of a chat transport.
#[async_trait]
pub trait MessageSource: Send {
    /// Next inbound message, or `None` once the source is closed.
    async fn receive(&mut self) -> Option<InboundMessage>;
}

/// A message source fed through an mpsc channel.
///
/// Transports that deliver messages through callbacks push into the
/// sender half; the runner drains the receiver.
pub struct ChannelSource {
    rx: mpsc::Receiver<InboundMessage>,
}

impl ChannelSource {
    /// Creates a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn receive(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}
