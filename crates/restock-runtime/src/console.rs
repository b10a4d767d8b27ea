//! Notifier that writes to stdout, for one-shot runs.

use async_trait::async_trait;
use restock_models::Address;

use crate::error::DeliveryError;
use crate::transport::Notifier;

/// Prints every message instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, recipient: &Address, text: &str) -> Result<(), DeliveryError> {
        println!("[to {}]\n{}\n", recipient, text);
        Ok(())
    }
}
