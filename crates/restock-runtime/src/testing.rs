//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use restock_inventory::{InventoryLookup, LookupError};
use restock_models::{Address, Availability, ItemId, StoreId};

use crate::error::DeliveryError;
use crate::transport::Notifier;

/// Lookup that replays queued results per item id.
#[derive(Default)]
pub struct ScriptedLookup {
    queue: Mutex<HashMap<String, VecDeque<Result<Availability, String>>>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: &str, result: Result<Availability, &str>) {
        self.queue
            .lock()
            .unwrap()
            .entry(item.to_string())
            .or_default()
            .push_back(result.map_err(String::from));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self, item: &str) -> usize {
        self.calls.lock().unwrap().get(item).copied().unwrap_or(0)
    }
}

#[async_trait]
impl InventoryLookup for ScriptedLookup {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn lookup(&self, _store: &StoreId, item: &ItemId) -> Result<Availability, LookupError> {
        *self.calls.lock().unwrap().entry(item.to_string()).or_default() += 1;

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .queue
            .lock()
            .unwrap()
            .get_mut(item.as_str())
            .and_then(|q| q.pop_front());
        match next {
            Some(Ok(a)) => Ok(a),
            Some(Err(e)) => Err(LookupError::Http(e)),
            None => Err(LookupError::UnknownItem(item.to_string())),
        }
    }
}

/// Notifier that records every delivery.
#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<(Address, String)>>,
    failing: Mutex<HashSet<Address>>,
    stalled: Mutex<HashSet<Address>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(Address::from(address));
    }

    /// Deliveries to `address` hang far past any test timeout.
    pub fn stall_for(&self, address: &str) {
        self.stalled.lock().unwrap().insert(Address::from(address));
    }

    pub fn sent(&self) -> Vec<(Address, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, recipient: &Address, text: &str) -> Result<(), DeliveryError> {
        let stalled = self.stalled.lock().unwrap().contains(recipient);
        if stalled {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.failing.lock().unwrap().contains(recipient) {
            return Err(DeliveryError::Transport("recipient unreachable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), text.to_string()));
        Ok(())
    }
}
