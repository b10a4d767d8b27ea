//! Availability monitor: polling, change detection and status replies.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use restock_inventory::{InventoryLookup, LookupError};
use restock_models::{Address, Availability, ItemKey, TrackedItem};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::bot::{Bot, STATUS_COMMAND};
use crate::config::MonitorConfig;
use crate::error::{DeliveryError, Result};
use crate::format::{restock_notification, status_report};
use crate::runner::spawn_poll_loop;
use crate::transport::Notifier;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Items whose cached state was replaced.
    pub updated: Vec<ItemKey>,
    /// Items whose lookup failed; their cached state is unchanged.
    pub failed: Vec<ItemKey>,
    /// Items not looked up this cycle because of backoff.
    pub skipped: Vec<ItemKey>,
    /// Items that hit a rising edge and were announced.
    pub notified: Vec<ItemKey>,
}

/// Outcome of a broadcast to all recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<Address>,
}

/// Outcome of a status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Snapshot sent to the requester.
    Replied,
    /// Requester is not a configured recipient; nothing was sent.
    Unauthorized,
    /// Requester is authorized but the reply could not be delivered.
    DeliveryFailed,
}

/// Consecutive-failure bookkeeping for one item.
#[derive(Debug, Clone, Copy, Default)]
struct Backoff {
    failures: u32,
    skip_remaining: u32,
}

impl Backoff {
    /// Ticks to sit out after the `failures`-th consecutive failure.
    ///
    /// The first failure is retried on the next tick; after that the pause
    /// doubles up to `cap`.
    fn pause_after(failures: u32, cap: u32) -> u32 {
        if cap == 0 || failures < 2 {
            return 0;
        }
        let exp = (failures - 2).min(31);
        (1u32 << exp).min(cap)
    }
}

/// Watches a fixed set of items and announces restocks.
pub struct AvailabilityMonitor {
    name: String,
    config: MonitorConfig,
    keys: Vec<ItemKey>,
    items: RwLock<Vec<TrackedItem>>,
    backoff: Mutex<HashMap<ItemKey, Backoff>>,
    recipients: Vec<Address>,
    authorized: HashSet<Address>,
    lookup: Arc<dyn InventoryLookup>,
    notifier: Arc<dyn Notifier>,
}

impl AvailabilityMonitor {
    /// Create a monitor for `items`, announcing to `recipients`.
    pub fn new(
        name: impl Into<String>,
        config: MonitorConfig,
        items: Vec<TrackedItem>,
        recipients: Vec<Address>,
        lookup: Arc<dyn InventoryLookup>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let keys = items.iter().map(|i| i.key.clone()).collect();
        let authorized = recipients.iter().cloned().collect();
        Self {
            name: name.into().to_lowercase(),
            config,
            keys,
            items: RwLock::new(items),
            backoff: Mutex::new(HashMap::new()),
            recipients,
            authorized,
            lookup,
            notifier,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    /// Copy of the cached per-item state.
    pub async fn snapshot(&self) -> Vec<TrackedItem> {
        self.items.read().await.clone()
    }

    /// Status text built from cached state.
    pub async fn status_text(&self) -> String {
        let items = self.items.read().await;
        status_report(&items)
    }

    /// Start polling every `config.poll_interval` until `shutdown` flips to true.
    pub fn start(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Result<JoinHandle<()>> {
        let bot: Arc<dyn Bot> = Arc::clone(self) as Arc<dyn Bot>;
        spawn_poll_loop(bot, shutdown)
    }

    /// Look up every tracked item once, update the cache and announce
    /// rising edges.
    pub async fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();
        let mut results: Vec<(ItemKey, Availability)> = Vec::with_capacity(self.keys.len());

        // Lookups run without the cache lock held.
        for key in &self.keys {
            if self.take_backoff_tick(key).await {
                debug!(bot = %self.name, item = %key, "skipping lookup during backoff");
                report.skipped.push(key.clone());
                continue;
            }

            match self.lookup_with_timeout(key).await {
                Ok(availability) => {
                    self.record_success(key).await;
                    results.push((key.clone(), availability));
                }
                Err(e) => {
                    warn!(
                        bot = %self.name,
                        store = %key.store_id,
                        item = %key.item_id,
                        backend = self.lookup.name(),
                        error = %e,
                        "inventory lookup failed, keeping cached state"
                    );
                    self.record_failure(key).await;
                    report.failed.push(key.clone());
                }
            }
        }

        let now = Utc::now();
        let rising: Vec<TrackedItem> = {
            let mut items = self.items.write().await;
            let mut rising = Vec::new();
            for (key, availability) in results {
                let Some(item) = items.iter_mut().find(|i| i.key == key) else {
                    continue;
                };
                debug!(
                    bot = %self.name,
                    item = %key,
                    quantity = availability.quantity,
                    forecast = availability.forecast.len(),
                    "availability updated"
                );
                if item.apply(availability, now) {
                    rising.push(item.clone());
                }
                report.updated.push(key);
            }
            rising
        };

        for item in &rising {
            info!(
                bot = %self.name,
                store = %item.store_id(),
                item = %item.item_id(),
                quantity = item.last_known_quantity.unwrap_or(0),
                "item back in stock"
            );
            self.notify_all(item).await;
            report.notified.push(item.key.clone());
        }

        report
    }

    /// Send a restock message for `item` to every recipient.
    ///
    /// A failed delivery is logged and does not stop the others.
    pub async fn notify_all(&self, item: &TrackedItem) -> DeliveryReport {
        let text = restock_notification(item);
        let mut report = DeliveryReport::default();

        for recipient in &self.recipients {
            match self.send_with_timeout(recipient, &text).await {
                Ok(()) => {
                    debug!(recipient = %recipient, item = %item.key, "notification sent");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(recipient = %recipient, item = %item.key, error = %e, "failed to send notification");
                    report.failed.push(recipient.clone());
                }
            }
        }

        report
    }

    /// Reply to `requester` with the cached snapshot.
    ///
    /// Unknown senders get nothing. Never triggers a poll.
    pub async fn handle_status_request(&self, requester: &Address) -> StatusOutcome {
        if !self.authorized.contains(requester) {
            debug!(bot = %self.name, sender = %requester, "ignoring status request from unknown sender");
            return StatusOutcome::Unauthorized;
        }

        let text = self.status_text().await;
        match self.send_with_timeout(requester, &text).await {
            Ok(()) => {
                info!(bot = %self.name, recipient = %requester, "status sent");
                StatusOutcome::Replied
            }
            Err(e) => {
                warn!(bot = %self.name, recipient = %requester, error = %e, "failed to send status");
                StatusOutcome::DeliveryFailed
            }
        }
    }

    async fn lookup_with_timeout(&self, key: &ItemKey) -> std::result::Result<Availability, LookupError> {
        let limit = self.config.lookup_timeout;
        match timeout(limit, self.lookup.lookup(&key.store_id, &key.item_id)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(limit)),
        }
    }

    async fn send_with_timeout(&self, recipient: &Address, text: &str) -> std::result::Result<(), DeliveryError> {
        let limit: Duration = self.config.send_timeout;
        match timeout(limit, self.notifier.send(recipient, text)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(limit)),
        }
    }

    /// Returns true if this tick should be skipped for `key`.
    async fn take_backoff_tick(&self, key: &ItemKey) -> bool {
        let mut backoff = self.backoff.lock().await;
        match backoff.get_mut(key) {
            Some(state) if state.skip_remaining > 0 => {
                state.skip_remaining -= 1;
                true
            }
            _ => false,
        }
    }

    async fn record_success(&self, key: &ItemKey) {
        self.backoff.lock().await.remove(key);
    }

    async fn record_failure(&self, key: &ItemKey) {
        let mut backoff = self.backoff.lock().await;
        let state = backoff.entry(key.clone()).or_default();
        state.failures = state.failures.saturating_add(1);
        state.skip_remaining = Backoff::pause_after(state.failures, self.config.max_backoff_ticks);
    }
}

#[async_trait]
impl Bot for AvailabilityMonitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    async fn poll(&self) {
        let report = self.poll_once().await;
        debug!(
            bot = %self.name,
            updated = report.updated.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            notified = report.notified.len(),
            "poll cycle complete"
        );
    }

    async fn handle_command(&self, sender: &Address, command: &str) -> bool {
        if command == STATUS_COMMAND {
            self.handle_status_request(sender).await;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNotifier, ScriptedLookup};

    fn monitor(lookup: Arc<ScriptedLookup>, notifier: Arc<FakeNotifier>) -> AvailabilityMonitor {
        AvailabilityMonitor::new(
            "ikea",
            MonitorConfig::new()
                .with_lookup_timeout(Duration::from_millis(200))
                .with_send_timeout(Duration::from_millis(200)),
            vec![TrackedItem::new("560", "A"), TrackedItem::new("560", "B")],
            vec![Address::from("alice"), Address::from("bob")],
            lookup,
            notifier,
        )
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(Backoff::pause_after(1, 8), 0);
        assert_eq!(Backoff::pause_after(2, 8), 1);
        assert_eq!(Backoff::pause_after(3, 8), 2);
        assert_eq!(Backoff::pause_after(4, 8), 4);
        assert_eq!(Backoff::pause_after(5, 8), 8);
        assert_eq!(Backoff::pause_after(40, 8), 8);
        assert_eq!(Backoff::pause_after(5, 0), 0);
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_item() {
        let lookup = Arc::new(ScriptedLookup::new());
        lookup.push("A", Err("network down"));
        lookup.push("B", Ok(Availability::new(2, vec![])));
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = monitor(Arc::clone(&lookup), Arc::clone(&notifier));

        let report = monitor.poll_once().await;

        assert_eq!(report.failed, vec![ItemKey::new("560", "A")]);
        assert_eq!(report.updated, vec![ItemKey::new("560", "B")]);
        assert_eq!(report.notified, vec![ItemKey::new("560", "B")]);
        assert_eq!(notifier.sent().len(), 2);

        let snapshot = monitor.snapshot().await;
        assert!(snapshot[0].is_unknown());
        assert_eq!(snapshot[1].last_known_quantity, Some(2));
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_block_others() {
        let lookup = Arc::new(ScriptedLookup::new());
        lookup.push("A", Ok(Availability::new(1, vec![])));
        lookup.push("B", Ok(Availability::new(0, vec![])));
        let notifier = Arc::new(FakeNotifier::new());
        notifier.fail_for("alice");
        let monitor = monitor(lookup, Arc::clone(&notifier));

        let report = monitor.poll_once().await;
        assert_eq!(report.notified.len(), 1);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Address::from("bob"));
        assert!(sent[0].1.contains("Item A"));
    }

    #[tokio::test]
    async fn test_notify_all_reports_failures() {
        let notifier = Arc::new(FakeNotifier::new());
        notifier.fail_for("bob");
        let monitor = monitor(Arc::new(ScriptedLookup::new()), Arc::clone(&notifier));

        let mut item = TrackedItem::new("560", "A");
        item.apply(Availability::new(4, vec![]), Utc::now());
        let report = monitor.notify_all(&item).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![Address::from("bob")]);
    }

    #[tokio::test]
    async fn test_lookup_timeout_counts_as_failure() {
        let lookup = Arc::new(ScriptedLookup::new());
        lookup.set_delay(Duration::from_secs(5));
        lookup.push("A", Ok(Availability::new(3, vec![])));
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = AvailabilityMonitor::new(
            "ikea",
            MonitorConfig::new().with_lookup_timeout(Duration::from_millis(20)),
            vec![TrackedItem::new("560", "A")],
            vec![Address::from("alice")],
            lookup,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let report = monitor.poll_once().await;

        assert_eq!(report.failed, vec![ItemKey::new("560", "A")]);
        assert!(notifier.sent().is_empty());
        assert!(monitor.snapshot().await[0].is_unknown());
    }

    fn slow_send_monitor(notifier: Arc<FakeNotifier>) -> AvailabilityMonitor {
        AvailabilityMonitor::new(
            "ikea",
            MonitorConfig::new().with_send_timeout(Duration::from_millis(50)),
            vec![TrackedItem::new("560", "A")],
            vec![Address::from("slow"), Address::from("bob")],
            Arc::new(ScriptedLookup::new()) as Arc<dyn InventoryLookup>,
            notifier as Arc<dyn Notifier>,
        )
    }

    #[tokio::test]
    async fn test_stalled_send_times_out_without_blocking_others() {
        let notifier = Arc::new(FakeNotifier::new());
        notifier.stall_for("slow");
        let monitor = slow_send_monitor(Arc::clone(&notifier));

        let mut item = TrackedItem::new("560", "A");
        item.apply(Availability::new(2, vec![]), Utc::now());
        let report = monitor.notify_all(&item).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![Address::from("slow")]);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Address::from("bob"));
    }

    #[tokio::test]
    async fn test_stalled_status_reply_reports_failure() {
        let notifier = Arc::new(FakeNotifier::new());
        notifier.stall_for("slow");
        let monitor = slow_send_monitor(Arc::clone(&notifier));

        let outcome = monitor.handle_status_request(&Address::from("slow")).await;

        assert_eq!(outcome, StatusOutcome::DeliveryFailed);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_failures_back_off_then_recover() {
        let lookup = Arc::new(ScriptedLookup::new());
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = AvailabilityMonitor::new(
            "ikea",
            MonitorConfig::new(),
            vec![TrackedItem::new("560", "A")],
            vec![Address::from("alice")],
            Arc::clone(&lookup) as Arc<dyn InventoryLookup>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );
        let key = ItemKey::new("560", "A");

        lookup.push("A", Err("down"));
        lookup.push("A", Err("down"));
        assert_eq!(monitor.poll_once().await.failed, vec![key.clone()]);
        // First failure retries immediately.
        assert_eq!(monitor.poll_once().await.failed, vec![key.clone()]);
        // Second consecutive failure sits out one tick.
        assert_eq!(monitor.poll_once().await.skipped, vec![key.clone()]);

        lookup.push("A", Ok(Availability::new(1, vec![])));
        let report = monitor.poll_once().await;
        assert_eq!(report.notified, vec![key.clone()]);
        assert_eq!(lookup.calls("A"), 3);
    }

    #[tokio::test]
    async fn test_status_request_unknown_before_poll() {
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = monitor(Arc::new(ScriptedLookup::new()), Arc::clone(&notifier));

        let outcome = monitor.handle_status_request(&Address::from("alice")).await;

        assert_eq!(outcome, StatusOutcome::Replied);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.matches("Current stock: unknown").count(), 2);
    }

    #[tokio::test]
    async fn test_status_request_from_stranger_is_ignored() {
        let lookup = Arc::new(ScriptedLookup::new());
        lookup.push("A", Ok(Availability::new(0, vec![])));
        lookup.push("B", Ok(Availability::new(0, vec![])));
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = monitor(Arc::clone(&lookup), Arc::clone(&notifier));
        monitor.poll_once().await;

        let outcome = monitor.handle_status_request(&Address::from("mallory")).await;

        assert_eq!(outcome, StatusOutcome::Unauthorized);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_status_request_does_not_poll() {
        let lookup = Arc::new(ScriptedLookup::new());
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = monitor(Arc::clone(&lookup), Arc::clone(&notifier));

        monitor.handle_status_request(&Address::from("bob")).await;

        assert_eq!(lookup.calls("A"), 0);
        assert_eq!(lookup.calls("B"), 0);
    }

    #[tokio::test]
    async fn test_status_delivery_failure_reported() {
        let notifier = Arc::new(FakeNotifier::new());
        notifier.fail_for("alice");
        let monitor = monitor(Arc::new(ScriptedLookup::new()), Arc::clone(&notifier));

        let outcome = monitor.handle_status_request(&Address::from("alice")).await;
        assert_eq!(outcome, StatusOutcome::DeliveryFailed);
    }

    #[tokio::test]
    async fn test_bot_command_routing() {
        let notifier = Arc::new(FakeNotifier::new());
        let monitor = monitor(Arc::new(ScriptedLookup::new()), Arc::clone(&notifier));
        let bot: &dyn Bot = &monitor;

        assert_eq!(bot.name(), "ikea");
        assert!(bot.handle_command(&Address::from("alice"), "status").await);
        assert!(!bot.handle_command(&Address::from("alice"), "order").await);
        assert_eq!(notifier.sent().len(), 1);
    }
}
