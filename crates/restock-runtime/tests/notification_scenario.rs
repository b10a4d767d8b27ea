//! End-to-end poll/notify/status behavior with in-memory collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use restock_inventory::{InventoryLookup, LookupError};
use restock_models::{
    Address, Availability, ForecastEntry, InboundMessage, ItemId, ItemKey, Probability, StoreId,
    TrackedItem,
};
use restock_runtime::{
    AvailabilityMonitor, Bot, ChannelSource, DeliveryError, MonitorConfig, Notifier, Runner,
};

/// Replays one queued result per lookup call, regardless of item.
#[derive(Default)]
struct QueueLookup {
    results: Mutex<VecDeque<Result<Availability, LookupError>>>,
}

impl QueueLookup {
    fn push(&self, result: Result<Availability, LookupError>) {
        self.results.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl InventoryLookup for QueueLookup {
    fn name(&self) -> &str {
        "queue"
    }

    async fn lookup(&self, _store: &StoreId, item: &ItemId) -> Result<Availability, LookupError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LookupError::UnknownItem(item.to_string())))
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(Address, String)>>,
}

impl Outbox {
    fn take(&self) -> Vec<(Address, String)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, recipient: &Address, text: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), text.to_string()));
        Ok(())
    }
}

fn recipients() -> Vec<Address> {
    vec![
        Address::from("111"),
        Address::from("222"),
        Address::from("333"),
    ]
}

fn setup() -> (Arc<QueueLookup>, Arc<Outbox>, Arc<AvailabilityMonitor>) {
    let lookup = Arc::new(QueueLookup::default());
    let outbox = Arc::new(Outbox::default());
    let monitor = Arc::new(AvailabilityMonitor::new(
        "ikea",
        MonitorConfig::new().with_poll_interval(Duration::from_secs(60)),
        vec![TrackedItem::new("560", "A")],
        recipients(),
        Arc::clone(&lookup) as Arc<dyn InventoryLookup>,
        Arc::clone(&outbox) as Arc<dyn Notifier>,
    ));
    (lookup, outbox, monitor)
}

#[tokio::test]
async fn test_rising_edge_scenario() {
    let (lookup, outbox, monitor) = setup();
    let key = ItemKey::new("560", "A");

    // Poll 1: unknown -> 0, no notification.
    lookup.push(Ok(Availability::new(0, vec![])));
    let report = monitor.poll_once().await;
    assert!(report.notified.is_empty());
    assert!(outbox.take().is_empty());

    // Poll 2: 0 -> 3 with forecast, one message per recipient.
    let forecast = vec![ForecastEntry::new(
        NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
        5,
        Probability::Ratio(0.6),
    )];
    lookup.push(Ok(Availability::new(3, forecast)));
    let report = monitor.poll_once().await;
    assert_eq!(report.notified, vec![key.clone()]);

    let sent = outbox.take();
    assert_eq!(sent.len(), 3);
    let addressed: Vec<Address> = sent.iter().map(|(a, _)| a.clone()).collect();
    assert_eq!(addressed, recipients());
    for (_, text) in &sent {
        assert!(text.contains("Stock: 3"));
        assert!(text.contains("2021-09-01: 5 (probability 0.6)"));
    }

    // Poll 3: still 3, no notification.
    lookup.push(Ok(Availability::new(3, vec![])));
    assert!(monitor.poll_once().await.notified.is_empty());
    assert!(outbox.take().is_empty());

    // Poll 4: lookup fails, cached quantity stays 3.
    lookup.push(Err(LookupError::Http("connection reset".to_string())));
    let report = monitor.poll_once().await;
    assert_eq!(report.failed, vec![key.clone()]);
    assert!(outbox.take().is_empty());
    assert_eq!(monitor.snapshot().await[0].last_known_quantity, Some(3));

    // Poll 5: drops to 0, falling edge is silent.
    lookup.push(Ok(Availability::new(0, vec![])));
    let report = monitor.poll_once().await;
    assert_eq!(report.updated, vec![key.clone()]);
    assert!(report.notified.is_empty());
    assert!(outbox.take().is_empty());

    // Poll 6: back to 1, new rising edge.
    lookup.push(Ok(Availability::new(1, vec![])));
    let report = monitor.poll_once().await;
    assert_eq!(report.notified, vec![key]);
    assert_eq!(outbox.take().len(), 3);
}

#[tokio::test]
async fn test_status_through_runner() {
    let (lookup, outbox, monitor) = setup();
    let (inbound, source) = ChannelSource::new(8);

    // The first tick fires immediately and sees stock.
    lookup.push(Ok(Availability::new(2, vec![])));

    let mut runner = Runner::new(source);
    runner.add_bot(Arc::clone(&monitor) as Arc<dyn Bot>).unwrap();
    runner.start().unwrap();

    let mut announced = Vec::new();
    for _ in 0..100 {
        announced.extend(outbox.take());
        if announced.len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(announced.len(), 3);
    assert_eq!(monitor.snapshot().await[0].last_known_quantity, Some(2));

    inbound
        .send(InboundMessage::new("999", "status"))
        .await
        .unwrap();
    inbound
        .send(InboundMessage::new("222", "ikea status"))
        .await
        .unwrap();
    drop(inbound);

    let mut replies = Vec::new();
    for _ in 0..100 {
        replies.extend(outbox.take());
        if !replies.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    runner.shutdown().await.unwrap();
    replies.extend(outbox.take());

    assert_eq!(replies.len(), 1, "only the configured recipient gets a reply");
    assert_eq!(replies[0].0, Address::from("222"));
    assert!(replies[0].1.contains("Current stock: 2"));
}
