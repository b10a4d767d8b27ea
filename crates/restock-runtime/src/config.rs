//! Monitor configuration.

use std::time::Duration;

use restock_core::Settings;

/// Timing configuration for an availability monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often to poll the inventory source.
    pub poll_interval: Duration,
    /// Upper bound for a single (store, item) lookup.
    pub lookup_timeout: Duration,
    /// Upper bound for a single message send.
    pub send_timeout: Duration,
    /// Most ticks an item sits out after repeated lookup failures.
    /// Zero disables backoff.
    pub max_backoff_ticks: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            lookup_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            max_backoff_ticks: 8,
        }
    }
}

impl MonitorConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timings taken from validated settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_poll_interval(settings.poll_interval())
            .with_lookup_timeout(settings.lookup_timeout())
            .with_send_timeout(settings.send_timeout())
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Sets the send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Sets the backoff cap.
    pub fn with_max_backoff_ticks(mut self, ticks: u32) -> Self {
        self.max_backoff_ticks = ticks;
        self
    }
}
