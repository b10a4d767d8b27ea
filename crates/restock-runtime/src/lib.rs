//! Async runtime for the restock notifier.
//!
//! - `AvailabilityMonitor` - polls an inventory source, caches per-item
//!   state, announces rising edges and answers status requests
//! - `Runner` - hosts bots: one poll timer per bot plus a shared inbound
//!   message loop
//! - `Notifier` / `MessageSource` - the chat transport seams
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use restock_runtime::{AvailabilityMonitor, ChannelSource, MonitorConfig, Runner};
//!
//! let (inbound_tx, source) = ChannelSource::new(64);
//! let monitor = Arc::new(AvailabilityMonitor::new(
//!     "ikea",
//!     MonitorConfig::default(),
//!     settings.tracked_items(),
//!     settings.recipient_addresses(),
//!     lookup,
//!     notifier,
//! ));
//!
//! let mut runner = Runner::new(source);
//! runner.add_bot(monitor)?;
//! runner.start()?;
//!
//! tokio::signal::ctrl_c().await?;
//! runner.shutdown().await?;
//! ```
//!
//! # Notification rule
//!
//! A restock message goes out only when an item's quantity moves from zero
//! (or never seen) to positive between two successful polls. Failed lookups
//! leave the cached state alone and are retried on later ticks.

pub mod bot;
pub mod config;
pub mod console;
pub mod error;
pub mod format;
pub mod monitor;
pub mod runner;
pub mod transport;

#[cfg(test)]
mod testing;

pub use bot::{Bot, STATUS_COMMAND};
pub use config::MonitorConfig;
pub use console::ConsoleNotifier;
pub use error::{DeliveryError, Result, RuntimeError};
pub use format::{restock_notification, status_report};
pub use monitor::{AvailabilityMonitor, DeliveryReport, PollReport, StatusOutcome};
pub use runner::{dispatch, route, Runner};
pub use transport::{ChannelSource, MessageSource, Notifier};
