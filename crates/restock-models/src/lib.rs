//! Core data models for the restock notifier.
//!
//! This crate provides the types shared by the inventory backends, the
//! availability monitor and the chat transports: identifiers, per-poll
//! availability results and the cached per-item state.

pub mod availability;
pub mod ids;
pub mod message;

// Re-export main types
pub use availability::{Availability, ForecastEntry, Probability, TrackedItem};
pub use ids::{Address, ItemId, ItemKey, StoreId};
pub use message::InboundMessage;
