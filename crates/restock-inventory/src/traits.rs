//! Core trait for inventory backends.

use async_trait::async_trait;
use restock_models::{Availability, ItemId, StoreId};

use crate::error::Result;

/// A source of current stock and restock forecasts.
///
/// Implementations report one (store, item) pair per call and never cache;
/// timeouts are applied by the caller.
#[async_trait]
pub trait InventoryLookup: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Look up current availability of `item` at `store`.
    async fn lookup(&self, store: &StoreId, item: &ItemId) -> Result<Availability>;
}
