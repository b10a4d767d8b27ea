//! HTTP stock report backend.

use async_trait::async_trait;
use restock_models::{Availability, ItemId, StoreId};
use tracing::debug;

use crate::error::{LookupError, Result};
use crate::report::availability_for;
use crate::traits::InventoryLookup;

/// Fetches a stock report from a URL template.
///
/// `{store}` and `{item}` in the template are replaced per lookup; the
/// response body must be a stock report.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: reqwest::Client,
    url_template: String,
}

impl HttpLookup {
    pub fn new(url_template: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("restock-notifier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    /// The concrete URL for a (store, item) pair.
    pub fn url_for(&self, store: &StoreId, item: &ItemId) -> String {
        self.url_template
            .replace("{store}", store.as_str())
            .replace("{item}", item.as_str())
    }
}

#[async_trait]
impl InventoryLookup for HttpLookup {
    fn name(&self) -> &str {
        "http"
    }

    async fn lookup(&self, store: &StoreId, item: &ItemId) -> Result<Availability> {
        let url = self.url_for(store, item);
        debug!(url = %url, "fetching stock report");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::UnknownItem(item.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        availability_for(&body, item)
    }
}
