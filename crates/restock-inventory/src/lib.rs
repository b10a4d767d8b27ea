//! Inventory lookup backends.
//!
//! The `InventoryLookup` trait is the narrow interface the availability
//! monitor polls through. Two backends ship with the crate:
//!
//! - `CommandLookup` - runs a stock checker CLI and parses its JSON report
//! - `HttpLookup` - fetches the same report shape from an HTTP endpoint
//!
//! # Example
//!
//! ```ignore
//! use restock_inventory::{CommandLookup, InventoryLookup};
//! use restock_models::{ItemId, StoreId};
//!
//! let lookup = CommandLookup::new(vec!["npx".into(), "ikea-availability-checker".into(), "stock".into()]);
//! let availability = lookup.lookup(&StoreId::from("560"), &ItemId::from("40431564")).await?;
//! println!("in stock: {}", availability.quantity);
//! ```

pub mod command;
pub mod error;
pub mod http;
pub mod report;
pub mod traits;

use std::sync::Arc;

use restock_core::LookupSettings;

pub use command::CommandLookup;
pub use error::{LookupError, Result};
pub use http::HttpLookup;
pub use report::{availability_for, parse_report, ProductReport};
pub use traits::InventoryLookup;

/// Build the lookup backend described by the settings.
pub fn from_settings(settings: &LookupSettings) -> Result<Arc<dyn InventoryLookup>> {
    match settings {
        LookupSettings::Command { command } => Ok(Arc::new(CommandLookup::new(command.clone()))),
        LookupSettings::Http { url_template } => Ok(Arc::new(HttpLookup::new(url_template.clone())?)),
    }
}
