//! Stock checker JSON report parsing.
//!
//! The report is an array of products:
//!
//! ```json
//! [{
//!   "productId": "40431564",
//!   "store": { "buCode": "560", "name": "Oak Creek" },
//!   "availability": {
//!     "stock": 3,
//!     "restockDate": "2021-09-01T00:00:00.000Z",
//!     "forecast": [{ "date": "2021-09-01T00:00:00.000Z", "stock": 5, "probability": "HIGH" }]
//!   }
//! }]
//! ```

use chrono::NaiveDate;
use restock_models::{Availability, ForecastEntry, ItemId, Probability};
use serde::Deserialize;

use crate::error::{LookupError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReport {
    #[serde(default)]
    pub bu_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub date: String,
    pub stock: u32,
    pub probability: Probability,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub stock: u32,
    #[serde(default)]
    pub restock_date: Option<String>,
    #[serde(default)]
    pub forecast: Vec<ForecastReport>,
}

/// One product entry of a stock report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReport {
    pub product_id: String,
    #[serde(default)]
    pub store: Option<StoreReport>,
    pub availability: AvailabilityReport,
}

/// Parse a date that may carry a time suffix; only `YYYY-MM-DD` is kept.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl ProductReport {
    /// Convert into the monitor's availability model.
    pub fn into_availability(self) -> Result<Availability> {
        let forecast = self
            .availability
            .forecast
            .into_iter()
            .map(|f| {
                let date = parse_date(&f.date)
                    .ok_or_else(|| LookupError::Parse(format!("bad forecast date {:?}", f.date)))?;
                Ok(ForecastEntry::new(date, f.stock, f.probability))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut availability = Availability::new(self.availability.stock, forecast);
        if let Some(name) = self.store.and_then(|s| s.name) {
            availability = availability.with_store_name(name);
        }
        if let Some(date) = self.availability.restock_date.as_deref().and_then(parse_date) {
            availability = availability.with_restock_date(date);
        }
        Ok(availability)
    }
}

/// Parse a stock report.
///
/// Accepts a JSON array or a single product object. Output with noise
/// around the objects is salvaged by keeping the text between the first
/// `{` and the last `}`.
pub fn parse_report(text: &str) -> Result<Vec<ProductReport>> {
    let trimmed = text.trim();

    if let Ok(products) = serde_json::from_str::<Vec<ProductReport>>(trimmed) {
        return Ok(products);
    }
    if let Ok(product) = serde_json::from_str::<ProductReport>(trimmed) {
        return Ok(vec![product]);
    }

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(LookupError::Parse("no product objects in report".to_string()));
    };
    if end < start {
        return Err(LookupError::Parse("no product objects in report".to_string()));
    }

    let salvaged = format!("[{}]", &trimmed[start..=end]);
    Ok(serde_json::from_str::<Vec<ProductReport>>(&salvaged)?)
}

/// Pick the requested item out of a report.
pub fn availability_for(text: &str, item: &ItemId) -> Result<Availability> {
    parse_report(text)?
        .into_iter()
        .find(|p| p.product_id.trim() == item.as_str())
        .ok_or_else(|| LookupError::UnknownItem(item.to_string()))?
        .into_availability()
}
