//! Availability results and cached per-item state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ItemId, ItemKey, StoreId};

/// Likelihood attached to a forecast entry.
///
/// Some stock sources report a ratio (`0.6`), others a level label
/// (`"HIGH"`); both are kept as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Probability {
    Ratio(f64),
    Level(String),
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probability::Ratio(r) => write!(f, "{}", r),
            Probability::Level(l) => write!(f, "{}", l),
        }
    }
}

/// A predicted future restock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date: NaiveDate,
    pub quantity: u32,
    pub probability: Probability,
}

impl ForecastEntry {
    pub fn new(date: NaiveDate, quantity: u32, probability: Probability) -> Self {
        Self {
            date,
            quantity,
            probability,
        }
    }
}

/// Result of one successful lookup for a single item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Availability {
    /// Units currently in stock.
    pub quantity: u32,
    /// Upcoming restock forecast, sorted by date ascending.
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
    /// Store display name, when the source reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Next announced restock date, when the source reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restock_date: Option<NaiveDate>,
}

impl Availability {
    /// Creates an availability result, sorting the forecast by date.
    pub fn new(quantity: u32, mut forecast: Vec<ForecastEntry>) -> Self {
        forecast.sort_by_key(|e| e.date);
        Self {
            quantity,
            forecast,
            store_name: None,
            restock_date: None,
        }
    }

    /// Sets the store display name.
    pub fn with_store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }

    /// Sets the announced restock date.
    pub fn with_restock_date(mut self, date: NaiveDate) -> Self {
        self.restock_date = Some(date);
        self
    }
}

/// Cached state of one monitored (store, item) pair.
///
/// Lives for the lifetime of the process; only successful polls mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub key: ItemKey,
    /// `None` until the first successful poll.
    pub last_known_quantity: Option<u32>,
    #[serde(default)]
    pub last_known_forecast: Vec<ForecastEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restock_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl TrackedItem {
    /// Creates an item in the unknown state.
    pub fn new(store_id: impl Into<StoreId>, item_id: impl Into<ItemId>) -> Self {
        Self {
            key: ItemKey::new(store_id, item_id),
            last_known_quantity: None,
            last_known_forecast: Vec::new(),
            store_name: None,
            restock_date: None,
            last_checked: None,
        }
    }

    pub fn store_id(&self) -> &StoreId {
        &self.key.store_id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.key.item_id
    }

    /// Returns true if no poll has succeeded for this item yet.
    pub fn is_unknown(&self) -> bool {
        self.last_known_quantity.is_none()
    }

    /// Returns true if the last successful poll saw stock.
    pub fn is_available(&self) -> bool {
        self.last_known_quantity.unwrap_or(0) > 0
    }

    /// Records a successful lookup.
    ///
    /// Returns true when this is a rising edge: the previous successful
    /// poll saw zero or nothing, and this one sees stock.
    pub fn apply(&mut self, availability: Availability, checked_at: DateTime<Utc>) -> bool {
        let was_available = self.is_available();

        self.last_known_quantity = Some(availability.quantity);
        self.last_known_forecast = availability.forecast;
        self.last_known_forecast.sort_by_key(|e| e.date);
        if availability.store_name.is_some() {
            self.store_name = availability.store_name;
        }
        self.restock_date = availability.restock_date;
        self.last_checked = Some(checked_at);

        !was_available && self.is_available()
    }
}
