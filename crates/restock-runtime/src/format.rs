//! Human-readable message bodies.

use restock_models::{ForecastEntry, TrackedItem};

/// Separator between per-item blocks in a status reply.
pub const STATUS_SEPARATOR: &str = "---------";

fn store_label(item: &TrackedItem) -> String {
    match &item.store_name {
        Some(name) => format!("{} ({})", item.store_id(), name),
        None => item.store_id().to_string(),
    }
}

fn push_forecast(out: &mut String, forecast: &[ForecastEntry]) {
    if forecast.is_empty() {
        out.push_str("Forecast: none\n");
        return;
    }

    let mut entries: Vec<&ForecastEntry> = forecast.iter().collect();
    entries.sort_by_key(|e| e.date);

    out.push_str("Forecast:\n");
    for entry in entries {
        out.push_str(&format!(
            "  - {}: {} (probability {})\n",
            entry.date.format("%Y-%m-%d"),
            entry.quantity,
            entry.probability
        ));
    }
}

/// Message sent to every recipient on a rising edge.
pub fn restock_notification(item: &TrackedItem) -> String {
    let mut out = format!(
        "Item {} is available at store {}! Stock: {}\n",
        item.item_id(),
        store_label(item),
        item.last_known_quantity.unwrap_or(0)
    );
    if let Some(date) = item.restock_date {
        out.push_str(&format!("Restock date: {}\n", date.format("%Y-%m-%d")));
    }
    push_forecast(&mut out, &item.last_known_forecast);
    out.trim_end().to_string()
}

/// Reply to a status request, built from cached state only.
pub fn status_report(items: &[TrackedItem]) -> String {
    if items.is_empty() {
        return "No items tracked.".to_string();
    }

    let blocks: Vec<String> = items
        .iter()
        .map(|item| {
            let mut out = format!("Item: {}\nStore: {}\n", item.item_id(), store_label(item));
            match item.last_known_quantity {
                Some(q) => out.push_str(&format!("Current stock: {}\n", q)),
                None => out.push_str("Current stock: unknown\n"),
            }
            if item.is_unknown() {
                return out.trim_end().to_string();
            }
            if let Some(date) = item.restock_date {
                out.push_str(&format!("Restock date: {}\n", date.format("%Y-%m-%d")));
            }
            push_forecast(&mut out, &item.last_known_forecast);
            if let Some(at) = item.last_checked {
                out.push_str(&format!("Last checked: {}\n", at.format("%Y-%m-%d %H:%M UTC")));
            }
            out.trim_end().to_string()
        })
        .collect();

    blocks.join(&format!("\n{}\n", STATUS_SEPARATOR))
}
