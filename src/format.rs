//! Display helpers for amounts, timestamps and percentages.

use chrono::{DateTime, Local, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats an amount with at most two decimals and no trailing zeros, followed by the currency.
pub fn format_amount(value: f64, currency: &str) -> String {
    let mut rendered = format!("{:.2}", value);
    if rendered.contains('.') {
        let trimmed = rendered.trim_end_matches('0').trim_end_matches('.').len();
        rendered.truncate(trimmed);
    }
    if rendered == "-0" {
        rendered = "0".into();
    }
    if currency.is_empty() {
        rendered
    } else {
        format!("{} {}", rendered, currency)
    }
}

/// Formats a percentage rounded to a whole number, e.g. `42%`.
pub fn format_percent(percent: f64) -> String {
    format!("{}%", percent.round() as i64)
}

/// Local date and time to the minute.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Text shown in place of a missing value.
pub fn format_optional_amount(value: Option<f64>, currency: &str) -> String {
    value
        .map(|amount| format_amount(amount, currency))
        .unwrap_or_else(|| "—".into())
}
