//! Date parsing and the timestamp formats the API expects.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// Parses `YYYY-MM-DD` or the compact `YYYYMMDD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    if input.len() == 8 && input.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y%m%d") {
            return Ok(date);
        }
    }
    Err(anyhow!(
        "Invalid date format '{input}'. Expected YYYY-MM-DD or YYYYMMDD"
    ))
}

/// Unix timestamp for midnight at the start of the day (UTC).
pub fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp()
}

/// Unix timestamp for the last second of the day (UTC).
pub fn day_end_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_default()
        .and_utc()
        .timestamp()
}

/// Value-date string for transactions: `YYYY-MM-DDT00:00:00+00:00`.
pub fn value_date(date: NaiveDate) -> String {
    format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))
}

/// Plain ISO date, used by the balance endpoint.
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
