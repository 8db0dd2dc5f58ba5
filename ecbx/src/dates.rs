//! Date argument handling shared by the CLI and store lookups.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{EcbxError, Result};

/// Normalize a compact `YYYYMMDD` date string to `YYYY-MM-DD`.
///
/// Anything that is not eight ASCII digits is returned unchanged and left
/// to the parser to reject.
pub fn normalize(input: &str) -> String {
    if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &input[..4], &input[4..6], &input[6..8])
    } else {
        input.to_string()
    }
}

/// Parse a `YYYY-MM-DD` or compact `YYYYMMDD` date argument.
pub fn parse(input: &str) -> Result<NaiveDate> {
    let normalized = normalize(input);
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| EcbxError::InvalidDate(input.to_string()))
}

/// The last business day on or before the given date.
///
/// The ECB publishes reference rates on business days only, so Saturday
/// and Sunday map to the preceding Friday.
pub fn last_business_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}
