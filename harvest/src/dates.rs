//! Date parsing and range helpers shared by the two binaries.

use chrono::{Datelike, NaiveDate};

use crate::error::{HarvestError, Result};

/// Parse `YYYY-MM-DD` or the compact `YYYYMMDD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let normalized = if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &input[..4], &input[4..6], &input[6..8])
    } else {
        input.to_string()
    };
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| HarvestError::InvalidDate(input.to_string()))
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// First and last day of the given month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

/// First and last day of the month before the one `today` falls in.
pub fn previous_month(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let last_of_previous = today.with_day(1)?.pred_opt()?;
    month_bounds(last_of_previous.year(), last_of_previous.month())
}
