//! Date parsing and range helpers for the exporter.

use chrono::{Datelike, NaiveDate};

use crate::error::{KimaiError, Result};

/// Parse `YYYY-MM-DD` or the compact `YYYYMMDD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let normalized = if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &input[..4], &input[4..6], &input[6..8])
    } else {
        input.to_string()
    };
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| KimaiError::InvalidDate(input.to_string()))
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Start of the day in the `%Y-%m-%dT%H:%M:%S` form the timesheet filter
/// expects.
pub fn day_start(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

/// End of the day for the timesheet filter.
pub fn day_end(date: NaiveDate) -> String {
    format!("{}T23:59:59", date.format("%Y-%m-%d"))
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

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_both_date_forms() {
        assert_eq!(parse_date("2024-07-31").unwrap(), date(2024, 7, 31));
        assert_eq!(parse_date("20240731").unwrap(), date(2024, 7, 31));
        assert!(parse_date("31.07.2024").is_err());
    }

    #[test]
    fn day_bounds_match_the_timesheet_filter_format() {
        assert_eq!(day_start(date(2024, 7, 1)), "2024-07-01T00:00:00");
        assert_eq!(day_end(date(2024, 7, 31)), "2024-07-31T23:59:59");
    }

    #[test]
    fn previous_month_crosses_january() {
        assert_eq!(
            previous_month(date(2024, 1, 15)).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
    }
}
