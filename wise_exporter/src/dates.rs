//! Date parsing and range helpers for the statement window.

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, WiseError};

/// Parse `YYYY-MM-DD` or the compact `YYYYMMDD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let normalized = if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &input[..4], &input[4..6], &input[6..8])
    } else {
        input.to_string()
    };
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| WiseError::InvalidDate(input.to_string()))
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
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
        assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));
        assert_eq!(parse_date("20240229").unwrap(), date(2024, 2, 29));
        assert!(matches!(
            parse_date("02/29/2024"),
            Err(WiseError::InvalidDate(_))
        ));
    }

    #[test]
    fn previous_month_crosses_january() {
        assert_eq!(
            previous_month(date(2024, 1, 15)).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
        assert_eq!(
            previous_month(date(2024, 3, 10)).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn month_bounds_handle_year_ends() {
        assert_eq!(
            month_bounds(2023, 12).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
        assert!(month_bounds(2024, 13).is_none());
    }
}
