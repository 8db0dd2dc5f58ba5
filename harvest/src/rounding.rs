//! Rounding of tracked hours to billing increments.
//!
//! Harvest stores hours as decimals, so all math here goes through whole
//! minutes to keep the arithmetic exact.

/// Decimal hours converted to whole minutes.
pub fn hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}

/// Whole minutes rendered as `H:MM`.
pub fn format_minutes(minutes: i64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Decimal hours rendered as `H:MM`.
pub fn format_hours(hours: f64) -> String {
    format_minutes(hours_to_minutes(hours))
}

/// Hours rounded up to the next multiple of `increment` minutes.
pub fn round_hours(hours: f64, increment: u32) -> f64 {
    let minutes = hours_to_minutes(hours);
    if minutes <= 0 {
        return 0.0;
    }
    let increment = i64::from(increment);
    // Signed div_ceil is unstable; minutes is positive here, so this matches it.
    let rounded = (minutes + increment - 1) / increment * increment;
    rounded as f64 / 60.0
}

/// Whether rounding would change the entry.
pub fn needs_rounding(hours: f64, increment: u32) -> bool {
    hours_to_minutes(hours) != hours_to_minutes(round_hours(hours, increment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiples_are_untouched() {
        assert_eq!(round_hours(1.25, 15), 1.25);
        assert_eq!(round_hours(2.0, 15), 2.0);
        assert_eq!(round_hours(0.1, 6), 0.1);
        assert!(!needs_rounding(1.25, 15));
    }

    #[test]
    fn partial_increments_round_up() {
        // 1.26h is 76 minutes, the next quarter hour is 90.
        assert_eq!(round_hours(1.26, 15), 1.5);
        assert_eq!(round_hours(0.01, 15), 0.25);
        assert_eq!(round_hours(0.75, 60), 1.0);
        assert!(needs_rounding(1.26, 15));
    }

    #[test]
    fn six_minute_increment_uses_tenths() {
        assert_eq!(round_hours(0.25, 6), 0.3);
        assert_eq!(round_hours(0.11, 6), 0.2);
    }

    #[test]
    fn zero_and_negative_hours_stay_zero() {
        assert_eq!(round_hours(0.0, 15), 0.0);
        assert_eq!(round_hours(-1.0, 15), 0.0);
        assert!(!needs_rounding(0.0, 15));
    }

    #[test]
    fn float_noise_does_not_round() {
        // 0.1 + 0.2 is 0.30000000000000004, still exactly 18 minutes.
        let hours = 0.1 + 0.2;
        assert_eq!(hours_to_minutes(hours), 18);
        assert!(!needs_rounding(hours, 6));
    }

    #[test]
    fn hhmm_formatting() {
        assert_eq!(format_hours(1.25), "1:15");
        assert_eq!(format_hours(0.1), "0:06");
        assert_eq!(format_hours(2.0), "2:00");
        assert_eq!(format_minutes(145), "2:25");
    }
}
