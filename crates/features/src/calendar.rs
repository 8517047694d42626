//! Calendar encodings used by the date, season and weekday features.

use chrono::{Datelike, NaiveDate};

/// Number of seasons.
pub const N_SEASONS: usize = 4;

/// Number of weekdays.
pub const N_WEEKDAYS: usize = 7;

/// Reference date for the date feature (first contest of the lottery).
pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2003, 9, 29).unwrap_or(NaiveDate::MIN)
}

/// Season index in `0..4`, grouping Dec-Feb, Mar-May, Jun-Aug, Sep-Nov.
#[inline]
pub fn season_index(date: NaiveDate) -> u32 {
    (date.month() % 12) / 3
}

/// Weekday index in `0..7`, Sunday = 0.
#[inline]
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Whole days between `epoch` and `date`, in 365-day years.
///
/// Not clamped: dates before the epoch give negative values.
#[inline]
pub fn years_since(date: NaiveDate, epoch: NaiveDate) -> f64 {
    date.signed_duration_since(epoch).num_days() as f64 / types::features::DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_season_boundaries() {
        assert_eq!(season_index(ymd(2024, 12, 1)), 0);
        assert_eq!(season_index(ymd(2024, 1, 15)), 0);
        assert_eq!(season_index(ymd(2024, 2, 29)), 0);
        assert_eq!(season_index(ymd(2024, 3, 1)), 1);
        assert_eq!(season_index(ymd(2024, 6, 1)), 2);
        assert_eq!(season_index(ymd(2024, 11, 30)), 3);
    }

    #[test]
    fn test_weekday_sunday_zero() {
        // 2024-06-02 was a Sunday
        assert_eq!(weekday_index(ymd(2024, 6, 2)), 0);
        assert_eq!(weekday_index(ymd(2024, 6, 8)), 6);
    }

    #[test]
    fn test_years_since_epoch() {
        let epoch = default_epoch();
        assert_eq!(years_since(epoch, epoch), 0.0);
        assert!((years_since(ymd(2004, 9, 28), epoch) - 1.0).abs() < 1e-12);
        assert!(years_since(ymd(2003, 1, 1), epoch) < 0.0);
    }
}
