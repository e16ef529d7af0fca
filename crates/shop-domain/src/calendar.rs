//! Calendar arithmetic shared by the recurrence schedule.

use chrono::{Datelike, Duration, NaiveDate};

/// Number of days in `month` of `year`, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    let last_current = first_next - Duration::days(1);
    if last_current.month() != month {
        return None;
    }
    Some(last_current.day())
}

/// Builds a date, clamping `day` to the last day of the month.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// Zero-based month counter (`year * 12 + month - 1`).
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Inverse of [`month_index`], yielding `(year, month)` with a 1-based month.
pub fn year_month(index: i64) -> (i32, u32) {
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

/// Sunday on or before `date`.
pub fn week_start_sunday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Largest multiple of `step` not greater than `value` (for non-negative values).
pub fn align_down(value: i64, step: i64) -> i64 {
    value - value.rem_euclid(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn clamped_date_moves_to_month_end() {
        assert_eq!(
            clamped_date(2025, 4, 31),
            NaiveDate::from_ymd_opt(2025, 4, 30)
        );
        assert_eq!(clamped_date(2025, 0, 1), None);
    }

    #[test]
    fn month_index_roundtrips() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 5).unwrap();
        assert_eq!(year_month(month_index(date)), (2026, 12));
    }

    #[test]
    fn week_start_is_previous_sunday() {
        // 2026-10-21 is a Wednesday.
        let date = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        assert_eq!(
            week_start_sunday(date),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        );
    }
}
