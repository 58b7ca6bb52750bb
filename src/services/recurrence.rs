//! Date arithmetic for the scheduled jobs: next-occurrence calculation for
//! recurring transactions and calendar-month windows for aggregation.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};

use crate::models::RecurringInterval;

/// Next occurrence of a recurring transaction after `from`.
///
/// Monthly and yearly steps clamp to the last valid day of the target
/// month (Jan 31 + 1 month = Feb 28, or Feb 29 in a leap year). Total:
/// saturates at chrono's far end rather than failing, which is unreachable
/// for any realistic date.
pub fn next_occurrence(from: DateTime<Utc>, interval: RecurringInterval) -> DateTime<Utc> {
    let next = match interval {
        RecurringInterval::Daily => from.checked_add_days(Days::new(1)),
        RecurringInterval::Weekly => from.checked_add_days(Days::new(7)),
        RecurringInterval::Monthly => from.checked_add_months(Months::new(1)),
        RecurringInterval::Yearly => from.checked_add_months(Months::new(12)),
    };
    next.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Half-open window [first of month 00:00, first of next month 00:00)
/// covering the calendar month containing `at`.
pub fn month_window(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = month_start(at.year(), at.month());
    let end = if at.month() == 12 {
        month_start(at.year() + 1, 1)
    } else {
        month_start(at.year(), at.month() + 1)
    };
    (start, end)
}

/// Window covering the calendar month before the one containing `at`.
pub fn prior_month_window(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (current_start, _) = month_window(at);
    let prior_start = if at.month() == 1 {
        month_start(at.year() - 1, 12)
    } else {
        month_start(at.year(), at.month() - 1)
    };
    (prior_start, current_start)
}

/// True when `current` falls in a different calendar month (or year) than
/// `last`. Used to gate at-most-one-alert-per-month behavior.
pub fn is_new_month(last: DateTime<Utc>, current: DateTime<Utc>) -> bool {
    last.month() != current.month() || last.year() != current.year()
}

/// English month name for report subjects ("January", ...).
pub fn month_name(at: DateTime<Utc>) -> String {
    at.format("%B").to_string()
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("first of month is a valid date")
        .and_time(NaiveTime::MIN)
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 30, 0).unwrap()
    }

    #[test]
    fn daily_adds_one_day() {
        let next = next_occurrence(at(2025, 3, 14), RecurringInterval::Daily);
        assert_eq!(next - at(2025, 3, 14), Duration::days(1));
    }

    #[test]
    fn weekly_adds_seven_days() {
        let next = next_occurrence(at(2025, 3, 14), RecurringInterval::Weekly);
        assert_eq!(next - at(2025, 3, 14), Duration::days(7));
    }

    #[test]
    fn monthly_preserves_day_of_month_when_possible() {
        let next = next_occurrence(at(2025, 3, 14), RecurringInterval::Monthly);
        assert_eq!((next.year(), next.month(), next.day()), (2025, 4, 14));
    }

    #[test]
    fn monthly_clamps_to_last_day_of_shorter_month() {
        let next = next_occurrence(at(2025, 1, 31), RecurringInterval::Monthly);
        assert_eq!((next.year(), next.month(), next.day()), (2025, 2, 28));

        let leap = next_occurrence(at(2024, 1, 31), RecurringInterval::Monthly);
        assert_eq!((leap.year(), leap.month(), leap.day()), (2024, 2, 29));
    }

    #[test]
    fn yearly_adds_one_calendar_year() {
        let next = next_occurrence(at(2025, 6, 1), RecurringInterval::Yearly);
        assert_eq!((next.year(), next.month(), next.day()), (2026, 6, 1));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let next = next_occurrence(at(2024, 2, 29), RecurringInterval::Yearly);
        assert_eq!((next.year(), next.month(), next.day()), (2025, 2, 28));
    }

    #[test]
    fn next_occurrence_is_strictly_later_for_all_intervals() {
        let reference = at(2025, 12, 31);
        for interval in [
            RecurringInterval::Daily,
            RecurringInterval::Weekly,
            RecurringInterval::Monthly,
            RecurringInterval::Yearly,
        ] {
            assert!(next_occurrence(reference, interval) > reference);
        }
    }

    #[test]
    fn month_window_spans_the_whole_month() {
        let (start, end) = month_window(at(2025, 2, 14));
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_window_rolls_over_december() {
        let (start, end) = month_window(at(2025, 12, 25));
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn prior_month_window_handles_january() {
        let (start, end) = prior_month_window(at(2025, 1, 5));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn new_month_guard() {
        assert!(!is_new_month(at(2025, 5, 1), at(2025, 5, 31)));
        assert!(is_new_month(at(2025, 5, 31), at(2025, 6, 1)));
        // Same month number, different year
        assert!(is_new_month(at(2024, 5, 15), at(2025, 5, 15)));
    }

    #[test]
    fn month_name_is_english() {
        assert_eq!(month_name(at(2025, 4, 1)), "April");
    }
}
