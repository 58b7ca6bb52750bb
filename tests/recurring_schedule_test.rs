//! Scheduling Calendar Tests
//!
//! Pins down the calendar arithmetic contracts the background jobs rely
//! on: next-occurrence stepping with month-end clamping, calendar-month
//! aggregation windows, and the once-per-month alert gate.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Next-occurrence stepping
// ---------------------------------------------------------------------------

mod next_occurrence {
    use super::*;

    /// Daily and weekly steps are fixed-length.
    #[test]
    fn day_based_intervals_add_exact_days() {
        let reference = at(2025, 3, 14);
        assert_eq!(
            reference.checked_add_days(Days::new(1)).unwrap(),
            at(2025, 3, 15)
        );
        assert_eq!(
            reference.checked_add_days(Days::new(7)).unwrap(),
            at(2025, 3, 21)
        );
    }

    /// Month steps preserve the day of month whenever the target month
    /// has that day.
    #[test]
    fn month_step_preserves_day_of_month() {
        let next = at(2025, 4, 14).checked_add_months(Months::new(1)).unwrap();
        assert_eq!((next.month(), next.day()), (5, 14));
    }

    /// The documented month-end policy: clamp to the last valid day of
    /// the target month.
    #[test]
    fn month_step_clamps_jan_31() {
        let next = at(2025, 1, 31).checked_add_months(Months::new(1)).unwrap();
        assert_eq!((next.year(), next.month(), next.day()), (2025, 2, 28));
    }

    #[test]
    fn month_step_clamps_to_leap_day_in_leap_years() {
        let next = at(2024, 1, 31).checked_add_months(Months::new(1)).unwrap();
        assert_eq!((next.year(), next.month(), next.day()), (2024, 2, 29));
    }

    #[test]
    fn year_step_clamps_feb_29() {
        let next = at(2024, 2, 29).checked_add_months(Months::new(12)).unwrap();
        assert_eq!((next.year(), next.month(), next.day()), (2025, 2, 28));
    }

    /// Every interval moves strictly forward, so a processed template can
    /// never be immediately due again.
    #[test]
    fn all_intervals_move_strictly_forward() {
        let reference = at(2025, 12, 31);
        let steps = [
            reference.checked_add_days(Days::new(1)).unwrap(),
            reference.checked_add_days(Days::new(7)).unwrap(),
            reference.checked_add_months(Months::new(1)).unwrap(),
            reference.checked_add_months(Months::new(12)).unwrap(),
        ];
        for next in steps {
            assert!(next > reference);
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar-month aggregation windows
// ---------------------------------------------------------------------------

mod month_windows {
    use super::*;

    fn month_start(year: i32, month: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .unwrap()
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    /// The half-open [start, next-start) window covers every instant of
    /// the month, including the last second the closed form would name.
    #[test]
    fn window_contains_last_second_of_month() {
        let start = month_start(2025, 4);
        let end = month_start(2025, 5);
        let last_second = Utc.with_ymd_and_hms(2025, 4, 30, 23, 59, 59).unwrap();

        assert!(last_second >= start && last_second < end);
        assert!(!(end >= start && end < end));
    }

    #[test]
    fn consecutive_windows_do_not_overlap() {
        let april = (month_start(2025, 4), month_start(2025, 5));
        let may = (month_start(2025, 5), month_start(2025, 6));
        assert_eq!(april.1, may.0);
    }

    #[test]
    fn prior_month_of_january_is_december_last_year() {
        let now = at(2025, 1, 1);
        let prior_start = month_start(now.year() - 1, 12);
        let prior_end = month_start(now.year(), 1);
        let new_years_eve = Utc.with_ymd_and_hms(2024, 12, 31, 18, 0, 0).unwrap();

        assert!(new_years_eve >= prior_start && new_years_eve < prior_end);
    }
}

// ---------------------------------------------------------------------------
// Once-per-month alert gate
// ---------------------------------------------------------------------------

mod alert_gate {
    use super::*;

    fn is_new_month(last: DateTime<Utc>, current: DateTime<Utc>) -> bool {
        last.month() != current.month() || last.year() != current.year()
    }

    fn should_alert(percentage_used: f64, last_alert: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        percentage_used >= 80.0 && last_alert.map_or(true, |last| is_new_month(last, now))
    }

    /// An 85%-spent budget with no prior alert fires.
    #[test]
    fn first_alert_fires_at_85_percent() {
        assert!(should_alert(85.0, None, at(2025, 5, 20)));
    }

    /// Re-running the checker later the same month stays quiet no matter
    /// how often it runs.
    #[test]
    fn same_month_rerun_stays_quiet() {
        let first_alert = at(2025, 5, 2);
        for day in [3, 10, 20, 31] {
            assert!(!should_alert(92.0, Some(first_alert), at(2025, 5, day)));
        }
    }

    /// The month rollover re-arms the gate, even one day later.
    #[test]
    fn month_rollover_rearms_the_gate() {
        let last = at(2025, 4, 30);
        assert!(should_alert(85.0, Some(last), at(2025, 5, 1)));
    }

    /// Same month number a year apart is a different calendar month.
    #[test]
    fn same_month_number_different_year_rearms() {
        assert!(should_alert(85.0, Some(at(2024, 5, 15)), at(2025, 5, 15)));
    }

    #[test]
    fn below_threshold_never_fires() {
        assert!(!should_alert(79.9, None, at(2025, 5, 20)));
    }
}
