//! Working-day classification: weekends are Saturday and Sunday, everything
//! else is a working day unless it is a declared holiday.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashSet};

/// Read-only view of the declared holidays.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl HolidayCalendar for BTreeSet<NaiveDate> {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl HolidayCalendar for HashSet<NaiveDate> {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

impl HolidayCalendar for [NaiveDate] {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_non_working_day<C: HolidayCalendar + ?Sized>(calendar: &C, date: NaiveDate) -> bool {
    is_weekend(date) || calendar.is_holiday(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2026-03-06 is a Friday.
    #[rstest]
    #[case(d(2026, 3, 6), false)]
    #[case(d(2026, 3, 7), true)]
    #[case(d(2026, 3, 8), true)]
    #[case(d(2026, 3, 9), false)]
    fn weekends_are_saturday_and_sunday(#[case] date: NaiveDate, #[case] expected: bool) {
        assert_eq!(is_weekend(date), expected);
    }

    #[test]
    fn declared_holidays_are_non_working() {
        let holidays: BTreeSet<_> = [d(2026, 3, 10)].into_iter().collect();
        assert!(is_non_working_day(&holidays, d(2026, 3, 10)));
        assert!(!is_non_working_day(&holidays, d(2026, 3, 11)));
        assert!(is_non_working_day(&holidays, d(2026, 3, 14)));
    }

    #[test]
    fn unknown_dates_default_to_working() {
        let none: [NaiveDate; 0] = [];
        assert!(!is_non_working_day(&none[..], d(2026, 12, 25)));
    }
}
