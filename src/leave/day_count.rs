//! Chargeable-day computation for a leave span.
//!
//! Every calendar day inside `[start, end]` is charged. Non-working days that
//! directly touch the span on either side ("sandwich" days) are charged as
//! well, and each half-day marker takes half a day off the result. A
//! single-day leave never absorbs sandwich days and is at most one half day
//! short of a full day.

use chrono::NaiveDate;
use derive_more::Display;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::calendar::{HolidayCalendar, is_non_working_day};
use crate::model::leave_request::HalfDay;

/// Upper bound on consecutive non-working days absorbed on one side.
pub const SANDWICH_SCAN_LIMIT: u32 = 366;

const HALF_DAY: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub total_days: Decimal,
    pub sandwich_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DayCountError {
    #[display(fmt = "start date {} is after end date {}", start, end)]
    InvertedSpan { start: NaiveDate, end: NaiveDate },
    #[display(fmt = "date arithmetic left the supported calendar range near {}", _0)]
    OutOfRange(NaiveDate),
    #[display(
        fmt = "more than {} consecutive non-working days next to {}",
        SANDWICH_SCAN_LIMIT,
        _0
    )]
    UnboundedSandwich(NaiveDate),
    #[display(fmt = "leave from {} to {} charges no days", start, end)]
    NothingCharged { start: NaiveDate, end: NaiveDate },
}

pub fn compute_days<C: HolidayCalendar + ?Sized>(
    calendar: &C,
    start: NaiveDate,
    end: NaiveDate,
    half_day_start: HalfDay,
    half_day_end: HalfDay,
) -> Result<DayCount, DayCountError> {
    if start > end {
        return Err(DayCountError::InvertedSpan { start, end });
    }

    if start == end {
        let total_days = if half_day_start.is_set() || half_day_end.is_set() {
            HALF_DAY
        } else {
            Decimal::ONE
        };
        return Ok(DayCount {
            total_days,
            sandwich_days: 0,
        });
    }

    let span_days = (end - start).num_days() + 1;
    let sandwich_days = sandwich_before(calendar, start)? + sandwich_after(calendar, end)?;

    let mut total_days = Decimal::from(span_days) + Decimal::from(sandwich_days);
    if half_day_start.is_set() {
        total_days -= HALF_DAY;
    }
    if half_day_end.is_set() {
        total_days -= HALF_DAY;
    }
    let total_days = total_days.round_dp(1);

    if total_days <= Decimal::ZERO {
        return Err(DayCountError::NothingCharged { start, end });
    }

    debug!(
        %start,
        %end,
        total = %total_days,
        sandwich = sandwich_days,
        "Leave days calculated"
    );

    Ok(DayCount {
        total_days,
        sandwich_days,
    })
}

fn sandwich_before<C: HolidayCalendar + ?Sized>(
    calendar: &C,
    start: NaiveDate,
) -> Result<u32, DayCountError> {
    scan(calendar, start, |d| d.pred_opt())
}

fn sandwich_after<C: HolidayCalendar + ?Sized>(
    calendar: &C,
    end: NaiveDate,
) -> Result<u32, DayCountError> {
    scan(calendar, end, |d| d.succ_opt())
}

/// Counts contiguous non-working days stepping away from `edge`.
fn scan<C, F>(calendar: &C, edge: NaiveDate, step: F) -> Result<u32, DayCountError>
where
    C: HolidayCalendar + ?Sized,
    F: Fn(NaiveDate) -> Option<NaiveDate>,
{
    let mut count = 0;
    let mut day = step(edge).ok_or(DayCountError::OutOfRange(edge))?;
    while is_non_working_day(calendar, day) {
        count += 1;
        if count > SANDWICH_SCAN_LIMIT {
            return Err(DayCountError::UnboundedSandwich(edge));
        }
        day = step(day).ok_or(DayCountError::OutOfRange(day))?;
    }
    Ok(count)
}
