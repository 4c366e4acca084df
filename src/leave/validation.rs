//! Input checks run before a leave request is stored or edited.

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::LeaveError;
use crate::model::leave_request::{HalfDay, LeaveRequest, LeaveStatus, LeaveType};

/// Longest span, in calendar days, a single request may cover.
pub const MAX_SPAN_DAYS: i64 = 366;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveInput {
    #[schema(example = "casual")]
    pub leave_type: String,
    #[schema(example = "2026-11-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-11-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "first", nullable = true)]
    pub half_day_start_type: Option<String>,
    #[schema(example = "none", nullable = true)]
    pub half_day_end_type: Option<String>,
    #[schema(example = "Family function", nullable = true)]
    pub reason: Option<String>,
}

/// Fields an employee may change on a pending request. Absent fields keep
/// their current value; half-day markers are cleared with `"none"`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeavePatch {
    pub leave_type: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub half_day_start_type: Option<String>,
    pub half_day_end_type: Option<String>,
    pub reason: Option<String>,
}

/// A parsed, validated leave span ready for day counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveDraft {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day_start: HalfDay,
    pub half_day_end: HalfDay,
    pub reason: Option<String>,
}

impl LeaveDraft {
    pub fn from_input(input: &LeaveInput, today: NaiveDate) -> Result<Self, LeaveError> {
        let draft = LeaveDraft {
            leave_type: LeaveType::parse(&input.leave_type)?,
            start_date: input.start_date,
            end_date: input.end_date,
            half_day_start: HalfDay::parse(
                "half_day_start_type",
                input.half_day_start_type.as_deref(),
            )?,
            half_day_end: HalfDay::parse("half_day_end_type", input.half_day_end_type.as_deref())?,
            reason: normalize_reason(input.reason.as_deref()),
        };
        validate_span(draft.start_date, draft.end_date, today)?;
        Ok(draft)
    }

    /// Applies `patch` on top of an existing request and re-validates the span.
    pub fn from_patch(
        current: &LeaveRequest,
        patch: &LeavePatch,
        today: NaiveDate,
    ) -> Result<Self, LeaveError> {
        let leave_type = match patch.leave_type.as_deref() {
            Some(v) => LeaveType::parse(v)?,
            None => current.leave_type,
        };
        let half_day_start = match patch.half_day_start_type.as_deref() {
            Some(v) => HalfDay::parse("half_day_start_type", Some(v))?,
            None => current.half_day_start_type,
        };
        let half_day_end = match patch.half_day_end_type.as_deref() {
            Some(v) => HalfDay::parse("half_day_end_type", Some(v))?,
            None => current.half_day_end_type,
        };
        let reason = match patch.reason.as_deref() {
            Some(v) => normalize_reason(Some(v)),
            None => current.reason.clone(),
        };

        let draft = LeaveDraft {
            leave_type,
            start_date: patch.start_date.unwrap_or(current.start_date),
            end_date: patch.end_date.unwrap_or(current.end_date),
            half_day_start,
            half_day_end,
            reason,
        };
        validate_span(draft.start_date, draft.end_date, today)?;
        Ok(draft)
    }
}

pub fn validate_span(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), LeaveError> {
    if start > end {
        return Err(LeaveError::Validation(
            "Start date cannot be after end date".to_string(),
        ));
    }
    if today > start || today > end {
        return Err(LeaveError::Validation(
            "Leave date has already passed.".to_string(),
        ));
    }
    if (end - start).num_days() + 1 > MAX_SPAN_DAYS {
        return Err(LeaveError::Validation(format!(
            "Leave cannot span more than {} days",
            MAX_SPAN_DAYS
        )));
    }
    Ok(())
}

/// Inclusive date-range overlap.
pub fn overlaps(
    start: NaiveDate,
    end: NaiveDate,
    other_start: NaiveDate,
    other_end: NaiveDate,
) -> bool {
    start <= other_end && end >= other_start
}

/// Another request of the same employee, as seen by the overlap guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingSpan {
    pub id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
}

/// The first pending or approved request overlapping `[start, end]`.
/// `editing` names the request being edited, which never clashes with itself.
pub fn find_clash(
    existing: &[ExistingSpan],
    start: NaiveDate,
    end: NaiveDate,
    editing: Option<u64>,
) -> Option<u64> {
    existing
        .iter()
        .filter(|span| span.status != LeaveStatus::Rejected)
        .filter(|span| Some(span.id) != editing)
        .find(|span| overlaps(start, end, span.start_date, span.end_date))
        .map(|span| span.id)
}

fn normalize_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{Deductions, LeaveStatus};
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn input(leave_type: &str, start: NaiveDate, end: NaiveDate) -> LeaveInput {
        LeaveInput {
            leave_type: leave_type.to_string(),
            start_date: start,
            end_date: end,
            half_day_start_type: None,
            half_day_end_type: None,
            reason: Some("  trip  ".to_string()),
        }
    }

    #[test]
    fn input_is_normalised() {
        let today = d(2026, 3, 1);
        let mut raw = input("Casual", d(2026, 3, 2), d(2026, 3, 3));
        raw.half_day_end_type = Some("SECOND".to_string());

        let draft = LeaveDraft::from_input(&raw, today).unwrap();
        assert_eq!(draft.leave_type, LeaveType::Casual);
        assert_eq!(draft.half_day_start, HalfDay::None);
        assert_eq!(draft.half_day_end, HalfDay::Second);
        assert_eq!(draft.reason.as_deref(), Some("trip"));
    }

    #[test]
    fn rejects_unknown_leave_type_and_marker() {
        let today = d(2026, 3, 1);
        let raw = input("annual", d(2026, 3, 2), d(2026, 3, 3));
        assert!(matches!(
            LeaveDraft::from_input(&raw, today),
            Err(LeaveError::Validation(_))
        ));

        let mut raw = input("sick", d(2026, 3, 2), d(2026, 3, 3));
        raw.half_day_start_type = Some("morning".to_string());
        assert!(matches!(
            LeaveDraft::from_input(&raw, today),
            Err(LeaveError::Validation(_))
        ));
    }

    #[test]
    fn rejects_inverted_and_past_spans() {
        let today = d(2026, 3, 5);
        assert!(validate_span(d(2026, 3, 7), d(2026, 3, 6), today).is_err());
        assert!(validate_span(d(2026, 3, 4), d(2026, 3, 6), today).is_err());
        assert!(validate_span(d(2026, 3, 5), d(2026, 3, 5), today).is_ok());
    }

    #[test]
    fn spans_longer_than_a_year_are_refused() {
        let today = d(2026, 10, 18);
        assert!(validate_span(d(2027, 1, 1), d(2027, 12, 31), today).is_ok());
        assert!(validate_span(d(2028, 1, 1), d(2028, 12, 31), today).is_ok());
        assert!(matches!(
            validate_span(d(2027, 1, 1), d(2028, 1, 2), today),
            Err(LeaveError::Validation(_))
        ));
        assert!(matches!(
            validate_span(d(2026, 11, 2), d(2100, 1, 1), today),
            Err(LeaveError::Validation(_))
        ));
    }

    fn span(id: u64, start: NaiveDate, end: NaiveDate, status: LeaveStatus) -> ExistingSpan {
        ExistingSpan {
            id,
            start_date: start,
            end_date: end,
            status,
        }
    }

    #[test]
    fn new_request_clashes_with_pending_or_approved_leave() {
        let existing = [
            span(1, d(2026, 3, 2), d(2026, 3, 4), LeaveStatus::Pending),
            span(2, d(2026, 3, 10), d(2026, 3, 10), LeaveStatus::Approved),
        ];
        assert_eq!(find_clash(&existing, d(2026, 3, 4), d(2026, 3, 5), None), Some(1));
        assert_eq!(find_clash(&existing, d(2026, 3, 9), d(2026, 3, 11), None), Some(2));
        assert_eq!(find_clash(&existing, d(2026, 3, 5), d(2026, 3, 9), None), None);
    }

    #[test]
    fn rejected_leave_frees_its_dates() {
        let existing = [span(3, d(2026, 3, 2), d(2026, 3, 4), LeaveStatus::Rejected)];
        assert_eq!(find_clash(&existing, d(2026, 3, 2), d(2026, 3, 4), None), None);
    }

    #[test]
    fn edited_request_does_not_clash_with_itself() {
        let existing = [
            span(4, d(2026, 3, 2), d(2026, 3, 4), LeaveStatus::Pending),
            span(5, d(2026, 3, 6), d(2026, 3, 6), LeaveStatus::Pending),
        ];
        assert_eq!(find_clash(&existing, d(2026, 3, 3), d(2026, 3, 5), Some(4)), None);
        assert_eq!(find_clash(&existing, d(2026, 3, 3), d(2026, 3, 6), Some(4)), Some(5));
    }

    #[test]
    fn overlap_is_inclusive() {
        assert!(overlaps(d(2026, 3, 2), d(2026, 3, 4), d(2026, 3, 4), d(2026, 3, 6)));
        assert!(overlaps(d(2026, 3, 3), d(2026, 3, 3), d(2026, 3, 1), d(2026, 3, 9)));
        assert!(!overlaps(d(2026, 3, 2), d(2026, 3, 3), d(2026, 3, 4), d(2026, 3, 6)));
    }

    #[test]
    fn patch_keeps_unset_fields_and_clears_markers() {
        let current = LeaveRequest {
            id: 1,
            employee_id: 2,
            leave_type: LeaveType::Sick,
            start_date: d(2026, 3, 2),
            end_date: d(2026, 3, 3),
            half_day_start_type: HalfDay::First,
            half_day_end_type: HalfDay::None,
            total_days: Decimal::new(15, 1),
            sandwich_days: 0,
            reason: Some("flu".to_string()),
            status: LeaveStatus::Pending,
            deducted: Deductions::default(),
            leave_without_pay: Decimal::ZERO,
            action_by: None,
            approve_date: None,
            approve_comment: None,
            reject_date: None,
            reject_comment: None,
            created_at: None,
        };
        let patch = LeavePatch {
            end_date: Some(d(2026, 3, 5)),
            half_day_start_type: Some("none".to_string()),
            ..LeavePatch::default()
        };

        let draft = LeaveDraft::from_patch(&current, &patch, d(2026, 3, 1)).unwrap();
        assert_eq!(draft.leave_type, LeaveType::Sick);
        assert_eq!(draft.start_date, d(2026, 3, 2));
        assert_eq!(draft.end_date, d(2026, 3, 5));
        assert_eq!(draft.half_day_start, HalfDay::None);
        assert_eq!(draft.reason.as_deref(), Some("flu"));

        let bad = LeavePatch {
            end_date: Some(d(2026, 3, 1)),
            ..LeavePatch::default()
        };
        assert!(LeaveDraft::from_patch(&current, &bad, d(2026, 3, 1)).is_err());
    }
}
