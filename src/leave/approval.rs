//! Status transitions of a leave request and their effect on the balance.
//!
//! ```text
//! pending ──approve──▶ approved ──reject──▶ rejected
//!    └──────────────reject──────────────────▲
//! ```
//!
//! Approval consumes `total_days` from the buckets and records exactly what
//! each bucket gave, so that a later rejection can put it back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::LeaveError;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{Deductions, LeaveRequest, LeaveStatus, LeaveType};

/// Who performed a transition, when, and why.
#[derive(Debug, Clone)]
pub struct ReviewAction {
    pub actor_id: u64,
    pub on: NaiveDate,
    pub comment: Option<String>,
}

/// Buckets consumed for a leave type, primary bucket first.
///
/// Optional leave has no fallback and sick leave is never a fallback target.
pub fn deduction_order(leave_type: LeaveType) -> &'static [LeaveType] {
    match leave_type {
        LeaveType::Sick => &[LeaveType::Sick, LeaveType::Casual, LeaveType::Earned],
        LeaveType::Casual => &[LeaveType::Casual, LeaveType::Earned],
        LeaveType::Earned => &[LeaveType::Earned, LeaveType::Casual],
        LeaveType::Optional => &[LeaveType::Optional],
    }
}

/// Moves `request` to `target`, adjusting `balance` accordingly.
///
/// `balance` is required whenever days have to move: on approval, and on
/// rejection of an approved request.
pub fn set_status(
    request: &mut LeaveRequest,
    balance: Option<&mut LeaveBalance>,
    target: LeaveStatus,
    action: ReviewAction,
) -> Result<(), LeaveError> {
    if request.status == target {
        return Err(LeaveError::Conflict(format!(
            "Leave request is already {}",
            target
        )));
    }

    match target {
        LeaveStatus::Approved => approve(request, balance, action),
        LeaveStatus::Rejected => reject(request, balance, action),
        LeaveStatus::Pending => Err(LeaveError::Validation(
            "Status must be either 'approved' or 'rejected'".to_string(),
        )),
    }
}

fn approve(
    request: &mut LeaveRequest,
    balance: Option<&mut LeaveBalance>,
    action: ReviewAction,
) -> Result<(), LeaveError> {
    if request.status == LeaveStatus::Rejected {
        return Err(LeaveError::Conflict(
            "A rejected leave request cannot be approved".to_string(),
        ));
    }
    let balance = require_balance(request, balance)?;

    let requested = request.total_days;
    if request.leave_type == LeaveType::Optional {
        let available = balance.available(LeaveType::Optional);
        if available < requested {
            return Err(LeaveError::InsufficientBalance {
                bucket: LeaveType::Optional,
                requested,
                available,
            });
        }
    }

    let mut deducted = Deductions::default();
    let mut remaining = requested;
    for bucket in deduction_order(request.leave_type) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let taken = balance.deduct(*bucket, remaining);
        deducted.add(*bucket, taken);
        remaining = (remaining - taken).round_dp(1);
    }

    request.deducted = deducted;
    request.leave_without_pay = remaining.max(Decimal::ZERO);
    request.status = LeaveStatus::Approved;
    request.action_by = Some(action.actor_id);
    request.approve_date = Some(action.on);
    request.approve_comment = action.comment;

    info!(
        leave_id = request.id,
        employee_id = request.employee_id,
        sick = %deducted.sick,
        casual = %deducted.casual,
        optional = %deducted.optional,
        earned = %deducted.earned,
        without_pay = %request.leave_without_pay,
        "Leave approved"
    );
    Ok(())
}

fn reject(
    request: &mut LeaveRequest,
    balance: Option<&mut LeaveBalance>,
    action: ReviewAction,
) -> Result<(), LeaveError> {
    if request.status == LeaveStatus::Approved {
        let balance = require_balance(request, balance)?;
        for bucket in LeaveType::ALL {
            let amount = request.deducted.get(bucket);
            if amount > Decimal::ZERO {
                balance.restore(bucket, amount);
            }
        }
        info!(
            leave_id = request.id,
            employee_id = request.employee_id,
            restored = %request.deducted.total(),
            "Approved leave reversed"
        );
        request.deducted = Deductions::default();
        request.leave_without_pay = Decimal::ZERO;
    }

    request.status = LeaveStatus::Rejected;
    request.action_by = Some(action.actor_id);
    request.reject_date = Some(action.on);
    request.reject_comment = action.comment;
    Ok(())
}

fn require_balance<'a>(
    request: &LeaveRequest,
    balance: Option<&'a mut LeaveBalance>,
) -> Result<&'a mut LeaveBalance, LeaveError> {
    match balance {
        Some(b) if b.employee_id == request.employee_id => Ok(b),
        Some(b) => Err(LeaveError::Precondition(format!(
            "Leave balance {} does not belong to employee {}",
            b.id, request.employee_id
        ))),
        None => Err(LeaveError::Precondition(
            "Leave balance not set. Contact HR.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::ledger::tests::balance;
    use crate::model::leave_request::HalfDay;
    use rust_decimal_macros::dec;

    fn request(leave_type: LeaveType, total_days: Decimal) -> LeaveRequest {
        LeaveRequest {
            id: 9,
            employee_id: 42,
            leave_type,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            half_day_start_type: HalfDay::None,
            half_day_end_type: HalfDay::None,
            total_days,
            sandwich_days: 0,
            reason: None,
            status: LeaveStatus::Pending,
            deducted: Deductions::default(),
            leave_without_pay: Decimal::ZERO,
            action_by: None,
            approve_date: None,
            approve_comment: None,
            reject_date: None,
            reject_comment: None,
            created_at: None,
        }
    }

    fn action() -> ReviewAction {
        ReviewAction {
            actor_id: 5,
            on: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            comment: Some("ok".to_string()),
        }
    }

    #[test]
    fn sick_leave_falls_back_to_casual_then_earned() {
        let mut b = balance(dec!(1), dec!(1), dec!(0), dec!(5));
        let mut r = request(LeaveType::Sick, dec!(3));

        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();

        assert_eq!(r.status, LeaveStatus::Approved);
        assert_eq!(r.deducted.sick, dec!(1));
        assert_eq!(r.deducted.casual, dec!(1));
        assert_eq!(r.deducted.earned, dec!(1));
        assert_eq!(r.leave_without_pay, dec!(0));
        assert_eq!(b.sick_leave, dec!(0));
        assert_eq!(b.casual_leave, dec!(0));
        assert_eq!(b.earned_leave, dec!(4));
        assert_eq!(r.action_by, Some(5));
        assert_eq!(r.approve_comment.as_deref(), Some("ok"));
    }

    #[test]
    fn casual_shortfall_becomes_unpaid_and_never_touches_sick() {
        let mut b = balance(dec!(5), dec!(0), dec!(0), dec!(0));
        let mut r = request(LeaveType::Casual, dec!(2));

        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();

        assert_eq!(r.deducted, Deductions::default());
        assert_eq!(r.leave_without_pay, dec!(2.0));
        assert_eq!(b.sick_leave, dec!(5));
    }

    #[test]
    fn earned_leave_falls_back_to_casual() {
        let mut b = balance(dec!(3), dec!(2), dec!(0), dec!(1.5));
        let mut r = request(LeaveType::Earned, dec!(4));

        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();

        assert_eq!(r.deducted.earned, dec!(1.5));
        assert_eq!(r.deducted.casual, dec!(2));
        assert_eq!(r.deducted.sick, dec!(0));
        assert_eq!(r.leave_without_pay, dec!(0.5));
        assert_eq!(r.deducted.total() + r.leave_without_pay, r.total_days);
    }

    #[test]
    fn optional_shortfall_rejects_without_mutation() {
        let mut b = balance(dec!(5), dec!(5), dec!(1), dec!(5));
        let before = b.clone();
        let mut r = request(LeaveType::Optional, dec!(2));

        let err = set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap_err();

        assert_eq!(
            err,
            LeaveError::InsufficientBalance {
                bucket: LeaveType::Optional,
                requested: dec!(2),
                available: dec!(1),
            }
        );
        assert_eq!(b, before);
        assert_eq!(r.status, LeaveStatus::Pending);
    }

    #[test]
    fn optional_leave_draws_only_from_optional() {
        let mut b = balance(dec!(5), dec!(5), dec!(2), dec!(5));
        let mut r = request(LeaveType::Optional, dec!(1.5));

        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();

        assert_eq!(r.deducted.optional, dec!(1.5));
        assert_eq!(b.optional_leave, dec!(0.5));
        assert_eq!(b.casual_leave, dec!(5));
    }

    #[test]
    fn rejecting_approved_leave_restores_exact_amounts() {
        let mut b = balance(dec!(1), dec!(1), dec!(0), dec!(5));
        let before = b.clone();
        let mut r = request(LeaveType::Sick, dec!(8));

        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();
        assert_eq!(r.leave_without_pay, dec!(1));

        set_status(&mut r, Some(&mut b), LeaveStatus::Rejected, action()).unwrap();

        assert_eq!(b, before);
        assert_eq!(r.status, LeaveStatus::Rejected);
        assert_eq!(r.deducted, Deductions::default());
        assert_eq!(r.leave_without_pay, Decimal::ZERO);
        assert_eq!(r.reject_comment.as_deref(), Some("ok"));
    }

    #[test]
    fn rejecting_pending_leave_needs_no_balance() {
        let mut r = request(LeaveType::Casual, dec!(1));
        set_status(&mut r, None, LeaveStatus::Rejected, action()).unwrap();
        assert_eq!(r.status, LeaveStatus::Rejected);
    }

    #[test]
    fn approval_without_balance_is_a_precondition_error() {
        let mut r = request(LeaveType::Casual, dec!(1));
        let err = set_status(&mut r, None, LeaveStatus::Approved, action()).unwrap_err();
        assert!(matches!(err, LeaveError::Precondition(_)));
    }

    #[test]
    fn balance_of_another_employee_is_refused() {
        let mut b = balance(dec!(1), dec!(1), dec!(1), dec!(1));
        b.employee_id = 7;
        let mut r = request(LeaveType::Casual, dec!(1));
        let err = set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap_err();
        assert!(matches!(err, LeaveError::Precondition(_)));
        assert_eq!(b.casual_leave, dec!(1));
    }

    #[test]
    fn same_status_is_a_conflict() {
        let mut b = balance(dec!(5), dec!(5), dec!(5), dec!(5));
        let mut r = request(LeaveType::Casual, dec!(1));
        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();

        let err = set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap_err();
        assert!(matches!(err, LeaveError::Conflict(_)));
        assert_eq!(b.casual_leave, dec!(4));

        let mut pending = request(LeaveType::Casual, dec!(1));
        let err = set_status(&mut pending, None, LeaveStatus::Pending, action()).unwrap_err();
        assert!(matches!(err, LeaveError::Conflict(_)));
    }

    #[test]
    fn rejected_leave_stays_rejected() {
        let mut b = balance(dec!(5), dec!(5), dec!(5), dec!(5));
        let mut r = request(LeaveType::Casual, dec!(1));
        set_status(&mut r, None, LeaveStatus::Rejected, action()).unwrap();

        let err = set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap_err();
        assert!(matches!(err, LeaveError::Conflict(_)));
        assert_eq!(b.casual_leave, dec!(5));
    }

    #[test]
    fn approved_leave_cannot_return_to_pending() {
        let mut b = balance(dec!(5), dec!(5), dec!(5), dec!(5));
        let mut r = request(LeaveType::Casual, dec!(1));
        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();
        let err = set_status(&mut r, Some(&mut b), LeaveStatus::Pending, action()).unwrap_err();
        assert!(matches!(err, LeaveError::Validation(_)));
    }

    #[test]
    fn half_day_approvals_keep_one_decimal() {
        let mut b = balance(dec!(0), dec!(1.0), dec!(0), dec!(0.3));
        let mut r = request(LeaveType::Casual, dec!(1.5));
        set_status(&mut r, Some(&mut b), LeaveStatus::Approved, action()).unwrap();
        assert_eq!(r.deducted.casual, dec!(1.0));
        assert_eq!(r.deducted.earned, dec!(0.3));
        assert_eq!(r.leave_without_pay.to_string(), "0.2");
    }
}
