//! Bucket arithmetic on a [`LeaveBalance`].
//!
//! Available counters never go below zero. Lifetime totals move only on
//! grants. Every mutation rounds the touched counter to one decimal place.

use rust_decimal::Decimal;

use crate::error::LeaveError;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::LeaveType;

impl LeaveBalance {
    pub fn available(&self, bucket: LeaveType) -> Decimal {
        match bucket {
            LeaveType::Sick => self.sick_leave,
            LeaveType::Casual => self.casual_leave,
            LeaveType::Optional => self.optional_leave,
            LeaveType::Earned => self.earned_leave,
        }
    }

    pub fn total(&self, bucket: LeaveType) -> Decimal {
        match bucket {
            LeaveType::Sick => self.total_sick_leave,
            LeaveType::Casual => self.total_casual_leave,
            LeaveType::Optional => self.total_optional_leave,
            LeaveType::Earned => self.total_earned_leave,
        }
    }

    fn available_mut(&mut self, bucket: LeaveType) -> &mut Decimal {
        match bucket {
            LeaveType::Sick => &mut self.sick_leave,
            LeaveType::Casual => &mut self.casual_leave,
            LeaveType::Optional => &mut self.optional_leave,
            LeaveType::Earned => &mut self.earned_leave,
        }
    }

    fn total_mut(&mut self, bucket: LeaveType) -> &mut Decimal {
        match bucket {
            LeaveType::Sick => &mut self.total_sick_leave,
            LeaveType::Casual => &mut self.total_casual_leave,
            LeaveType::Optional => &mut self.total_optional_leave,
            LeaveType::Earned => &mut self.total_earned_leave,
        }
    }

    /// Takes up to `amount` from `bucket` and returns what was actually taken.
    pub fn deduct(&mut self, bucket: LeaveType, amount: Decimal) -> Decimal {
        let slot = self.available_mut(bucket);
        let taken = amount.max(Decimal::ZERO).min((*slot).max(Decimal::ZERO));
        *slot = (*slot - taken).max(Decimal::ZERO).round_dp(1);
        taken
    }

    /// Puts back an amount recorded by an earlier deduction.
    pub fn restore(&mut self, bucket: LeaveType, amount: Decimal) {
        let slot = self.available_mut(bucket);
        *slot = (*slot + amount).round_dp(1);
    }

    /// Entitlement grant: raises both the available and the lifetime counter.
    pub fn grant(&mut self, bucket: LeaveType, amount: Decimal) -> Result<(), LeaveError> {
        if amount <= Decimal::ZERO {
            return Err(LeaveError::Validation(
                "Grant amount must be greater than zero".to_string(),
            ));
        }
        let available = self.available_mut(bucket);
        *available = (*available + amount).round_dp(1);
        let total = self.total_mut(bucket);
        *total = (*total + amount).round_dp(1);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn balance(sick: Decimal, casual: Decimal, optional: Decimal, earned: Decimal) -> LeaveBalance {
        LeaveBalance {
            id: 1,
            employee_id: 42,
            sick_leave: sick,
            casual_leave: casual,
            optional_leave: optional,
            earned_leave: earned,
            total_sick_leave: sick,
            total_casual_leave: casual,
            total_optional_leave: optional,
            total_earned_leave: earned,
            updated_at: None,
        }
    }

    #[test]
    fn deduct_is_clamped_to_available() {
        let mut b = balance(dec!(1), dec!(0), dec!(0), dec!(0));
        assert_eq!(b.deduct(LeaveType::Sick, dec!(3)), dec!(1));
        assert_eq!(b.sick_leave, dec!(0));
        assert_eq!(b.deduct(LeaveType::Sick, dec!(1)), dec!(0));
        assert_eq!(b.sick_leave, dec!(0));
    }

    #[test]
    fn deduct_and_restore_leave_totals_alone() {
        let mut b = balance(dec!(4), dec!(4), dec!(4), dec!(4));
        let taken = b.deduct(LeaveType::Earned, dec!(2.5));
        b.restore(LeaveType::Earned, taken);
        assert_eq!(b.earned_leave, dec!(4));
        assert_eq!(b.total_earned_leave, dec!(4));
    }

    #[test]
    fn repeated_half_day_deductions_stay_exact() {
        let mut b = balance(dec!(0), dec!(3.0), dec!(0), dec!(0));
        for _ in 0..5 {
            b.deduct(LeaveType::Casual, dec!(0.5));
        }
        assert_eq!(b.casual_leave, dec!(0.5));
        assert_eq!(b.casual_leave.to_string(), "0.5");
    }

    #[test]
    fn grant_raises_available_and_lifetime_total() {
        let mut b = balance(dec!(0), dec!(1.5), dec!(0), dec!(0));
        b.grant(LeaveType::Casual, dec!(0.5)).unwrap();
        assert_eq!(b.casual_leave, dec!(2.0));
        assert_eq!(b.total_casual_leave, dec!(2.0));
        assert!(matches!(
            b.grant(LeaveType::Casual, dec!(0)),
            Err(LeaveError::Validation(_))
        ));
    }
}
