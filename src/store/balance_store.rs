use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::LeaveError;
use crate::model::leave_balance::{LEAVE_BALANCE_COLUMNS, LeaveBalance};
use crate::model::leave_request::LeaveType;

/// Opening counters for an employee's balance row. Lifetime totals default to
/// the opening available amounts.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewBalance {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(value_type = Option<f64>, example = 10.0)]
    pub sick_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 12.0)]
    pub casual_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 2.0)]
    pub optional_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 15.0)]
    pub earned_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total_sick_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total_casual_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total_optional_leave: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total_earned_leave: Option<Decimal>,
}

impl NewBalance {
    /// `[available, total]` per bucket in `LeaveType::ALL` order.
    pub fn counters(&self) -> Result<[[Decimal; 2]; 4], LeaveError> {
        let pairs = [
            (self.sick_leave, self.total_sick_leave),
            (self.casual_leave, self.total_casual_leave),
            (self.optional_leave, self.total_optional_leave),
            (self.earned_leave, self.total_earned_leave),
        ];

        let mut counters = [[Decimal::ZERO; 2]; 4];
        for (slot, (bucket, (available, total))) in
            counters.iter_mut().zip(LeaveType::ALL.iter().zip(pairs))
        {
            let available = available.unwrap_or(Decimal::ZERO).round_dp(1);
            let total = total.unwrap_or(available).round_dp(1);
            if available < Decimal::ZERO || total < Decimal::ZERO {
                return Err(LeaveError::Validation(format!(
                    "{} leave counters cannot be negative",
                    bucket
                )));
            }
            *slot = [available, total];
        }
        Ok(counters)
    }
}

pub(crate) async fn lock_balance(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM leave_balances WHERE employee_id = ? FOR UPDATE",
        LEAVE_BALANCE_COLUMNS
    );
    sqlx::query_as::<_, LeaveBalance>(&sql)
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await
}

pub(crate) async fn require_locked_balance(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> Result<LeaveBalance, LeaveError> {
    lock_balance(conn, employee_id)
        .await?
        .ok_or_else(|| LeaveError::Precondition("Leave balance not set. Contact HR.".to_string()))
}

pub(crate) async fn save_balance(
    conn: &mut MySqlConnection,
    balance: &LeaveBalance,
    updated_by: Option<u64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE leave_balances
        SET sick_leave = ?, casual_leave = ?, optional_leave = ?, earned_leave = ?,
            total_sick_leave = ?, total_casual_leave = ?, total_optional_leave = ?,
            total_earned_leave = ?, updated_by = COALESCE(?, updated_by)
        WHERE id = ?
        "#,
    )
    .bind(balance.sick_leave)
    .bind(balance.casual_leave)
    .bind(balance.optional_leave)
    .bind(balance.earned_leave)
    .bind(balance.total_sick_leave)
    .bind(balance.total_casual_leave)
    .bind(balance.total_optional_leave)
    .bind(balance.total_earned_leave)
    .bind(updated_by)
    .bind(balance.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn get_balance(pool: &MySqlPool, employee_id: u64) -> Result<LeaveBalance, LeaveError> {
    let sql = format!(
        "SELECT {} FROM leave_balances WHERE employee_id = ?",
        LEAVE_BALANCE_COLUMNS
    );
    sqlx::query_as::<_, LeaveBalance>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LeaveError::Precondition("Leave balance not set. Contact HR.".to_string()))
}

pub async fn find_balance(pool: &MySqlPool, employee_id: u64) -> Result<Option<LeaveBalance>, LeaveError> {
    match get_balance(pool, employee_id).await {
        Ok(balance) => Ok(Some(balance)),
        Err(LeaveError::Precondition(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn create_balance(
    pool: &MySqlPool,
    new: &NewBalance,
    created_by: u64,
) -> Result<LeaveBalance, LeaveError> {
    let [sick, casual, optional, earned] = new.counters()?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, sick_leave, casual_leave, optional_leave, earned_leave,
             total_sick_leave, total_casual_leave, total_optional_leave, total_earned_leave,
             updated_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.employee_id)
    .bind(sick[0])
    .bind(casual[0])
    .bind(optional[0])
    .bind(earned[0])
    .bind(sick[1])
    .bind(casual[1])
    .bind(optional[1])
    .bind(earned[1])
    .bind(created_by)
    .execute(pool)
    .await;

    if let Err(e) = result {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Err(LeaveError::Conflict(
                    "Leave balance already exists for this employee".to_string(),
                ));
            }
        }
        return Err(e.into());
    }

    info!(employee_id = new.employee_id, created_by, "Leave balance created");
    get_balance(pool, new.employee_id).await
}

/// Adds `amount` to one bucket of one employee (available and lifetime total).
pub async fn grant(
    pool: &MySqlPool,
    employee_id: u64,
    bucket: LeaveType,
    amount: Decimal,
    granted_by: Option<u64>,
) -> Result<LeaveBalance, LeaveError> {
    let amount = amount.round_dp(1);
    let mut tx = pool.begin().await?;

    let mut balance = require_locked_balance(&mut tx, employee_id).await?;
    let before = balance.available(bucket);
    balance.grant(bucket, amount)?;
    save_balance(&mut tx, &balance, granted_by).await?;
    tx.commit().await?;

    info!(
        employee_id,
        %bucket,
        from = %before,
        to = %balance.available(bucket),
        lifetime = %balance.total(bucket),
        "Leave granted"
    );
    Ok(balance)
}

/// Accrual pass: grants `amount` of `bucket` to every balance row in one
/// transaction. Returns the number of employees credited.
pub async fn grant_all(
    pool: &MySqlPool,
    bucket: LeaveType,
    amount: Decimal,
    granted_by: Option<u64>,
) -> Result<u64, LeaveError> {
    let amount = amount.round_dp(1);
    if amount <= Decimal::ZERO {
        return Err(LeaveError::Validation(
            "Grant amount must be greater than zero".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let sql = format!(
        "SELECT {} FROM leave_balances ORDER BY employee_id FOR UPDATE",
        LEAVE_BALANCE_COLUMNS
    );
    let balances = sqlx::query_as::<_, LeaveBalance>(&sql)
        .fetch_all(&mut *tx)
        .await?;

    let mut credited = 0u64;
    for mut balance in balances {
        let before = balance.available(bucket);
        balance.grant(bucket, amount)?;
        save_balance(&mut tx, &balance, granted_by).await?;
        credited += 1;
        info!(
            employee_id = balance.employee_id,
            %bucket,
            from = %before,
            to = %balance.available(bucket),
            "Leave accrued"
        );
    }
    tx.commit().await?;

    if credited == 0 {
        warn!(%bucket, "Accrual ran with no leave balances to credit");
    }
    Ok(credited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_default_to_opening_amounts() {
        let new = NewBalance {
            employee_id: 1,
            sick_leave: Some(dec!(10)),
            casual_leave: Some(dec!(7.5)),
            total_casual_leave: Some(dec!(12)),
            ..NewBalance::default()
        };
        let [sick, casual, optional, earned] = new.counters().unwrap();
        assert_eq!(sick, [dec!(10), dec!(10)]);
        assert_eq!(casual, [dec!(7.5), dec!(12)]);
        assert_eq!(optional, [Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(earned, [Decimal::ZERO, Decimal::ZERO]);
    }

    #[test]
    fn negative_counters_are_rejected() {
        let new = NewBalance {
            employee_id: 1,
            earned_leave: Some(dec!(-1)),
            ..NewBalance::default()
        };
        assert!(matches!(new.counters(), Err(LeaveError::Validation(_))));
    }

    #[test]
    fn counters_are_rounded_to_one_place() {
        let new = NewBalance {
            employee_id: 1,
            optional_leave: Some(dec!(1.25)),
            ..NewBalance::default()
        };
        let [_, _, optional, _] = new.counters().unwrap();
        assert_eq!(optional[0].to_string(), "1.2");
    }
}
