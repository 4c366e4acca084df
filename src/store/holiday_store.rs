use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::{error, info};

use crate::error::LeaveError;
use crate::model::holiday::Holiday;

pub async fn holiday_dates_between(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "SELECT festival_date FROM holiday_calendar WHERE festival_date BETWEEN ? AND ? ORDER BY festival_date",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

pub async fn list_holidays(pool: &MySqlPool, year: Option<i32>) -> Result<Vec<Holiday>, LeaveError> {
    let holidays = match year {
        Some(year) => {
            let (from, to) = year_bounds(year)?;
            sqlx::query_as::<_, Holiday>(
                r#"
                SELECT id, festival_date, festival_name
                FROM holiday_calendar
                WHERE festival_date BETWEEN ? AND ?
                ORDER BY festival_date
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Holiday>(
                "SELECT id, festival_date, festival_name FROM holiday_calendar ORDER BY festival_date",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(holidays)
}

pub async fn create_holiday(
    pool: &MySqlPool,
    festival_date: NaiveDate,
    festival_name: &str,
    created_by: u64,
) -> Result<Holiday, LeaveError> {
    let name = festival_name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(LeaveError::Validation(
            "festival_name must be 1 to 100 characters".to_string(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO holiday_calendar (festival_date, festival_name, created_by)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(festival_date)
    .bind(name)
    .bind(created_by)
    .execute(pool)
    .await;

    match result {
        Ok(done) => {
            info!(%festival_date, created_by, "Holiday created");
            Ok(Holiday {
                id: done.last_insert_id(),
                festival_date,
                festival_name: name.to_string(),
            })
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(LeaveError::Conflict(format!(
                        "A holiday is already declared on {}",
                        festival_date
                    )));
                }
            }
            error!(error = %e, %festival_date, "Failed to create holiday");
            Err(e.into())
        }
    }
}

/// Deletes a holiday and returns its date.
pub async fn delete_holiday(pool: &MySqlPool, id: u64) -> Result<NaiveDate, LeaveError> {
    let mut tx = pool.begin().await?;

    let date = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT festival_date FROM holiday_calendar WHERE id = ? FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| LeaveError::NotFound("Holiday not found".to_string()))?;

    sqlx::query("DELETE FROM holiday_calendar WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(holiday_id = id, %date, "Holiday deleted");
    Ok(date)
}

pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), LeaveError> {
    let from = NaiveDate::from_ymd_opt(year, 1, 1);
    let to = NaiveDate::from_ymd_opt(year, 12, 31);
    from.zip(to)
        .ok_or_else(|| LeaveError::Validation(format!("Year {} is out of range", year)))
}
