use sqlx::{Executor, MySql};

/// Whether `employee_id` is mapped to the manager user `manager_id`.
pub async fn manages<'c, E>(executor: E, manager_id: u64, employee_id: u64) -> Result<bool, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM employee_manager_map WHERE manager_id = ? AND employee_id = ? LIMIT 1)",
    )
    .bind(manager_id)
    .bind(employee_id)
    .fetch_one(executor)
    .await?;
    Ok(found != 0)
}

pub async fn team_employee_ids<'c, E>(executor: E, manager_id: u64) -> Result<Vec<u64>, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    sqlx::query_scalar::<_, u64>(
        "SELECT employee_id FROM employee_manager_map WHERE manager_id = ? ORDER BY employee_id",
    )
    .bind(manager_id)
    .fetch_all(executor)
    .await
}
