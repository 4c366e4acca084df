use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::auth::{AuthUser, ReviewScope};
use crate::error::LeaveError;
use crate::leave::approval::{self, ReviewAction};
use crate::leave::day_count::{DayCount, compute_days};
use crate::leave::validation::{ExistingSpan, LeaveDraft, LeaveInput, LeavePatch, find_clash};
use crate::model::leave_request::{
    LEAVE_REQUEST_COLUMNS, LeaveRequest, LeaveRequestRow, LeaveStatus,
};
use crate::store::balance_store::{get_balance, lock_balance, require_locked_balance, save_balance};
use crate::store::team_store;
use crate::utils::holiday_cache::HolidayCache;

/// Whose requests a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Employees(Vec<u64>),
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub page: u64,
    pub per_page: u64,
}

impl LeaveQuery {
    pub fn new(
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Self {
        Self {
            employee_id,
            status,
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(10).clamp(1, 100),
        }
    }

    fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

async fn fetch_leave(
    conn: &mut MySqlConnection,
    leave_id: u64,
    for_update: bool,
) -> Result<Option<LeaveRequest>, LeaveError> {
    let sql = format!(
        "SELECT {} FROM leave_requests WHERE id = ?{}",
        LEAVE_REQUEST_COLUMNS,
        if for_update { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, LeaveRequestRow>(&sql)
        .bind(leave_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(LeaveRequest::try_from)
        .transpose()
}

async fn require_leave(
    conn: &mut MySqlConnection,
    leave_id: u64,
    for_update: bool,
) -> Result<LeaveRequest, LeaveError> {
    fetch_leave(conn, leave_id, for_update)
        .await?
        .ok_or_else(|| LeaveError::NotFound("Leave request not found".to_string()))
}

/// Refuses `[start, end]` if it overlaps another pending or approved request
/// of the same employee. Must run while the employee's balance row is locked.
async fn ensure_no_overlap(
    conn: &mut MySqlConnection,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    editing: Option<u64>,
) -> Result<(), LeaveError> {
    let rows = sqlx::query_as::<_, (u64, NaiveDate, NaiveDate, String)>(
        r#"
        SELECT id, start_date, end_date, status
        FROM leave_requests
        WHERE employee_id = ?
          AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(employee_id)
    .bind(end)
    .bind(start)
    .fetch_all(&mut *conn)
    .await?;

    let existing = rows
        .into_iter()
        .map(|(id, start_date, end_date, status)| {
            let status = status.parse::<LeaveStatus>().map_err(|_| {
                LeaveError::Database(format!("leave request {} has invalid status '{}'", id, status))
            })?;
            Ok(ExistingSpan {
                id,
                start_date,
                end_date,
                status,
            })
        })
        .collect::<Result<Vec<_>, LeaveError>>()?;

    if let Some(clash_id) = find_clash(&existing, start, end, editing) {
        warn!(employee_id, clash_id, %start, %end, "Overlapping leave refused");
        return Err(LeaveError::Conflict(
            "Duplicate leave: Dates already applied.".to_string(),
        ));
    }
    Ok(())
}

async fn count_days(
    pool: &MySqlPool,
    holidays: &HolidayCache,
    draft: &LeaveDraft,
) -> Result<DayCount, LeaveError> {
    let calendar = holidays
        .for_span(pool, draft.start_date, draft.end_date)
        .await?;
    Ok(compute_days(
        &calendar,
        draft.start_date,
        draft.end_date,
        draft.half_day_start,
        draft.half_day_end,
    )?)
}

pub async fn submit_leave(
    pool: &MySqlPool,
    holidays: &HolidayCache,
    employee_id: u64,
    input: &LeaveInput,
    today: NaiveDate,
) -> Result<LeaveRequest, LeaveError> {
    get_balance(pool, employee_id).await?;
    let draft = LeaveDraft::from_input(input, today)?;
    // Holidays may need their own pooled connection, so count before locking.
    let days = count_days(pool, holidays, &draft).await?;

    let mut tx = pool.begin().await?;

    // Serialises submissions of this employee for the overlap check.
    require_locked_balance(&mut tx, employee_id).await?;
    ensure_no_overlap(&mut tx, employee_id, draft.start_date, draft.end_date, None).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, start_date, end_date, half_day_start_type,
             half_day_end_type, total_days, sandwich_days, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(employee_id)
    .bind(draft.leave_type.to_string())
    .bind(draft.start_date)
    .bind(draft.end_date)
    .bind(draft.half_day_start.to_column())
    .bind(draft.half_day_end.to_column())
    .bind(days.total_days)
    .bind(days.sandwich_days)
    .bind(draft.reason.as_deref())
    .execute(&mut *tx)
    .await?;

    let leave = require_leave(&mut tx, result.last_insert_id(), false).await?;
    tx.commit().await?;

    info!(
        leave_id = leave.id,
        employee_id,
        leave_type = %leave.leave_type,
        total_days = %leave.total_days,
        sandwich_days = leave.sandwich_days,
        "Leave request submitted"
    );
    Ok(leave)
}

fn ensure_editable(leave: &LeaveRequest, employee_id: u64) -> Result<(), LeaveError> {
    if leave.employee_id != employee_id {
        return Err(LeaveError::Forbidden(
            "You can only edit your own leave requests".to_string(),
        ));
    }
    if leave.status != LeaveStatus::Pending {
        return Err(LeaveError::Validation(
            "Only pending leave requests can be edited".to_string(),
        ));
    }
    Ok(())
}

pub async fn edit_pending_leave(
    pool: &MySqlPool,
    holidays: &HolidayCache,
    leave_id: u64,
    employee_id: u64,
    patch: &LeavePatch,
    today: NaiveDate,
) -> Result<LeaveRequest, LeaveError> {
    let mut conn = pool.acquire().await?;
    let current = require_leave(&mut conn, leave_id, false).await?;
    drop(conn);
    ensure_editable(&current, employee_id)?;

    let draft = LeaveDraft::from_patch(&current, patch, today)?;
    // Holidays may need their own pooled connection, so count before locking.
    let days = count_days(pool, holidays, &draft).await?;

    let mut tx = pool.begin().await?;

    require_locked_balance(&mut tx, employee_id).await?;
    let locked = require_leave(&mut tx, leave_id, true).await?;
    ensure_editable(&locked, employee_id)?;
    if LeaveDraft::from_patch(&locked, patch, today)? != draft {
        return Err(LeaveError::Conflict(
            "Leave request changed while being edited. Please retry.".to_string(),
        ));
    }

    ensure_no_overlap(
        &mut tx,
        employee_id,
        draft.start_date,
        draft.end_date,
        Some(leave_id),
    )
    .await?;

    sqlx::query(
        r#"
        UPDATE leave_requests
        SET leave_type = ?, start_date = ?, end_date = ?, half_day_start_type = ?,
            half_day_end_type = ?, total_days = ?, sandwich_days = ?, reason = ?
        WHERE id = ?
        "#,
    )
    .bind(draft.leave_type.to_string())
    .bind(draft.start_date)
    .bind(draft.end_date)
    .bind(draft.half_day_start.to_column())
    .bind(draft.half_day_end.to_column())
    .bind(days.total_days)
    .bind(days.sandwich_days)
    .bind(draft.reason.as_deref())
    .bind(leave_id)
    .execute(&mut *tx)
    .await?;

    let leave = require_leave(&mut tx, leave_id, false).await?;
    tx.commit().await?;

    info!(
        leave_id,
        employee_id,
        total_days = %leave.total_days,
        sandwich_days = leave.sandwich_days,
        "Pending leave request edited"
    );
    Ok(leave)
}

pub async fn delete_pending_leave(
    pool: &MySqlPool,
    leave_id: u64,
    employee_id: u64,
) -> Result<(), LeaveError> {
    let mut tx = pool.begin().await?;

    let leave = require_leave(&mut tx, leave_id, true).await?;
    if leave.employee_id != employee_id {
        return Err(LeaveError::Forbidden(
            "You can only delete your own leave requests".to_string(),
        ));
    }
    if leave.status != LeaveStatus::Pending {
        return Err(LeaveError::Validation(
            "Only pending leave requests can be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM leave_requests WHERE id = ? AND status = 'pending'")
        .bind(leave_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(leave_id, employee_id, "Pending leave request deleted");
    Ok(())
}

async fn save_transition(conn: &mut MySqlConnection, leave: &LeaveRequest) -> Result<(), LeaveError> {
    sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, sick_deducted = ?, casual_deducted = ?, optional_deducted = ?,
            earned_deducted = ?, leave_without_pay = ?, action_by = ?,
            approve_date = ?, approve_comment = ?, reject_date = ?, reject_comment = ?
        WHERE id = ?
        "#,
    )
    .bind(leave.status.to_string())
    .bind(leave.deducted.sick)
    .bind(leave.deducted.casual)
    .bind(leave.deducted.optional)
    .bind(leave.deducted.earned)
    .bind(leave.leave_without_pay)
    .bind(leave.action_by)
    .bind(leave.approve_date)
    .bind(leave.approve_comment.as_deref())
    .bind(leave.reject_date)
    .bind(leave.reject_comment.as_deref())
    .bind(leave.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Approves or rejects a request on behalf of `reviewer`, moving balance days
/// in the same transaction.
pub async fn set_status(
    pool: &MySqlPool,
    leave_id: u64,
    reviewer: &AuthUser,
    target: LeaveStatus,
    comment: Option<String>,
    today: NaiveDate,
) -> Result<LeaveRequest, LeaveError> {
    // The owner never changes, so it can be read before taking locks.
    let mut conn = pool.acquire().await?;
    let owner = require_leave(&mut conn, leave_id, false).await?.employee_id;
    let in_team = match reviewer.review_scope() {
        Some(ReviewScope::Team) => team_store::manages(&mut *conn, reviewer.user_id, owner).await?,
        _ => false,
    };
    drop(conn);
    reviewer.authorize_review(owner, in_team)?;

    let mut tx = pool.begin().await?;
    let mut balance = lock_balance(&mut tx, owner).await?;
    let mut leave = require_leave(&mut tx, leave_id, true).await?;

    let action = ReviewAction {
        actor_id: reviewer.user_id,
        on: today,
        comment: comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };
    let before = balance.clone();
    approval::set_status(&mut leave, balance.as_mut(), target, action)?;

    save_transition(&mut tx, &leave).await?;
    if let Some(balance) = balance.as_ref().filter(|b| Some(*b) != before.as_ref()) {
        save_balance(&mut tx, balance, Some(reviewer.user_id)).await?;
    }
    tx.commit().await?;

    info!(
        leave_id,
        employee_id = owner,
        reviewer = reviewer.user_id,
        status = %leave.status,
        "Leave status updated"
    );
    Ok(leave)
}

/// A single request, visible to its owner and to reviewers in scope.
pub async fn find_leave(
    pool: &MySqlPool,
    leave_id: u64,
    viewer: &AuthUser,
) -> Result<LeaveRequest, LeaveError> {
    let mut conn = pool.acquire().await?;
    let leave = require_leave(&mut conn, leave_id, false).await?;

    let in_team = match viewer.review_scope() {
        Some(ReviewScope::Team) if viewer.employee_id != Some(leave.employee_id) => {
            team_store::manages(&mut *conn, viewer.user_id, leave.employee_id).await?
        }
        _ => false,
    };
    if !viewer.can_view(leave.employee_id, in_team) {
        // Not revealing that the id exists.
        return Err(LeaveError::NotFound("Leave request not found".to_string()));
    }
    Ok(leave)
}

pub async fn my_leaves(pool: &MySqlPool, employee_id: u64) -> Result<Vec<LeaveRequest>, LeaveError> {
    let sql = format!(
        "SELECT {} FROM leave_requests WHERE employee_id = ? ORDER BY created_at DESC, id DESC",
        LEAVE_REQUEST_COLUMNS
    );
    sqlx::query_as::<_, LeaveRequestRow>(&sql)
        .bind(employee_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(LeaveRequest::try_from)
        .collect()
}

/// Resolves which employees `viewer` may list, or `None` if they may not list
/// other employees' requests at all.
pub async fn list_scope(pool: &MySqlPool, viewer: &AuthUser) -> Result<Option<ListScope>, LeaveError> {
    Ok(match viewer.review_scope() {
        Some(ReviewScope::Any) => Some(ListScope::All),
        Some(ReviewScope::Team) => Some(ListScope::Employees(
            team_store::team_employee_ids(pool, viewer.user_id).await?,
        )),
        None => None,
    })
}

pub async fn list_leaves(
    pool: &MySqlPool,
    scope: &ListScope,
    query: &LeaveQuery,
) -> Result<LeavePage, LeaveError> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let ListScope::Employees(ids) = scope {
        if ids.is_empty() {
            return Ok(LeavePage {
                data: Vec::new(),
                page: query.page,
                per_page: query.per_page,
                total: 0,
            });
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        where_sql.push_str(&format!(" AND employee_id IN ({})", placeholders));
        args.extend(ids.iter().map(|id| FilterValue::U64(*id)));
    }

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_ref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.as_ref()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q.fetch_one(pool).await?;

    let data_sql = format!(
        r#"
        SELECT {}
        FROM leave_requests
        {}
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        LEAVE_REQUEST_COLUMNS, where_sql
    );
    let mut data_q = sqlx::query_as::<_, LeaveRequestRow>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let data = data_q
        .bind(query.per_page)
        .bind(query.offset())
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(LeaveRequest::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LeavePage {
        data,
        page: query.page,
        per_page: query.per_page,
        total,
    })
}
