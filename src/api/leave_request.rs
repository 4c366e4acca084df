use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::leave::validation::{LeaveInput, LeavePatch};
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Capability;
use crate::store::{balance_store, leave_store};
use crate::store::leave_store::{LeavePage, LeaveQuery};
use crate::utils::holiday_cache::HolidayCache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

impl LeaveFilter {
    fn to_query(&self) -> Result<LeaveQuery, LeaveError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(s.parse::<LeaveStatus>().map_err(|_| {
                LeaveError::Validation(format!("Invalid leave status : {}", s))
            })?),
        };
        Ok(LeaveQuery::new(
            self.employee_id,
            status,
            self.page,
            self.per_page,
        ))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewComment {
    #[schema(example = "Enjoy your break")]
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SubmittedLeave {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    #[schema(value_type = f64, example = 3.0)]
    pub total_days: rust_decimal::Decimal,
    #[schema(example = 1)]
    pub sandwich_days: u32,
    pub leave: LeaveRequest,
}

#[derive(Serialize, ToSchema)]
pub struct MyLeaves {
    pub balance: Option<LeaveBalance>,
    pub leaves: Vec<LeaveRequest>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveInput,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully", body = SubmittedLeave),
        (status = 400, description = "Invalid leave type, half-day marker or dates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile or leave balance not set"),
        (status = 409, description = "Dates overlap an existing request"),
        (status = 422, description = "Leave days could not be calculated")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    holidays: web::Data<HolidayCache>,
    payload: web::Json<LeaveInput>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ApplyLeave)?;
    let employee_id = auth.employee()?;

    let leave = leave_store::submit_leave(
        pool.get_ref(),
        holidays.get_ref(),
        employee_id,
        &payload,
        today(),
    )
    .await?;

    Ok(HttpResponse::Created().json(SubmittedLeave {
        message: "Leave request submitted".to_string(),
        total_days: leave.total_days,
        sandwich_days: leave.sandwich_days,
        leave,
    }))
}

/* =========================
Edit pending leave (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the pending leave request to edit")
    ),
    request_body = LeavePatch,
    responses(
        (status = 200, description = "Leave request updated and days recalculated", body = LeaveRequest),
        (status = 400, description = "Invalid input or request is no longer pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your leave request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Dates overlap an existing request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    holidays: web::Data<HolidayCache>,
    path: web::Path<u64>,
    payload: web::Json<LeavePatch>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee()?;

    let leave = leave_store::edit_pending_leave(
        pool.get_ref(),
        holidays.get_ref(),
        path.into_inner(),
        employee_id,
        &payload,
        today(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Delete pending leave (owner)
========================= */
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the pending leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave request deleted", body = Object, example = json!({
            "message": "Leave request deleted"
        })),
        (status = 400, description = "Request is no longer pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your leave request"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee()?;
    leave_store::delete_pending_leave(pool.get_ref(), path.into_inner(), employee_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request deleted"
    })))
}

/* =========================
Approve leave (HR/Admin/Manager)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ReviewComment, description = "Optional approval comment"),
    responses(
        (status = 200, description = "Leave approved; balance deducted", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed to review this request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already approved, or previously rejected"),
        (status = 422, description = "Insufficient optional leave balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<ReviewComment>>,
) -> actix_web::Result<impl Responder> {
    review(auth, pool, path.into_inner(), LeaveStatus::Approved, payload).await
}

/* =========================
Reject leave (HR/Admin/Manager)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = ReviewComment, description = "Optional rejection comment"),
    responses(
        (status = 200, description = "Leave rejected; deducted days restored if it was approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed to review this request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<ReviewComment>>,
) -> actix_web::Result<impl Responder> {
    review(auth, pool, path.into_inner(), LeaveStatus::Rejected, payload).await
}

async fn review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    leave_id: u64,
    target: LeaveStatus,
    payload: Option<web::Json<ReviewComment>>,
) -> actix_web::Result<HttpResponse> {
    if auth.review_scope().is_none() {
        return Err(LeaveError::Forbidden("Not authorised to review leave requests".to_string()).into());
    }
    let comment = payload.and_then(|p| p.into_inner().comment);

    let leave =
        leave_store::set_status(pool.get_ref(), leave_id, &auth, target, comment, today()).await?;

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "code": "not_found",
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = leave_store::find_leave(pool.get_ref(), path.into_inner(), &auth).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// The caller's own leave requests, newest first, with their balance.
#[utoipa::path(
    get,
    path = "/api/leave/me",
    responses(
        (status = 200, description = "Own leave requests and balance", body = MyLeaves),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "User is not linked to an employee")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee()?;

    let leaves = leave_store::my_leaves(pool.get_ref(), employee_id).await?;
    let balance = balance_store::find_balance(pool.get_ref(), employee_id).await?;

    Ok(HttpResponse::Ok().json(MyLeaves { balance, leaves }))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeavePage),
        (status = 400, description = "Invalid status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let query = query.to_query()?;

    let scope = leave_store::list_scope(pool.get_ref(), &auth)
        .await?
        .ok_or_else(|| LeaveError::Forbidden("Not authorised to list leave requests".to_string()))?;

    let page: LeavePage = leave_store::list_leaves(pool.get_ref(), &scope, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(status: Option<&str>) -> LeaveFilter {
        LeaveFilter {
            employee_id: None,
            status: status.map(str::to_string),
            page: Some(2),
            per_page: None,
        }
    }

    #[test]
    fn status_filter_is_parsed_case_insensitively() {
        let q = filter(Some("Approved")).to_query().unwrap();
        assert_eq!(q.status, Some(LeaveStatus::Approved));
        assert_eq!((q.page, q.per_page), (2, 10));

        assert_eq!(filter(Some(" ")).to_query().unwrap().status, None);
        assert!(matches!(
            filter(Some("archived")).to_query(),
            Err(LeaveError::Validation(_))
        ));
    }
}
