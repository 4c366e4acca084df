use crate::auth::auth::{AuthUser, ReviewScope};
use crate::error::LeaveError;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::LeaveType;
use crate::model::role::Capability;
use crate::store::balance_store::{self, NewBalance};
use crate::store::team_store;
use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct GrantLeave {
    #[schema(example = "casual")]
    pub leave_type: String,
    #[schema(value_type = f64, example = 0.5)]
    pub amount: Decimal,
}

/// Swagger doc for create_balance endpoint
#[utoipa::path(
    post,
    path = "/api/leave-balance",
    request_body = NewBalance,
    responses(
        (status = 201, description = "Leave balance created", body = LeaveBalance),
        (status = 400, description = "Negative counters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Employee already has a leave balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn create_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageBalances)?;

    let balance = balance_store::create_balance(pool.get_ref(), &payload, auth.user_id).await?;
    Ok(HttpResponse::Created().json(balance))
}

#[utoipa::path(
    get,
    path = "/api/leave-balance/me",
    responses(
        (status = 200, description = "Own leave balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile or balance not set")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn my_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee()?;
    let balance = balance_store::get_balance(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Balance of one employee, for the employee and reviewers in scope.
#[utoipa::path(
    get,
    path = "/api/leave-balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balance to fetch")
    ),
    responses(
        (status = 200, description = "Leave balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden or balance not set")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let in_team = match auth.review_scope() {
        Some(ReviewScope::Team) => {
            team_store::manages(pool.get_ref(), auth.user_id, employee_id)
                .await
                .map_err(LeaveError::from)?
        }
        _ => false,
    };
    if !auth.can_view(employee_id, in_team) {
        return Err(LeaveError::Forbidden(
            "Not authorised to view this leave balance".to_string(),
        )
        .into());
    }

    let balance = balance_store::get_balance(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[utoipa::path(
    post,
    path = "/api/leave-balance/{employee_id}/grant",
    params(
        ("employee_id" = u64, Path, description = "Employee to credit")
    ),
    request_body = GrantLeave,
    responses(
        (status = 200, description = "Bucket credited", body = LeaveBalance),
        (status = 400, description = "Unknown leave type or non-positive amount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden or balance not set")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn grant_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<GrantLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageBalances)?;
    let bucket = LeaveType::parse(&payload.leave_type)?;

    let balance = balance_store::grant(
        pool.get_ref(),
        path.into_inner(),
        bucket,
        payload.amount,
        Some(auth.user_id),
    )
    .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Credits one bucket of every employee. Meant for a periodic accrual job.
#[utoipa::path(
    post,
    path = "/api/leave-balance/accrue",
    request_body = GrantLeave,
    responses(
        (status = 200, description = "Employees credited", body = Object, example = json!({
            "message": "Leave accrued",
            "leave_type": "casual",
            "credited": 42
        })),
        (status = 400, description = "Unknown leave type or non-positive amount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn accrue_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GrantLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageBalances)?;
    let bucket = LeaveType::parse(&payload.leave_type)?;

    let credited =
        balance_store::grant_all(pool.get_ref(), bucket, payload.amount, Some(auth.user_id))
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave accrued",
        "leave_type": bucket,
        "credited": credited
    })))
}
