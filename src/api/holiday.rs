use crate::auth::auth::AuthUser;
use crate::model::holiday::Holiday;
use crate::model::role::Capability;
use crate::store::holiday_store;
use crate::utils::holiday_cache::HolidayCache;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HolidayQuery {
    /// Calendar year; all holidays when omitted
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-12-25", format = "date", value_type = String)]
    pub festival_date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub festival_name: String,
}

#[utoipa::path(
    get,
    path = "/api/holiday",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Declared holidays", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = holiday_store::list_holidays(pool.get_ref(), query.year).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holiday",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday declared", body = Holiday),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "A holiday already exists on that date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<HolidayCache>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageHolidays)?;

    let holiday = holiday_store::create_holiday(
        pool.get_ref(),
        payload.festival_date,
        &payload.festival_name,
        auth.user_id,
    )
    .await?;
    cache.invalidate(holiday.festival_date).await;

    Ok(HttpResponse::Created().json(holiday))
}

#[utoipa::path(
    delete,
    path = "/api/holiday/{holiday_id}",
    params(
        ("holiday_id" = u64, Path, description = "ID of the holiday to delete")
    ),
    responses(
        (status = 200, description = "Holiday deleted", body = Object, example = json!({
            "message": "Holiday deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Holiday not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<HolidayCache>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageHolidays)?;

    let date = holiday_store::delete_holiday(pool.get_ref(), path.into_inner()).await?;
    cache.invalidate(date).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Holiday deleted"
    })))
}
