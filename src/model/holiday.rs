use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2026-12-25", format = "date", value_type = String)]
    pub festival_date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub festival_name: String,
}
