use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Per-employee leave counters: what is still available in each bucket and
/// the lifetime amount ever granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "sick_leave": 5.0,
    "casual_leave": 7.5,
    "optional_leave": 2.0,
    "earned_leave": 12.0,
    "total_sick_leave": 10.0,
    "total_casual_leave": 12.0,
    "total_optional_leave": 2.0,
    "total_earned_leave": 15.0,
    "updated_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = f64)]
    pub sick_leave: Decimal,
    #[schema(value_type = f64)]
    pub casual_leave: Decimal,
    #[schema(value_type = f64)]
    pub optional_leave: Decimal,
    #[schema(value_type = f64)]
    pub earned_leave: Decimal,
    #[schema(value_type = f64)]
    pub total_sick_leave: Decimal,
    #[schema(value_type = f64)]
    pub total_casual_leave: Decimal,
    #[schema(value_type = f64)]
    pub total_optional_leave: Decimal,
    #[schema(value_type = f64)]
    pub total_earned_leave: Decimal,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

pub const LEAVE_BALANCE_COLUMNS: &str = "id, employee_id, sick_leave, casual_leave, \
     optional_leave, earned_leave, total_sick_leave, total_casual_leave, \
     total_optional_leave, total_earned_leave, updated_at";
