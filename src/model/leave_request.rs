use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::error::LeaveError;

/// Leave category, also the name of the balance bucket it draws from first.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    AsRefStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Sick,
    Casual,
    Optional,
    Earned,
}

impl LeaveType {
    pub const ALL: [LeaveType; 4] = [
        LeaveType::Sick,
        LeaveType::Casual,
        LeaveType::Optional,
        LeaveType::Earned,
    ];

    pub fn parse(value: &str) -> Result<Self, LeaveError> {
        value
            .trim()
            .parse()
            .map_err(|_| LeaveError::Validation(format!("Invalid leave type : {}", value)))
    }
}

/// Which half of a boundary day is taken off.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    AsRefStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HalfDay {
    #[default]
    None,
    First,
    Second,
}

impl HalfDay {
    pub fn is_set(self) -> bool {
        self != HalfDay::None
    }

    /// Parses an optional marker; missing or blank input means no half day.
    pub fn parse(field: &str, value: Option<&str>) -> Result<Self, LeaveError> {
        match value.map(str::trim) {
            None | Some("") => Ok(HalfDay::None),
            Some(v) => v.parse().map_err(|_| {
                LeaveError::Validation(format!(
                    "{} must be one of 'none', 'first' or 'second'",
                    field
                ))
            }),
        }
    }

    /// Column value: unset markers are stored as NULL.
    pub fn to_column(self) -> Option<&'static str> {
        match self {
            HalfDay::None => None,
            HalfDay::First => Some("first"),
            HalfDay::Second => Some("second"),
        }
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    AsRefStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Days taken from each bucket by an approval, kept for exact reversal.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Deductions {
    #[schema(value_type = f64, example = 1.0)]
    pub sick: Decimal,
    #[schema(value_type = f64, example = 0.5)]
    pub casual: Decimal,
    #[schema(value_type = f64, example = 0.0)]
    pub optional: Decimal,
    #[schema(value_type = f64, example = 0.0)]
    pub earned: Decimal,
}

impl Deductions {
    pub fn get(&self, bucket: LeaveType) -> Decimal {
        match bucket {
            LeaveType::Sick => self.sick,
            LeaveType::Casual => self.casual,
            LeaveType::Optional => self.optional,
            LeaveType::Earned => self.earned,
        }
    }

    pub fn add(&mut self, bucket: LeaveType, amount: Decimal) {
        let slot = match bucket {
            LeaveType::Sick => &mut self.sick,
            LeaveType::Casual => &mut self.casual,
            LeaveType::Optional => &mut self.optional,
            LeaveType::Earned => &mut self.earned,
        };
        *slot = (*slot + amount).round_dp(1);
    }

    pub fn total(&self) -> Decimal {
        LeaveType::ALL.iter().map(|b| self.get(*b)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub half_day_start_type: HalfDay,
    pub half_day_end_type: HalfDay,
    #[schema(value_type = f64, example = 2.0)]
    pub total_days: Decimal,
    #[schema(example = 0)]
    pub sandwich_days: u32,
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    pub deducted: Deductions,
    #[schema(value_type = f64, example = 0.0)]
    pub leave_without_pay: Decimal,
    pub action_by: Option<u64>,
    #[schema(format = "date", value_type = Option<String>)]
    pub approve_date: Option<NaiveDate>,
    pub approve_comment: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub reject_date: Option<NaiveDate>,
    pub reject_comment: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw `leave_requests` row; enum columns are stored as text.
#[derive(Debug, FromRow)]
pub struct LeaveRequestRow {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day_start_type: Option<String>,
    pub half_day_end_type: Option<String>,
    pub total_days: Decimal,
    pub sandwich_days: u32,
    pub reason: Option<String>,
    pub status: String,
    pub sick_deducted: Decimal,
    pub casual_deducted: Decimal,
    pub optional_deducted: Decimal,
    pub earned_deducted: Decimal,
    pub leave_without_pay: Decimal,
    pub action_by: Option<u64>,
    pub approve_date: Option<NaiveDate>,
    pub approve_comment: Option<String>,
    pub reject_date: Option<NaiveDate>,
    pub reject_comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

pub const LEAVE_REQUEST_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, \
     half_day_start_type, half_day_end_type, total_days, sandwich_days, reason, status, \
     sick_deducted, casual_deducted, optional_deducted, earned_deducted, leave_without_pay, \
     action_by, approve_date, approve_comment, reject_date, reject_comment, created_at";

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |column: &str, value: &str| {
            LeaveError::Database(format!(
                "leave request {} has invalid {} '{}'",
                id, column, value
            ))
        };

        let leave_type = row
            .leave_type
            .parse()
            .map_err(|_| corrupt("leave_type", &row.leave_type))?;
        let status = row
            .status
            .parse()
            .map_err(|_| corrupt("status", &row.status))?;
        let start_marker = row.half_day_start_type.as_deref();
        let half_day_start_type = HalfDay::parse("half_day_start_type", start_marker)
            .map_err(|_| corrupt("half_day_start_type", start_marker.unwrap_or_default()))?;
        let end_marker = row.half_day_end_type.as_deref();
        let half_day_end_type = HalfDay::parse("half_day_end_type", end_marker)
            .map_err(|_| corrupt("half_day_end_type", end_marker.unwrap_or_default()))?;

        Ok(LeaveRequest {
            id,
            employee_id: row.employee_id,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            half_day_start_type,
            half_day_end_type,
            total_days: row.total_days,
            sandwich_days: row.sandwich_days,
            reason: row.reason,
            status,
            deducted: Deductions {
                sick: row.sick_deducted,
                casual: row.casual_deducted,
                optional: row.optional_deducted,
                earned: row.earned_deducted,
            },
            leave_without_pay: row.leave_without_pay,
            action_by: row.action_by,
            approve_date: row.approve_date,
            approve_comment: row.approve_comment,
            reject_date: row.reject_date,
            reject_comment: row.reject_comment,
            created_at: row.created_at,
        })
    }
}
