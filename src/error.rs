use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use rust_decimal::Decimal;
use serde_json::json;

use crate::leave::day_count::DayCountError;
use crate::model::leave_request::LeaveType;

/// Failures of the leave core, surfaced to callers as JSON rejections.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LeaveError {
    /// Malformed or out-of-range input.
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// Overlapping leave or a transition to the status already held.
    #[display(fmt = "{}", _0)]
    Conflict(String),
    /// Required state is missing, e.g. no balance row for the employee.
    #[display(fmt = "{}", _0)]
    Precondition(String),
    /// Only raised for optional leave, which never falls back to other buckets.
    #[display(
        fmt = "Insufficient {} leave balance: requested {}, available {}",
        bucket,
        requested,
        available
    )]
    InsufficientBalance {
        bucket: LeaveType,
        requested: Decimal,
        available: Decimal,
    },
    #[display(fmt = "Unable to calculate leave days: {}", _0)]
    Calculation(DayCountError),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "Database error: {}", _0)]
    Database(String),
}

impl std::error::Error for LeaveError {}

impl LeaveError {
    pub fn code(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "validation_error",
            LeaveError::Conflict(_) => "conflict",
            LeaveError::Precondition(_) => "precondition_failed",
            LeaveError::InsufficientBalance { .. } => "insufficient_balance",
            LeaveError::Calculation(_) => "calculation_error",
            LeaveError::NotFound(_) => "not_found",
            LeaveError::Forbidden(_) => "forbidden",
            LeaveError::Database(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for LeaveError {
    fn from(e: sqlx::Error) -> Self {
        LeaveError::Database(e.to_string())
    }
}

impl From<DayCountError> for LeaveError {
    fn from(e: DayCountError) -> Self {
        LeaveError::Calculation(e)
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::Forbidden(_) | LeaveError::Precondition(_) => StatusCode::FORBIDDEN,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Conflict(_) => StatusCode::CONFLICT,
            LeaveError::InsufficientBalance { .. } | LeaveError::Calculation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LeaveError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Database(detail) => {
                tracing::error!(error = %detail, "Leave operation failed on storage");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rust_decimal_macros::dec;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (LeaveError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (LeaveError::Conflict("dup".into()), StatusCode::CONFLICT),
            (LeaveError::Precondition("hr".into()), StatusCode::FORBIDDEN),
            (LeaveError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                LeaveError::InsufficientBalance {
                    bucket: LeaveType::Optional,
                    requested: dec!(2),
                    available: dec!(1),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LeaveError::Database("pool closed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{:?}", err);
        }
    }

    #[test]
    fn insufficient_balance_message_names_bucket() {
        let err = LeaveError::InsufficientBalance {
            bucket: LeaveType::Optional,
            requested: dec!(2.0),
            available: dec!(1.5),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient optional leave balance: requested 2.0, available 1.5"
        );
    }

    #[actix_web::test]
    async fn database_errors_are_redacted() {
        let response = LeaveError::Database("password=hunter2".into()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "internal_error");
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[actix_web::test]
    async fn conflict_body_carries_message() {
        let response = LeaveError::Conflict("Duplicate leave: Dates already applied.".into())
            .error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "conflict");
        assert_eq!(body["message"], "Duplicate leave: Dates already applied.");
    }
}
