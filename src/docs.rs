use crate::api::holiday::{CreateHoliday, HolidayQuery};
use crate::api::leave_balance::GrantLeave;
use crate::api::leave_request::{LeaveFilter, MyLeaves, ReviewComment, SubmittedLeave};
use crate::leave::validation::{LeaveInput, LeavePatch};
use crate::model::holiday::Holiday;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{Deductions, HalfDay, LeaveRequest, LeaveStatus, LeaveType};
use crate::store::balance_store::NewBalance;
use crate::store::leave_store::LeavePage;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Ledger API",
        version = "1.0.0",
        description = r#"
## Leave Management

Leave requests, balances and the holiday calendar of an organisation.

### 🔹 Key Features
- **Leave Requests**
  - Apply for full or half-day leave; weekends and holidays adjacent to the span are charged as sandwich days
  - Edit or delete while pending
  - Approve or reject (HR, Admin, or the employee's manager)
- **Leave Balances**
  - Sick, casual, optional and earned buckets
  - Approval deducts with fallback to other buckets; the uncovered remainder is leave without pay
  - Rejecting an approved request restores exactly what was deducted
- **Holiday Calendar**
  - Declared holidays feed the day count

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication** (access tokens).
Managers only see and review their own team.

### 📦 Response Format
- JSON-based RESTful responses
- Errors as `{"code": "...", "message": "..."}`
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::leave_balance::create_balance,
        crate::api::leave_balance::my_balance,
        crate::api::leave_balance::get_balance,
        crate::api::leave_balance::grant_leave,
        crate::api::leave_balance::accrue_leave,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveInput,
            LeavePatch,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            HalfDay,
            Deductions,
            LeavePage,
            MyLeaves,
            SubmittedLeave,
            ReviewComment,
            LeaveBalance,
            NewBalance,
            GrantLeave,
            Holiday,
            HolidayQuery,
            CreateHoliday
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Leave Balance", description = "Leave balance APIs"),
        (name = "Holiday", description = "Holiday calendar APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_with_bearer_auth() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/api/leave",
            "/api/leave/me",
            "/api/leave/{leave_id}/approve",
            "/api/leave-balance/accrue",
            "/api/holiday/{holiday_id}",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
