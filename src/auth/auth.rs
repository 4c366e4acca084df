use crate::config::Config;
use crate::error::LeaveError;
use crate::model::role::{Capability, Role};
use crate::models::TokenType;
use crate::auth::jwt::verify_token;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

/// How far a reviewer's reach extends over other employees' leave.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReviewScope {
    Any,
    /// Only employees mapped to this user in the manager map.
    Team,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by `auth_middleware` on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        ready(AuthUser::from_token(token, &config.jwt_secret).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    /// Resolves an access token into a principal.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, &'static str> {
        let claims = verify_token(token, secret).map_err(|_| "Invalid or expired token")?;

        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require(&self, capability: Capability) -> Result<(), LeaveError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(LeaveError::Forbidden(format!(
                "{:?} role is not allowed to perform this action",
                self.role
            )))
        }
    }

    /// The caller's own employee id; leave can only be applied for oneself.
    pub fn employee(&self) -> Result<u64, LeaveError> {
        self.employee_id
            .ok_or_else(|| LeaveError::Forbidden("User is not linked to an employee.".to_string()))
    }

    pub fn review_scope(&self) -> Option<ReviewScope> {
        if self.role.can(Capability::ReviewAnyLeave) {
            Some(ReviewScope::Any)
        } else if self.role.can(Capability::ReviewTeamLeave) {
            Some(ReviewScope::Team)
        } else {
            None
        }
    }

    /// Whether the caller may approve or reject leave of `employee_id`.
    /// `in_team` tells whether that employee is mapped to the caller.
    pub fn authorize_review(&self, employee_id: u64, in_team: bool) -> Result<(), LeaveError> {
        if self.employee_id == Some(employee_id) {
            return Err(LeaveError::Forbidden(
                "You cannot review your own leave request".to_string(),
            ));
        }
        match self.review_scope() {
            Some(ReviewScope::Any) => Ok(()),
            Some(ReviewScope::Team) if in_team => Ok(()),
            Some(ReviewScope::Team) => Err(LeaveError::Forbidden(
                "Employee is not in your team".to_string(),
            )),
            None => Err(LeaveError::Forbidden(
                "Not authorised to review leave requests".to_string(),
            )),
        }
    }

    /// Whether the caller may read leave data of `employee_id`.
    pub fn can_view(&self, employee_id: u64, in_team: bool) -> bool {
        self.employee_id == Some(employee_id)
            || match self.review_scope() {
                Some(ReviewScope::Any) => true,
                Some(ReviewScope::Team) => in_team,
                None => false,
            }
    }
}
