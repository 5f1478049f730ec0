use poem_openapi::{ApiResponse, Object, payload::Json};
use serde::{Deserialize, Serialize};

use crate::types::db::login_attempt;
use crate::types::internal::{Role, SessionGrant, UserSummary};

/// Request model for self-registration
///
/// Unknown fields such as `role` are ignored; the account is always BASIC.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,

    /// Email address (case-insensitive, unique)
    pub email: String,

    /// Password (8-50 chars, upper, lower and digit)
    pub password: String,
}

/// Public user view
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<UserSummary> for UserResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// API response for register endpoint
#[derive(ApiResponse)]
pub enum RegisterApiResponse {
    /// User created
    #[oai(status = 201)]
    Created(Json<RegisterResponse>),
}

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email for authentication
    pub email: String,

    /// Password for authentication
    pub password: String,
}

/// Response model containing authentication tokens
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,

    pub user: UserResponse,
}

impl From<SessionGrant> for TokenResponse {
    fn from(grant: SessionGrant) -> Self {
        Self {
            access_token: grant.tokens.access_token,
            refresh_token: grant.tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: grant.tokens.expires_in,
            user: grant.user.into(),
        }
    }
}

/// Request model for token refresh
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token to exchange for a new pair
    pub refresh_token: String,
}

/// Request model for logout
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke
    pub refresh_token: String,
}

/// Request model for password change
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password for verification
    pub current_password: String,

    /// New password to set
    pub new_password: String,
}

/// One row of the login attempt log
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginAttemptResponse {
    pub id: i64,
    pub email: String,
    pub success: bool,

    /// user_not_found, account_locked, account_inactive or invalid_password
    pub fail_reason: Option<String>,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,

    /// Unix timestamp
    pub created_at: i64,
}

impl From<login_attempt::Model> for LoginAttemptResponse {
    fn from(row: login_attempt::Model) -> Self {
        Self {
            id: row.id,
            email: row.email,
            success: row.success,
            fail_reason: row.fail_reason,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}
