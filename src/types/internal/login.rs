use std::fmt;

use crate::types::internal::auth::TokenPair;
use crate::types::internal::context::UserSummary;

/// Internal reason recorded for a failed login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    UserNotFound,
    AccountLocked,
    AccountInactive,
    InvalidPassword,
}

impl FailReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserNotFound => "user_not_found",
            Self::AccountLocked => "account_locked",
            Self::AccountInactive => "account_inactive",
            Self::InvalidPassword => "invalid_password",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful login or refresh
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub tokens: TokenPair,
    pub user: UserSummary,
}

/// Filters for the administrative login log listing
#[derive(Debug, Clone, Default)]
pub struct LoginLogFilter {
    pub user_id: Option<String>,
    /// Case-insensitive substring
    pub email: Option<String>,
    pub success: Option<bool>,
    /// Inclusive lower bound (unix seconds)
    pub start: Option<i64>,
    /// Inclusive upper bound (unix seconds)
    pub end: Option<i64>,
    pub limit: Option<u64>,
}

impl LoginLogFilter {
    pub const DEFAULT_LIMIT: u64 = 100;

    pub fn effective_limit(&self) -> u64 {
        match self.limit {
            Some(0) | None => Self::DEFAULT_LIMIT,
            Some(limit) => limit,
        }
    }
}
