use thiserror::Error;

use crate::types::internal::Role;

/// Internal error type for store, provider and coordinator operations
///
/// Infrastructure errors (Database, Transaction, Parse, Crypto) are shared by
/// every layer. Domain errors are grouped per concern.
///
/// This error type is NOT exposed via API. Endpoints convert it to AuthError.
#[derive(Error, Debug)]
pub enum InternalError {
    // ============================================================
    // Infrastructure Errors
    // ============================================================

    /// Database query or operation failed
    #[error("Database error: {operation} failed: {source}")]
    Database {
        operation: String,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Database transaction failed
    #[error("Transaction error: {operation} failed: {source}")]
    Transaction {
        operation: String,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Failed to parse a value (timestamp, duration, etc.)
    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse { value_type: String, message: String },

    /// Cryptographic operation failed (hashing, signing, etc.)
    #[error("Crypto error: {operation} failed: {message}")]
    Crypto { operation: String, message: String },

    // ============================================================
    // Domain Errors
    // ============================================================

    /// Login, registration, token and session errors
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Role gate and admin self-targeting errors
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// Login attempt log errors
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl InternalError {
    /// Create a database error with context
    pub fn database(operation: impl Into<String>, source: sea_orm::DbErr) -> Self {
        Self::Database {
            operation: operation.into(),
            source,
        }
    }

    /// Create a transaction error with context
    pub fn transaction(operation: impl Into<String>, source: sea_orm::DbErr) -> Self {
        Self::Transaction {
            operation: operation.into(),
            source,
        }
    }

    /// Create a parse error with context
    pub fn parse(value_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            value_type: value_type.into(),
            message: message.into(),
        }
    }

    /// Create a crypto error with context
    pub fn crypto(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Crypto {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Which token a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access_token"),
            TokenKind::Refresh => write!(f, "refresh_token"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CredentialError {
    /// Unknown email or wrong password. `remaining_attempts` is only set for
    /// a wrong password below the lockout threshold.
    #[error("Invalid credentials")]
    InvalidCredentials { remaining_attempts: Option<i32> },

    /// Login rejected because an earlier lockout is still running
    #[error("Account locked for another {minutes_remaining} minute(s)")]
    AccountLocked { minutes_remaining: i64 },

    /// This failed attempt crossed the threshold and locked the account
    #[error("Account locked for {lock_minutes} minutes after repeated failures")]
    LockoutTriggered { lock_minutes: i64 },

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Current password is incorrect (for password change)
    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Password validation failed: {0}")]
    PasswordValidationFailed(String),

    /// Malformed registration or creation input (email, name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid token: {kind} - {reason}")]
    InvalidToken { kind: TokenKind, reason: String },

    #[error("Expired token: {0}")]
    ExpiredToken(TokenKind),

    /// Access token epoch no longer matches the user's token epoch
    #[error("Session expired")]
    SessionExpired,

    /// Access token subject is missing or deactivated
    #[error("User not found or inactive")]
    UserUnavailable,
}

impl CredentialError {
    pub fn invalid_token(kind: TokenKind, reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            kind,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Role {required} required")]
    InsufficientRole { required: Role },

    /// Admin attempted a destructive action on their own account
    #[error("Self-targeted admin action rejected: {action}")]
    SelfTargeted { action: String },
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to write login attempt: {0}")]
    WriteFailed(String),

    #[error("Failed to query login attempts: {0}")]
    QueryFailed(String),
}
