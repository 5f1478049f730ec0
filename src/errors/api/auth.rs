use crate::errors::internal::{
    AuditError, AuthorizationError, CredentialError, InternalError, TokenKind,
};
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Standardized error response for every API endpoint
#[derive(Object, Debug, Clone)]
pub struct AuthErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// API error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Invalid email or password, or account inactive
    #[oai(status = 401)]
    InvalidCredentials(Json<AuthErrorResponse>),

    /// Current password is incorrect (for password change)
    #[oai(status = 401)]
    IncorrectPassword(Json<AuthErrorResponse>),

    /// Invalid, expired or revoked access token
    #[oai(status = 401)]
    InvalidToken(Json<AuthErrorResponse>),

    /// Invalid, consumed or expired refresh token
    #[oai(status = 401)]
    InvalidRefreshToken(Json<AuthErrorResponse>),

    /// Account is locked after repeated failures
    #[oai(status = 403)]
    AccountLocked(Json<AuthErrorResponse>),

    /// Caller lacks the role or targeted their own account
    #[oai(status = 403)]
    Forbidden(Json<AuthErrorResponse>),

    /// Password policy or input validation failed
    #[oai(status = 400)]
    ValidationFailed(Json<AuthErrorResponse>),

    /// Target user does not exist
    #[oai(status = 404)]
    UserNotFound(Json<AuthErrorResponse>),

    /// Email already in use
    #[oai(status = 409)]
    DuplicateEmail(Json<AuthErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AuthErrorResponse>),
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<AuthErrorResponse> {
    Json(AuthErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    })
}

impl AuthError {
    /// Deliberately identical for unknown email and wrong password
    pub fn invalid_credentials(remaining_attempts: Option<i32>) -> Self {
        let message = match remaining_attempts {
            Some(n) => format!("Email ou senha inválidos. Tentativas restantes: {}", n),
            None => "Email ou senha inválidos".to_string(),
        };
        AuthError::InvalidCredentials(body("invalid_credentials", message, 401))
    }

    pub fn account_inactive() -> Self {
        AuthError::InvalidCredentials(body(
            "account_inactive",
            "Conta desativada. Entre em contato com o administrador",
            401,
        ))
    }

    pub fn incorrect_password() -> Self {
        AuthError::IncorrectPassword(body("incorrect_password", "Senha atual incorreta", 401))
    }

    pub fn account_locked(minutes_remaining: i64) -> Self {
        AuthError::AccountLocked(body(
            "account_locked",
            format!(
                "Conta bloqueada. Tente novamente em {} minuto(s)",
                minutes_remaining
            ),
            403,
        ))
    }

    pub fn lockout_triggered(lock_minutes: i64) -> Self {
        AuthError::AccountLocked(body(
            "account_locked",
            format!(
                "Conta bloqueada por {} minutos devido a múltiplas tentativas de login falhas",
                lock_minutes
            ),
            403,
        ))
    }

    pub fn invalid_token() -> Self {
        AuthError::InvalidToken(body("invalid_token", "Token inválido", 401))
    }

    pub fn expired_token() -> Self {
        AuthError::InvalidToken(body("expired_token", "Token expirado", 401))
    }

    pub fn session_expired() -> Self {
        AuthError::InvalidToken(body(
            "session_expired",
            "Sessão expirada, faça login novamente",
            401,
        ))
    }

    pub fn user_unavailable() -> Self {
        AuthError::InvalidToken(body(
            "user_unavailable",
            "Usuário não encontrado ou inativo",
            401,
        ))
    }

    pub fn invalid_refresh_token() -> Self {
        AuthError::InvalidRefreshToken(body(
            "invalid_refresh_token",
            "Refresh token inválido",
            401,
        ))
    }

    pub fn expired_refresh_token() -> Self {
        AuthError::InvalidRefreshToken(body(
            "expired_refresh_token",
            "Refresh token expirado, faça login novamente",
            401,
        ))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AuthError::Forbidden(body("forbidden", message, 403))
    }

    pub fn password_validation_failed(message: String) -> Self {
        AuthError::ValidationFailed(body("password_validation_failed", message, 400))
    }

    pub fn validation_failed(message: String) -> Self {
        AuthError::ValidationFailed(body("validation_failed", message, 400))
    }

    pub fn user_not_found() -> Self {
        AuthError::UserNotFound(body("user_not_found", "Usuário não encontrado", 404))
    }

    pub fn duplicate_email() -> Self {
        AuthError::DuplicateEmail(body("duplicate_email", "Email já cadastrado", 409))
    }

    /// Convert InternalError to AuthError
    ///
    /// This is the explicit conversion point from internal errors to API errors.
    /// Internal error details are logged but not exposed to clients.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            // Infrastructure errors - always log and return generic error
            InternalError::Database { operation, .. } => {
                tracing::error!("Database error in {}: {}", operation, err);
                Self::internal_server_error()
            }
            InternalError::Transaction { operation, .. } => {
                tracing::error!("Transaction error in {}: {}", operation, err);
                Self::internal_server_error()
            }
            InternalError::Parse { value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, err);
                Self::internal_server_error()
            }
            InternalError::Crypto { operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, err);
                Self::internal_server_error()
            }
            InternalError::Audit(audit) => {
                match audit {
                    AuditError::WriteFailed(_) => tracing::error!("Audit write failed: {}", err),
                    AuditError::QueryFailed(_) => tracing::error!("Audit query failed: {}", err),
                }
                Self::internal_server_error()
            }

            // Domain errors - convert to specific API errors
            InternalError::Credential(credential) => match credential {
                CredentialError::InvalidCredentials { remaining_attempts } => {
                    Self::invalid_credentials(*remaining_attempts)
                }
                CredentialError::AccountLocked { minutes_remaining } => {
                    Self::account_locked(*minutes_remaining)
                }
                CredentialError::LockoutTriggered { lock_minutes } => {
                    Self::lockout_triggered(*lock_minutes)
                }
                CredentialError::AccountInactive => Self::account_inactive(),
                CredentialError::DuplicateEmail(email) => {
                    tracing::warn!("Duplicate email registration attempt: {}", email);
                    Self::duplicate_email()
                }
                CredentialError::UserNotFound(user_id) => {
                    tracing::debug!("User not found: {}", user_id);
                    Self::user_not_found()
                }
                CredentialError::IncorrectPassword => Self::incorrect_password(),
                CredentialError::PasswordValidationFailed(message) => {
                    Self::password_validation_failed(message.clone())
                }
                CredentialError::InvalidInput(message) => Self::validation_failed(message.clone()),
                CredentialError::InvalidToken { kind, reason } => {
                    tracing::debug!("Invalid token: {} - {}", kind, reason);
                    match kind {
                        TokenKind::Access => Self::invalid_token(),
                        TokenKind::Refresh => Self::invalid_refresh_token(),
                    }
                }
                CredentialError::ExpiredToken(kind) => match kind {
                    TokenKind::Access => Self::expired_token(),
                    TokenKind::Refresh => Self::expired_refresh_token(),
                },
                CredentialError::SessionExpired => Self::session_expired(),
                CredentialError::UserUnavailable => Self::user_unavailable(),
            },
            InternalError::Authorization(authorization) => {
                tracing::warn!("Authorization rejected: {}", err);
                match authorization {
                    AuthorizationError::InsufficientRole { .. } => {
                        Self::forbidden("Acesso negado")
                    }
                    AuthorizationError::SelfTargeted { .. } => {
                        Self::forbidden("Não é possível executar esta ação na própria conta")
                    }
                }
            }
        }
    }

    /// Generic internal server error; never exposes internal details
    fn internal_server_error() -> Self {
        AuthError::InternalError(body("internal_error", "Erro interno do servidor", 500))
    }

    fn response(&self) -> &AuthErrorResponse {
        match self {
            AuthError::InvalidCredentials(json)
            | AuthError::IncorrectPassword(json)
            | AuthError::InvalidToken(json)
            | AuthError::InvalidRefreshToken(json)
            | AuthError::AccountLocked(json)
            | AuthError::Forbidden(json)
            | AuthError::ValidationFailed(json)
            | AuthError::UserNotFound(json)
            | AuthError::DuplicateEmail(json)
            | AuthError::InternalError(json) => &json.0,
        }
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        self.response().message.clone()
    }

    /// Machine-readable error code
    pub fn code(&self) -> &str {
        &self.response().error
    }

    pub fn status_code(&self) -> u16 {
        self.response().status_code
    }
}

impl From<InternalError> for AuthError {
    fn from(err: InternalError) -> Self {
        Self::from_internal_error(err)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::internal::Role;
    use sea_orm::DbErr;

    #[test]
    fn test_database_error_converts_to_internal_server_error() {
        let internal_err = InternalError::database("find_by_email", DbErr::Custom("gone".into()));
        let auth_err = AuthError::from(internal_err);

        assert_eq!(auth_err.status_code(), 500);
        assert_eq!(auth_err.message(), "Erro interno do servidor");
    }

    #[test]
    fn test_audit_error_is_not_exposed() {
        let internal_err: InternalError = AuditError::WriteFailed("disk full".into()).into();
        let auth_err = AuthError::from(internal_err);

        assert_eq!(auth_err.status_code(), 500);
        assert!(!auth_err.message().contains("disk"));
    }

    #[test]
    fn test_invalid_credentials_message_with_and_without_remaining() {
        let plain = AuthError::from(InternalError::from(CredentialError::InvalidCredentials {
            remaining_attempts: None,
        }));
        assert_eq!(plain.message(), "Email ou senha inválidos");
        assert_eq!(plain.status_code(), 401);

        let counted = AuthError::from(InternalError::from(CredentialError::InvalidCredentials {
            remaining_attempts: Some(3),
        }));
        assert_eq!(
            counted.message(),
            "Email ou senha inválidos. Tentativas restantes: 3"
        );
    }

    #[test]
    fn test_lock_errors_are_forbidden() {
        let locked = AuthError::from(InternalError::from(CredentialError::AccountLocked {
            minutes_remaining: 1,
        }));
        assert_eq!(locked.status_code(), 403);
        assert_eq!(locked.code(), "account_locked");
        assert_eq!(locked.message(), "Conta bloqueada. Tente novamente em 1 minuto(s)");

        let triggered = AuthError::from(InternalError::from(CredentialError::LockoutTriggered {
            lock_minutes: 15,
        }));
        assert_eq!(triggered.status_code(), 403);
        assert!(triggered.message().contains("15 minutos"));
    }

    #[test]
    fn test_refresh_token_errors() {
        let invalid = AuthError::from(InternalError::from(CredentialError::invalid_token(
            TokenKind::Refresh,
            "not found",
        )));
        assert_eq!(invalid.message(), "Refresh token inválido");

        let expired = AuthError::from(InternalError::from(CredentialError::ExpiredToken(
            TokenKind::Refresh,
        )));
        assert_eq!(expired.message(), "Refresh token expirado, faça login novamente");
    }

    #[test]
    fn test_guard_errors() {
        let session = AuthError::from(InternalError::from(CredentialError::SessionExpired));
        assert_eq!(session.status_code(), 401);
        assert_eq!(session.message(), "Sessão expirada, faça login novamente");

        let missing = AuthError::from(InternalError::from(CredentialError::UserUnavailable));
        assert_eq!(missing.message(), "Usuário não encontrado ou inativo");
    }

    #[test]
    fn test_status_codes_for_remaining_domain_errors() {
        let cases: Vec<(InternalError, u16)> = vec![
            (CredentialError::DuplicateEmail("a@b.com".into()).into(), 409),
            (CredentialError::UserNotFound("x".into()).into(), 404),
            (CredentialError::PasswordValidationFailed("short".into()).into(), 400),
            (CredentialError::InvalidInput("email".into()).into(), 400),
            (CredentialError::AccountInactive.into(), 401),
            (
                AuthorizationError::InsufficientRole {
                    required: Role::Admin,
                }
                .into(),
                403,
            ),
        ];

        for (internal, status) in cases {
            assert_eq!(AuthError::from(internal).status_code(), status);
        }
    }
}
