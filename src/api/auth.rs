use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::{OpenApi, SecurityScheme, Tags, auth::Bearer, payload::Json};

use crate::coordinators::{AccessGuard, AdminCoordinator, AuthCoordinator};
use crate::errors::AuthError;
use crate::types::dto::auth::{
    ChangePasswordRequest, LoginAttemptResponse, LoginRequest, LogoutRequest, RefreshRequest,
    RegisterApiResponse, RegisterRequest, RegisterResponse, TokenResponse, UserResponse,
};
use crate::types::dto::common::MessageResponse;
use crate::types::internal::{IdentityContext, LoginLogFilter, RequestContext, UserSummary};

/// Authentication API endpoints
pub struct AuthApi {
    auth_coordinator: Arc<AuthCoordinator>,
    admin_coordinator: Arc<AdminCoordinator>,
    access_guard: Arc<AccessGuard>,
}

impl AuthApi {
    pub fn new(
        auth_coordinator: Arc<AuthCoordinator>,
        admin_coordinator: Arc<AdminCoordinator>,
        access_guard: Arc<AccessGuard>,
    ) -> Self {
        Self {
            auth_coordinator,
            admin_coordinator,
            access_guard,
        }
    }
}

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Create a BASIC account
    ///
    /// Any `role` in the body is ignored.
    #[oai(path = "/register", method = "post", tag = "AuthTags::Authentication")]
    async fn register(
        &self,
        body: Json<RegisterRequest>,
    ) -> Result<RegisterApiResponse, AuthError> {
        let user = self
            .auth_coordinator
            .register(&body.name, &body.email, &body.password)
            .await?;

        Ok(RegisterApiResponse::Created(Json(RegisterResponse {
            message: "Usuário criado com sucesso".to_string(),
            user: UserResponse::from(user),
        })))
    }

    /// Login with email and password to receive authentication tokens
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(
        &self,
        req: &Request,
        body: Json<LoginRequest>,
    ) -> Result<Json<TokenResponse>, AuthError> {
        let ctx = RequestContext::from_request(req);
        let grant = self
            .auth_coordinator
            .login(&ctx, &body.email, &body.password)
            .await?;
        Ok(Json(TokenResponse::from(grant)))
    }

    /// Exchange a refresh token for a new pair; the presented one is consumed
    #[oai(path = "/refresh", method = "post", tag = "AuthTags::Authentication")]
    async fn refresh(
        &self,
        req: &Request,
        body: Json<RefreshRequest>,
    ) -> Result<Json<TokenResponse>, AuthError> {
        let ctx = RequestContext::from_request(req);
        let grant = self
            .auth_coordinator
            .refresh_tokens(&ctx, &body.refresh_token)
            .await?;
        Ok(Json(TokenResponse::from(grant)))
    }

    /// Revoke a refresh token
    #[oai(path = "/logout", method = "post", tag = "AuthTags::Authentication")]
    async fn logout(&self, body: Json<LogoutRequest>) -> Result<Json<MessageResponse>, AuthError> {
        self.auth_coordinator.logout(&body.refresh_token).await?;
        Ok(Json(MessageResponse::new("Logout realizado com sucesso")))
    }

    /// Sign out of every device
    #[oai(path = "/logout-all", method = "post", tag = "AuthTags::Authentication")]
    async fn logout_all(&self, auth: BearerAuth) -> Result<Json<MessageResponse>, AuthError> {
        let identity = self.authenticate(&auth).await?;
        self.auth_coordinator.logout_all_devices(&identity.id).await?;
        Ok(Json(MessageResponse::new(
            "Logout realizado em todos os dispositivos",
        )))
    }

    /// Current identity
    #[oai(path = "/me", method = "get", tag = "AuthTags::Authentication")]
    async fn me(&self, auth: BearerAuth) -> Result<Json<UserResponse>, AuthError> {
        let identity = self.authenticate(&auth).await?;
        Ok(Json(UserResponse::from(UserSummary::from(identity))))
    }

    /// Change the password; every other session is revoked
    #[oai(path = "/change-password", method = "post", tag = "AuthTags::Authentication")]
    async fn change_password(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<ChangePasswordRequest>,
    ) -> Result<Json<TokenResponse>, AuthError> {
        let identity = self.authenticate(&auth).await?;
        let ctx = RequestContext::from_request(req).with_identity(identity.clone());
        let grant = self
            .auth_coordinator
            .change_password(&ctx, &identity.id, &body.current_password, &body.new_password)
            .await?;
        Ok(Json(TokenResponse::from(grant)))
    }

    /// Clear a lockout (admin only)
    #[oai(path = "/unlock/:user_id", method = "post", tag = "AuthTags::Authentication")]
    async fn unlock(
        &self,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let actor = self.require_admin(&auth).await?;
        self.admin_coordinator.unlock_account(&actor, &user_id).await?;
        Ok(Json(MessageResponse::new("Conta desbloqueada com sucesso")))
    }

    /// Login attempt log, newest first (admin only)
    ///
    /// `startDate` and `endDate` accept RFC 3339, `YYYY-MM-DD` or unix seconds.
    #[oai(path = "/login-logs", method = "get", tag = "AuthTags::Authentication")]
    async fn login_logs(
        &self,
        auth: BearerAuth,
        #[oai(name = "userId")] user_id: Query<Option<String>>,
        email: Query<Option<String>>,
        success: Query<Option<bool>>,
        #[oai(name = "startDate")] start_date: Query<Option<String>>,
        #[oai(name = "endDate")] end_date: Query<Option<String>>,
        limit: Query<Option<u64>>,
    ) -> Result<Json<Vec<LoginAttemptResponse>>, AuthError> {
        let actor = self.require_admin(&auth).await?;
        let filter = LoginLogFilter {
            user_id: user_id.0,
            email: email.0,
            success: success.0,
            start: parse_date_param("startDate", start_date.0.as_deref(), false)?,
            end: parse_date_param("endDate", end_date.0.as_deref(), true)?,
            limit: limit.0,
        };

        let rows = self.admin_coordinator.get_login_logs(&actor, &filter).await?;
        Ok(Json(rows.into_iter().map(LoginAttemptResponse::from).collect()))
    }
}

impl AuthApi {
    async fn authenticate(&self, auth: &BearerAuth) -> Result<IdentityContext, AuthError> {
        Ok(self.access_guard.authenticate(&auth.0.token).await?)
    }

    async fn require_admin(&self, auth: &BearerAuth) -> Result<IdentityContext, AuthError> {
        Ok(self.access_guard.require_admin(&auth.0.token).await?)
    }
}

/// Parse a date filter into unix seconds
///
/// A bare calendar date means the start of that day, or its last second
/// when `end_of_day` is set.
fn parse_date_param(
    name: &str,
    value: Option<&str>,
    end_of_day: bool,
) -> Result<Option<i64>, AuthError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(secs) = value.parse::<i64>() {
        return Ok(Some(secs));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.timestamp()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(time) = time {
            return Ok(Some(time.and_utc().timestamp()));
        }
    }

    Err(AuthError::validation_failed(format!("Data inválida em {}", name)))
}
