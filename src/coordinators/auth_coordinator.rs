use std::sync::Arc;

use chrono::Utc;
use sea_orm::ConnectionTrait;

use crate::app_data::AppData;
use crate::config::{AuthSettings, DatabaseConnections, commit_transaction};
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, TokenKind};
use crate::providers::{PasswordHasher, PasswordPolicy, TokenProvider};
use crate::stores::{
    CredentialStore, LoginAttemptStore, NewLoginAttempt, NewUser, RefreshTokenStore,
};
use crate::types::db::{login_attempt, user};
use crate::types::internal::{
    FailReason, LoginLogFilter, RequestContext, Role, SessionGrant, UserSummary,
};

/// Session manager: login, refresh rotation, logout and lockout policy
///
/// Holds no in-process locks. All cross-request coordination goes through
/// the user and refresh token rows.
pub struct AuthCoordinator {
    connections: DatabaseConnections,
    credential_store: Arc<CredentialStore>,
    refresh_token_store: Arc<RefreshTokenStore>,
    login_attempt_store: Arc<LoginAttemptStore>,
    password_hasher: Arc<dyn PasswordHasher>,
    password_policy: PasswordPolicy,
    token_provider: Arc<TokenProvider>,
    settings: AuthSettings,
}

impl AuthCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            credential_store: app_data.credential_store.clone(),
            refresh_token_store: app_data.refresh_token_store.clone(),
            login_attempt_store: app_data.login_attempt_store.clone(),
            password_hasher: app_data.password_hasher.clone(),
            password_policy: app_data.password_policy,
            token_provider: app_data.token_provider.clone(),
            settings: app_data.auth_settings.clone(),
        }
    }

    /// Self-registration; the role is always BASIC whatever the caller sent
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, InternalError> {
        let user = self.create_account(name, email, password, Role::Basic).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(UserSummary::from(&user))
    }

    /// Shared by self-registration and admin creation
    pub(crate) async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<user::Model, InternalError> {
        let email = CredentialStore::normalize_email(email);
        validate_identity_fields(name, &email)?;
        self.password_policy.validate(password)?;

        let conn = &self.connections.auth;
        if self.credential_store.email_exists(conn, &email).await? {
            return Err(CredentialError::DuplicateEmail(email).into());
        }

        let password_hash = self.password_hasher.hash(password)?;
        self.credential_store
            .insert_user(
                conn,
                NewUser {
                    name: name.to_string(),
                    email,
                    password_hash,
                    role,
                },
            )
            .await
    }

    /// Authenticate with email and password
    ///
    /// Exactly one login attempt row is written per call, whatever the
    /// outcome, before the result is returned.
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<SessionGrant, InternalError> {
        let conn = &self.connections.auth;
        let now = Utc::now().timestamp();

        let Some(user) = self.credential_store.find_by_email(conn, email).await? else {
            self.record_attempt(ctx, email, None, Some(FailReason::UserNotFound)).await?;
            tracing::info!(request_id = %ctx.request_id, "Login failed: unknown email");
            return Err(CredentialError::InvalidCredentials {
                remaining_attempts: None,
            }
            .into());
        };

        if user.is_locked_at(now) {
            self.record_attempt(ctx, email, Some(&user.id), Some(FailReason::AccountLocked))
                .await?;
            tracing::warn!(user_id = %user.id, request_id = %ctx.request_id, "Login rejected: account locked");
            return Err(CredentialError::AccountLocked {
                minutes_remaining: minutes_remaining(user.locked_until.unwrap_or(now), now),
            }
            .into());
        }

        if !user.active {
            self.record_attempt(ctx, email, Some(&user.id), Some(FailReason::AccountInactive))
                .await?;
            tracing::info!(user_id = %user.id, "Login rejected: account inactive");
            return Err(CredentialError::AccountInactive.into());
        }

        if !self.password_hasher.verify(password, &user.password_hash)? {
            return Err(self.register_failed_password(ctx, email, &user, now).await?);
        }

        self.credential_store.reset_login_state(conn, &user.id).await?;
        self.record_attempt(ctx, email, Some(&user.id), None).await?;

        let tokens = self.token_provider.issue(conn, &user, ctx).await?;
        tracing::info!(user_id = %user.id, request_id = %ctx.request_id, "Login succeeded");

        Ok(SessionGrant {
            tokens,
            user: UserSummary::from(&user),
        })
    }

    /// Count a wrong password, lock when the threshold is reached, and
    /// return the error to hand back to the caller
    async fn register_failed_password(
        &self,
        ctx: &RequestContext,
        email: &str,
        user: &user::Model,
        now: i64,
    ) -> Result<InternalError, InternalError> {
        let conn = &self.connections.auth;
        let attempts = self.credential_store.increment_failed_attempts(conn, &user.id).await?;

        if attempts >= self.settings.max_login_attempts {
            self.credential_store
                .lock_until(conn, &user.id, now + self.settings.lock_time_secs())
                .await?;
            self.record_attempt(ctx, email, Some(&user.id), Some(FailReason::InvalidPassword))
                .await?;
            tracing::warn!(
                user_id = %user.id,
                attempts,
                "Account locked after repeated login failures"
            );
            return Ok(CredentialError::LockoutTriggered {
                lock_minutes: self.settings.lock_time_minutes,
            }
            .into());
        }

        self.record_attempt(ctx, email, Some(&user.id), Some(FailReason::InvalidPassword))
            .await?;
        tracing::info!(user_id = %user.id, attempts, "Login failed: invalid password");
        Ok(CredentialError::InvalidCredentials {
            remaining_attempts: Some(self.settings.max_login_attempts - attempts),
        }
        .into())
    }

    /// Rotate a refresh token: the presented token is consumed and a new
    /// pair is issued
    pub async fn refresh_tokens(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<SessionGrant, InternalError> {
        let conn = &self.connections.auth;
        let token_hash = self.token_provider.hash_refresh_token(refresh_token)?;

        let Some(stored) = self.refresh_token_store.find_by_hash(conn, &token_hash).await? else {
            return Err(CredentialError::invalid_token(TokenKind::Refresh, "not found").into());
        };

        if stored.expires_at < Utc::now().timestamp() {
            self.refresh_token_store.delete_by_hash(conn, &token_hash).await?;
            return Err(CredentialError::ExpiredToken(TokenKind::Refresh).into());
        }

        // Inactive owner: the row stays so a reactivated account can resume
        match self.credential_store.find_by_id(conn, &stored.user_id).await? {
            Some(owner) if owner.active => {}
            _ => return Err(CredentialError::UserUnavailable.into()),
        }

        // Consume, re-read and reissue in one transaction so a concurrent
        // epoch bump cannot slip between the read and the insert
        let txn = self.connections.begin_auth_transaction().await?;

        // A concurrent rotation or logout may have consumed it since the read
        if self.refresh_token_store.delete_by_hash(&txn, &token_hash).await? == 0 {
            tracing::warn!(user_id = %stored.user_id, "Refresh token replay rejected");
            return Err(CredentialError::invalid_token(TokenKind::Refresh, "already consumed").into());
        }

        // The new access token carries the epoch current at issuance
        let user = self
            .credential_store
            .find_by_id(&txn, &stored.user_id)
            .await?
            .ok_or(CredentialError::UserUnavailable)?;

        let tokens = self.token_provider.issue(&txn, &user, ctx).await?;
        commit_transaction(txn, "refresh_tokens").await?;
        tracing::debug!(user_id = %user.id, "Refresh token rotated");

        Ok(SessionGrant {
            tokens,
            user: UserSummary::from(&user),
        })
    }

    /// Revoke one refresh token; unknown tokens are not an error
    pub async fn logout(&self, refresh_token: &str) -> Result<u64, InternalError> {
        let token_hash = self.token_provider.hash_refresh_token(refresh_token)?;
        let deleted = self
            .refresh_token_store
            .delete_by_hash(&self.connections.auth, &token_hash)
            .await?;
        tracing::debug!(deleted, "Logout processed");
        Ok(deleted)
    }

    /// Sign the user out everywhere, in one transaction
    pub async fn logout_all_devices(&self, user_id: &str) -> Result<u64, InternalError> {
        let txn = self.connections.begin_auth_transaction().await?;
        let revoked = self.invalidate_all_sessions(&txn, user_id).await?;
        commit_transaction(txn, "logout_all_devices").await?;

        tracing::info!(user_id, revoked, "All sessions invalidated");
        Ok(revoked)
    }

    /// Invalidate every access token (epoch bump) and delete every refresh
    /// token of the user on `conn`
    ///
    /// Callers pass a transaction so both writes commit together.
    pub async fn invalidate_all_sessions(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        if self.credential_store.bump_token_epoch(conn, user_id).await? == 0 {
            return Err(CredentialError::UserNotFound(user_id.to_owned()).into());
        }
        self.refresh_token_store.delete_all_for_user(conn, user_id).await
    }

    /// Clear the failure counter and any lock. Sessions are untouched.
    pub async fn unlock_account(&self, user_id: &str) -> Result<(), InternalError> {
        let updated = self
            .credential_store
            .reset_login_state(&self.connections.auth, user_id)
            .await?;
        if updated == 0 {
            return Err(CredentialError::UserNotFound(user_id.to_owned()).into());
        }
        tracing::info!(user_id, "Account unlocked");
        Ok(())
    }

    pub async fn get_login_logs(
        &self,
        filter: &LoginLogFilter,
    ) -> Result<Vec<login_attempt::Model>, InternalError> {
        self.login_attempt_store.find(filter).await
    }

    /// Delete refresh tokens past their expiry; meant for periodic runs
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, InternalError> {
        let deleted = self
            .refresh_token_store
            .delete_expired(&self.connections.auth, Utc::now().timestamp())
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, "Expired refresh tokens removed");
        }
        Ok(deleted)
    }

    /// Change the password of `user_id` after verifying the current one
    ///
    /// Every existing session is invalidated. The returned pair is issued
    /// after the epoch bump, so only the caller stays signed in.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<SessionGrant, InternalError> {
        let user = self
            .credential_store
            .find_by_id(&self.connections.auth, user_id)
            .await?
            .ok_or_else(|| CredentialError::UserNotFound(user_id.to_owned()))?;

        if !self.password_hasher.verify(current_password, &user.password_hash)? {
            return Err(CredentialError::IncorrectPassword.into());
        }
        self.password_policy.validate(new_password)?;
        let password_hash = self.password_hasher.hash(new_password)?;

        let txn = self.connections.begin_auth_transaction().await?;
        self.credential_store.update_password_hash(&txn, user_id, &password_hash).await?;
        self.invalidate_all_sessions(&txn, user_id).await?;

        let user = self
            .credential_store
            .find_by_id(&txn, user_id)
            .await?
            .ok_or_else(|| CredentialError::UserNotFound(user_id.to_owned()))?;
        let tokens = self.token_provider.issue(&txn, &user, ctx).await?;
        commit_transaction(txn, "change_password").await?;

        tracing::info!(user_id, "Password changed, other sessions invalidated");
        Ok(SessionGrant {
            tokens,
            user: UserSummary::from(&user),
        })
    }

    async fn record_attempt(
        &self,
        ctx: &RequestContext,
        email: &str,
        user_id: Option<&str>,
        fail_reason: Option<FailReason>,
    ) -> Result<(), InternalError> {
        self.login_attempt_store
            .record(NewLoginAttempt {
                email: email.to_string(),
                success: fail_reason.is_none(),
                fail_reason,
                ip_address: ctx.ip_string(),
                user_agent: ctx.user_agent.clone(),
                user_id: user_id.map(str::to_owned),
            })
            .await
    }
}

/// Whole minutes left on a lock, rounded up
fn minutes_remaining(locked_until: i64, now: i64) -> i64 {
    ((locked_until - now).max(0) + 59) / 60
}

fn validate_identity_fields(name: &str, email: &str) -> Result<(), InternalError> {
    if name.trim().is_empty() {
        return Err(CredentialError::InvalidInput("Nome é obrigatório".to_string()).into());
    }
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid_email {
        return Err(CredentialError::InvalidInput("Email inválido".to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinators::AccessGuard;
    use crate::test::utils::{ctx_from, setup_test_app_data};

    async fn coordinator() -> (Arc<AppData>, AuthCoordinator) {
        let app_data = setup_test_app_data(AuthSettings::default()).await;
        (app_data.clone(), AuthCoordinator::new(app_data))
    }

    async fn reload(app_data: &AppData, user_id: &str) -> user::Model {
        app_data
            .credential_store
            .find_by_id(&app_data.connections.auth, user_id)
            .await
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_minutes_remaining_rounds_up() {
        assert_eq!(minutes_remaining(1_000 + 900, 1_000), 15);
        assert_eq!(minutes_remaining(1_000 + 61, 1_000), 2);
        assert_eq!(minutes_remaining(1_000 + 1, 1_000), 1);
        assert_eq!(minutes_remaining(1_000, 1_000), 0);
    }

    #[test]
    fn test_validate_identity_fields() {
        assert!(validate_identity_fields("Maria", "maria@example.com").is_ok());
        assert!(validate_identity_fields(" ", "maria@example.com").is_err());
        assert!(validate_identity_fields("Maria", "maria.example.com").is_err());
        assert!(validate_identity_fields("Maria", "@example.com").is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_case_insensitively() {
        let (_app_data, auth) = coordinator().await;
        auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();

        let result = auth.register("Maria 2", "MARIA@Example.com", "Correct1Horse").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::DuplicateEmail(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_enforces_policy_before_hashing() {
        let (app_data, auth) = coordinator().await;

        let result = auth.register("Maria", "maria@example.com", "Weak1").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::PasswordValidationFailed(_)))
        ));
        assert!(
            !app_data
                .credential_store
                .email_exists(&app_data.connections.auth, "maria@example.com")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_wrong_password_reports_remaining_attempts() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();

        let result = auth.login(&ctx_from("10.0.0.1"), "maria@example.com", "Wrong1Horse").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::InvalidCredentials {
                remaining_attempts: Some(4)
            }))
        ));
        let row = reload(&app_data, &user.id).await;
        assert_eq!(row.failed_login_attempts, 1);
        assert_eq!(row.locked_until, None);
    }

    #[tokio::test]
    async fn test_lockout_and_unlock() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");

        for _ in 0..4 {
            let _ = auth.login(&ctx, "maria@example.com", "Wrong1Horse").await;
        }
        let fifth = auth.login(&ctx, "maria@example.com", "Wrong1Horse").await;
        assert!(matches!(
            fifth,
            Err(InternalError::Credential(CredentialError::LockoutTriggered { lock_minutes: 15 }))
        ));

        let sixth = auth.login(&ctx, "maria@example.com", "Correct1Horse").await;
        match sixth {
            Err(InternalError::Credential(CredentialError::AccountLocked { minutes_remaining })) => {
                assert!((14..=15).contains(&minutes_remaining))
            }
            other => panic!("Expected AccountLocked, got {:?}", other.map(|_| ())),
        }

        auth.unlock_account(&user.id).await.unwrap();
        assert!(auth.login(&ctx, "maria@example.com", "Correct1Horse").await.is_ok());
        assert_eq!(reload(&app_data, &user.id).await.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_elapsed_lock_relocks_on_next_failure() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        for _ in 0..5 {
            let _ = auth.login(&ctx, "maria@example.com", "Wrong1Horse").await;
        }
        // Simulate the lock having elapsed
        app_data
            .credential_store
            .lock_until(&app_data.connections.auth, &user.id, Utc::now().timestamp() - 1)
            .await
            .unwrap();

        let result = auth.login(&ctx, "maria@example.com", "Wrong1Horse").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::LockoutTriggered { .. }))
        ));
    }

    #[tokio::test]
    async fn test_correct_password_after_lock_elapses_resets_state() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        for _ in 0..5 {
            let _ = auth.login(&ctx, "maria@example.com", "Wrong1Horse").await;
        }
        assert!(auth.login(&ctx, "maria@example.com", "Correct1Horse").await.is_err());

        app_data
            .credential_store
            .lock_until(&app_data.connections.auth, &user.id, Utc::now().timestamp() - 1)
            .await
            .unwrap();

        assert!(auth.login(&ctx, "maria@example.com", "Correct1Horse").await.is_ok());
        let row = reload(&app_data, &user.id).await;
        assert_eq!(row.failed_login_attempts, 0);
        assert_eq!(row.locked_until, None);
    }

    #[tokio::test]
    async fn test_inactive_account_is_rejected_and_logged() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        app_data
            .credential_store
            .set_active(&app_data.connections.auth, &user.id, false)
            .await
            .unwrap();

        let result = auth.login(&ctx_from("10.0.0.1"), "maria@example.com", "Correct1Horse").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::AccountInactive))
        ));

        let logs = auth.get_login_logs(&LoginLogFilter::default()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].fail_reason.as_deref(), Some("account_inactive"));
        assert_eq!(logs[0].user_id.as_deref(), Some(user.id.as_str()));
    }

    #[tokio::test]
    async fn test_refresh_rotation_is_single_use() {
        let (_app_data, auth) = coordinator().await;
        auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        let grant = auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();

        let rotated = auth.refresh_tokens(&ctx, &grant.tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.tokens.refresh_token, grant.tokens.refresh_token);

        let replay = auth.refresh_tokens(&ctx, &grant.tokens.refresh_token).await;
        assert!(matches!(
            replay,
            Err(InternalError::Credential(CredentialError::InvalidToken {
                kind: TokenKind::Refresh,
                ..
            }))
        ));
        assert!(auth.refresh_tokens(&ctx, &rotated.tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_for_inactive_user_keeps_row() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        let grant = auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();
        let conn = &app_data.connections.auth;
        app_data.credential_store.set_active(conn, &user.id, false).await.unwrap();

        let result = auth.refresh_tokens(&ctx, &grant.tokens.refresh_token).await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::UserUnavailable))
        ));

        app_data.credential_store.set_active(conn, &user.id, true).await.unwrap();
        assert!(auth.refresh_tokens(&ctx, &grant.tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_refresh_token_is_deleted() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let token = app_data.token_provider.generate_refresh_token();
        let hash = app_data.token_provider.hash_refresh_token(&token).unwrap();
        app_data
            .refresh_token_store
            .insert(
                &app_data.connections.auth,
                crate::stores::NewRefreshToken {
                    token_hash: hash.clone(),
                    user_id: user.id.clone(),
                    expires_at: Utc::now().timestamp() - 10,
                    ip_address: None,
                    user_agent: None,
                },
            )
            .await
            .unwrap();

        let result = auth.refresh_tokens(&ctx_from("10.0.0.1"), &token).await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::ExpiredToken(TokenKind::Refresh)))
        ));
        assert!(
            app_data
                .refresh_token_store
                .find_by_hash(&app_data.connections.auth, &hash)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (_app_data, auth) = coordinator().await;
        auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let grant = auth
            .login(&ctx_from("10.0.0.1"), "maria@example.com", "Correct1Horse")
            .await
            .unwrap();

        assert_eq!(auth.logout(&grant.tokens.refresh_token).await.unwrap(), 1);
        assert_eq!(auth.logout(&grant.tokens.refresh_token).await.unwrap(), 0);
        assert_eq!(auth.logout("never-issued").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_logout_all_devices_bumps_epoch_and_revokes() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        let first = auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();
        auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();

        assert_eq!(auth.logout_all_devices(&user.id).await.unwrap(), 2);
        assert_eq!(reload(&app_data, &user.id).await.token_epoch, 1);
        assert!(auth.refresh_tokens(&ctx, &first.tokens.refresh_token).await.is_err());

        assert!(matches!(
            auth.logout_all_devices("missing").await,
            Err(InternalError::Credential(CredentialError::UserNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalidate_all_sessions_rejects_live_access_token() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        let grant = auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();
        let guard = AccessGuard::new(app_data.clone());
        assert!(guard.authenticate(&grant.tokens.access_token).await.is_ok());

        let revoked = auth
            .invalidate_all_sessions(&app_data.connections.auth, &user.id)
            .await
            .unwrap();

        assert_eq!(revoked, 1);
        assert!(matches!(
            guard.authenticate(&grant.tokens.access_token).await,
            Err(InternalError::Credential(CredentialError::SessionExpired))
        ));
        assert!(auth.refresh_tokens(&ctx, &grant.tokens.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_after_epoch_bump_carries_current_epoch() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        auth.logout_all_devices(&user.id).await.unwrap();
        let grant = auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();

        let rotated = auth.refresh_tokens(&ctx, &grant.tokens.refresh_token).await.unwrap();

        let claims = app_data
            .token_provider
            .validate_access_token(&rotated.tokens.access_token)
            .unwrap();
        assert_eq!(claims.epoch, 1);
        assert!(
            AccessGuard::new(app_data.clone())
                .authenticate(&rotated.tokens.access_token)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unlock_unknown_user_is_not_found() {
        let (_app_data, auth) = coordinator().await;
        assert!(matches!(
            auth.unlock_account("missing").await,
            Err(InternalError::Credential(CredentialError::UserNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_change_password_invalidates_other_sessions() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let ctx = ctx_from("10.0.0.1");
        let old = auth.login(&ctx, "maria@example.com", "Correct1Horse").await.unwrap();

        let wrong = auth.change_password(&ctx, &user.id, "Wrong1Horse", "Battery9Staple").await;
        assert!(matches!(
            wrong,
            Err(InternalError::Credential(CredentialError::IncorrectPassword))
        ));

        let fresh = auth
            .change_password(&ctx, &user.id, "Correct1Horse", "Battery9Staple")
            .await
            .unwrap();
        assert_eq!(reload(&app_data, &user.id).await.token_epoch, 1);
        assert!(auth.refresh_tokens(&ctx, &old.tokens.refresh_token).await.is_err());
        assert!(auth.refresh_tokens(&ctx, &fresh.tokens.refresh_token).await.is_ok());

        assert!(auth.login(&ctx, "maria@example.com", "Correct1Horse").await.is_err());
        assert!(auth.login(&ctx, "maria@example.com", "Battery9Staple").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_expired_tokens() {
        let (app_data, auth) = coordinator().await;
        let user = auth.register("Maria", "maria@example.com", "Correct1Horse").await.unwrap();
        let conn = &app_data.connections.auth;
        for (hash, expires_at) in [("a", 10), ("b", 20), ("c", Utc::now().timestamp() + 600)] {
            app_data
                .refresh_token_store
                .insert(
                    conn,
                    crate::stores::NewRefreshToken {
                        token_hash: hash.to_string(),
                        user_id: user.id.clone(),
                        expires_at,
                        ip_address: None,
                        user_agent: None,
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(auth.cleanup_expired_tokens().await.unwrap(), 2);
        assert_eq!(auth.cleanup_expired_tokens().await.unwrap(), 0);
    }
}
