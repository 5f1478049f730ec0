use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use sea_orm::ConnectionTrait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AuthSettings, SecretManager};
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, TokenKind};
use crate::providers::CryptoProvider;
use crate::stores::{NewRefreshToken, RefreshTokenStore};
use crate::types::db::user;
use crate::types::internal::{Claims, RequestContext, TokenPair};

/// Mints and validates access tokens and opaque refresh tokens
pub struct TokenProvider {
    secret_manager: Arc<SecretManager>,
    crypto: CryptoProvider,
    refresh_token_store: RefreshTokenStore,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenProvider {
    pub fn new(secret_manager: Arc<SecretManager>, settings: &AuthSettings) -> Self {
        Self {
            secret_manager,
            crypto: CryptoProvider::new(),
            refresh_token_store: RefreshTokenStore::new(),
            access_ttl_secs: settings.access_token_ttl_secs,
            refresh_ttl_secs: settings.refresh_token_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Sign an HS256 access token stamped with the user's current epoch
    pub fn generate_access_token(&self, user: &user::Model) -> Result<String, InternalError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            epoch: user.token_epoch,
            iat: now,
            exp: now + self.access_ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
        )
        .map_err(|e| InternalError::crypto("jwt_generation", e.to_string()))
    }

    /// Verify signature and expiry; epoch is checked by the access guard
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, InternalError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => CredentialError::ExpiredToken(TokenKind::Access).into(),
            _ => CredentialError::invalid_token(TokenKind::Access, e.to_string()).into(),
        })
    }

    /// 256 random bits, URL-safe base64 without padding
    pub fn generate_refresh_token(&self) -> String {
        let random_bytes: [u8; 32] = rand::rng().random();
        URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Storage key for a refresh token
    pub fn hash_refresh_token(&self, token: &str) -> Result<String, InternalError> {
        self.crypto
            .hmac_sha256_token(self.secret_manager.refresh_token_secret(), token)
    }

    pub fn refresh_expiration(&self, now: i64) -> i64 {
        now + self.refresh_ttl_secs
    }

    /// Issue a token pair for `user` and persist the refresh token
    ///
    /// The access token carries the epoch of the `user` row passed in, so
    /// callers must pass a row read after any epoch change.
    pub async fn issue(
        &self,
        conn: &impl ConnectionTrait,
        user: &user::Model,
        ctx: &RequestContext,
    ) -> Result<TokenPair, InternalError> {
        let access_token = self.generate_access_token(user)?;
        let refresh_token = self.generate_refresh_token();

        self.refresh_token_store
            .insert(
                conn,
                NewRefreshToken {
                    token_hash: self.hash_refresh_token(&refresh_token)?,
                    user_id: user.id.clone(),
                    expires_at: self.refresh_expiration(Utc::now().timestamp()),
                    ip_address: ctx.ip_string(),
                    user_agent: ctx.user_agent.clone(),
                },
            )
            .await?;

        tracing::debug!(user_id = %user.id, epoch = user.token_epoch, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_secs,
        })
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("secret_manager", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl fmt::Display for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenProvider {{ access_ttl: {}s, refresh_ttl: {}s }}",
            self.access_ttl_secs, self.refresh_ttl_secs
        )
    }
}
