use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::errors::InternalError;
use crate::types::db::refresh_token::{self, Entity as RefreshToken};

/// Refresh token row to persist; `token_hash` is already HMAC'd
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub user_id: String,
    pub expires_at: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Data access for persisted refresh tokens
#[derive(Debug, Default, Clone)]
pub struct RefreshTokenStore;

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        token: NewRefreshToken,
    ) -> Result<(), InternalError> {
        refresh_token::ActiveModel {
            token_hash: Set(token.token_hash),
            user_id: Set(token.user_id),
            expires_at: Set(token.expires_at),
            ip_address: Set(token.ip_address),
            user_agent: Set(token.user_agent),
            created_at: Set(Utc::now().timestamp()),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_refresh_token", e))?;
        Ok(())
    }

    pub async fn find_by_hash(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<Option<refresh_token::Model>, InternalError> {
        RefreshToken::find_by_id(token_hash.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_refresh_token", e))
    }

    /// Delete one token; 0 rows means it was already consumed
    pub async fn delete_by_hash(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<u64, InternalError> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_refresh_token", e))?;
        Ok(result.rows_affected)
    }

    pub async fn delete_all_for_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user_refresh_tokens", e))?;
        Ok(result.rows_affected)
    }

    /// Delete every token with `expires_at < now`
    pub async fn delete_expired(
        &self,
        conn: &impl ConnectionTrait,
        now: i64,
    ) -> Result<u64, InternalError> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::ExpiresAt.lt(now))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_expired_refresh_tokens", e))?;
        Ok(result.rows_affected)
    }

    #[cfg(test)]
    pub async fn count_for_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        use sea_orm::PaginatorTrait;

        RefreshToken::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_refresh_tokens", e))
    }
}
