use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set, SqlErr,
};

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::types::db::user::{self, Entity as User};
use crate::types::internal::Role;

/// Fields required to create a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Data access for user credentials and login state
///
/// Every method takes the connection explicitly so callers decide whether
/// it runs inside a transaction.
#[derive(Debug, Default, Clone)]
pub struct CredentialStore;

impl CredentialStore {
    pub fn new() -> Self {
        Self
    }

    /// Canonical form used for storage and lookup
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub async fn find_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::Email.eq(Self::normalize_email(email)))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find_by_id(user_id.to_owned())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))
    }

    pub async fn email_exists(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<bool, InternalError> {
        let count = User::find()
            .filter(user::Column::Email.eq(Self::normalize_email(email)))
            .count(conn)
            .await
            .map_err(|e| InternalError::database("email_exists", e))?;
        Ok(count > 0)
    }

    /// Insert a new user with a fresh id, zeroed counters and epoch 0
    ///
    /// A unique violation on email maps to `DuplicateEmail`, which covers the
    /// race between two registrations that both passed `email_exists`.
    pub async fn insert_user(
        &self,
        conn: &impl ConnectionTrait,
        new_user: NewUser,
    ) -> Result<user::Model, InternalError> {
        let now = Utc::now().timestamp();
        let email = Self::normalize_email(&new_user.email);

        let model = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email.clone()),
            name: Set(new_user.name.trim().to_string()),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            active: Set(true),
            token_epoch: Set(0),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                InternalError::Credential(CredentialError::DuplicateEmail(email))
            } else {
                InternalError::database("insert_user", e)
            }
        })
    }

    /// Atomically add one to the failure counter and return the new value
    pub async fn increment_failed_attempts(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<i32, InternalError> {
        let result = User::update_many()
            .col_expr(
                user::Column::FailedLoginAttempts,
                Expr::col(user::Column::FailedLoginAttempts).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("increment_failed_attempts", e))?;

        if result.rows_affected == 0 {
            return Err(CredentialError::UserNotFound(user_id.to_owned()).into());
        }

        let attempts: Option<i32> = User::find_by_id(user_id.to_owned())
            .select_only()
            .column(user::Column::FailedLoginAttempts)
            .into_tuple()
            .one(conn)
            .await
            .map_err(|e| InternalError::database("read_failed_attempts", e))?;

        attempts.ok_or_else(|| CredentialError::UserNotFound(user_id.to_owned()).into())
    }

    pub async fn lock_until(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        locked_until: i64,
    ) -> Result<(), InternalError> {
        User::update_many()
            .col_expr(user::Column::LockedUntil, Expr::value(locked_until))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("lock_user", e))?;
        Ok(())
    }

    /// Zero the failure counter and clear any lock; returns rows affected
    pub async fn reset_login_state(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = User::update_many()
            .col_expr(user::Column::FailedLoginAttempts, Expr::value(0))
            .col_expr(user::Column::LockedUntil, Expr::value(Option::<i64>::None))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("reset_login_state", e))?;
        Ok(result.rows_affected)
    }

    /// Atomically increment `token_epoch`; returns rows affected
    pub async fn bump_token_epoch(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = User::update_many()
            .col_expr(
                user::Column::TokenEpoch,
                Expr::col(user::Column::TokenEpoch).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("bump_token_epoch", e))?;
        Ok(result.rows_affected)
    }

    pub async fn update_password_hash(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        password_hash: &str,
    ) -> Result<u64, InternalError> {
        let result = User::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("update_password_hash", e))?;
        Ok(result.rows_affected)
    }

    pub async fn set_active(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        active: bool,
    ) -> Result<u64, InternalError> {
        let result = User::update_many()
            .col_expr(user::Column::Active, Expr::value(active))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("set_user_active", e))?;
        Ok(result.rows_affected)
    }

    /// Hard delete; refresh tokens go with it through the FK cascade
    pub async fn delete_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = User::delete_by_id(user_id.to_owned())
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user", e))?;
        Ok(result.rows_affected)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err.to_string().contains("UNIQUE")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_databases;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Maria Silva".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            role: Role::Basic,
        }
    }

    #[tokio::test]
    async fn test_insert_user_sets_initial_state() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();

        let user = store
            .insert_user(&dbs.auth, new_user("  Maria@Example.COM "))
            .await
            .unwrap();

        assert_eq!(user.email, "maria@example.com");
        assert_eq!(user.role, Role::Basic);
        assert!(user.active);
        assert_eq!(user.token_epoch, 0);
        assert_eq!(user.failed_login_attempts, 0);
        assert_eq!(user.locked_until, None);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();
        let user = store.insert_user(&dbs.auth, new_user("maria@example.com")).await.unwrap();

        let found = store.find_by_email(&dbs.auth, "MARIA@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(store.email_exists(&dbs.auth, "Maria@Example.com").await.unwrap());
        assert!(!store.email_exists(&dbs.auth, "ghost@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();
        store.insert_user(&dbs.auth, new_user("maria@example.com")).await.unwrap();

        let result = store.insert_user(&dbs.auth, new_user("MARIA@example.com")).await;

        match result {
            Err(InternalError::Credential(CredentialError::DuplicateEmail(email))) => {
                assert_eq!(email, "maria@example.com")
            }
            other => panic!("Expected DuplicateEmail, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_increment_and_reset_failed_attempts() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();
        let user = store.insert_user(&dbs.auth, new_user("maria@example.com")).await.unwrap();

        assert_eq!(store.increment_failed_attempts(&dbs.auth, &user.id).await.unwrap(), 1);
        assert_eq!(store.increment_failed_attempts(&dbs.auth, &user.id).await.unwrap(), 2);

        store.lock_until(&dbs.auth, &user.id, 4_102_444_800).await.unwrap();
        let locked = store.find_by_id(&dbs.auth, &user.id).await.unwrap().unwrap();
        assert_eq!(locked.locked_until, Some(4_102_444_800));

        assert_eq!(store.reset_login_state(&dbs.auth, &user.id).await.unwrap(), 1);
        let reset = store.find_by_id(&dbs.auth, &user.id).await.unwrap().unwrap();
        assert_eq!(reset.failed_login_attempts, 0);
        assert_eq!(reset.locked_until, None);
    }

    #[tokio::test]
    async fn test_increment_unknown_user_fails() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();

        let result = store.increment_failed_attempts(&dbs.auth, "missing").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::UserNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_bump_token_epoch_is_monotonic() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();
        let user = store.insert_user(&dbs.auth, new_user("maria@example.com")).await.unwrap();

        for _ in 0..3 {
            assert_eq!(store.bump_token_epoch(&dbs.auth, &user.id).await.unwrap(), 1);
        }
        let after = store.find_by_id(&dbs.auth, &user.id).await.unwrap().unwrap();
        assert_eq!(after.token_epoch, 3);

        assert_eq!(store.bump_token_epoch(&dbs.auth, "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_active_update_hash_and_delete() {
        let dbs = setup_test_databases().await;
        let store = CredentialStore::new();
        let user = store.insert_user(&dbs.auth, new_user("maria@example.com")).await.unwrap();

        store.set_active(&dbs.auth, &user.id, false).await.unwrap();
        store.update_password_hash(&dbs.auth, &user.id, "$argon2id$new").await.unwrap();
        let updated = store.find_by_id(&dbs.auth, &user.id).await.unwrap().unwrap();
        assert!(!updated.active);
        assert_eq!(updated.password_hash, "$argon2id$new");

        assert_eq!(store.delete_user(&dbs.auth, &user.id).await.unwrap(), 1);
        assert!(store.find_by_id(&dbs.auth, &user.id).await.unwrap().is_none());
    }
}
