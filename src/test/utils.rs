// Test utilities shared across unit tests
// Only compiled when running tests

use std::net::IpAddr;
use std::sync::Arc;

use argon2::Params;
use sea_orm::{ConnectionTrait, Database};

use crate::app_data::AppData;
use crate::config::{AuthSettings, DatabaseConnections, MockEnvironment, SecretManager};
use crate::providers::{Argon2Hasher, PasswordHasher};
use crate::stores::{CredentialStore, NewUser};
use crate::types::db::user;
use crate::types::internal::{RequestContext, Role};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-minimum-32-characters-long";
pub const TEST_PEPPER: &str = "test-pepper-for-unit-tests";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-minimum-32-chars-long";

/// Creates in-memory auth and audit databases with migrations applied
pub async fn setup_test_databases() -> DatabaseConnections {
    let auth = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    let audit = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create audit database");

    let connections = DatabaseConnections::from_parts(auth, audit);
    connections.migrate().await.expect("Failed to run migrations");
    connections
}

pub fn test_environment() -> MockEnvironment {
    MockEnvironment::empty().with_vars(&[
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("PASSWORD_PEPPER", TEST_PEPPER),
        ("REFRESH_TOKEN_SECRET", TEST_REFRESH_SECRET),
    ])
}

pub fn test_secret_manager() -> Arc<SecretManager> {
    Arc::new(
        SecretManager::from_env_provider(&test_environment())
            .expect("Failed to create test secret manager"),
    )
}

/// Argon2id with minimal cost so tests stay fast
pub fn test_password_hasher() -> Arc<dyn PasswordHasher> {
    let params = Params::new(8 * 1024, 1, 1, None).expect("valid argon2 params");
    Arc::new(Argon2Hasher::with_params(TEST_PEPPER, params))
}

/// Full AppData over fresh in-memory databases
pub async fn setup_test_app_data(settings: AuthSettings) -> Arc<AppData> {
    let connections = setup_test_databases().await;
    Arc::new(AppData::from_parts(
        connections,
        test_secret_manager(),
        settings,
        test_password_hasher(),
    ))
}

/// Insert an active user with a real (fast) password hash
pub async fn seed_user(
    conn: &impl ConnectionTrait,
    email: &str,
    password: &str,
    role: Role,
) -> user::Model {
    let password_hash = test_password_hasher()
        .hash(password)
        .expect("Failed to hash test password");
    CredentialStore::new()
        .insert_user(
            conn,
            NewUser {
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash,
                role,
            },
        )
        .await
        .expect("Failed to seed user")
}

/// Request context as if the call came from `ip`
pub fn ctx_from(ip: &str) -> RequestContext {
    let ip: IpAddr = ip.parse().expect("valid test ip");
    RequestContext::new()
        .with_ip_address(ip)
        .with_user_agent("test-agent/1.0")
}
