// Common test utilities for integration tests

use std::sync::Arc;

use argon2::Params;
use crm_auth_backend::app_data::AppData;
use crm_auth_backend::config::{AuthSettings, DatabaseConnections, MockEnvironment, SecretManager};
use crm_auth_backend::providers::{Argon2Hasher, PasswordHasher};
use crm_auth_backend::types::internal::RequestContext;

pub const TEST_PASSWORD: &str = "Correct1Horse";

/// Fresh in-memory auth and audit databases with migrations applied
pub async fn setup_test_databases() -> DatabaseConnections {
    let connections = DatabaseConnections::connect("sqlite::memory:", "sqlite::memory:")
        .await
        .expect("Failed to create test databases");
    connections.migrate().await.expect("Failed to run migrations");
    connections
}

pub fn test_environment() -> MockEnvironment {
    MockEnvironment::empty().with_vars(&[
        ("JWT_SECRET", "integration-jwt-secret-at-least-32-characters"),
        ("PASSWORD_PEPPER", "integration-pepper"),
        ("REFRESH_TOKEN_SECRET", "integration-refresh-secret-32-characters-min"),
    ])
}

/// AppData wired like production except for a cheap Argon2 cost
pub async fn setup_app_data(settings: AuthSettings) -> Arc<AppData> {
    let secret_manager = Arc::new(
        SecretManager::from_env_provider(&test_environment()).expect("test secrets are valid"),
    );
    let params = Params::new(8 * 1024, 1, 1, None).expect("valid argon2 params");
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::with_params(
        secret_manager.password_pepper(),
        params,
    ));

    Arc::new(AppData::from_parts(
        setup_test_databases().await,
        secret_manager,
        settings,
        hasher,
    ))
}

pub fn client_ctx() -> RequestContext {
    RequestContext::new()
        .with_ip_address("203.0.113.7".parse().expect("valid ip"))
        .with_user_agent("integration-test")
}
