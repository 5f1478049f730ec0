use std::sync::Arc;

use thiserror::Error;

use crate::config::{
    AuthSettings, ConfigError, DatabaseConnections, EnvironmentProvider, SecretError,
    SecretManager,
};
use crate::providers::{Argon2Hasher, PasswordHasher, PasswordPolicy, TokenProvider};
use crate::stores::{CredentialStore, LoginAttemptStore, RefreshTokenStore};

#[derive(Error, Debug)]
pub enum AppDataError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Secret(#[from] SecretError),
}

/// Centralized application data following the main-owned stores pattern
///
/// Everything is created once and shared across coordinators.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init(connections, env)
///   ↓ creates once
///   ├─ connections (auth + audit DatabaseConnection)
///   ├─ secret_manager (Arc<SecretManager>)
///   ├─ auth_settings (AuthSettings)
///   ├─ credential_store / refresh_token_store / login_attempt_store
///   ├─ password_hasher (Arc<dyn PasswordHasher>)
///   └─ token_provider (Arc<TokenProvider>)
///   ↓ wrapped in Arc<AppData>
///   ├─ AuthCoordinator::new(app_data)
///   ├─ AccessGuard::new(app_data)
///   └─ AdminCoordinator::new(app_data)
/// ```
pub struct AppData {
    pub connections: DatabaseConnections,
    pub secret_manager: Arc<SecretManager>,
    pub auth_settings: AuthSettings,
    pub credential_store: Arc<CredentialStore>,
    pub refresh_token_store: Arc<RefreshTokenStore>,
    pub login_attempt_store: Arc<LoginAttemptStore>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub password_policy: PasswordPolicy,
    pub token_provider: Arc<TokenProvider>,
}

impl AppData {
    /// Build application data from already connected (and migrated) databases
    pub fn init(
        connections: DatabaseConnections,
        env: &dyn EnvironmentProvider,
    ) -> Result<Self, AppDataError> {
        tracing::info!("Initializing AppData...");

        let secret_manager = Arc::new(SecretManager::from_env_provider(env)?);
        tracing::debug!("Secret manager initialized: {}", secret_manager);

        let auth_settings = AuthSettings::from_env_provider(env)?;
        tracing::debug!("Auth settings loaded: {:?}", auth_settings);

        let password_hasher: Arc<dyn PasswordHasher> =
            Arc::new(Argon2Hasher::new(secret_manager.password_pepper()));

        let app_data = Self::from_parts(connections, secret_manager, auth_settings, password_hasher);
        tracing::info!("AppData initialization complete");
        Ok(app_data)
    }

    /// Assemble from explicit parts; tests use this to inject a policy and a
    /// cheap hasher
    pub fn from_parts(
        connections: DatabaseConnections,
        secret_manager: Arc<SecretManager>,
        auth_settings: AuthSettings,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let token_provider = Arc::new(TokenProvider::new(secret_manager.clone(), &auth_settings));
        let login_attempt_store = Arc::new(LoginAttemptStore::new(connections.audit.clone()));

        Self {
            connections,
            secret_manager,
            auth_settings,
            credential_store: Arc::new(CredentialStore::new()),
            refresh_token_store: Arc::new(RefreshTokenStore::new()),
            login_attempt_store,
            password_hasher,
            password_policy: PasswordPolicy::default(),
            token_provider,
        }
    }
}
