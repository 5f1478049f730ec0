use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::config::BootstrapSettings;
use crate::errors::InternalError;

/// Connections to the auth database and the separate audit database
#[derive(Debug, Clone)]
pub struct DatabaseConnections {
    pub auth: DatabaseConnection,
    pub audit: DatabaseConnection,
}

impl DatabaseConnections {
    /// Connect to both databases
    ///
    /// Does NOT run migrations - call `migrate()` separately.
    pub async fn init(bootstrap_settings: &BootstrapSettings) -> Result<Self, InternalError> {
        Self::connect(
            bootstrap_settings.database_url(),
            bootstrap_settings.audit_database_url(),
        )
        .await
    }

    pub async fn connect(auth_url: &str, audit_url: &str) -> Result<Self, InternalError> {
        let auth = Database::connect(auth_url)
            .await
            .map_err(|e| InternalError::database("connect_database", e))?;
        tracing::debug!("Connected to auth database: {}", auth_url);

        let audit = Database::connect(audit_url)
            .await
            .map_err(|e| InternalError::database("connect_audit_database", e))?;
        tracing::debug!("Connected to audit database: {}", audit_url);

        Ok(Self { auth, audit })
    }

    pub fn from_parts(auth: DatabaseConnection, audit: DatabaseConnection) -> Self {
        Self { auth, audit }
    }

    /// Run all pending migrations on both databases
    pub async fn migrate(&self) -> Result<(), InternalError> {
        AuthMigrator::up(&self.auth, None)
            .await
            .map_err(|e| InternalError::database("run_migrations", e))?;
        tracing::debug!("Auth database migrations completed");

        AuditMigrator::up(&self.audit, None)
            .await
            .map_err(|e| InternalError::database("run_audit_migrations", e))?;
        tracing::debug!("Audit database migrations completed");

        Ok(())
    }

    pub async fn begin_auth_transaction(&self) -> Result<DatabaseTransaction, InternalError> {
        self.auth
            .begin()
            .await
            .map_err(|e| InternalError::transaction("begin_auth_transaction", e))
    }
}

pub async fn commit_transaction(
    txn: DatabaseTransaction,
    operation: &str,
) -> Result<(), InternalError> {
    txn.commit()
        .await
        .map_err(|e| InternalError::transaction(operation, e))
}
