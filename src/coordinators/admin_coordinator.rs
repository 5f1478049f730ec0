use std::sync::Arc;

use crate::app_data::AppData;
use crate::config::DatabaseConnections;
use crate::coordinators::AuthCoordinator;
use crate::errors::InternalError;
use crate::errors::internal::{AuthorizationError, CredentialError};
use crate::stores::CredentialStore;
use crate::types::db::login_attempt;
use crate::types::internal::{IdentityContext, LoginLogFilter, Role, UserSummary};

/// Administrative overrides around the session core
///
/// Every operation takes the acting identity and checks it holds ADMIN,
/// so a caller that skipped the route gate still cannot reach them.
pub struct AdminCoordinator {
    connections: DatabaseConnections,
    credential_store: Arc<CredentialStore>,
    auth: AuthCoordinator,
}

impl AdminCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            credential_store: app_data.credential_store.clone(),
            auth: AuthCoordinator::new(app_data),
        }
    }

    /// Create an account with an explicit role
    pub async fn create_user(
        &self,
        actor: &IdentityContext,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<UserSummary, InternalError> {
        actor.require_role(Role::Admin)?;
        let user = self.auth.create_account(name, email, password, role).await?;
        tracing::info!(actor_id = %actor.id, user_id = %user.id, role = %role, "User created by admin");
        Ok(UserSummary::from(&user))
    }

    /// Activate or deactivate an account
    ///
    /// Deactivation leaves refresh tokens in place; the guard and refresh
    /// both refuse inactive users, and reactivation resumes the sessions.
    pub async fn set_user_active(
        &self,
        actor: &IdentityContext,
        target_id: &str,
        active: bool,
    ) -> Result<(), InternalError> {
        actor.require_role(Role::Admin)?;
        reject_self(actor, target_id, "set_user_active")?;

        let updated = self
            .credential_store
            .set_active(&self.connections.auth, target_id, active)
            .await?;
        if updated == 0 {
            return Err(CredentialError::UserNotFound(target_id.to_owned()).into());
        }
        tracing::info!(actor_id = %actor.id, user_id = target_id, active, "User status changed");
        Ok(())
    }

    /// Hard delete; refresh tokens go with the user row
    pub async fn delete_user(
        &self,
        actor: &IdentityContext,
        target_id: &str,
    ) -> Result<(), InternalError> {
        actor.require_role(Role::Admin)?;
        reject_self(actor, target_id, "delete_user")?;

        let deleted = self
            .credential_store
            .delete_user(&self.connections.auth, target_id)
            .await?;
        if deleted == 0 {
            return Err(CredentialError::UserNotFound(target_id.to_owned()).into());
        }
        tracing::warn!(actor_id = %actor.id, user_id = target_id, "User deleted");
        Ok(())
    }

    pub async fn force_logout(
        &self,
        actor: &IdentityContext,
        target_id: &str,
    ) -> Result<u64, InternalError> {
        actor.require_role(Role::Admin)?;
        let revoked = self.auth.logout_all_devices(target_id).await?;
        tracing::info!(actor_id = %actor.id, user_id = target_id, revoked, "Forced logout");
        Ok(revoked)
    }

    pub async fn unlock_account(
        &self,
        actor: &IdentityContext,
        target_id: &str,
    ) -> Result<(), InternalError> {
        actor.require_role(Role::Admin)?;
        self.auth.unlock_account(target_id).await
    }

    pub async fn get_login_logs(
        &self,
        actor: &IdentityContext,
        filter: &LoginLogFilter,
    ) -> Result<Vec<login_attempt::Model>, InternalError> {
        actor.require_role(Role::Admin)?;
        self.auth.get_login_logs(filter).await
    }
}

fn reject_self(actor: &IdentityContext, target_id: &str, action: &str) -> Result<(), InternalError> {
    if actor.id == target_id {
        return Err(AuthorizationError::SelfTargeted {
            action: action.to_string(),
        }
        .into());
    }
    Ok(())
}
