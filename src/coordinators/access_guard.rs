use std::sync::Arc;

use crate::app_data::AppData;
use crate::config::DatabaseConnections;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::providers::TokenProvider;
use crate::stores::CredentialStore;
use crate::types::internal::{IdentityContext, Role};

/// Gate for authenticated routes
///
/// A token is accepted only if its signature and expiry hold, its user still
/// exists and is active, and its epoch equals the user's current epoch.
pub struct AccessGuard {
    connections: DatabaseConnections,
    credential_store: Arc<CredentialStore>,
    token_provider: Arc<TokenProvider>,
}

impl AccessGuard {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            credential_store: app_data.credential_store.clone(),
            token_provider: app_data.token_provider.clone(),
        }
    }

    pub async fn authenticate(&self, access_token: &str) -> Result<IdentityContext, InternalError> {
        let claims = self.token_provider.validate_access_token(access_token)?;

        let user = match self
            .credential_store
            .find_by_id(&self.connections.auth, &claims.sub)
            .await?
        {
            Some(user) if user.active => user,
            _ => {
                tracing::debug!(user_id = %claims.sub, "Access rejected: user missing or inactive");
                return Err(CredentialError::UserUnavailable.into());
            }
        };

        if claims.epoch != user.token_epoch {
            tracing::debug!(
                user_id = %user.id,
                token_epoch = claims.epoch,
                current_epoch = user.token_epoch,
                "Access rejected: stale token epoch"
            );
            return Err(CredentialError::SessionExpired.into());
        }

        Ok(IdentityContext::from(&user))
    }

    /// Authenticate and require the ADMIN role
    pub async fn require_admin(&self, access_token: &str) -> Result<IdentityContext, InternalError> {
        let identity = self.authenticate(access_token).await?;
        identity.require_role(Role::Admin)?;
        Ok(identity)
    }
}
