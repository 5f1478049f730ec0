use std::sync::Arc;

use poem_openapi::param::Path;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::api::auth::BearerAuth;
use crate::coordinators::{AccessGuard, AdminCoordinator};
use crate::errors::AuthError;
use crate::types::dto::admin::{CreateUserApiResponse, CreateUserRequest, SetUserStatusRequest};
use crate::types::dto::auth::UserResponse;
use crate::types::dto::common::MessageResponse;
use crate::types::internal::IdentityContext;

/// Admin user management API endpoints
pub struct AdminApi {
    admin_coordinator: Arc<AdminCoordinator>,
    access_guard: Arc<AccessGuard>,
}

impl AdminApi {
    pub fn new(admin_coordinator: Arc<AdminCoordinator>, access_guard: Arc<AccessGuard>) -> Self {
        Self {
            admin_coordinator,
            access_guard,
        }
    }

    async fn actor(&self, auth: &BearerAuth) -> Result<IdentityContext, AuthError> {
        Ok(self.access_guard.require_admin(&auth.0.token).await?)
    }
}

/// API tags for admin endpoints
#[derive(Tags)]
enum AdminTags {
    /// Admin user management
    Admin,
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// Create a user with any role
    #[oai(path = "/users", method = "post", tag = "AdminTags::Admin")]
    async fn create_user(
        &self,
        auth: BearerAuth,
        body: Json<CreateUserRequest>,
    ) -> Result<CreateUserApiResponse, AuthError> {
        let actor = self.actor(&auth).await?;
        let user = self
            .admin_coordinator
            .create_user(&actor, &body.name, &body.email, &body.password, body.role)
            .await?;
        Ok(CreateUserApiResponse::Created(Json(UserResponse::from(user))))
    }

    /// Activate or deactivate a user
    #[oai(path = "/users/:user_id/status", method = "put", tag = "AdminTags::Admin")]
    async fn set_status(
        &self,
        auth: BearerAuth,
        user_id: Path<String>,
        body: Json<SetUserStatusRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let actor = self.actor(&auth).await?;
        self.admin_coordinator
            .set_user_active(&actor, &user_id, body.active)
            .await?;
        let message = if body.active {
            "Usuário ativado com sucesso"
        } else {
            "Usuário desativado com sucesso"
        };
        Ok(Json(MessageResponse::new(message)))
    }

    /// Delete a user and all of their sessions
    #[oai(path = "/users/:user_id", method = "delete", tag = "AdminTags::Admin")]
    async fn delete_user(
        &self,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let actor = self.actor(&auth).await?;
        self.admin_coordinator.delete_user(&actor, &user_id).await?;
        Ok(Json(MessageResponse::new("Usuário removido com sucesso")))
    }

    /// Sign a user out of every device
    #[oai(path = "/users/:user_id/logout-all", method = "post", tag = "AdminTags::Admin")]
    async fn force_logout(
        &self,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let actor = self.actor(&auth).await?;
        self.admin_coordinator.force_logout(&actor, &user_id).await?;
        Ok(Json(MessageResponse::new(
            "Logout realizado em todos os dispositivos",
        )))
    }
}
