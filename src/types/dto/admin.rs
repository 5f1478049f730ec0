use poem_openapi::{ApiResponse, Object, payload::Json};

use crate::types::dto::auth::UserResponse;
use crate::types::internal::Role;

/// Admin-initiated user creation; role is selectable
#[derive(Object, Debug)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(ApiResponse)]
pub enum CreateUserApiResponse {
    /// User created
    #[oai(status = 201)]
    Created(Json<UserResponse>),
}

/// Activate or deactivate an account
#[derive(Object, Debug)]
pub struct SetUserStatusRequest {
    pub active: bool,
}
