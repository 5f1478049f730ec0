// API layer - HTTP endpoints
pub mod admin;
pub mod auth;
pub mod health;

use std::sync::Arc;

pub use admin::AdminApi;
pub use auth::{AuthApi, BearerAuth};
pub use health::HealthApi;

use poem::Route;
use poem_openapi::OpenApiService;

use crate::app_data::AppData;
use crate::coordinators::{AccessGuard, AdminCoordinator, AuthCoordinator};

/// Mount the OpenAPI service under `/api` and Swagger UI under `/swagger`
pub fn build_routes(app_data: Arc<AppData>, server_url: &str) -> Route {
    let auth_coordinator = Arc::new(AuthCoordinator::new(app_data.clone()));
    let admin_coordinator = Arc::new(AdminCoordinator::new(app_data.clone()));
    let health_api = HealthApi::new(app_data.connections.clone());
    let access_guard = Arc::new(AccessGuard::new(app_data));

    let auth_api = AuthApi::new(auth_coordinator, admin_coordinator.clone(), access_guard.clone());
    let admin_api = AdminApi::new(admin_coordinator, access_guard);

    let api_service = OpenApiService::new(
        (health_api, auth_api, admin_api),
        "CRM Auth API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/api", server_url));

    let ui = api_service.swagger_ui();

    Route::new()
        .nest("/api", api_service)
        .nest("/swagger", ui)
}
