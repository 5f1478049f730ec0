use chrono::Utc;
use poem_openapi::{OpenApi, Tags, payload::Json};
use sea_orm::DatabaseConnection;

use crate::config::DatabaseConnections;
use crate::types::dto::common::HealthResponse;

/// Health check API
pub struct HealthApi {
    connections: DatabaseConnections,
}

impl HealthApi {
    pub fn new(connections: DatabaseConnections) -> Self {
        Self { connections }
    }
}

/// API tags for health endpoints
#[derive(Tags)]
enum ApiTags {
    /// Health check endpoints
    Health,
}

#[OpenApi]
impl HealthApi {
    /// Service status with the reachability of the auth and audit databases
    ///
    /// `status` is `degraded` when either database does not answer.
    #[oai(path = "/health", method = "get", tag = "ApiTags::Health")]
    async fn health(&self) -> Json<HealthResponse> {
        let auth_database = database_state("auth", &self.connections.auth).await;
        let audit_database = database_state("audit", &self.connections.audit).await;
        let status = if auth_database == "up" && audit_database == "up" {
            "healthy"
        } else {
            "degraded"
        };

        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            auth_database: auth_database.to_string(),
            audit_database: audit_database.to_string(),
        })
    }
}

async fn database_state(name: &str, conn: &DatabaseConnection) -> &'static str {
    match conn.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::error!(database = name, "Health check ping failed: {}", e);
            "down"
        }
    }
}
