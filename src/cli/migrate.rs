use crate::config::{BootstrapSettings, DatabaseConnections};

/// Connect to both databases and run all pending migrations
///
/// Does not initialize AppData, so secrets are not required.
pub async fn run_migrations(
    bootstrap_settings: &BootstrapSettings,
) -> Result<DatabaseConnections, Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    let connections = DatabaseConnections::init(bootstrap_settings).await?;
    connections.migrate().await?;

    tracing::info!("All migrations completed successfully");
    Ok(connections)
}
