use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use poem::{Server, listener::TcpListener};

use crm_auth_backend::api::build_routes;
use crm_auth_backend::app_data::AppData;
use crm_auth_backend::cli::{self, Cli, Commands};
use crm_auth_backend::config::{BootstrapSettings, SystemEnvironment, init_logging};
use crm_auth_backend::coordinators::AuthCoordinator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_logging()?;

    let command = Cli::parse().command();
    let bootstrap_settings = BootstrapSettings::from_env()?;

    let connections = cli::migrate::run_migrations(&bootstrap_settings).await?;
    if command == Commands::Migrate {
        return Ok(());
    }

    let app_data = Arc::new(AppData::init(connections, &SystemEnvironment)?);

    if command != Commands::Serve {
        return cli::execute_command(command, app_data).await;
    }

    spawn_token_cleanup(app_data.clone());

    let server_address = bootstrap_settings.server_address();
    let server_url = format!("http://{}", server_address);
    let app = build_routes(app_data, &server_url);

    tracing::info!("Server listening on {}", server_url);
    tracing::info!("Swagger UI available at {}/swagger", server_url);

    Server::new(TcpListener::bind(server_address)).run(app).await?;
    Ok(())
}

/// Periodically delete expired refresh tokens; an interval of 0 disables it
fn spawn_token_cleanup(app_data: Arc<AppData>) {
    let minutes = app_data.auth_settings.token_cleanup_interval_minutes;
    if minutes == 0 {
        tracing::info!("Refresh token cleanup task disabled");
        return;
    }

    let auth = AuthCoordinator::new(app_data);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
        loop {
            interval.tick().await;
            if let Err(e) = auth.cleanup_expired_tokens().await {
                tracing::error!("Refresh token cleanup failed: {}", e);
            }
        }
    });
    tracing::info!(interval_minutes = minutes, "Refresh token cleanup task started");
}
