// CLI module for administrative operations requiring server access

pub mod accounts;
pub mod migrate;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;

/// CRM authentication backend
#[derive(Parser, Debug)]
#[command(name = "crm-auth")]
#[command(about = "CRM authentication backend and administrative CLI", long_about = None)]
pub struct Cli {
    /// Runs the HTTP server when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Apply pending migrations to both databases and exit
    Migrate,

    /// Delete expired refresh tokens once and exit
    CleanupTokens,

    /// Create an ADMIN account with a generated password
    CreateAdmin {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Clear the failure counter and lock of an account
    Unlock {
        #[arg(long)]
        user_id: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Execute a one-shot CLI command
///
/// `Serve` and `Migrate` are handled by `main` before AppData exists.
pub async fn execute_command(
    command: Commands,
    app_data: std::sync::Arc<AppData>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::CleanupTokens => accounts::cleanup_tokens(app_data).await?,
        Commands::CreateAdmin { name, email } => {
            accounts::create_admin(app_data, &name, &email).await?
        }
        Commands::Unlock { user_id } => accounts::unlock(app_data, &user_id).await?,
        Commands::Serve | Commands::Migrate => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::parse_from(["crm-auth"]);
        assert_eq!(cli.command(), Commands::Serve);
    }

    #[test]
    fn test_parse_create_admin() {
        let cli = Cli::parse_from([
            "crm-auth",
            "create-admin",
            "--name",
            "Ana",
            "--email",
            "ana@example.com",
        ]);
        assert_eq!(
            cli.command(),
            Commands::CreateAdmin {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string()
            }
        );
    }

    #[test]
    fn test_parse_unlock_and_cleanup() {
        let cli = Cli::parse_from(["crm-auth", "unlock", "--user-id", "abc"]);
        assert_eq!(cli.command(), Commands::Unlock { user_id: "abc".to_string() });

        let cli = Cli::parse_from(["crm-auth", "cleanup-tokens"]);
        assert_eq!(cli.command(), Commands::CleanupTokens);
    }
}
