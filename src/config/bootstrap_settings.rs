use std::fmt;

use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ConfigError;
use crate::config::{EnvironmentProvider, SystemEnvironment};

/// Bootstrap settings for infrastructure configuration
pub struct BootstrapSettings {
    database_url: String,
    audit_database_url: String,
    server_host: String,
    server_port: u16,
}

impl BootstrapSettings {
    pub fn from_env_provider(env: &dyn EnvironmentProvider) -> Result<Self, ConfigError> {
        let database_url = ConfigSpec::new(env, "DATABASE_URL")
            .default_value("sqlite://auth.db?mode=rwc")
            .validator(ConfigSpec::validate_non_empty)
            .load()?;

        let audit_database_url = ConfigSpec::new(env, "AUDIT_DATABASE_URL")
            .default_value("sqlite://audit.db?mode=rwc")
            .validator(ConfigSpec::validate_non_empty)
            .load()?;

        let server_host = ConfigSpec::new(env, "HOST")
            .default_value("0.0.0.0")
            .validator(ConfigSpec::validate_host_address)
            .load()?;

        let server_port: u16 = ConfigSpec::new(env, "PORT").default_value("3000").parse()?;
        if server_port == 0 {
            return Err(ConfigError::invalid("PORT", "port must be between 1 and 65535"));
        }

        Ok(Self {
            database_url,
            audit_database_url,
            server_host,
            server_port,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_provider(&SystemEnvironment)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn audit_database_url(&self) -> &str {
        &self.audit_database_url
    }

    pub fn server_host(&self) -> &str {
        &self.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("database_url", &self.database_url)
            .field("audit_database_url", &self.audit_database_url)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}
