use thiserror::Error;

/// Errors raised while loading settings at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Setting '{setting_name}' is invalid: {reason}")]
    InvalidSetting {
        setting_name: String,
        reason: String,
    },

    #[error("Setting '{setting_name}' could not be parsed: {error}")]
    ParseError { setting_name: String, error: String },

    #[error("Required setting '{setting_name}' has no value")]
    MissingSetting { setting_name: String },
}

impl ConfigError {
    pub fn invalid(setting_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting_name: setting_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn parse(setting_name: &str, error: impl ToString) -> Self {
        Self::ParseError {
            setting_name: setting_name.to_string(),
            error: error.to_string(),
        }
    }
}
