use std::str::FromStr;

use crate::config::EnvironmentProvider;
use crate::config::errors::ConfigError;

/// Where a loaded setting value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValueSource {
    EnvironmentVariable { name: String },
    Default,
}

#[derive(Debug, Clone)]
pub struct ConfigValue {
    pub value: String,
    pub source: ConfigValueSource,
}

/// Specification of one environment-backed setting
///
/// Priority is environment variable, then default. Validation runs on
/// whichever value wins.
pub struct ConfigSpec<'a> {
    env: &'a dyn EnvironmentProvider,
    name: String,
    default_value: Option<String>,
    required: bool,
    validator: Option<fn(&str) -> Result<(), String>>,
}

impl<'a> ConfigSpec<'a> {
    pub fn new(env: &'a dyn EnvironmentProvider, name: &str) -> Self {
        Self {
            env,
            name: name.to_string(),
            default_value: None,
            required: false,
            validator: None,
        }
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    pub fn load_with_source(&self) -> Result<ConfigValue, ConfigError> {
        let loaded = match self.env.get_var(&self.name) {
            Some(value) => Some(ConfigValue {
                value,
                source: ConfigValueSource::EnvironmentVariable {
                    name: self.name.clone(),
                },
            }),
            None => self.default_value.clone().map(|value| ConfigValue {
                value,
                source: ConfigValueSource::Default,
            }),
        };

        let Some(loaded) = loaded else {
            if self.required {
                return Err(ConfigError::MissingSetting {
                    setting_name: self.name.clone(),
                });
            }
            return Ok(ConfigValue {
                value: String::new(),
                source: ConfigValueSource::Default,
            });
        };

        if let Some(validator) = self.validator {
            validator(&loaded.value).map_err(|reason| ConfigError::invalid(&self.name, reason))?;
        }

        Ok(loaded)
    }

    pub fn load(&self) -> Result<String, ConfigError> {
        Ok(self.load_with_source()?.value)
    }

    /// Load and parse with `FromStr`
    pub fn parse<T>(&self) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.load()?;
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::parse(&self.name, format!("'{}': {}", value, e)))
    }

    pub fn validate_host_address(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("host cannot be empty".to_string());
        }
        if value.contains(char::is_whitespace) {
            return Err("host cannot contain whitespace".to_string());
        }
        Ok(())
    }

    pub fn validate_non_empty(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err("value cannot be empty".to_string())
        } else {
            Ok(())
        }
    }
}
