use std::fmt;

use thiserror::Error;

use crate::config::{EnvironmentProvider, SystemEnvironment};

/// Secret-related startup failures
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Required secret '{secret_name}' is missing")]
    Missing { secret_name: String },

    #[error("Secret '{secret_name}' must be at least {expected} characters, got {actual}")]
    InvalidLength {
        secret_name: String,
        expected: usize,
        actual: usize,
    },
}

/// Name and minimum length of one required secret
struct SecretSpec {
    name: &'static str,
    min_length: usize,
}

const JWT_SECRET: SecretSpec = SecretSpec {
    name: "JWT_SECRET",
    min_length: 32,
};

const PASSWORD_PEPPER: SecretSpec = SecretSpec {
    name: "PASSWORD_PEPPER",
    min_length: 16,
};

const REFRESH_TOKEN_SECRET: SecretSpec = SecretSpec {
    name: "REFRESH_TOKEN_SECRET",
    min_length: 32,
};

/// Centralized manager for application secrets
pub struct SecretManager {
    jwt_secret: String,
    password_pepper: String,
    refresh_token_secret: String,
}

impl SecretManager {
    /// Load and validate all secrets from the process environment
    pub fn init() -> Result<Self, SecretError> {
        Self::from_env_provider(&SystemEnvironment)
    }

    pub fn from_env_provider(env: &dyn EnvironmentProvider) -> Result<Self, SecretError> {
        Ok(Self {
            jwt_secret: Self::load_secret(env, &JWT_SECRET)?,
            password_pepper: Self::load_secret(env, &PASSWORD_PEPPER)?,
            refresh_token_secret: Self::load_secret(env, &REFRESH_TOKEN_SECRET)?,
        })
    }

    /// Signing key for access tokens
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Server-side secret mixed into every password hash
    pub fn password_pepper(&self) -> &str {
        &self.password_pepper
    }

    /// HMAC key used to hash refresh tokens before storage
    pub fn refresh_token_secret(&self) -> &str {
        &self.refresh_token_secret
    }

    fn load_secret(env: &dyn EnvironmentProvider, spec: &SecretSpec) -> Result<String, SecretError> {
        let value = env.get_var(spec.name).ok_or_else(|| SecretError::Missing {
            secret_name: spec.name.to_string(),
        })?;

        if value.len() < spec.min_length {
            return Err(SecretError::InvalidLength {
                secret_name: spec.name.to_string(),
                expected: spec.min_length,
                actual: value.len(),
            });
        }

        Ok(value)
    }
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("jwt_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretManager {{ secrets_loaded: 3 }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    const VALID_JWT: &str = "this-is-a-valid-jwt-secret-with-32-characters";
    const VALID_PEPPER: &str = "valid-pepper-16ch";
    const VALID_REFRESH: &str = "refresh-token-secret-with-32-characters";

    fn valid_env() -> MockEnvironment {
        MockEnvironment::empty().with_vars(&[
            ("JWT_SECRET", VALID_JWT),
            ("PASSWORD_PEPPER", VALID_PEPPER),
            ("REFRESH_TOKEN_SECRET", VALID_REFRESH),
        ])
    }

    #[test]
    fn test_successful_initialization_with_valid_secrets() {
        let manager = SecretManager::from_env_provider(&valid_env()).unwrap();

        assert_eq!(manager.jwt_secret(), VALID_JWT);
        assert_eq!(manager.password_pepper(), VALID_PEPPER);
        assert_eq!(manager.refresh_token_secret(), VALID_REFRESH);
    }

    #[test]
    fn test_error_when_secret_missing() {
        let env = MockEnvironment::empty().with_vars(&[
            ("JWT_SECRET", VALID_JWT),
            ("REFRESH_TOKEN_SECRET", VALID_REFRESH),
        ]);

        match SecretManager::from_env_provider(&env) {
            Err(SecretError::Missing { secret_name }) => assert_eq!(secret_name, "PASSWORD_PEPPER"),
            other => panic!("Expected Missing error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_error_when_jwt_secret_too_short() {
        let env = valid_env().with_var("JWT_SECRET", "short-secret");

        match SecretManager::from_env_provider(&env) {
            Err(SecretError::InvalidLength {
                secret_name,
                expected,
                actual,
            }) => {
                assert_eq!(secret_name, "JWT_SECRET");
                assert_eq!(expected, 32);
                assert_eq!(actual, 12);
            }
            other => panic!("Expected InvalidLength error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_debug_and_display_redact_secrets() {
        let manager = SecretManager::from_env_provider(&valid_env()).unwrap();
        let debug = format!("{:?}", manager);
        let display = format!("{}", manager);

        for secret in [VALID_JWT, VALID_PEPPER, VALID_REFRESH] {
            assert!(!debug.contains(secret));
            assert!(!display.contains(secret));
        }
        assert!(debug.contains("<redacted>"));
    }
}
