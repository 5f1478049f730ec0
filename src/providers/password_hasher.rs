use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version};
use std::fmt;

use crate::errors::InternalError;

/// One-way adaptive password hashing
///
/// The session manager only sees this trait, so the algorithm and its cost
/// can change without touching login logic.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, InternalError>;

    /// `Ok(false)` for a wrong password or an unparseable stored hash
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, InternalError>;
}

/// Argon2id v0x13 keyed with the server-side pepper
pub struct Argon2Hasher {
    pepper: String,
    params: Params,
}

impl Argon2Hasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self::with_params(pepper, Params::default())
    }

    /// Custom cost parameters; tests use this to stay fast
    pub fn with_params(pepper: impl Into<String>, params: Params) -> Self {
        Self {
            pepper: pepper.into(),
            params,
        }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.pepper.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, InternalError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| InternalError::crypto("password_hash", e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, InternalError> {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return Ok(false);
        };

        match self.argon2()?.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::warn!("Password verification failed: {}", e);
                Ok(false)
            }
        }
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("pepper", &"<redacted>")
            .field("params", &self.params)
            .finish()
    }
}
