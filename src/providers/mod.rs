// Providers layer - Work performers
//
// Providers hold the cryptographic and policy logic that coordinators
// compose. They do not decide login outcomes themselves.

pub mod crypto_provider;
pub mod password_hasher;
pub mod password_policy;
pub mod token_provider;

pub use crypto_provider::CryptoProvider;
pub use password_hasher::{Argon2Hasher, PasswordHasher};
pub use password_policy::PasswordPolicy;
pub use token_provider::TokenProvider;
