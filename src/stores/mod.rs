// Stores layer - Data access and repository pattern
pub mod credential_store;
pub mod login_attempt_store;
pub mod refresh_token_store;

pub use credential_store::{CredentialStore, NewUser};
pub use login_attempt_store::{LoginAttemptStore, NewLoginAttempt};
pub use refresh_token_store::{NewRefreshToken, RefreshTokenStore};
