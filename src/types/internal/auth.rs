use serde::{Deserialize, Serialize};

use crate::types::internal::role::Role;

/// Access token claims
///
/// `epoch` is compared with the user's current `token_epoch` on every
/// request; a mismatch means the session was invalidated after issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    pub email: String,

    pub role: Role,

    /// Token epoch of the user at issuance time
    pub epoch: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// Access and refresh token issued together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}
