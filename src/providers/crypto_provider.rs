use hmac::{Hmac, Mac};
use rand::Rng;
use rand::seq::SliceRandom;
use sha2::Sha256;

use crate::errors::InternalError;

type HmacSha256 = Hmac<Sha256>;

const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

/// Cryptographic helpers shared by the token provider and the CLI
#[derive(Debug, Default, Clone)]
pub struct CryptoProvider;

impl CryptoProvider {
    pub fn new() -> Self {
        Self
    }

    /// HMAC-SHA256 of `token` under `key`, hex encoded
    pub fn hmac_sha256_token(&self, key: &str, token: &str) -> Result<String, InternalError> {
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| InternalError::crypto("hmac_init", e.to_string()))?;
        mac.update(token.as_bytes());
        Ok(format!("{:x}", mac.finalize().into_bytes()))
    }

    /// Random password that always satisfies the password policy
    ///
    /// 20 characters with at least one uppercase letter, one lowercase
    /// letter and one digit. Ambiguous glyphs (I, O, l, 0, 1) are left out
    /// because the value is read off a terminal.
    pub fn generate_secure_password(&self) -> String {
        const PASSWORD_LENGTH: usize = 20;

        let mut rng = rand::rng();
        let mut pick = |set: &[u8]| set[rng.random_range(0..set.len())];

        let mut chars: Vec<u8> = vec![pick(UPPERCASE), pick(LOWERCASE), pick(DIGITS)];
        let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS].concat();
        while chars.len() < PASSWORD_LENGTH {
            chars.push(pick(all.as_slice()));
        }
        chars.shuffle(&mut rand::rng());

        chars.into_iter().map(char::from).collect()
    }
}
