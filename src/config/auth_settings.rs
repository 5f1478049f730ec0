use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ConfigError;
use crate::config::{EnvironmentProvider, SystemEnvironment};

const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Login policy and token lifetimes
///
/// Built once at startup and handed to the session manager and token
/// provider, so each test can run with its own policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Failed attempts that trigger a lock
    pub max_login_attempts: i32,
    pub lock_time_minutes: i64,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
    /// Interval of the expired refresh token sweep, 0 disables it
    pub token_cleanup_interval_minutes: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lock_time_minutes: 15,
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            token_cleanup_interval_minutes: 60,
        }
    }
}

impl AuthSettings {
    pub fn from_env_provider(env: &dyn EnvironmentProvider) -> Result<Self, ConfigError> {
        let max_login_attempts: i32 = ConfigSpec::new(env, "MAX_LOGIN_ATTEMPTS")
            .default_value("5")
            .parse()?;
        if max_login_attempts < 1 {
            return Err(ConfigError::invalid("MAX_LOGIN_ATTEMPTS", "must be at least 1"));
        }

        let lock_time_minutes: i64 = ConfigSpec::new(env, "LOCK_TIME_MINUTES")
            .default_value("15")
            .parse()?;
        if lock_time_minutes < 1 {
            return Err(ConfigError::invalid("LOCK_TIME_MINUTES", "must be at least 1"));
        }

        let access_expr = ConfigSpec::new(env, "JWT_EXPIRES_IN").default_value("15m").load()?;
        let refresh_expr = ConfigSpec::new(env, "REFRESH_TOKEN_EXPIRES_IN")
            .default_value("7d")
            .load()?;

        let token_cleanup_interval_minutes: u64 =
            ConfigSpec::new(env, "TOKEN_CLEANUP_INTERVAL_MINUTES")
                .default_value("60")
                .parse()?;

        Ok(Self {
            max_login_attempts,
            lock_time_minutes,
            access_token_ttl_secs: duration_or_default(
                "JWT_EXPIRES_IN",
                &access_expr,
                DEFAULT_ACCESS_TTL_SECS,
            ),
            refresh_token_ttl_secs: duration_or_default(
                "REFRESH_TOKEN_EXPIRES_IN",
                &refresh_expr,
                DEFAULT_REFRESH_TTL_SECS,
            ),
            token_cleanup_interval_minutes,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_provider(&SystemEnvironment)
    }

    pub fn lock_time_secs(&self) -> i64 {
        self.lock_time_minutes * 60
    }
}

/// Parse a `<integer><unit>` duration expression into seconds
///
/// Units are `d`, `h` and `m`. Returns `None` for anything else.
pub fn parse_duration_expr(expr: &str) -> Option<i64> {
    let expr = expr.trim();
    let unit = expr.chars().last()?;
    let digits = &expr[..expr.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    let multiplier = match unit {
        'd' => 24 * 60 * 60,
        'h' => 60 * 60,
        'm' => 60,
        _ => return None,
    };
    value.checked_mul(multiplier)
}

fn duration_or_default(setting_name: &str, expr: &str, default_secs: i64) -> i64 {
    match parse_duration_expr(expr) {
        Some(secs) => secs,
        None => {
            tracing::warn!(
                "Unrecognized duration '{}' for {}, using {}s",
                expr,
                setting_name,
                default_secs
            );
            default_secs
        }
    }
}
