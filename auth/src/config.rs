use chrono::Duration;
use secrecy::SecretString;

/// Default lifetime of an issued session token.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Longest validity window a deployment may configure (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Immutable token settings, built once at startup.
#[derive(Debug)]
pub struct TokenConfig {
    /// Symmetric signing secret
    pub secret: SecretString,
    /// Validity window applied at issuance
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Token settings with the default 72 hour validity window.
    pub fn with_default_ttl(secret: SecretString) -> Self {
        Self::new(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }
}
