use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Identity assertion carried inside a session token.
///
/// `user_id` travels as a decimal string so that the full `i64` range
/// survives JSON number handling in any client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for an authenticated user.
    ///
    /// # Arguments
    /// * `user_id` - Storage-assigned user identifier
    /// * `email` - User email address
    /// * `issued_at` - Issuance instant
    /// * `validity` - How long the token stays valid after `issued_at`
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiry falls outside the representable time range
    pub fn for_user(
        user_id: i64,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = issued_at.checked_add_signed(validity).ok_or_else(|| {
            JwtError::EncodingFailed("token expiry out of range".to_string())
        })?;

        Ok(Self {
            user_id: user_id.to_string(),
            email: email.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Parse the user identifier back into its numeric form.
    ///
    /// # Errors
    /// * `Malformed` - `user_id` is not a decimal `i64`
    pub fn numeric_user_id(&self) -> Result<i64, JwtError> {
        self.user_id
            .parse::<i64>()
            .map_err(|e| JwtError::Malformed(format!("invalid user_id claim: {}", e)))
    }
}
