use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// The stored value is not a parseable PHC hash string.
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}
