//! Authentication utilities library
//!
//! Provides the credential primitives used by the credential service:
//! - Password hashing (Argon2id)
//! - Session token issuance and validation (HS256 JWT)
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, TokenConfig};
//! use secrecy::SecretString;
//!
//! let config = TokenConfig::with_default_ttl(SecretString::from("secret_key_at_least_32_bytes_long!".to_string()));
//! let auth = Authenticator::new(&config);
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! let result = auth.authenticate("password123", &hash, 1, "alice@example.com").unwrap();
//!
//! // Validate token
//! let identity = auth.verify_token(&result.access_token).unwrap();
//! assert_eq!(identity.user_id, 1);
//! ```

pub mod authenticator;
pub mod config;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use authenticator::Identity;
pub use config::TokenConfig;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
