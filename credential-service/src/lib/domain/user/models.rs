use std::fmt;
use std::str::FromStr;

use secrecy::ExposeSecret;
use secrecy::SecretString;

use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::UserError;

/// User aggregate entity.
///
/// Represents a registered account. `password_hash` is an opaque PHC string
/// and is never serialized to clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: DisplayName,
    pub password_hash: String,
}

/// A user that has not been assigned an id by storage yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: EmailAddress,
    pub name: DisplayName,
    pub password_hash: String,
}

/// Storage-assigned user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Comparison is
/// case-sensitive, matching what storage holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type, at least two characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MIN_LENGTH: usize = 2;

    /// Create a new valid display name.
    ///
    /// # Errors
    /// * `TooShort` - Name shorter than 2 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        let length = name.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(NameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password that satisfies the length policy.
///
/// Wrapped in a secret so it cannot leak through `Debug` or logs.
#[derive(Debug)]
pub struct Password(SecretString);

impl Password {
    pub const MIN_LENGTH: usize = 8;

    /// Accept a plaintext password if it is long enough.
    ///
    /// `field` names the input in the error message.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    pub fn new(password: String, field: &'static str) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                field,
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        Ok(Self(SecretString::from(password)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Command to register a new account
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub name: DisplayName,
    pub password: Password,
}

impl RegisterCommand {
    /// Validate raw registration input.
    ///
    /// Checks run in order and the first failure is returned: presence of
    /// all fields, email syntax, name length, password length.
    ///
    /// # Errors
    /// * `MissingFields` - Any field is empty
    /// * `InvalidEmail` - Email is not syntactically valid
    /// * `InvalidName` - Name shorter than 2 characters
    /// * `InvalidPassword` - Password shorter than 8 characters
    pub fn new(email: String, password: String, name: String) -> Result<Self, UserError> {
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(UserError::MissingFields);
        }

        let email = EmailAddress::new(email)?;
        let name = DisplayName::new(name)?;
        let password = Password::new(password, "password")?;

        Ok(Self {
            email,
            name,
            password,
        })
    }
}

/// Command to log in with email and password
///
/// Not validated: a malformed email matches no account.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: SecretString,
}

impl LoginCommand {
    pub fn new(email: String, password: String) -> Self {
        Self {
            email,
            password: SecretString::from(password),
        }
    }
}

/// Command to replace the password of the authenticated account
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub old_password: SecretString,
    pub new_password: Password,
}

impl ChangePasswordCommand {
    /// Validate raw password change input.
    ///
    /// # Errors
    /// * `MissingFields` - Either password is empty
    /// * `InvalidPassword` - New password too short or equal to the old one
    pub fn new(old_password: String, new_password: String) -> Result<Self, UserError> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(UserError::MissingFields);
        }

        let unchanged = old_password == new_password;
        let new_password = Password::new(new_password, "new password")?;
        if unchanged {
            return Err(PasswordPolicyError::Unchanged.into());
        }

        Ok(Self {
            old_password: SecretString::from(old_password),
            new_password,
        })
    }
}

/// Outcome of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}
