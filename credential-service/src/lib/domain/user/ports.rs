use async_trait::async_trait;

use crate::domain::user::models::AuthSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for credential lifecycle operations.
#[async_trait]
pub trait CredentialServicePort: Send + Sync + 'static {
    /// Register a new account and open a session for it.
    ///
    /// # Arguments
    /// * `command` - Validated email, name, and password
    ///
    /// # Returns
    /// Session token and the persisted user
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered, including when a
    ///   concurrent registration wins the insert
    /// * `Password` / `Token` / `DatabaseError` / `Timeout` - Internal failure
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, UserError>;

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishably
    /// * `Password` / `Token` / `DatabaseError` / `Timeout` - Internal failure
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, UserError>;

    /// Replace the password of an authenticated account.
    ///
    /// # Arguments
    /// * `user_id` - Identity taken from the verified token, never from the body
    /// * `command` - Old and new password
    ///
    /// # Errors
    /// * `WrongOldPassword` - Old password does not match
    /// * `NotFound` - Account vanished after the token was issued
    /// * `Password` / `DatabaseError` / `Timeout` - Internal failure
    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Returns
    /// The stored user carrying its assigned id
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Unique constraint on email rejected the insert
    /// * `DatabaseError` - Database operation failed
    /// * `Timeout` - Query deadline exceeded
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    /// * `Timeout` - Query deadline exceeded
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by email address (exact, case-sensitive match).
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    /// * `Timeout` - Query deadline exceeded
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// Overwrite the stored password hash of `user`.
    ///
    /// # Errors
    /// * `NotFound` - No row was updated
    /// * `DatabaseError` - Database operation failed
    /// * `Timeout` - Query deadline exceeded
    async fn update_password(&self, user: &User) -> Result<(), UserError>;
}
