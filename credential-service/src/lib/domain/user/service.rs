use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use secrecy::ExposeSecret;

use crate::domain::user::models::AuthSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::CredentialServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for the credential lifecycle.
///
/// Concrete implementation of CredentialServicePort with dependency injection.
pub struct CredentialService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> CredentialService<UR>
where
    UR: UserRepository,
{
    /// Create a new credential service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hasher and token issuer
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    /// Run hashing work off the async workers.
    ///
    /// Argon2 is deliberately slow; no deadline is applied here.
    async fn with_authenticator<T, F>(&self, task: F) -> Result<T, UserError>
    where
        F: FnOnce(&Authenticator) -> Result<T, UserError> + Send + 'static,
        T: Send + 'static,
    {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || task(&authenticator))
            .await
            .map_err(|e| UserError::Unknown(format!("Credential task failed: {}", e)))?
    }

    fn open_session(&self, user: User) -> Result<AuthSession, UserError> {
        let token = self
            .authenticator
            .issue_token(user.id.0, user.email.as_str())?;
        Ok(AuthSession { token, user })
    }
}

#[async_trait]
impl<UR> CredentialServicePort for CredentialService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, UserError> {
        let RegisterCommand {
            email,
            name,
            password,
        } = command;

        // Advisory only; the unique constraint decides under concurrency.
        if self
            .repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(UserError::EmailAlreadyExists(email.to_string()));
        }

        let password_hash = self
            .with_authenticator(move |auth| Ok(auth.hash_password(password.expose())?))
            .await?;

        let user = self
            .repository
            .create(NewUser {
                email,
                name,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        self.open_session(user)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, UserError> {
        let LoginCommand { email, password } = command;

        let Some(user) = self.repository.find_by_email(&email).await? else {
            self.with_authenticator(move |auth| {
                auth.verify_decoy(password.expose_secret());
                Ok(())
            })
            .await?;
            return Err(UserError::InvalidCredentials);
        };

        let stored_hash = user.password_hash.clone();
        let user_id = user.id.0;
        let token_email = user.email.to_string();
        let result = self
            .with_authenticator(move |auth| {
                Ok(auth.authenticate(
                    password.expose_secret(),
                    &stored_hash,
                    user_id,
                    &token_email,
                )?)
            })
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            token: result.access_token,
            user,
        })
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        let mut user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UserError::NotFound(user_id.to_string()))?;

        let ChangePasswordCommand {
            old_password,
            new_password,
        } = command;
        let stored_hash = user.password_hash.clone();

        user.password_hash = self
            .with_authenticator(move |auth| {
                if !auth.verify_password(old_password.expose_secret(), &stored_hash)? {
                    return Err(UserError::WrongOldPassword);
                }
                Ok(auth.hash_password(new_password.expose())?)
            })
            .await?;

        self.repository.update_password(&user).await?;

        tracing::info!(user_id = %user.id, "Password changed");

        Ok(())
    }
}
