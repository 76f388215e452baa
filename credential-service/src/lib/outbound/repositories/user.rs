use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USERS_EMAIL_KEY: &str = "users_email_key";

pub struct PostgresUserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    email: String,
    name: String,
    hashed_password: String,
}

/// Stored rows that no longer pass validation are a storage fault, not bad input.
impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |e: String| {
            UserError::DatabaseError(format!("user {} has an invalid stored value: {}", row.user_id, e))
        };

        Ok(User {
            id: UserId(row.user_id),
            email: EmailAddress::new(row.email).map_err(|e| corrupt(e.to_string()))?,
            name: DisplayName::new(row.name).map_err(|e| corrupt(e.to_string()))?,
            password_hash: row.hashed_password,
        })
    }
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

/// Await a query under the per-call deadline.
async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &str,
    query: F,
) -> Result<Result<T, sqlx::Error>, UserError>
where
    F: Future<Output = Result<T, sqlx::Error>> + Send,
{
    tokio::time::timeout(timeout, query).await.map_err(|_| {
        tracing::error!(
            operation,
            timeout_ms = timeout.as_millis() as u64,
            "Query deadline exceeded"
        );
        UserError::Timeout(operation.to_string())
    })
}

fn map_insert_error(err: sqlx::Error, email: &EmailAddress) -> UserError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(USERS_EMAIL_KEY) {
            return UserError::EmailAlreadyExists(email.to_string());
        }
    }
    UserError::DatabaseError(err.to_string())
}

fn ensure_updated(rows_affected: u64, id: &UserId) -> Result<(), UserError> {
    if rows_affected == 0 {
        return Err(UserError::NotFound(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let user_id: i64 = with_deadline(
            self.query_timeout,
            "create",
            sqlx::query_scalar(
                r#"
                INSERT INTO users (email, name, hashed_password)
                VALUES ($1, $2, $3)
                RETURNING user_id
                "#,
            )
            .bind(user.email.as_str())
            .bind(user.name.as_str())
            .bind(&user.password_hash)
            .fetch_one(&self.pool),
        )
        .await?
        .map_err(|e| map_insert_error(e, &user.email))?;

        Ok(User {
            id: UserId(user_id),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
        })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = with_deadline(
            self.query_timeout,
            "find_by_id",
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT user_id, email, name, hashed_password
                FROM users
                WHERE user_id = $1
                "#,
            )
            .bind(id.0)
            .fetch_optional(&self.pool),
        )
        .await?
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let row = with_deadline(
            self.query_timeout,
            "find_by_email",
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT user_id, email, name, hashed_password
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn update_password(&self, user: &User) -> Result<(), UserError> {
        let result = with_deadline(
            self.query_timeout,
            "update_password",
            sqlx::query(
                r#"
                UPDATE users
                SET hashed_password = $2
                WHERE user_id = $1
                "#,
            )
            .bind(user.id.0)
            .bind(&user.password_hash)
            .execute(&self.pool),
        )
        .await?
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        ensure_updated(result.rows_affected(), &user.id)
    }
}
