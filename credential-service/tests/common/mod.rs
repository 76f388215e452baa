use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenConfig;
use credential_service::config::ServerConfig;
use credential_service::domain::user::models::NewUser;
use credential_service::domain::user::models::User;
use credential_service::domain::user::models::UserId;
use credential_service::domain::user::ports::UserRepository;
use credential_service::domain::user::service::CredentialService;
use credential_service::inbound::http::router::create_router;
use credential_service::user::errors::UserError;
use secrecy::SecretString;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const TEST_BODY_LIMIT: usize = 4 * 1024;

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
}

/// Storage double with the same uniqueness guarantee as the users table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    next_id: i64,
    users: HashMap<i64, User>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .values()
            .any(|existing| existing.email.as_str() == user.email.as_str())
        {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }

        state.next_id += 1;
        let created = User {
            id: UserId(state.next_id),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
        };
        state.users.insert(created.id.0, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.state.lock().unwrap().users.get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned())
    }

    async fn update_password(&self, user: &User) -> Result<(), UserError> {
        let mut state = self.state.lock().unwrap();
        match state.users.get_mut(&user.id.0) {
            Some(stored) => {
                stored.password_hash = user.password_hash.clone();
                Ok(())
            }
            None => Err(UserError::NotFound(user.id.to_string())),
        }
    }
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server = ServerConfig {
            http_port: port,
            body_limit_bytes: TEST_BODY_LIMIT,
            request_timeout_secs: 10,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        };

        let authenticator = Arc::new(Authenticator::new(&TokenConfig::with_default_ttl(
            SecretString::from(TEST_SECRET.to_string()),
        )));
        let repository = Arc::new(InMemoryUserRepository::default());
        let credential_service = Arc::new(CredentialService::new(
            repository,
            Arc::clone(&authenticator),
        ));

        let router = create_router(credential_service, Arc::clone(&authenticator), &server);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            authenticator,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, email: &str, password: &str, name: &str) -> serde_json::Value {
        let response = self
            .post("/register")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "name": name
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the raw response
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/login")
            .json(&serde_json::json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
