//! User service
//!
//! Business logic for accounts and authentication:
//! - Registration with duplicate-email detection
//! - Login with credential verification and token issuance
//! - Token validation
//! - Login history recording

use crate::db::repositories::{LoginLogRepository, UserRepository};
use crate::models::{LoginLog, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{Claims, TokenService};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    /// Create a new registration input
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

impl LoginInput {
    /// Create a new login input
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            user_agent: None,
        }
    }
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    login_log_repo: Arc<dyn LoginLogRepository>,
    token_service: Arc<TokenService>,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        login_log_repo: Arc<dyn LoginLogRepository>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            user_repo,
            login_log_repo,
            token_service,
        }
    }

    /// Register a new user
    ///
    /// Everyone registers as a Student; admin and staff accounts are
    /// provisioned directly in the store.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if email or password is empty or malformed
    /// - `EmailTaken` if the email is already registered
    /// - `InternalError` for database errors
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::EmailTaken(input.email));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.email, password_hash, UserRole::Student);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, "Registered new user");
        Ok(created)
    }

    /// Login with credentials
    ///
    /// Verifies the password, records a login log entry, and issues a
    /// fresh token. The same error is returned for unknown emails and
    /// wrong passwords so the endpoint does not leak which one failed.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if credentials are invalid
    /// - `InternalError` for database errors
    pub async fn login(&self, input: LoginInput) -> Result<(User, String), UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to get user by email")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid email or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self
            .token_service
            .issue(&user)
            .context("Failed to issue token")?;

        // Login history is fire-and-forget; a failed insert must not
        // block or fail the login itself.
        let log = LoginLog::new(user.id, input.user_agent);
        let log_repo = self.login_log_repo.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            if let Err(e) = log_repo.create(&log).await {
                tracing::warn!(user_id, error = %e, "Failed to record login log");
            }
        });

        Ok((user, token))
    }

    /// Validate a token and return the associated user.
    ///
    /// Returns `None` if the token is invalid, expired, or its user no
    /// longer exists.
    pub async fn validate_token(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let claims = match self.token_service.verify(token) {
            Some(claims) => claims,
            None => return Ok(None),
        };

        let user = self
            .user_repo
            .get_by_id(claims.sub)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Decode a token without a user lookup.
    pub fn decode_token(&self, token: &str) -> Option<Claims> {
        self.token_service.verify(token)
    }

    /// Token lifetime in seconds, matching the cookie Max-Age.
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_service.ttl_seconds()
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// List login history for a user, newest first.
    pub async fn login_history(&self, user_id: i64) -> Result<Vec<LoginLog>, UserServiceError> {
        let logs = self
            .login_log_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list login logs")?;

        Ok(logs)
    }

    /// Validate registration input
    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db::repositories::{SqlxLoginLogRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let token_service = Arc::new(TokenService::new(&AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            token_ttl_minutes: 120,
        }));
        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxLoginLogRepository::boxed(pool.clone()),
            token_service,
        );

        (pool, service)
    }

    // ========================================================================
    // Registration tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_always_assigns_student_role() {
        let (_pool, service) = setup_test_service().await;

        // The very first account gets no special treatment
        let first = service
            .register(RegisterInput::new("first@example.com", "password123"))
            .await
            .expect("Failed to register first user");
        assert_eq!(first.role, UserRole::Student);
        assert_eq!(first.email, "first@example.com");

        let second = service
            .register(RegisterInput::new("second@example.com", "password456"))
            .await
            .expect("Failed to register second user");
        assert_eq!(second.role, UserRole::Student);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("same@example.com", "password123"))
            .await
            .expect("Failed to register first user");

        let result = service
            .register(RegisterInput::new("same@example.com", "password456"))
            .await;

        assert!(matches!(result, Err(UserServiceError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_register_empty_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.register(RegisterInput::new("", "password123")).await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .register(RegisterInput::new("not-an-email", "password123"))
            .await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_empty_password_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.register(RegisterInput::new("a@example.com", "")).await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (_pool, service) = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("hash@example.com", "plaintext"))
            .await
            .expect("Failed to register");

        assert_ne!(user.password_hash, "plaintext");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    // ========================================================================
    // Login tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_success_issues_valid_token() {
        let (_pool, service) = setup_test_service().await;

        let registered = service
            .register(RegisterInput::new("login@example.com", "password123"))
            .await
            .expect("Failed to register");

        let (user, token) = service
            .login(LoginInput::new("login@example.com", "password123"))
            .await
            .expect("Failed to login");

        assert_eq!(user.id, registered.id);

        let validated = service
            .validate_token(&token)
            .await
            .expect("Failed to validate token")
            .expect("Token should be valid");
        assert_eq!(validated.id, registered.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("login@example.com", "password123"))
            .await
            .expect("Failed to register");

        let result = service
            .login(LoginInput::new("login@example.com", "wrongpassword"))
            .await;

        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .login(LoginInput::new("ghost@example.com", "password123"))
            .await;

        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_records_history() {
        let (_pool, service) = setup_test_service().await;

        let registered = service
            .register(RegisterInput::new("history@example.com", "password123"))
            .await
            .expect("Failed to register");

        let mut input = LoginInput::new("history@example.com", "password123");
        input.user_agent = Some("test-agent/1.0".to_string());
        service.login(input).await.expect("Failed to login");

        // The log row is written by a spawned task, so wait for it
        let mut logs = Vec::new();
        for _ in 0..50 {
            logs = service
                .login_history(registered.id)
                .await
                .expect("Failed to list history");
            if !logs.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].user_agent.as_deref(), Some("test-agent/1.0"));
    }

    // ========================================================================
    // Token validation tests
    // ========================================================================

    #[tokio::test]
    async fn test_validate_token_garbage_returns_none() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .validate_token("not-a-real-token")
            .await
            .expect("Validation should not error");

        assert!(result.is_none());
    }
}
