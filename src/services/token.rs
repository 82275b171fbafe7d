//! JWT token module
//!
//! Issues and verifies the HS256 tokens used for API authentication.
//! Tokens carry the user id, email, and role, and expire after the
//! configured TTL (120 minutes by default). Verification rejects both
//! tampered and expired tokens; there is no server-side session state.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::models::{User, UserRole};

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// User email
    pub email: String,
    /// User role at issue time
    pub role: UserRole,
    /// Expiration as a Unix timestamp (seconds)
    pub exp: i64,
}

/// Issues and verifies JWT tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from the auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    /// Token lifetime in seconds, for cookie Max-Age.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, user: &User) -> Result<String> {
        let exp = (Utc::now() + self.ttl).timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to sign token")
    }

    /// Verify a token and return its claims.
    ///
    /// Returns `None` for tokens that are malformed, carry a bad
    /// signature, or have expired.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            token_ttl_minutes: 120,
        }
    }

    fn test_user() -> User {
        let mut user = User::new(
            "student@example.com".to_string(),
            "$argon2id$fake".to_string(),
            UserRole::Student,
        );
        user.id = 42;
        user
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = TokenService::new(&test_config());
        let token = service.issue(&test_user()).expect("Failed to issue token");

        let claims = service.verify(&token).expect("Token should verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "student@example.com");
        assert_eq!(claims.role, UserRole::Student);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = TokenService::new(&test_config());
        assert!(service.verify("not-a-token").is_none());
        assert!(service.verify("").is_none());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let service = TokenService::new(&test_config());
        let token = service.issue(&test_user()).expect("Failed to issue token");

        let other = TokenService::new(&AuthConfig {
            jwt_secret: "a-different-secret".to_string(),
            token_ttl_minutes: 120,
        });
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let service = TokenService::new(&AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            token_ttl_minutes: -5,
        });
        let token = service.issue(&test_user()).expect("Failed to issue token");

        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let service = TokenService::new(&test_config());
        let token = service.issue(&test_user()).expect("Failed to issue token");

        // Flip a character in the payload segment
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        assert_eq!(parts.len(), 3);
        let mut payload: Vec<char> = parts[1].chars().collect();
        payload[0] = if payload[0] == 'A' { 'B' } else { 'A' };
        parts[1] = payload.into_iter().collect();

        assert!(service.verify(&parts.join(".")).is_none());
    }
}
