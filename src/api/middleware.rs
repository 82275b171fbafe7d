//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The API error envelope and its status mapping
//! - Token extraction (cookie first, then bearer header)
//! - Authentication middleware

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::{AnnouncementRepository, InventoryRequestRepository, RoomRepository};
use crate::models::User;
use crate::services::reservation::{ReservationError, ReservationService};
use crate::services::user::{UserService, UserServiceError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub reservation_service: Arc<ReservationService>,
    pub room_repo: Arc<dyn RoomRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub inventory_repo: Arc<dyn InventoryRequestRepository>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new("UNAUTHENTICATED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_REQUEST", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("STORAGE_FAILURE", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHENTICATED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "MALFORMED_REQUEST"
            | "INVALID_ROOM_REFERENCE"
            | "INVALID_TIMESTAMP"
            | "INVALID_INTERVAL"
            | "INVALID_PURPOSE" => StatusCode::BAD_REQUEST,
            "SLOT_CONFLICT" | "EMAIL_TAKEN" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        match &err {
            ReservationError::InvalidRoomReference(_) => {
                ApiError::new("INVALID_ROOM_REFERENCE", err.to_string())
            }
            ReservationError::InvalidTimestamp(_) => {
                ApiError::new("INVALID_TIMESTAMP", err.to_string())
            }
            ReservationError::InvalidInterval => {
                ApiError::new("INVALID_INTERVAL", err.to_string())
            }
            ReservationError::InvalidPurpose => ApiError::new("INVALID_PURPOSE", err.to_string()),
            ReservationError::SlotConflict => ApiError::new("SLOT_CONFLICT", err.to_string()),
            ReservationError::StorageFailure(e) => {
                tracing::error!(error = %e, "Reservation store failure");
                ApiError::new("STORAGE_FAILURE", "Failed to access the reservation store")
            }
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match &err {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthenticated(msg.clone()),
            UserServiceError::ValidationError(msg) => ApiError::malformed_request(msg.clone()),
            UserServiceError::EmailTaken(email) => ApiError::new(
                "EMAIL_TAKEN",
                format!("Email '{}' is already registered", email),
            ),
            UserServiceError::InternalError(e) => {
                tracing::error!(error = %e, "User service failure");
                ApiError::internal_error("Internal error")
            }
        }
    }
}

/// Extract the auth token from a request.
///
/// The `token` cookie set at login takes priority; `Authorization: Bearer`
/// is accepted for non-browser clients.
pub fn extract_token(request: &Request) -> Option<String> {
    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("token=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&request)
        .ok_or_else(|| ApiError::unauthenticated("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_token(&token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthenticated("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Attaches the user when a valid token is present but never rejects
/// the request. Used by endpoints whose response widens for admins.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&request) {
        if let Ok(Some(user)) = state.user_service.validate_token(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn request_with_bearer(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn request_with_cookie(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, format!("token={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let request = request_with_bearer("test-token-123");
        assert_eq!(extract_token(&request), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let request = request_with_cookie("test-token-456");
        assert_eq!(extract_token(&request), Some("test-token-456".to_string()));
    }

    #[test]
    fn test_extract_token_cookie_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "token=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("cookie-token".to_string()));
    }

    #[test]
    fn test_extract_token_ignores_other_cookies() {
        let request = Request::builder()
            .uri("/test")
            .header(header::COOKIE, "theme=dark; token=abc; lang=en")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("abc".to_string()));
    }

    #[test]
    fn test_extract_token_empty_cookie_falls_through() {
        let request = Request::builder()
            .uri("/test")
            .header(header::COOKIE, "token=")
            .header(header::AUTHORIZATION, "Bearer fallback")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("fallback".to_string()));
    }

    #[test]
    fn test_extract_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_token(&request).is_none());
    }

    #[test]
    fn test_extract_token_invalid_bearer() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Basic invalid")
            .body(Body::empty())
            .unwrap();
        assert!(extract_token(&request).is_none());
    }

    #[test]
    fn test_api_error_unauthenticated() {
        let error = ApiError::unauthenticated("Test message");
        assert_eq!(error.error.code, "UNAUTHENTICATED");
    }

    #[test]
    fn test_reservation_error_codes() {
        let cases: Vec<(ReservationError, &str)> = vec![
            (
                ReservationError::InvalidRoomReference("R?".to_string()),
                "INVALID_ROOM_REFERENCE",
            ),
            (
                ReservationError::InvalidTimestamp("x".to_string()),
                "INVALID_TIMESTAMP",
            ),
            (ReservationError::InvalidInterval, "INVALID_INTERVAL"),
            (ReservationError::InvalidPurpose, "INVALID_PURPOSE"),
            (ReservationError::SlotConflict, "SLOT_CONFLICT"),
            (
                ReservationError::StorageFailure(anyhow::anyhow!("down")),
                "STORAGE_FAILURE",
            ),
        ];

        for (err, code) in cases {
            let api_error: ApiError = err.into();
            assert_eq!(api_error.error.code, code);
        }
    }

    #[test]
    fn test_internal_error_text_stays_off_the_wire() {
        let store_error: ApiError =
            UserServiceError::InternalError(anyhow::anyhow!("Failed to get user")).into();
        assert_eq!(store_error.error.code, "STORAGE_FAILURE");
        assert!(!store_error.error.message.contains("Failed to get user"));

        let reservation_error: ApiError =
            ReservationError::StorageFailure(anyhow::anyhow!("connection refused")).into();
        assert!(!reservation_error.error.message.contains("connection refused"));
    }

    #[test]
    fn test_user_service_error_codes() {
        let taken: ApiError =
            UserServiceError::EmailTaken("a@example.com".to_string()).into();
        assert_eq!(taken.error.code, "EMAIL_TAKEN");

        let auth: ApiError =
            UserServiceError::AuthenticationError("bad".to_string()).into();
        assert_eq!(auth.error.code, "UNAUTHENTICATED");

        let validation: ApiError =
            UserServiceError::ValidationError("empty".to_string()).into();
        assert_eq!(validation.error.code, "MALFORMED_REQUEST");
    }
}
