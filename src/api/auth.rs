//! Authentication API endpoints
//!
//! - POST /api/register - account creation
//! - POST /api/login - credential check, sets the token cookie
//! - POST /api/logout - clears the token cookie
//! - GET  /api/validate-token - current identity from the token
//! - GET  /api/login-logs - login history for the current user

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::LoginLog;
use crate::services::user::{LoginInput, RegisterInput};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/validate-token", get(validate_token))
        .route("/login-logs", get(login_logs))
}

/// Token cookie with a Max-Age matching the token TTL.
fn token_cookie(token: &str, max_age_seconds: i64) -> HeaderMap {
    let cookie = format!(
        "token={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age_seconds
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());
    headers
}

/// POST /api/register - User registration
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::malformed_request(e.body_text()))?;

    let user = state
        .user_service
        .register(RegisterInput::new(body.email, body.password))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User registered successfully",
            "user": UserResponse::from(user),
        })),
    ))
}

/// POST /api/login - User login
///
/// On success the token is returned in the body and also set as an
/// HttpOnly cookie so browser clients authenticate without storing it.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::malformed_request(e.body_text()))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    let mut input = LoginInput::new(body.email, body.password);
    input.user_agent = user_agent;

    let (user, token) = state.user_service.login(input).await?;

    let cookie_headers = token_cookie(&token, state.user_service.token_ttl_seconds());

    Ok((
        StatusCode::OK,
        cookie_headers,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/logout - User logout
///
/// Tokens are stateless, so logout only clears the cookie.
async fn logout() -> impl IntoResponse {
    let headers = token_cookie("", 0);

    (
        StatusCode::OK,
        headers,
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}

/// GET /api/validate-token - Confirm the token and return its identity
///
/// The auth middleware has already verified the token and confirmed the
/// subject still exists, so this only echoes who the caller is.
async fn validate_token(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "email": user.email,
        "role": user.role.to_string(),
    }))
}

/// Response entry for login history
#[derive(Debug, Serialize)]
pub struct LoginLogResponse {
    pub id: i64,
    pub logged_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl From<LoginLog> for LoginLogResponse {
    fn from(log: LoginLog) -> Self {
        Self {
            id: log.id,
            logged_at: log.logged_at.to_rfc3339(),
            user_agent: log.user_agent,
        }
    }
}

/// GET /api/login-logs - Login history for the current user
async fn login_logs(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<LoginLogResponse>>, ApiError> {
    let logs = state.user_service.login_history(user.id).await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}
