//! API layer - HTTP handlers and routing
//!
//! All HTTP endpoints for the Roomdesk service:
//! - Auth endpoints (register, login, logout, validate-token, login history)
//! - Reservation endpoints (book, list, fetch)
//! - Room catalog endpoints (search, fetch)
//! - Facility status endpoints (rooms, inventory)
//! - Announcement endpoints

pub mod announcements;
pub mod auth;
pub mod catalog;
pub mod middleware;
pub mod reservations;
pub mod status;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid token)
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .nest("/reservations", reservations::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Announcements widen for admins, so auth is optional there
    let announcement_routes = Router::new()
        .nest("/announcements", announcements::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Public routes
    Router::new()
        .merge(auth::public_router())
        .nest("/catalog", catalog::router())
        .nest("/status", status::router())
        .merge(announcement_routes)
        .merge(protected_routes)
}

/// GET /health - liveness probe
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.pool.ping().await {
        Ok(()) => Ok(Json(serde_json::json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
