//! Reservation API endpoints
//!
//! - POST /api/reservations - submit a booking request
//! - GET  /api/reservations - list the current user's reservations
//! - GET  /api/reservations/{id} - fetch one reservation

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Reservation;
use crate::services::reservation::ReservationRequest;

/// Request body for a booking
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub room_id: String,
    pub purpose: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

/// Response entry for a reservation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: String,
    pub room_id: i64,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub created_at: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            room_id: r.room_id,
            purpose: r.purpose,
            description: r.description,
            start_time: r.start_time.to_rfc3339(),
            end_time: r.end_time.to_rfc3339(),
            status: r.status.to_string(),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Build the reservations router (all routes require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_reservation).get(list_my_reservations))
        .route("/{id}", get(get_reservation))
}

/// POST /api/reservations - Submit a booking request
///
/// The wire `roomId` field carries the room code, not the numeric id.
async fn create_reservation(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::malformed_request(e.body_text()))?;

    let request = ReservationRequest {
        room_code: body.room_id,
        purpose: body.purpose,
        description: body.description,
        start_time: body.start_time,
        end_time: body.end_time,
    };

    let reservation = state.reservation_service.book(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Reservation submitted",
            "reservationId": reservation.id,
        })),
    ))
}

/// GET /api/reservations - List the current user's reservations
async fn list_my_reservations(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations = state.reservation_service.list_for_user(user.id).await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

/// GET /api/reservations/{id} - Fetch one reservation
async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state
        .reservation_service
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Reservation '{}' not found", id)))?;

    Ok(Json(reservation.into()))
}
