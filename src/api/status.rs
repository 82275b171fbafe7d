//! Facility status API endpoints
//!
//! Backs the facility status page: the availability of every room plus
//! the inventory request table.
//!
//! - GET /api/status/rooms - room availability overview
//! - GET /api/status/inventory - inventory requests, newest first

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{InventoryRequest, Room};

/// Compact room entry for the status overview
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusResponse {
    pub room_code: String,
    pub name: String,
    pub status: String,
}

impl From<Room> for RoomStatusResponse {
    fn from(room: Room) -> Self {
        Self {
            room_code: room.room_code,
            name: room.name,
            status: room.status.to_string(),
        }
    }
}

/// Response entry for an inventory request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequestResponse {
    pub request_code: String,
    pub requester_name: String,
    pub item_name: String,
    pub requested_at: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_at: Option<String>,
}

impl From<InventoryRequest> for InventoryRequestResponse {
    fn from(request: InventoryRequest) -> Self {
        Self {
            request_code: request.request_code,
            requester_name: request.requester_name,
            item_name: request.item_name,
            requested_at: request.requested_at.to_rfc3339(),
            status: request.status,
            pickup_at: request.pickup_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Build the status router (public)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(room_status))
        .route("/inventory", get(inventory_requests))
}

/// GET /api/status/rooms - Room availability overview
async fn room_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomStatusResponse>>, ApiError> {
    let rooms = state.room_repo.list().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list rooms for status page");
        ApiError::internal_error("Failed to list rooms")
    })?;

    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

/// GET /api/status/inventory - Inventory requests, newest first
async fn inventory_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryRequestResponse>>, ApiError> {
    let requests = state.inventory_repo.list().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list inventory requests");
        ApiError::internal_error("Failed to list inventory requests")
    })?;

    Ok(Json(requests.into_iter().map(Into::into).collect()))
}
