//! Room catalog API endpoints
//!
//! - GET /api/catalog/search?q=&status= - filtered search
//! - GET /api/catalog/rooms/{id} - single room

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::RoomSearch;
use crate::models::{Room, RoomStatus};

/// Query parameters for catalog search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Name substring, case-insensitive
    pub q: Option<String>,
    /// Availability filter: `available` or `unavailable`
    pub status: Option<String>,
}

/// Response entry for a room
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: i64,
    pub room_code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: String,
    pub capacity: i64,
    pub location: String,
    pub kind: String,
    pub furniture: bool,
    pub display: bool,
    pub audio: bool,
    pub air_conditioning: bool,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            room_code: room.room_code,
            name: room.name,
            image_url: room.image_url,
            status: room.status.to_string(),
            capacity: room.capacity,
            location: room.location,
            kind: room.kind,
            furniture: room.furniture,
            display: room.display,
            audio: room.audio,
            air_conditioning: room.air_conditioning,
        }
    }
}

/// Build the catalog router (public)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_rooms))
        .route("/rooms/{id}", get(get_room))
}

/// Parse the `status` query parameter.
///
/// `available` selects rooms that can be booked right now;
/// `unavailable` covers everything else. Unknown values are rejected
/// rather than silently dropped.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<Vec<RoomStatus>>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some("available") => Ok(Some(vec![RoomStatus::Available])),
        Some("unavailable") => Ok(Some(vec![
            RoomStatus::InUse,
            RoomStatus::UnderMaintenance,
        ])),
        Some(other) => Err(ApiError::malformed_request(format!(
            "Unknown status filter: {}",
            other
        ))),
    }
}

/// GET /api/catalog/search - Filtered search
async fn search_rooms(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let filter = RoomSearch {
        query: params.q,
        statuses: parse_status_filter(params.status.as_deref())?,
    };

    let rooms = state
        .room_repo
        .search(&filter)
        .await
        .map_err(|e| storage_error(e, "Failed to search rooms"))?;

    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

/// GET /api/catalog/rooms/{id} - Single room
async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RoomResponse>, ApiError> {
    let room = state
        .room_repo
        .get_by_id(id)
        .await
        .map_err(|e| storage_error(e, "Failed to get room"))?
        .ok_or_else(|| ApiError::not_found(format!("Room {} not found", id)))?;

    Ok(Json(room.into()))
}

fn storage_error(e: anyhow::Error, message: &str) -> ApiError {
    tracing::error!(error = %e, "{}", message);
    ApiError::internal_error(message)
}
