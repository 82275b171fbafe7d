//! Announcement API endpoints
//!
//! - GET /api/announcements - public listing; admins also see private posts

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Announcement;

/// Response entry for an announcement
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_at: String,
    pub content: String,
    pub tags: Vec<String>,
    pub visibility: String,
}

impl From<Announcement> for AnnouncementResponse {
    fn from(a: Announcement) -> Self {
        Self {
            id: a.id,
            title: a.title,
            author: a.author,
            published_at: a.published_at.to_rfc3339(),
            content: a.content,
            tags: a.tags,
            visibility: a.visibility.to_string(),
        }
    }
}

/// Build the announcements router (public, with optional auth widening)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_announcements))
}

/// GET /api/announcements - List announcements, newest first
///
/// Anonymous and non-admin callers get public announcements only;
/// admins also see private ones.
async fn list_announcements(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<Vec<AnnouncementResponse>>, ApiError> {
    let include_private = user
        .map(|Extension(AuthenticatedUser(u))| u.is_admin())
        .unwrap_or(false);

    let announcements = state
        .announcement_repo
        .list(include_private)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list announcements");
            ApiError::internal_error("Failed to list announcements")
        })?;

    Ok(Json(announcements.into_iter().map(Into::into).collect()))
}
