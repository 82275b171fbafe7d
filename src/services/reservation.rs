//! Reservation service
//!
//! The booking core. A booking request runs through a fixed validation
//! chain, then a conflict check against `Approved` reservations on the
//! same room, then a `Pending` insert. The conflict check and the insert
//! are serialized per room with an async mutex so two concurrent requests
//! for the same room cannot both pass the check before either insert
//! lands. Requests for different rooms never contend.
//!
//! Every store operation on the booking path is wrapped in a timeout so
//! a stalled database surfaces as `StorageFailure` instead of hanging
//! the request.

use crate::db::repositories::{ReservationRepository, RoomRepository};
use crate::models::{Reservation, Room};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

/// Timeout applied to each individual store operation on the booking path.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Error types for reservation operations.
///
/// Each variant maps to one API error code, so handlers can translate
/// without inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// Room code is missing or not in the accepted format
    #[error("Invalid room reference: {0}")]
    InvalidRoomReference(String),

    /// Timestamp failed to parse as RFC 3339
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// End does not come strictly after start
    #[error("Reservation end must be after its start")]
    InvalidInterval,

    /// Purpose is missing or blank
    #[error("Reservation purpose must not be empty")]
    InvalidPurpose,

    /// The slot is already taken by an approved reservation
    #[error("The requested slot conflicts with an existing reservation")]
    SlotConflict,

    /// The store failed or timed out
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] anyhow::Error),
}

/// A booking request as it arrives from the API, timestamps still raw.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    /// Room code identifying the room to book
    pub room_code: String,
    /// Short purpose text (required)
    pub purpose: String,
    /// Free-text description (optional)
    pub description: Option<String>,
    /// Interval start, RFC 3339
    pub start_time: String,
    /// Interval end, RFC 3339
    pub end_time: String,
}

/// Reservation service owning the booking validation chain and the
/// per-room serialization of conflict checks.
pub struct ReservationService {
    reservation_repo: Arc<dyn ReservationRepository>,
    room_repo: Arc<dyn RoomRepository>,
    // One async mutex per room id; entries are created on first use and
    // kept for the lifetime of the service.
    room_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl ReservationService {
    /// Create a new reservation service
    pub fn new(
        reservation_repo: Arc<dyn ReservationRepository>,
        room_repo: Arc<dyn RoomRepository>,
    ) -> Self {
        Self {
            reservation_repo,
            room_repo,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Submit a booking request on behalf of `user_id`.
    ///
    /// Validation order is fixed: room code format, timestamp parsing,
    /// interval ordering, room existence, purpose, then the conflict
    /// check. The first failure wins; nothing is written unless every
    /// step passes.
    ///
    /// # Errors
    ///
    /// - `InvalidRoomReference` if the room code is malformed or unknown
    /// - `InvalidTimestamp` if either timestamp is not RFC 3339
    /// - `InvalidInterval` if the end is not strictly after the start
    /// - `InvalidPurpose` if the purpose is blank
    /// - `SlotConflict` if an approved reservation overlaps the interval
    /// - `StorageFailure` if the store errors or times out
    pub async fn book(
        &self,
        user_id: i64,
        request: ReservationRequest,
    ) -> Result<Reservation, ReservationError> {
        if !Room::is_valid_code(&request.room_code) {
            return Err(ReservationError::InvalidRoomReference(
                request.room_code.clone(),
            ));
        }

        let start = parse_timestamp(&request.start_time)?;
        let end = parse_timestamp(&request.end_time)?;
        if end <= start {
            return Err(ReservationError::InvalidInterval);
        }

        let room = self.resolve_room(&request.room_code).await?;

        if request.purpose.trim().is_empty() {
            return Err(ReservationError::InvalidPurpose);
        }

        let reservation = Reservation::new(
            room.id,
            user_id,
            request.purpose.trim().to_string(),
            request.description.filter(|d| !d.trim().is_empty()),
            start,
            end,
        );

        // Conflict check and insert must not interleave with another
        // booking for the same room.
        let lock = self.room_lock(room.id);
        let _guard = lock.lock().await;

        let conflicts = with_store_timeout(
            self.reservation_repo
                .count_approved_overlapping(room.id, start, end),
        )
        .await?;

        if conflicts > 0 {
            return Err(ReservationError::SlotConflict);
        }

        with_store_timeout(self.reservation_repo.create(&reservation)).await?;

        tracing::info!(
            reservation_id = %reservation.id,
            room_code = %room.room_code,
            user_id,
            "Created pending reservation"
        );

        Ok(reservation)
    }

    /// Get a reservation by its UUID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Reservation>, ReservationError> {
        let reservation = with_store_timeout(self.reservation_repo.get_by_id(id)).await?;
        Ok(reservation)
    }

    /// List reservations made by a user, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Reservation>, ReservationError> {
        let reservations =
            with_store_timeout(self.reservation_repo.list_by_user(user_id)).await?;
        Ok(reservations)
    }

    /// Resolve a well-formed room code to a catalog row.
    async fn resolve_room(&self, room_code: &str) -> Result<Room, ReservationError> {
        let room = with_store_timeout(self.room_repo.get_by_code(room_code)).await?;

        room.ok_or_else(|| ReservationError::InvalidRoomReference(room_code.to_string()))
    }

    /// Get or create the lock for a room.
    fn room_lock(&self, room_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.room_locks.lock().expect("room lock map poisoned");
        locks
            .entry(room_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Parse an RFC 3339 timestamp into UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ReservationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ReservationError::InvalidTimestamp(raw.to_string()))
}

/// Run a store future under the booking-path timeout.
async fn with_store_timeout<T>(
    fut: impl Future<Output = Result<T>>,
) -> Result<T, ReservationError> {
    match timeout(STORE_TIMEOUT, fut).await {
        Ok(result) => result.map_err(ReservationError::StorageFailure),
        Err(_) => Err(ReservationError::StorageFailure(anyhow::anyhow!(
            "Store operation timed out after {:?}",
            STORE_TIMEOUT
        ))),
    }
}
