//! Reservation model
//!
//! The only entity with a lifecycle worth stating:
//! - created `Pending` by the reservation core
//! - flipped to `Approved` or `Rejected` by an external approval process
//! - once `Approved`, its `[start_time, end_time)` interval blocks
//!   overlapping bookings on the same room
//!
//! Invariants:
//! - `end_time` is strictly greater than `start_time`
//! - per room, `Approved` reservations are pairwise non-overlapping;
//!   `Pending` and `Rejected` rows never block a slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Reservation entity.
///
/// The public identifier is a UUID string assigned at creation and
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier (UUID v4, assigned at creation)
    pub id: String,
    /// Reserved room
    pub room_id: i64,
    /// Requesting user
    pub user_id: i64,
    /// Short purpose text (required)
    pub purpose: String,
    /// Free-text description (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Interval start (inclusive)
    pub start_time: DateTime<Utc>,
    /// Interval end (exclusive)
    pub end_time: DateTime<Utc>,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a new `Pending` reservation with a fresh identifier.
    pub fn new(
        room_id: i64,
        user_id: i64,
        purpose: String,
        description: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id,
            user_id,
            purpose,
            description,
            start_time,
            end_time,
            status: ReservationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Reservation lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Awaiting approval; does not block the slot
    Pending,
    /// Confirmed; blocks the slot for overlapping requests
    Approved,
    /// Denied; does not block the slot
    Rejected,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "Pending"),
            ReservationStatus::Approved => write!(f, "Approved"),
            ReservationStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReservationStatus::Pending),
            "Approved" => Ok(ReservationStatus::Approved),
            "Rejected" => Ok(ReservationStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid reservation status: {}", s)),
        }
    }
}
