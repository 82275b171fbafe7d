//! Room model
//!
//! Rooms are read-only from the reservation core's perspective; the catalog
//! and status endpoints list them, booking only resolves a code to an id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Room entity from the facility catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier
    pub id: i64,
    /// Short room code shown to users (e.g. "R001", unique)
    pub room_code: String,
    /// Display name
    pub name: String,
    /// Catalog image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Availability status
    pub status: RoomStatus,
    /// Seating capacity
    pub capacity: i64,
    /// Building / floor location
    pub location: String,
    /// Room kind (lecture hall, lab, meeting room, ...)
    pub kind: String,
    /// Furniture available
    pub furniture: bool,
    /// Display / projector available
    pub display: bool,
    /// Audio system available
    pub audio: bool,
    /// Air conditioning available
    pub air_conditioning: bool,
}

impl Room {
    /// Check a room code for well-formedness: 1-32 ASCII alphanumerics,
    /// `-` or `_`. This is a format check only, not an existence check.
    pub fn is_valid_code(code: &str) -> bool {
        !code.is_empty()
            && code.len() <= 32
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

/// Room availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    /// Free for booking
    Available,
    /// Currently occupied
    InUse,
    /// Closed for maintenance
    UnderMaintenance,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Available => write!(f, "Available"),
            RoomStatus::InUse => write!(f, "In Use"),
            RoomStatus::UnderMaintenance => write!(f, "Under Maintenance"),
        }
    }
}

impl FromStr for RoomStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(RoomStatus::Available),
            "In Use" => Ok(RoomStatus::InUse),
            "Under Maintenance" => Ok(RoomStatus::UnderMaintenance),
            _ => Err(anyhow::anyhow!("Invalid room status: {}", s)),
        }
    }
}
