//! Inventory request model
//!
//! Backs the table on the facility status page. Read-only from this
//! service's perspective; rows are managed by the department inventory
//! process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request for an inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRequest {
    /// Unique identifier
    pub id: i64,
    /// Human-readable request code
    pub request_code: String,
    /// Who requested the item
    pub requester_name: String,
    /// Requested item
    pub item_name: String,
    /// When the request was filed (listings sort on this, descending)
    pub requested_at: DateTime<Utc>,
    /// Request status ("Pending", "Approved", "Rejected")
    pub status: String,
    /// Scheduled pickup time, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_at: Option<DateTime<Utc>>,
}
