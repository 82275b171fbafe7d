//! Login log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single login event for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginLog {
    /// Unique identifier
    pub id: i64,
    /// User who logged in
    pub user_id: i64,
    /// When the login happened
    pub logged_at: DateTime<Utc>,
    /// User agent of the client, if sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl LoginLog {
    /// Create a new login log entry stamped with the current time.
    pub fn new(user_id: i64, user_agent: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            user_id,
            logged_at: Utc::now(),
            user_agent,
        }
    }
}
