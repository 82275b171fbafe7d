//! Announcement model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single announcement post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    /// Unique identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Author display name
    pub author: String,
    /// Publication timestamp (listings sort on this, descending)
    pub published_at: DateTime<Utc>,
    /// Body text
    pub content: String,
    /// Free-form tags; serialized as `[]` when empty, never absent
    #[serde(default)]
    pub tags: Vec<String>,
    /// Who may see the announcement
    pub visibility: AnnouncementVisibility,
}

/// Announcement visibility.
///
/// Public announcements are shown to everyone; private ones only to admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementVisibility {
    /// Visible to everyone
    Public,
    /// Visible to admins only
    Private,
}

impl fmt::Display for AnnouncementVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnouncementVisibility::Public => write!(f, "public"),
            AnnouncementVisibility::Private => write!(f, "private"),
        }
    }
}

impl FromStr for AnnouncementVisibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(AnnouncementVisibility::Public),
            "private" => Ok(AnnouncementVisibility::Private),
            _ => Err(anyhow::anyhow!("Invalid announcement visibility: {}", s)),
        }
    }
}
