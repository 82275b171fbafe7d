//! Announcement repository
//!
//! Tags are persisted as a JSON array in a TEXT column so the schema
//! stays identical across SQLite and MySQL.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Announcement, AnnouncementVisibility};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Announcement repository trait
#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    /// Create a new announcement
    async fn create(&self, announcement: &Announcement) -> Result<Announcement>;

    /// List announcements, newest first. When `include_private` is false,
    /// private announcements are filtered out.
    async fn list(&self, include_private: bool) -> Result<Vec<Announcement>>;
}

/// SQLx-based announcement repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxAnnouncementRepository {
    pool: DynDatabasePool,
}

impl SqlxAnnouncementRepository {
    /// Create a new SQLx announcement repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AnnouncementRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AnnouncementRepository for SqlxAnnouncementRepository {
    async fn create(&self, announcement: &Announcement) -> Result<Announcement> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_announcement_sqlite(self.pool.as_sqlite().unwrap(), announcement).await
            }
            DatabaseDriver::Mysql => {
                create_announcement_mysql(self.pool.as_mysql().unwrap(), announcement).await
            }
        }
    }

    async fn list(&self, include_private: bool) -> Result<Vec<Announcement>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_announcements_sqlite(self.pool.as_sqlite().unwrap(), include_private).await
            }
            DatabaseDriver::Mysql => {
                list_announcements_mysql(self.pool.as_mysql().unwrap(), include_private).await
            }
        }
    }
}

fn list_sql(include_private: bool) -> &'static str {
    if include_private {
        "SELECT id, title, author, published_at, content, tags, visibility \
         FROM announcements ORDER BY published_at DESC"
    } else {
        "SELECT id, title, author, published_at, content, tags, visibility \
         FROM announcements WHERE visibility = 'public' ORDER BY published_at DESC"
    }
}

fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).context("Failed to encode announcement tags")
}

fn decode_tags(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .with_context(|| format!("Invalid announcement tags in database: {}", raw))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_announcement_sqlite(
    pool: &SqlitePool,
    announcement: &Announcement,
) -> Result<Announcement> {
    let tags = encode_tags(&announcement.tags)?;

    let result = sqlx::query(
        r#"
        INSERT INTO announcements (title, author, published_at, content, tags, visibility)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&announcement.title)
    .bind(&announcement.author)
    .bind(announcement.published_at)
    .bind(&announcement.content)
    .bind(&tags)
    .bind(announcement.visibility.to_string())
    .execute(pool)
    .await
    .context("Failed to create announcement")?;

    let mut created = announcement.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn list_announcements_sqlite(
    pool: &SqlitePool,
    include_private: bool,
) -> Result<Vec<Announcement>> {
    let rows = sqlx::query(list_sql(include_private))
        .fetch_all(pool)
        .await
        .context("Failed to list announcements")?;

    let mut announcements = Vec::new();
    for row in rows {
        announcements.push(row_to_announcement_sqlite(&row)?);
    }
    Ok(announcements)
}

fn row_to_announcement_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Announcement> {
    let visibility_str: String = row.get("visibility");
    let visibility = AnnouncementVisibility::from_str(&visibility_str)?;
    let tags_raw: String = row.get("tags");

    Ok(Announcement {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        published_at: row.get("published_at"),
        content: row.get("content"),
        tags: decode_tags(&tags_raw)?,
        visibility,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_announcement_mysql(
    pool: &MySqlPool,
    announcement: &Announcement,
) -> Result<Announcement> {
    let tags = encode_tags(&announcement.tags)?;

    let result = sqlx::query(
        r#"
        INSERT INTO announcements (title, author, published_at, content, tags, visibility)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&announcement.title)
    .bind(&announcement.author)
    .bind(announcement.published_at)
    .bind(&announcement.content)
    .bind(&tags)
    .bind(announcement.visibility.to_string())
    .execute(pool)
    .await
    .context("Failed to create announcement")?;

    let mut created = announcement.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn list_announcements_mysql(
    pool: &MySqlPool,
    include_private: bool,
) -> Result<Vec<Announcement>> {
    let rows = sqlx::query(list_sql(include_private))
        .fetch_all(pool)
        .await
        .context("Failed to list announcements")?;

    let mut announcements = Vec::new();
    for row in rows {
        announcements.push(row_to_announcement_mysql(&row)?);
    }
    Ok(announcements)
}

fn row_to_announcement_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Announcement> {
    let visibility_str: String = row.get("visibility");
    let visibility = AnnouncementVisibility::from_str(&visibility_str)?;
    let tags_raw: String = row.get("tags");

    Ok(Announcement {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        published_at: row.get("published_at"),
        content: row.get("content"),
        tags: decode_tags(&tags_raw)?,
        visibility,
    })
}
