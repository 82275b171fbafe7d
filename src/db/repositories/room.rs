//! Room repository
//!
//! Database operations for the room catalog. Rooms are read-mostly; the
//! booking path only resolves a room code to a row, and the catalog
//! endpoints filter by name and availability status.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Room, RoomStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Catalog search filter.
///
/// `query` is a case-insensitive substring match on the room name;
/// `statuses` restricts to the given availability statuses. An empty
/// filter returns every room.
#[derive(Debug, Clone, Default)]
pub struct RoomSearch {
    /// Substring to match against the room name
    pub query: Option<String>,
    /// Allowed availability statuses
    pub statuses: Option<Vec<RoomStatus>>,
}

/// Room repository trait
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Create a new room
    async fn create(&self, room: &Room) -> Result<Room>;

    /// Get room by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Room>>;

    /// Get room by its short room code
    async fn get_by_code(&self, code: &str) -> Result<Option<Room>>;

    /// List all rooms
    async fn list(&self) -> Result<Vec<Room>>;

    /// Search rooms by name substring and status filter
    async fn search(&self, filter: &RoomSearch) -> Result<Vec<Room>>;
}

/// SQLx-based room repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxRoomRepository {
    pool: DynDatabasePool,
}

impl SqlxRoomRepository {
    /// Create a new SQLx room repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RoomRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RoomRepository for SqlxRoomRepository {
    async fn create(&self, room: &Room) -> Result<Room> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_room_sqlite(self.pool.as_sqlite().unwrap(), room).await,
            DatabaseDriver::Mysql => create_room_mysql(self.pool.as_mysql().unwrap(), room).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Room>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_room_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_room_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Room>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_room_by_code_sqlite(self.pool.as_sqlite().unwrap(), code).await
            }
            DatabaseDriver::Mysql => {
                get_room_by_code_mysql(self.pool.as_mysql().unwrap(), code).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Room>> {
        self.search(&RoomSearch::default()).await
    }

    async fn search(&self, filter: &RoomSearch) -> Result<Vec<Room>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                search_rooms_sqlite(self.pool.as_sqlite().unwrap(), filter).await
            }
            DatabaseDriver::Mysql => search_rooms_mysql(self.pool.as_mysql().unwrap(), filter).await,
        }
    }
}

const ROOM_COLUMNS: &str = "id, room_code, name, image_url, status, capacity, location, kind, \
     furniture, display, audio, air_conditioning";

/// Build the WHERE clause and bind values for a catalog search.
/// Placeholder syntax is `?` for both supported drivers.
fn build_search_sql(filter: &RoomSearch) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(query) = filter.query.as_deref() {
        let trimmed = query.trim();
        if !trimmed.is_empty() {
            conditions.push("LOWER(name) LIKE ?".to_string());
            binds.push(format!("%{}%", trimmed.to_lowercase()));
        }
    }

    if let Some(statuses) = filter.statuses.as_deref() {
        if !statuses.is_empty() {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            conditions.push(format!("status IN ({})", placeholders));
            for status in statuses {
                binds.push(status.to_string());
            }
        }
    }

    let mut sql = format!("SELECT {} FROM rooms", ROOM_COLUMNS);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY room_code");

    (sql, binds)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_room_sqlite(pool: &SqlitePool, room: &Room) -> Result<Room> {
    let status_str = room.status.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO rooms (room_code, name, image_url, status, capacity, location, kind,
                           furniture, display, audio, air_conditioning)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&room.room_code)
    .bind(&room.name)
    .bind(&room.image_url)
    .bind(&status_str)
    .bind(room.capacity)
    .bind(&room.location)
    .bind(&room.kind)
    .bind(room.furniture)
    .bind(room.display)
    .bind(room.audio)
    .bind(room.air_conditioning)
    .execute(pool)
    .await
    .context("Failed to create room")?;

    let mut created = room.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_room_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Room>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM rooms WHERE id = ?",
        ROOM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get room by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_room_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_room_by_code_sqlite(pool: &SqlitePool, code: &str) -> Result<Option<Room>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM rooms WHERE room_code = ?",
        ROOM_COLUMNS
    ))
    .bind(code)
    .fetch_optional(pool)
    .await
    .context("Failed to get room by code")?;

    match row {
        Some(row) => Ok(Some(row_to_room_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn search_rooms_sqlite(pool: &SqlitePool, filter: &RoomSearch) -> Result<Vec<Room>> {
    let (sql, binds) = build_search_sql(filter);

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to search rooms")?;

    let mut rooms = Vec::new();
    for row in rows {
        rooms.push(row_to_room_sqlite(&row)?);
    }
    Ok(rooms)
}

fn row_to_room_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Room> {
    let status_str: String = row.get("status");
    let status = RoomStatus::from_str(&status_str)
        .with_context(|| format!("Invalid room status in database: {}", status_str))?;

    Ok(Room {
        id: row.get("id"),
        room_code: row.get("room_code"),
        name: row.get("name"),
        image_url: row.get("image_url"),
        status,
        capacity: row.get("capacity"),
        location: row.get("location"),
        kind: row.get("kind"),
        furniture: row.get("furniture"),
        display: row.get("display"),
        audio: row.get("audio"),
        air_conditioning: row.get("air_conditioning"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_room_mysql(pool: &MySqlPool, room: &Room) -> Result<Room> {
    let status_str = room.status.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO rooms (room_code, name, image_url, status, capacity, location, kind,
                           furniture, display, audio, air_conditioning)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&room.room_code)
    .bind(&room.name)
    .bind(&room.image_url)
    .bind(&status_str)
    .bind(room.capacity)
    .bind(&room.location)
    .bind(&room.kind)
    .bind(room.furniture)
    .bind(room.display)
    .bind(room.audio)
    .bind(room.air_conditioning)
    .execute(pool)
    .await
    .context("Failed to create room")?;

    let mut created = room.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_room_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Room>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM rooms WHERE id = ?",
        ROOM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get room by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_room_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_room_by_code_mysql(pool: &MySqlPool, code: &str) -> Result<Option<Room>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM rooms WHERE room_code = ?",
        ROOM_COLUMNS
    ))
    .bind(code)
    .fetch_optional(pool)
    .await
    .context("Failed to get room by code")?;

    match row {
        Some(row) => Ok(Some(row_to_room_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn search_rooms_mysql(pool: &MySqlPool, filter: &RoomSearch) -> Result<Vec<Room>> {
    let (sql, binds) = build_search_sql(filter);

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to search rooms")?;

    let mut rooms = Vec::new();
    for row in rows {
        rooms.push(row_to_room_mysql(&row)?);
    }
    Ok(rooms)
}

fn row_to_room_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Room> {
    let status_str: String = row.get("status");
    let status = RoomStatus::from_str(&status_str)
        .with_context(|| format!("Invalid room status in database: {}", status_str))?;

    Ok(Room {
        id: row.get("id"),
        room_code: row.get("room_code"),
        name: row.get("name"),
        image_url: row.get("image_url"),
        status,
        capacity: row.get("capacity"),
        location: row.get("location"),
        kind: row.get("kind"),
        furniture: row.get("furniture"),
        display: row.get("display"),
        audio: row.get("audio"),
        air_conditioning: row.get("air_conditioning"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxRoomRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxRoomRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_room(code: &str, name: &str, status: RoomStatus) -> Room {
        Room {
            id: 0,
            room_code: code.to_string(),
            name: name.to_string(),
            image_url: None,
            status,
            capacity: 40,
            location: "Building A, 2nd floor".to_string(),
            kind: "lecture hall".to_string(),
            furniture: true,
            display: true,
            audio: false,
            air_conditioning: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_room() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&test_room("R001", "Lecture Hall A", RoomStatus::Available))
            .await
            .expect("Failed to create room");

        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get room")
            .expect("Room not found");

        assert_eq!(found.room_code, "R001");
        assert_eq!(found.status, RoomStatus::Available);
        assert!(found.furniture);
        assert!(!found.audio);
    }

    #[tokio::test]
    async fn test_get_room_by_code() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_room("R002", "Seminar Room", RoomStatus::InUse))
            .await
            .expect("Failed to create room");

        let found = repo
            .get_by_code("R002")
            .await
            .expect("Failed to get room")
            .expect("Room not found");

        assert_eq!(found.name, "Seminar Room");
        assert_eq!(found.status, RoomStatus::InUse);
    }

    #[tokio::test]
    async fn test_get_room_by_code_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_code("NOPE").await.expect("Failed to query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_empty_returns_empty_vec() {
        let (_pool, repo) = setup_test_repo().await;

        let rooms = repo.list().await.expect("Failed to list rooms");
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_name_is_case_insensitive() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_room("R001", "Lecture Hall A", RoomStatus::Available))
            .await
            .unwrap();
        repo.create(&test_room("R002", "Computer Lab", RoomStatus::Available))
            .await
            .unwrap();

        let filter = RoomSearch {
            query: Some("lecture".to_string()),
            statuses: None,
        };
        let rooms = repo.search(&filter).await.expect("Failed to search");

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_code, "R001");
    }

    #[tokio::test]
    async fn test_search_by_status() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_room("R001", "Hall A", RoomStatus::Available))
            .await
            .unwrap();
        repo.create(&test_room("R002", "Hall B", RoomStatus::InUse))
            .await
            .unwrap();
        repo.create(&test_room("R003", "Hall C", RoomStatus::UnderMaintenance))
            .await
            .unwrap();

        let filter = RoomSearch {
            query: None,
            statuses: Some(vec![RoomStatus::InUse, RoomStatus::UnderMaintenance]),
        };
        let rooms = repo.search(&filter).await.expect("Failed to search");

        assert_eq!(rooms.len(), 2);
        assert!(rooms.iter().all(|r| r.status != RoomStatus::Available));
    }

    #[tokio::test]
    async fn test_search_no_match_returns_empty_vec() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_room("R001", "Hall A", RoomStatus::Available))
            .await
            .unwrap();

        let filter = RoomSearch {
            query: Some("xyzzy".to_string()),
            statuses: None,
        };
        let rooms = repo.search(&filter).await.expect("Failed to search");

        assert!(rooms.is_empty());
    }
}
