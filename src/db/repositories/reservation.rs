//! Reservation repository
//!
//! Database operations for reservations. The conflict count query is the
//! hot path of the booking flow: it counts `Approved` reservations on a
//! room whose half-open `[start_time, end_time)` interval intersects the
//! requested one. Callers must serialize the count-then-insert pair per
//! room; the repository itself only runs the individual statements.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Reservation, ReservationStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Reservation repository trait
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation
    async fn create(&self, reservation: &Reservation) -> Result<()>;

    /// Get reservation by its UUID
    async fn get_by_id(&self, id: &str) -> Result<Option<Reservation>>;

    /// List reservations made by a user, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Reservation>>;

    /// Count `Approved` reservations on `room_id` whose interval
    /// intersects `[start, end)`
    async fn count_approved_overlapping(
        &self,
        room_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64>;

    /// Update the status of a reservation. Returns false if no row matched.
    async fn update_status(&self, id: &str, status: ReservationStatus) -> Result<bool>;
}

/// SQLx-based reservation repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxReservationRepository {
    pool: DynDatabasePool,
}

impl SqlxReservationRepository {
    /// Create a new SQLx reservation repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReservationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReservationRepository for SqlxReservationRepository {
    async fn create(&self, reservation: &Reservation) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_reservation_sqlite(self.pool.as_sqlite().unwrap(), reservation).await
            }
            DatabaseDriver::Mysql => {
                create_reservation_mysql(self.pool.as_mysql().unwrap(), reservation).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Reservation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_reservation_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_reservation_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Reservation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_reservations_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                list_reservations_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn count_approved_overlapping(
        &self,
        room_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_overlapping_sqlite(self.pool.as_sqlite().unwrap(), room_id, start, end).await
            }
            DatabaseDriver::Mysql => {
                count_overlapping_mysql(self.pool.as_mysql().unwrap(), room_id, start, end).await
            }
        }
    }

    async fn update_status(&self, id: &str, status: ReservationStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                update_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }
}

const RESERVATION_COLUMNS: &str =
    "id, room_id, user_id, purpose, description, start_time, end_time, status, created_at";

/// Three-way interval intersection against approved reservations:
/// existing start falls inside the request, existing end falls inside
/// the request, or the existing interval contains the request. All
/// comparisons keep `[start, end)` half-open so touching intervals
/// do not count as conflicts.
const COUNT_OVERLAPPING_SQL: &str = r#"
    SELECT COUNT(*) as count
    FROM reservations
    WHERE room_id = ?
      AND status = 'Approved'
      AND (
            (start_time >= ? AND start_time < ?)
         OR (end_time > ? AND end_time <= ?)
         OR (start_time <= ? AND end_time >= ?)
      )
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_reservation_sqlite(pool: &SqlitePool, reservation: &Reservation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reservations (id, room_id, user_id, purpose, description,
                                  start_time, end_time, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&reservation.id)
    .bind(reservation.room_id)
    .bind(reservation.user_id)
    .bind(&reservation.purpose)
    .bind(&reservation.description)
    .bind(reservation.start_time)
    .bind(reservation.end_time)
    .bind(reservation.status.to_string())
    .bind(reservation.created_at)
    .execute(pool)
    .await
    .context("Failed to create reservation")?;

    Ok(())
}

async fn get_reservation_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Reservation>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM reservations WHERE id = ?",
        RESERVATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get reservation by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_reservation_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_reservations_by_user_sqlite(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Reservation>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM reservations WHERE user_id = ? ORDER BY created_at DESC",
        RESERVATION_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list reservations by user")?;

    let mut reservations = Vec::new();
    for row in rows {
        reservations.push(row_to_reservation_sqlite(&row)?);
    }
    Ok(reservations)
}

async fn count_overlapping_sqlite(
    pool: &SqlitePool,
    room_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64> {
    let row = sqlx::query(COUNT_OVERLAPPING_SQL)
        .bind(room_id)
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
        .context("Failed to count overlapping reservations")?;

    Ok(row.get("count"))
}

async fn update_status_sqlite(
    pool: &SqlitePool,
    id: &str,
    status: ReservationStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update reservation status")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_reservation_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Reservation> {
    let status_str: String = row.get("status");
    let status = ReservationStatus::from_str(&status_str)
        .with_context(|| format!("Invalid reservation status in database: {}", status_str))?;

    Ok(Reservation {
        id: row.get("id"),
        room_id: row.get("room_id"),
        user_id: row.get("user_id"),
        purpose: row.get("purpose"),
        description: row.get("description"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        status,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_reservation_mysql(pool: &MySqlPool, reservation: &Reservation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reservations (id, room_id, user_id, purpose, description,
                                  start_time, end_time, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&reservation.id)
    .bind(reservation.room_id)
    .bind(reservation.user_id)
    .bind(&reservation.purpose)
    .bind(&reservation.description)
    .bind(reservation.start_time)
    .bind(reservation.end_time)
    .bind(reservation.status.to_string())
    .bind(reservation.created_at)
    .execute(pool)
    .await
    .context("Failed to create reservation")?;

    Ok(())
}

async fn get_reservation_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Reservation>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM reservations WHERE id = ?",
        RESERVATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get reservation by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_reservation_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_reservations_by_user_mysql(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Vec<Reservation>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM reservations WHERE user_id = ? ORDER BY created_at DESC",
        RESERVATION_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list reservations by user")?;

    let mut reservations = Vec::new();
    for row in rows {
        reservations.push(row_to_reservation_mysql(&row)?);
    }
    Ok(reservations)
}

async fn count_overlapping_mysql(
    pool: &MySqlPool,
    room_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64> {
    let row = sqlx::query(COUNT_OVERLAPPING_SQL)
        .bind(room_id)
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
        .context("Failed to count overlapping reservations")?;

    Ok(row.get("count"))
}

async fn update_status_mysql(
    pool: &MySqlPool,
    id: &str,
    status: ReservationStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update reservation status")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_reservation_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Reservation> {
    let status_str: String = row.get("status");
    let status = ReservationStatus::from_str(&status_str)
        .with_context(|| format!("Invalid reservation status in database: {}", status_str))?;

    Ok(Reservation {
        id: row.get("id"),
        room_id: row.get("room_id"),
        user_id: row.get("user_id"),
        purpose: row.get("purpose"),
        description: row.get("description"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        status,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{RoomRepository, SqlxRoomRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Room, RoomStatus, User, UserRole};
    use chrono::TimeZone;

    struct TestContext {
        repo: SqlxReservationRepository,
        room_id: i64,
        user_id: i64,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "booker@example.com".to_string(),
                "$argon2id$fake".to_string(),
                UserRole::Student,
            ))
            .await
            .expect("Failed to create user");

        let room = SqlxRoomRepository::new(pool.clone())
            .create(&Room {
                id: 0,
                room_code: "R101".to_string(),
                name: "Lecture Hall".to_string(),
                image_url: None,
                status: RoomStatus::Available,
                capacity: 60,
                location: "Main building".to_string(),
                kind: "lecture hall".to_string(),
                furniture: true,
                display: true,
                audio: true,
                air_conditioning: false,
            })
            .await
            .expect("Failed to create room");

        TestContext {
            repo: SqlxReservationRepository::new(pool),
            room_id: room.id,
            user_id: user.id,
        }
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn reservation(ctx: &TestContext, start: DateTime<Utc>, end: DateTime<Utc>) -> Reservation {
        Reservation::new(
            ctx.room_id,
            ctx.user_id,
            "Study group".to_string(),
            None,
            start,
            end,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_reservation() {
        let ctx = setup().await;
        let r = reservation(&ctx, ts(10, 0), ts(11, 0));

        ctx.repo.create(&r).await.expect("Failed to create");

        let found = ctx
            .repo
            .get_by_id(&r.id)
            .await
            .expect("Failed to get")
            .expect("Reservation not found");

        assert_eq!(found.id, r.id);
        assert_eq!(found.room_id, ctx.room_id);
        assert_eq!(found.status, ReservationStatus::Pending);
        assert_eq!(found.start_time, ts(10, 0));
        assert_eq!(found.end_time, ts(11, 0));
    }

    #[tokio::test]
    async fn test_get_reservation_not_found() {
        let ctx = setup().await;
        let found = ctx
            .repo
            .get_by_id("00000000-0000-0000-0000-000000000000")
            .await
            .expect("Failed to query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_pending_reservations_do_not_conflict() {
        let ctx = setup().await;
        let r = reservation(&ctx, ts(10, 0), ts(11, 0));
        ctx.repo.create(&r).await.unwrap();

        let count = ctx
            .repo
            .count_approved_overlapping(ctx.room_id, ts(10, 0), ts(11, 0))
            .await
            .expect("Failed to count");

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_approved_overlap_is_counted() {
        let ctx = setup().await;
        let r = reservation(&ctx, ts(10, 0), ts(11, 0));
        ctx.repo.create(&r).await.unwrap();
        ctx.repo
            .update_status(&r.id, ReservationStatus::Approved)
            .await
            .unwrap();

        // Contained, spanning, and partial overlaps all count
        for (start, end) in [
            (ts(10, 15), ts(10, 45)),
            (ts(9, 0), ts(12, 0)),
            (ts(9, 30), ts(10, 30)),
            (ts(10, 30), ts(11, 30)),
        ] {
            let count = ctx
                .repo
                .count_approved_overlapping(ctx.room_id, start, end)
                .await
                .expect("Failed to count");
            assert_eq!(count, 1, "expected conflict for [{} .. {})", start, end);
        }
    }

    #[tokio::test]
    async fn test_touching_intervals_are_not_conflicts() {
        let ctx = setup().await;
        let r = reservation(&ctx, ts(10, 0), ts(11, 0));
        ctx.repo.create(&r).await.unwrap();
        ctx.repo
            .update_status(&r.id, ReservationStatus::Approved)
            .await
            .unwrap();

        for (start, end) in [(ts(11, 0), ts(12, 0)), (ts(9, 0), ts(10, 0))] {
            let count = ctx
                .repo
                .count_approved_overlapping(ctx.room_id, start, end)
                .await
                .expect("Failed to count");
            assert_eq!(count, 0, "adjacent interval [{} .. {}) must not conflict", start, end);
        }
    }

    #[tokio::test]
    async fn test_conflict_is_scoped_to_room() {
        let ctx = setup().await;
        let r = reservation(&ctx, ts(10, 0), ts(11, 0));
        ctx.repo.create(&r).await.unwrap();
        ctx.repo
            .update_status(&r.id, ReservationStatus::Approved)
            .await
            .unwrap();

        let count = ctx
            .repo
            .count_approved_overlapping(ctx.room_id + 1, ts(10, 0), ts(11, 0))
            .await
            .expect("Failed to count");

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_update_status() {
        let ctx = setup().await;
        let r = reservation(&ctx, ts(10, 0), ts(11, 0));
        ctx.repo.create(&r).await.unwrap();

        let updated = ctx
            .repo
            .update_status(&r.id, ReservationStatus::Rejected)
            .await
            .expect("Failed to update");
        assert!(updated);

        let found = ctx.repo.get_by_id(&r.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReservationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_update_status_missing_row() {
        let ctx = setup().await;
        let updated = ctx
            .repo
            .update_status("missing-id", ReservationStatus::Approved)
            .await
            .expect("Failed to update");
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_list_by_user_newest_first() {
        let ctx = setup().await;
        let a = reservation(&ctx, ts(10, 0), ts(11, 0));
        ctx.repo.create(&a).await.unwrap();
        let mut b = reservation(&ctx, ts(12, 0), ts(13, 0));
        b.created_at = a.created_at + chrono::Duration::seconds(5);
        ctx.repo.create(&b).await.unwrap();

        let list = ctx
            .repo
            .list_by_user(ctx.user_id)
            .await
            .expect("Failed to list");

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, b.id);
        assert_eq!(list[1].id, a.id);
    }
}
