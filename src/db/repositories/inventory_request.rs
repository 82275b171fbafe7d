//! Inventory request repository
//!
//! Read side of the inventory workflow. This service only lists requests
//! for the facility status page; `create` exists for seeding and tests.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::InventoryRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Inventory request repository trait
#[async_trait]
pub trait InventoryRequestRepository: Send + Sync {
    /// Insert an inventory request
    async fn create(&self, request: &InventoryRequest) -> Result<InventoryRequest>;

    /// List all inventory requests, newest first
    async fn list(&self) -> Result<Vec<InventoryRequest>>;
}

/// SQLx-based inventory request repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxInventoryRequestRepository {
    pool: DynDatabasePool,
}

impl SqlxInventoryRequestRepository {
    /// Create a new SQLx inventory request repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InventoryRequestRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InventoryRequestRepository for SqlxInventoryRequestRepository {
    async fn create(&self, request: &InventoryRequest) -> Result<InventoryRequest> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_request_sqlite(self.pool.as_sqlite().unwrap(), request).await
            }
            DatabaseDriver::Mysql => {
                create_request_mysql(self.pool.as_mysql().unwrap(), request).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<InventoryRequest>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_requests_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_requests_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

const LIST_SQL: &str = "SELECT id, request_code, requester_name, item_name, requested_at, \
     status, pickup_at FROM inventory_requests ORDER BY requested_at DESC";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_request_sqlite(
    pool: &SqlitePool,
    request: &InventoryRequest,
) -> Result<InventoryRequest> {
    let result = sqlx::query(
        r#"
        INSERT INTO inventory_requests (request_code, requester_name, item_name,
                                        requested_at, status, pickup_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.request_code)
    .bind(&request.requester_name)
    .bind(&request.item_name)
    .bind(request.requested_at)
    .bind(&request.status)
    .bind(request.pickup_at)
    .execute(pool)
    .await
    .context("Failed to create inventory request")?;

    let mut created = request.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn list_requests_sqlite(pool: &SqlitePool) -> Result<Vec<InventoryRequest>> {
    let rows = sqlx::query(LIST_SQL)
        .fetch_all(pool)
        .await
        .context("Failed to list inventory requests")?;

    Ok(rows
        .iter()
        .map(|row| InventoryRequest {
            id: row.get("id"),
            request_code: row.get("request_code"),
            requester_name: row.get("requester_name"),
            item_name: row.get("item_name"),
            requested_at: row.get("requested_at"),
            status: row.get("status"),
            pickup_at: row.get("pickup_at"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_request_mysql(
    pool: &MySqlPool,
    request: &InventoryRequest,
) -> Result<InventoryRequest> {
    let result = sqlx::query(
        r#"
        INSERT INTO inventory_requests (request_code, requester_name, item_name,
                                        requested_at, status, pickup_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.request_code)
    .bind(&request.requester_name)
    .bind(&request.item_name)
    .bind(request.requested_at)
    .bind(&request.status)
    .bind(request.pickup_at)
    .execute(pool)
    .await
    .context("Failed to create inventory request")?;

    let mut created = request.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn list_requests_mysql(pool: &MySqlPool) -> Result<Vec<InventoryRequest>> {
    let rows = sqlx::query(LIST_SQL)
        .fetch_all(pool)
        .await
        .context("Failed to list inventory requests")?;

    Ok(rows
        .iter()
        .map(|row| InventoryRequest {
            id: row.get("id"),
            request_code: row.get("request_code"),
            requester_name: row.get("requester_name"),
            item_name: row.get("item_name"),
            requested_at: row.get("requested_at"),
            status: row.get("status"),
            pickup_at: row.get("pickup_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, Utc};

    async fn setup_test_repo() -> SqlxInventoryRequestRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxInventoryRequestRepository::new(pool)
    }

    fn request(code: &str) -> InventoryRequest {
        InventoryRequest {
            id: 0,
            request_code: code.to_string(),
            requester_name: "Prof. Okafor".to_string(),
            item_name: "HDMI cable".to_string(),
            requested_at: Utc::now(),
            status: "Pending".to_string(),
            pickup_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_requests() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&request("INV-0001"))
            .await
            .expect("Failed to create request");

        assert!(created.id > 0);

        let list = repo.list().await.expect("Failed to list");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].request_code, "INV-0001");
        assert_eq!(list[0].status, "Pending");
        assert!(list[0].pickup_at.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_test_repo().await;
        let mut older = request("INV-0001");
        older.requested_at = Utc::now() - Duration::days(2);
        repo.create(&older).await.unwrap();
        repo.create(&request("INV-0002")).await.unwrap();

        let list = repo.list().await.expect("Failed to list");
        assert_eq!(list[0].request_code, "INV-0002");
        assert_eq!(list[1].request_code, "INV-0001");
    }

    #[tokio::test]
    async fn test_pickup_time_round_trip() {
        let repo = setup_test_repo().await;
        let mut r = request("INV-0003");
        r.status = "Approved".to_string();
        r.pickup_at = Some(Utc::now() + Duration::days(1));
        repo.create(&r).await.unwrap();

        let list = repo.list().await.expect("Failed to list");
        assert_eq!(list[0].status, "Approved");
        assert!(list[0].pickup_at.is_some());
    }
}
