//! Login log repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::LoginLog;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Login log repository trait
#[async_trait]
pub trait LoginLogRepository: Send + Sync {
    /// Record a login event
    async fn create(&self, log: &LoginLog) -> Result<LoginLog>;

    /// List login events for a user, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<LoginLog>>;
}

/// SQLx-based login log repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxLoginLogRepository {
    pool: DynDatabasePool,
}

impl SqlxLoginLogRepository {
    /// Create a new SQLx login log repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LoginLogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LoginLogRepository for SqlxLoginLogRepository {
    async fn create(&self, log: &LoginLog) -> Result<LoginLog> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_log_sqlite(self.pool.as_sqlite().unwrap(), log).await,
            DatabaseDriver::Mysql => create_log_mysql(self.pool.as_mysql().unwrap(), log).await,
        }
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<LoginLog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_logs_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                list_logs_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_log_sqlite(pool: &SqlitePool, log: &LoginLog) -> Result<LoginLog> {
    let result = sqlx::query(
        "INSERT INTO login_logs (user_id, logged_at, user_agent) VALUES (?, ?, ?)",
    )
    .bind(log.user_id)
    .bind(log.logged_at)
    .bind(&log.user_agent)
    .execute(pool)
    .await
    .context("Failed to create login log")?;

    let mut created = log.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn list_logs_by_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<LoginLog>> {
    let rows = sqlx::query(
        "SELECT id, user_id, logged_at, user_agent FROM login_logs \
         WHERE user_id = ? ORDER BY logged_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list login logs")?;

    Ok(rows
        .iter()
        .map(|row| LoginLog {
            id: row.get("id"),
            user_id: row.get("user_id"),
            logged_at: row.get("logged_at"),
            user_agent: row.get("user_agent"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_log_mysql(pool: &MySqlPool, log: &LoginLog) -> Result<LoginLog> {
    let result = sqlx::query(
        "INSERT INTO login_logs (user_id, logged_at, user_agent) VALUES (?, ?, ?)",
    )
    .bind(log.user_id)
    .bind(log.logged_at)
    .bind(&log.user_agent)
    .execute(pool)
    .await
    .context("Failed to create login log")?;

    let mut created = log.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn list_logs_by_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<LoginLog>> {
    let rows = sqlx::query(
        "SELECT id, user_id, logged_at, user_agent FROM login_logs \
         WHERE user_id = ? ORDER BY logged_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list login logs")?;

    Ok(rows
        .iter()
        .map(|row| LoginLog {
            id: row.get("id"),
            user_id: row.get("user_id"),
            logged_at: row.get("logged_at"),
            user_agent: row.get("user_agent"),
        })
        .collect())
}
