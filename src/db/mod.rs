//! Database layer
//!
//! Database abstraction for the Roomdesk service. Supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected based on configuration. The layer uses a
//! trait-based abstraction (`DatabasePool`) so repositories can work with
//! either backend without knowing the specific one.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
