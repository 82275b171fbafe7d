//! Roomdesk - room reservation and facility status backend
//!
//! This library provides the core functionality for the Roomdesk service:
//! room catalog, reservation booking with conflict detection, announcements,
//! and inventory request status for an academic department.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
