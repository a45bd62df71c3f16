//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction and pass `&mut tx` through to compose
//! several calls atomically.
//!
//! Timestamps are always supplied by the caller, so that every row written in one transaction carries the same time.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod menu_items;
pub mod order_items;
pub mod orders;
pub mod recalculation;
pub mod restaurants;
pub mod reviews;
pub mod status_history;
pub mod users;

/// Opens a connection pool in WAL mode, with foreign keys enforced.
///
/// Writers that find the database locked wait up to `busy_timeout` before failing with `SQLITE_BUSY`.
pub async fn new_pool(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(busy_timeout);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
