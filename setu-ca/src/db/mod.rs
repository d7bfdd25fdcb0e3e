//! Database access layer for setu-ca

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

pub mod contracts;

/// Open (creating if needed) the service database
pub async fn open_database(db_path: &Path) -> Result<SqlitePool> {
    setu_common::db::init_database(db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}
