//! SQLite persistence gateway
//!
//! - [`schema`]: table creation from the record schemas
//! - [`store`]: [`SqliteFeatureStore`], the single-writer feature store
//! - [`fingerprints`]: [`SqliteFingerprintIndex`], status lookup for change detection

pub mod fingerprints;
pub mod schema;
pub mod store;

pub use fingerprints::SqliteFingerprintIndex;
pub use store::SqliteFeatureStore;

use afx_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database file and its tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    schema::init_tables(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with tables created
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    schema::init_tables(&pool).await?;
    Ok(pool)
}
