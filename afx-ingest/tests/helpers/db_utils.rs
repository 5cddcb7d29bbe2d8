//! Database test utilities

use anyhow::Result;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Temporary on-disk feature database with all tables created
///
/// The TempDir must be kept alive for the duration of the test.
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_afx.db");
    let pool = afx_ingest::db::init_database_pool(&db_path).await?;
    Ok((temp_dir, pool))
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
