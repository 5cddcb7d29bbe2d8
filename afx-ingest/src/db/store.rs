//! SQLite feature store
//!
//! Holds one pooled connection for the lifetime of the run; the insertion
//! driver owns the store, so every write goes through that one connection.
//! Statements name their columns explicitly and refuse field lists that do
//! not match the group's declared schema.

use std::path::Path;

use afx_common::{AssetType, Error, Result};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::records::{column_names, encode_f32_blob, AudioAssetRecord, Field, FieldValue, RecordGroup};
use crate::types::{ChangeStatus, FeatureStore};

/// Feature store backed by one SQLite connection
pub struct SqliteFeatureStore {
    conn: PoolConnection<Sqlite>,
}

impl SqliteFeatureStore {
    /// Take a connection out of the pool for the run
    pub async fn acquire(pool: &SqlitePool) -> Result<Self> {
        Ok(Self {
            conn: pool.acquire().await?,
        })
    }

    /// Remove rows sharing `checksum` whose path no longer exists
    async fn retire_vanished(&mut self, table: &str, checksum: &str) -> Result<()> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as(&format!("SELECT id, path FROM {} WHERE checksum = ?", table))
                .bind(checksum)
                .fetch_all(&mut *self.conn)
                .await?;

        for (id, path) in rows {
            // Identical copies that still exist keep their rows
            if !Path::new(&path).exists() {
                debug!(old_path = %path, "Retiring vanished asset row");
                sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
                    .bind(id)
                    .execute(&mut *self.conn)
                    .await?;
            }
        }
        Ok(())
    }
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    )
}

fn bind_field<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &FieldValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Integer(v) => query.bind(*v),
        FieldValue::Real(v) => query.bind(*v),
        FieldValue::Text(v) => query.bind(v.clone()),
        FieldValue::Vector(v) => query.bind(v.as_deref().map(encode_f32_blob)),
    }
}

fn check_fields(expected: &[&str], fields: &[Field], what: &str) -> Result<()> {
    let actual: Vec<&str> = fields.iter().map(|f| f.name).collect();
    if actual != expected {
        return Err(Error::InvalidInput(format!(
            "{} fields {:?} do not match columns {:?}",
            what, actual, expected
        )));
    }
    Ok(())
}

#[async_trait]
impl FeatureStore for SqliteFeatureStore {
    async fn insert_asset(
        &mut self,
        asset_type: AssetType,
        record: &AudioAssetRecord,
        status: &ChangeStatus,
    ) -> Result<i64> {
        let table = asset_type.table_name();

        // Group rows go with the asset row (ON DELETE CASCADE)
        sqlx::query(&format!("DELETE FROM {} WHERE path = ?", table))
            .bind(&record.path)
            .execute(&mut *self.conn)
            .await?;

        // Moved content is not always classified Moved (forced runs, occupied target paths)
        self.retire_vanished(table, &record.checksum).await?;

        let columns = column_names(AudioAssetRecord::SCHEMA);
        let fields = record.fields();
        check_fields(&columns, &fields, table)?;

        let sql = insert_sql(table, &columns);
        let mut query = sqlx::query(&sql);
        for field in &fields {
            query = bind_field(query, &field.value);
        }
        let id = query.execute(&mut *self.conn).await?.last_insert_rowid();

        debug!(path = %record.path, id, table, ?status, "Inserted asset row");
        Ok(id)
    }

    async fn attach(
        &mut self,
        asset_type: AssetType,
        asset_id: i64,
        group: RecordGroup,
        fields: &[Field],
    ) -> Result<()> {
        let table = group.table(asset_type).ok_or_else(|| {
            Error::InvalidInput(format!("{} has no table for {}", group, asset_type))
        })?;

        let mut columns = column_names(group.schema());
        check_fields(&columns, fields, table)?;
        columns.insert(0, "asset_id");

        let sql = insert_sql(table, &columns);
        let mut query = sqlx::query(&sql).bind(asset_id);
        for field in fields {
            query = bind_field(query, &field.value);
        }
        query.execute(&mut *self.conn).await?;
        Ok(())
    }

    async fn commit_asset(&mut self, asset_type: AssetType, asset_id: i64) -> Result<()> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET committed = 1 WHERE id = ?",
            asset_type.table_name()
        ))
        .bind(asset_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "{} row {}",
                asset_type.table_name(),
                asset_id
            )));
        }
        Ok(())
    }
}
