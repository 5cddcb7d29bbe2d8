//! Table layout
//!
//! One asset table per asset type (`tracks`, `samples`) plus one table per
//! feature group. Group rows reference their asset with `ON DELETE CASCADE`,
//! so replacing an asset row drops its stale features.

use afx_common::db::{create_table_sql, ColumnDefinition};
use afx_common::{AssetType, Result};
use sqlx::SqlitePool;
use tracing::debug;

use crate::records::{column_definitions, AudioAssetRecord, RecordGroup};

/// Columns of an asset table
pub fn asset_table_columns() -> Vec<ColumnDefinition> {
    let mut columns = vec![ColumnDefinition::new("id", "INTEGER").primary_key()];
    for column in column_definitions(AudioAssetRecord::SCHEMA) {
        let column = match column.name.as_str() {
            "path" => column.not_null().unique(),
            "filesize" | "modified_ms" | "checksum" => column.not_null(),
            _ => column,
        };
        columns.push(column);
    }
    columns.push(ColumnDefinition::new("committed", "INTEGER").not_null().default("0"));
    columns
}

/// Columns of a feature group table
pub fn group_table_columns(asset_type: AssetType, group: RecordGroup) -> Vec<ColumnDefinition> {
    let mut columns = vec![
        ColumnDefinition::new("id", "INTEGER").primary_key(),
        ColumnDefinition::new("asset_id", "INTEGER")
            .not_null()
            .unique()
            .references(format!("{}(id) ON DELETE CASCADE", asset_type.table_name())),
    ];
    columns.extend(column_definitions(group.schema()));
    columns
}

/// Create every table and index if missing
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    for asset_type in AssetType::all() {
        let table = asset_type.table_name();
        sqlx::query(&create_table_sql(table, &asset_table_columns()))
            .execute(pool)
            .await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_checksum ON {} (checksum)",
            asset_type.table_prefix(),
            table
        ))
        .execute(pool)
        .await?;

        for group in RecordGroup::all() {
            if let Some(group_table) = group.table(asset_type) {
                sqlx::query(&create_table_sql(
                    group_table,
                    &group_table_columns(asset_type, group),
                ))
                .execute(pool)
                .await?;
            }
        }
    }

    debug!("Feature tables ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use afx_common::db::table_exists;

    #[tokio::test]
    async fn test_all_tables_created() {
        let pool = crate::db::init_memory_pool().await.unwrap();
        for asset_type in AssetType::all() {
            assert!(table_exists(&pool, asset_type.table_name()).await.unwrap());
            for group in RecordGroup::all() {
                if let Some(table) = group.table(asset_type) {
                    assert!(table_exists(&pool, table).await.unwrap(), "{}", table);
                }
            }
        }
        assert!(!table_exists(&pool, "sample_tags").await.unwrap());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let pool = crate::db::init_memory_pool().await.unwrap();
        init_tables(&pool).await.unwrap();
    }

    #[test]
    fn test_lowlevel_columns_order() {
        let names: Vec<String> = group_table_columns(AssetType::Track, RecordGroup::LowLevel)
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mfcc = names.iter().position(|n| n == "mfcc").unwrap();
        assert_eq!(names[0], "id");
        assert_eq!(names[1], "asset_id");
        assert_eq!(names[mfcc - 1], "mfcc_frame_size");
    }
}
