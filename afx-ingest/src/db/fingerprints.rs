//! Persisted fingerprint lookup
//!
//! Answers the change detector from the asset tables. Only committed rows
//! count as complete; an uncommitted row at the same path means an earlier
//! run stopped part way and the asset is reported as modified.

use afx_common::{AssetType, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::records::AudioAssetRecord;
use crate::types::{AssetPath, FileFingerprint, FingerprintIndex};

/// Fingerprint index over the `tracks` / `samples` tables
#[derive(Clone)]
pub struct SqliteFingerprintIndex {
    pool: SqlitePool,
}

impl SqliteFingerprintIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read back the persisted fingerprint for a path
    pub async fn fingerprint(
        &self,
        path: &str,
        asset_type: AssetType,
    ) -> Result<Option<(AudioAssetRecord, bool)>> {
        let row = sqlx::query(&format!(
            "SELECT path, filesize, duration, channels, bitrate, samplerate, modified_ms, checksum, committed \
             FROM {} WHERE path = ?",
            asset_type.table_name()
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = AudioAssetRecord {
            path: row.try_get("path")?,
            filesize: row.try_get::<i64, _>("filesize")? as u64,
            duration: row.try_get("duration")?,
            channels: row.try_get::<Option<i64>, _>("channels")?.map(|v| v as u32),
            bitrate: row.try_get::<Option<i64>, _>("bitrate")?.map(|v| v as u32),
            samplerate: row.try_get::<Option<i64>, _>("samplerate")?.map(|v| v as u32),
            modified_ms: row.try_get("modified_ms")?,
            checksum: row.try_get("checksum")?,
        };
        let committed: i64 = row.try_get("committed")?;
        Ok(Some((record, committed != 0)))
    }
}

#[async_trait]
impl FingerprintIndex for SqliteFingerprintIndex {
    async fn query_status(
        &self,
        asset: &AssetPath,
        fingerprint: &FileFingerprint,
        asset_type: AssetType,
    ) -> Result<String> {
        let path = asset.path.display().to_string();

        if let Some((record, committed)) = self.fingerprint(&path, asset_type).await? {
            let same = record.filesize == fingerprint.size && record.checksum == fingerprint.checksum;
            let answer = if committed && same { "found" } else { "modified" };
            return Ok(answer.to_string());
        }

        let elsewhere: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE checksum = ? AND committed = 1",
            asset_type.table_name()
        ))
        .bind(&fingerprint.checksum)
        .fetch_one(&self.pool)
        .await?;

        let answer = if elsewhere > 0 { "moved" } else { "not found" };
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteFeatureStore;
    use crate::types::{ChangeStatus, FeatureStore};
    use std::path::PathBuf;

    fn fingerprint(size: u64, checksum: &str) -> FileFingerprint {
        FileFingerprint {
            size,
            modified_ms: 0,
            checksum: checksum.to_string(),
        }
    }

    async fn seed(pool: &SqlitePool, path: &str, size: u64, checksum: &str, commit: bool) {
        let mut store = SqliteFeatureStore::acquire(pool).await.unwrap();
        let record = AudioAssetRecord {
            path: path.to_string(),
            filesize: size,
            checksum: checksum.to_string(),
            ..Default::default()
        };
        let id = store
            .insert_asset(AssetType::Track, &record, &ChangeStatus::New)
            .await
            .unwrap();
        if commit {
            store.commit_asset(AssetType::Track, id).await.unwrap();
        }
    }

    async fn status(index: &SqliteFingerprintIndex, path: &str, size: u64, checksum: &str) -> String {
        let asset = AssetPath::new(PathBuf::from(path));
        index
            .query_status(&asset, &fingerprint(size, checksum), AssetType::Track)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_vocabulary() {
        let pool = crate::db::init_memory_pool().await.unwrap();
        seed(&pool, "/m/a.wav", 100, "aaa", true).await;
        seed(&pool, "/m/partial.wav", 100, "ppp", false).await;
        let index = SqliteFingerprintIndex::new(pool);

        assert_eq!(status(&index, "/m/a.wav", 100, "aaa").await, "found");
        assert_eq!(status(&index, "/m/a.wav", 200, "aaa").await, "modified");
        assert_eq!(status(&index, "/m/a.wav", 100, "bbb").await, "modified");
        assert_eq!(status(&index, "/m/partial.wav", 100, "ppp").await, "modified");
        assert_eq!(status(&index, "/other/a.wav", 100, "aaa").await, "moved");
        assert_eq!(status(&index, "/other/p.wav", 100, "ppp").await, "not found");
        assert_eq!(status(&index, "/m/new.wav", 1, "zzz").await, "not found");
    }

    #[tokio::test]
    async fn test_fingerprint_read_back() {
        let pool = crate::db::init_memory_pool().await.unwrap();
        seed(&pool, "/m/a.wav", 100, "aaa", true).await;
        let index = SqliteFingerprintIndex::new(pool);

        let (record, committed) = index
            .fingerprint("/m/a.wav", AssetType::Track)
            .await
            .unwrap()
            .unwrap();
        assert!(committed);
        assert_eq!(record.filesize, 100);
        assert_eq!(record.checksum, "aaa");
        assert!(index.fingerprint("/m/b.wav", AssetType::Track).await.unwrap().is_none());
    }
}
