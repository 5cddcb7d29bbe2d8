//! Change detector
//!
//! Classifies catalog candidates against persisted fingerprints. Only `New`,
//! `Modified` and `Moved` assets enter the processing set, so a rerun over an
//! unchanged library dispatches no extraction work at all. An answer outside
//! the index vocabulary aborts the run before anything is dispatched.

use std::sync::Arc;

use afx_common::AssetType;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::types::{AssetPath, ChangeStatus, FileFingerprint, FingerprintIndex, PendingAsset};

/// Partition of the catalog by change status
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Processing set in catalog order
    pub pending: Vec<PendingAsset>,
    pub unchanged: Vec<AssetPath>,
    /// Assets whose fingerprint could not be read
    pub unreadable: Vec<(AssetPath, String)>,
}

impl ChangeSet {
    pub fn count(&self, status: &ChangeStatus) -> usize {
        self.pending.iter().filter(|p| &p.status == status).count()
    }
}

/// Change detector over a fingerprint index
pub struct ChangeDetector<'a> {
    index: &'a dyn FingerprintIndex,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(index: &'a dyn FingerprintIndex) -> Self {
        Self { index, pool: None }
    }

    /// Hash files on `pool` instead of rayon's global pool
    pub fn on_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Classify one asset
    pub async fn classify(
        &self,
        asset: &AssetPath,
        fingerprint: &FileFingerprint,
        asset_type: AssetType,
    ) -> Result<ChangeStatus> {
        let answer = self.index.query_status(asset, fingerprint, asset_type).await?;
        Ok(ChangeStatus::from_query(&answer))
    }

    /// Fingerprint and classify every candidate
    ///
    /// With `force` the index is not consulted and every readable asset is
    /// treated as new.
    pub async fn detect(
        &self,
        assets: Vec<AssetPath>,
        asset_type: AssetType,
        force: bool,
    ) -> Result<ChangeSet> {
        let fingerprints = fingerprint_all(assets, self.pool.clone()).await?;
        let mut set = ChangeSet::default();

        for (asset, fingerprint) in fingerprints {
            let fingerprint = match fingerprint {
                Ok(fingerprint) => fingerprint,
                Err(reason) => {
                    warn!(file = %asset, error = %reason, "Cannot read fingerprint, skipping");
                    set.unreadable.push((asset, reason));
                    continue;
                }
            };

            let status = if force {
                ChangeStatus::New
            } else {
                self.classify(&asset, &fingerprint, asset_type).await?
            };

            match status {
                ChangeStatus::Invalid(answer) => {
                    return Err(IngestError::DetectorContract {
                        path: asset.path,
                        status: answer,
                    });
                }
                ChangeStatus::Unchanged => {
                    debug!(file = %asset, "Unchanged");
                    set.unchanged.push(asset);
                }
                status => {
                    debug!(file = %asset, status = %status, "Queued for processing");
                    set.pending.push(PendingAsset { asset, status, fingerprint });
                }
            }
        }

        info!(
            new = set.count(&ChangeStatus::New),
            modified = set.count(&ChangeStatus::Modified),
            moved = set.count(&ChangeStatus::Moved),
            unchanged = set.unchanged.len(),
            unreadable = set.unreadable.len(),
            "Change detection complete"
        );
        Ok(set)
    }
}

/// Read fingerprints in parallel, keeping catalog order
async fn fingerprint_all(
    assets: Vec<AssetPath>,
    pool: Option<Arc<rayon::ThreadPool>>,
) -> Result<Vec<(AssetPath, std::result::Result<FileFingerprint, String>)>> {
    tokio::task::spawn_blocking(move || {
        let read_all = move || {
            assets
                .into_par_iter()
                .map(|asset| {
                    let fingerprint =
                        FileFingerprint::read(&asset.path).map_err(|e| e.to_string());
                    (asset, fingerprint)
                })
                .collect()
        };
        match pool {
            Some(pool) => pool.install(read_all),
            None => read_all(),
        }
    })
    .await
    .map_err(|e| IngestError::WorkerPool(format!("Fingerprint task failed: {}", e)))
}
