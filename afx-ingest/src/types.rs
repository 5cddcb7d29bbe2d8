//! Core types and collaborator traits
//!
//! The two traits here are the boundaries the orchestration core talks to:
//! - [`FingerprintIndex`]: read-only status lookup used by the change detector
//! - [`FeatureStore`]: the single-writer persistence gateway used by the
//!   insertion driver

use afx_common::AssetType;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::records::{AudioAssetRecord, Field, RecordGroup};

// ============================================================================
// Assets
// ============================================================================

/// Canonical path of a candidate asset plus its extension tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath {
    /// Absolute, canonicalized path; identity key for all downstream lookups
    pub path: PathBuf,
    /// Lowercase extension without the dot (empty if none)
    pub extension: String,
}

impl AssetPath {
    /// Build from an already canonical path
    pub fn new(path: PathBuf) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self { path, extension }
    }

    /// Canonicalize and wrap a path
    pub fn canonicalize(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(path.canonicalize()?))
    }
}

impl std::fmt::Display for AssetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Fingerprint attributes read from the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    /// File size in bytes
    pub size: u64,
    /// Modification time, unix milliseconds
    pub modified_ms: i64,
    /// Hex SHA-256 of the file contents
    pub checksum: String,
}

impl FileFingerprint {
    /// Read size, mtime and content checksum
    ///
    /// Blocking; the change detector runs this off the async runtime.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 1024 * 1024]; // 1MB chunks

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self {
            size: metadata.len(),
            modified_ms,
            checksum: format!("{:x}", hasher.finalize()),
        })
    }
}

// ============================================================================
// Change classification
// ============================================================================

/// Classification of a candidate against persisted state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeStatus {
    /// No persisted fingerprint
    New,
    /// Persisted fingerprint matches; no work needed
    Unchanged,
    /// Same path, fingerprint attributes changed
    Modified,
    /// Same fingerprint found under a different path
    Moved,
    /// Index answered outside its vocabulary
    Invalid(String),
}

impl ChangeStatus {
    /// Map a fingerprint index answer onto a status
    pub fn from_query(answer: &str) -> Self {
        match answer {
            "not found" => ChangeStatus::New,
            "found" => ChangeStatus::Unchanged,
            "modified" => ChangeStatus::Modified,
            "moved" => ChangeStatus::Moved,
            other => ChangeStatus::Invalid(other.to_string()),
        }
    }

    /// Whether the asset enters the processing set
    pub fn needs_processing(&self) -> bool {
        matches!(
            self,
            ChangeStatus::New | ChangeStatus::Modified | ChangeStatus::Moved
        )
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeStatus::New => write!(f, "new"),
            ChangeStatus::Unchanged => write!(f, "unchanged"),
            ChangeStatus::Modified => write!(f, "modified"),
            ChangeStatus::Moved => write!(f, "moved"),
            ChangeStatus::Invalid(s) => write!(f, "invalid({})", s),
        }
    }
}

/// Asset selected for processing, with the fingerprint taken at detection time
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAsset {
    pub asset: AssetPath,
    pub status: ChangeStatus,
    pub fingerprint: FileFingerprint,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Persisted fingerprint lookup
///
/// Answers with one of `"not found"`, `"found"`, `"modified"`, `"moved"`.
/// Anything else is a contract violation the change detector treats as fatal.
#[async_trait]
pub trait FingerprintIndex: Send + Sync {
    async fn query_status(
        &self,
        asset: &AssetPath,
        fingerprint: &FileFingerprint,
        asset_type: AssetType,
    ) -> afx_common::Result<String>;
}

/// Persistence gateway
///
/// Not assumed safe for concurrent writers; the insertion driver owns the only
/// handle for the whole run.
#[async_trait]
pub trait FeatureStore: Send {
    /// Insert the asset-level row and return its identifier
    ///
    /// `status` tells the store which earlier rows the new one replaces.
    async fn insert_asset(
        &mut self,
        asset_type: AssetType,
        record: &AudioAssetRecord,
        status: &ChangeStatus,
    ) -> afx_common::Result<i64>;

    /// Attach one feature group row to an inserted asset
    async fn attach(
        &mut self,
        asset_type: AssetType,
        asset_id: i64,
        group: RecordGroup,
        fields: &[Field],
    ) -> afx_common::Result<()>;

    /// Mark an asset complete so the next run classifies it as unchanged
    async fn commit_asset(&mut self, asset_type: AssetType, asset_id: i64)
        -> afx_common::Result<()>;
}
