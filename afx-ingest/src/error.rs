//! Error types for afx-ingest
//!
//! Run-level failures are [`IngestError`]. Stage-local errors
//! ([`CatalogError`], [`ExtractError`], [`MarshalIssue`]) are contained at the
//! asset or feature-group level and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Run-level error
#[derive(Debug, Error)]
pub enum IngestError {
    /// Fingerprint index answered with a status outside its vocabulary
    #[error("Change detector contract violation for {path}: unrecognized status {status:?}")]
    DetectorContract {
        /// Asset being classified
        path: PathBuf,
        /// Raw status returned by the index
        status: String,
    },

    /// Worker pool could not be built or a dispatched batch was lost
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// afx-common error (database, I/O)
    #[error(transparent)]
    Common(#[from] afx_common::Error),

    /// Database error raised outside a per-asset isolation unit
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Catalog walk error; the entry is skipped
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Input path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Directory or file could not be read
    #[error("Cannot read {path}: {reason}")]
    Unreadable {
        /// Entry path
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },
}

/// Extraction failure for a single asset
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Audio file could not be read or inspected
    #[error("Failed to read audio: {0}")]
    Read(String),

    /// External extractor could not be started
    #[error("Failed to execute extractor: {0}")]
    Execution(String),

    /// External extractor ran and reported failure
    #[error("Extractor failed: {0}")]
    AnalysisFailed(String),

    /// Extractor output could not be parsed
    #[error("Failed to parse extractor output: {0}")]
    Parse(String),

    /// Extractor panicked
    #[error("Extractor panicked: {0}")]
    Panicked(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reason a feature group could not be marshalled
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalIssue {
    /// Required descriptor missing from the bundle
    #[error("missing descriptor {0}")]
    Missing(String),

    /// Descriptor present with the wrong shape or type
    #[error("malformed descriptor {name}: {reason}")]
    Malformed {
        /// Descriptor name
        name: String,
        /// What was wrong
        reason: String,
    },
}

/// Result alias for run-level operations
pub type Result<T> = std::result::Result<T, IngestError>;
