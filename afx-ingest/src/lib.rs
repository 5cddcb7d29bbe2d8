//! afx-ingest library
//!
//! Incremental, parallel audio feature extraction into SQLite. The binary is a
//! thin CLI over [`services::pipeline`]; everything here is also usable from
//! integration tests with mock collaborators.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod records;
pub mod services;
pub mod types;

pub use crate::error::{IngestError, Result};
