//! # afx common library
//!
//! Shared code for the afx feature-extraction tools:
//! - Error type and result alias
//! - TOML configuration model and config-path resolution
//! - Asset type selector (track / sample)
//! - Declarative table schema helpers

pub mod asset_type;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use asset_type::AssetType;
pub use error::{Error, Result};
