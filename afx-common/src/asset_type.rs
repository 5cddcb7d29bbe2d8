//! Asset type selector
//!
//! Tracks and samples run through the same pipeline; the type only changes
//! which family of tables the records land in.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of audio asset being ingested
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Track,
    Sample,
}

impl AssetType {
    /// Name of the asset-level table for this type
    pub fn table_name(&self) -> &'static str {
        match self {
            AssetType::Track => "tracks",
            AssetType::Sample => "samples",
        }
    }

    /// Prefix used by the per-group tables (`track_features_rhythm`, ...)
    pub fn table_prefix(&self) -> &'static str {
        match self {
            AssetType::Track => "track",
            AssetType::Sample => "sample",
        }
    }

    pub fn all() -> [AssetType; 2] {
        [AssetType::Track, AssetType::Sample]
    }
}

impl FromStr for AssetType {
    type Err = Error;
    fn from_str(input: &str) -> Result<AssetType> {
        match input {
            "track" | "tracks" => Ok(AssetType::Track),
            "sample" | "samples" => Ok(AssetType::Sample),
            e => Err(Error::InvalidInput(format!("unknown asset type: {}", e))),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssetType::Track => write!(f, "track"),
            AssetType::Sample => write!(f, "sample"),
        }
    }
}
