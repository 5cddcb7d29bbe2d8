//! Configuration loading and config-file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `AFX_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/afx/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error unless it was named explicitly;
//! the loader warns and continues with defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "AFX_CONFIG";

/// Extensions recognized as audio when walking directories
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "opus", "wav", "aiff", "aif", "alac", "aac", "m4a", "mp4",
];

/// Entries skipped during directory walks
pub const DEFAULT_IGNORE_PATTERNS: &[&str] =
    &[".DS_Store", "Thumbs.db", ".git", ".svn", "node_modules"];

/// Default external feature extractor
pub const DEFAULT_EXTRACTOR_COMMAND: &str = "essentia_streaming_extractor_music";

/// Top-level configuration file model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AfxConfig {
    /// SQLite database file; defaults to `<data_local_dir>/afx/afx.db`
    pub database: Option<PathBuf>,
    pub catalog: CatalogConfig,
    pub extraction: ExtractionConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// `[catalog]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Lowercase extensions without the leading dot
    pub extensions: Vec<String>,
    /// File or directory names skipped during the walk
    pub ignore_patterns: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `[extraction]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Analysis sample rate handed to the extractor (Hz)
    pub sample_rate: u32,
    /// Downmix to mono before analysis
    pub mono: bool,
    /// External extractor program
    ///
    /// Must write frame-level descriptor pools. Run with the default
    /// arguments, `essentia_streaming_extractor_music` writes aggregated
    /// statistics only, and the lowlevel, sfx, tonal and spectrogram groups
    /// are then stored as absent. Pass a profile with `outputFrames: 1`
    /// through `args` to get frame data.
    pub command: String,
    /// Argument template; `{input}`, `{output}`, `{sample_rate}`, `{mono}`
    /// and `{descriptors}` are substituted per invocation
    ///
    /// e.g. `["{input}", "{output}", "/etc/afx/frames.yaml"]`
    pub args: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            mono: false,
            command: DEFAULT_EXTRACTOR_COMMAND.to_string(),
            args: vec!["{input}".to_string(), "{output}".to_string()],
        }
    }
}

/// `[scheduler]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Worker threads; `None` means one per CPU
    pub jobs: Option<usize>,
    /// Assets per super-batch (outer batching level)
    pub queue_size: usize,
    /// Assets per job (inner batching level)
    pub batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            queue_size: 16,
            batch_size: 1,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AfxConfig {
    /// Database path, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.queue_size == 0 {
            return Err(Error::Config("scheduler.queue_size must be at least 1".to_string()));
        }
        if self.scheduler.batch_size == 0 {
            return Err(Error::Config("scheduler.batch_size must be at least 1".to_string()));
        }
        if self.scheduler.jobs == Some(0) {
            return Err(Error::Config("scheduler.jobs must be at least 1".to_string()));
        }
        if self.extraction.sample_rate == 0 {
            return Err(Error::Config("extraction.sample_rate must be positive".to_string()));
        }
        if self.catalog.extensions.is_empty() {
            return Err(Error::Config("catalog.extensions must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("afx").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a config file
pub fn load_config(path: &Path) -> Result<AfxConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: AfxConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load the resolved config file or fall back to defaults
///
/// A file named on the command line must exist; one found through the
/// environment or the platform directory degrades to defaults when unreadable.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<AfxConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if cli_arg.is_some() => {
            let config = load_config(&path)?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        }
        Some(path) => match load_config(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring config {}: {}. Using defaults.", path.display(), e);
                Ok(AfxConfig::default())
            }
        },
        None => {
            warn!("No config file found, using compiled defaults");
            Ok(AfxConfig::default())
        }
    }
}

/// Platform default for the database file
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("afx").join("afx.db"))
        .unwrap_or_else(|| PathBuf::from("./afx_data/afx.db"))
}
