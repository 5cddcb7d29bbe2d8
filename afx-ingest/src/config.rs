//! Run configuration
//!
//! Merges the config file with command-line flags. Priority per setting:
//! CLI flag → config file → compiled default.

use std::path::PathBuf;

use afx_common::config::{AfxConfig, CatalogConfig, ExtractionConfig};
use afx_common::AssetType;
use tracing::{debug, info};

use crate::cli::Args;
use crate::error::{IngestError, Result};
use crate::services::descriptor_selection::DescriptorToken;
use crate::services::extraction::ExtractOptions;

/// Everything one ingest run needs to know
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub inputs: Vec<PathBuf>,
    pub asset_type: AssetType,
    pub descriptors: Vec<DescriptorToken>,
    pub jobs: usize,
    pub queue_size: usize,
    pub batch_size: usize,
    pub force: bool,
    pub database: PathBuf,
    pub catalog: CatalogConfig,
    pub extraction: ExtractionConfig,
}

impl RunConfig {
    /// Defaults for the given inputs, as if no config file and no flags
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        let config = AfxConfig::default();
        Self {
            inputs,
            asset_type: AssetType::default(),
            descriptors: Vec::new(),
            jobs: resolve_jobs(None, None),
            queue_size: config.scheduler.queue_size,
            batch_size: config.scheduler.batch_size,
            force: false,
            database: config.database_path(),
            catalog: config.catalog,
            extraction: config.extraction,
        }
    }

    /// Apply CLI overrides on top of the loaded config file
    pub fn from_args(args: &Args, config: &AfxConfig) -> Result<Self> {
        let mut extraction = config.extraction.clone();
        if let Some(rate) = args.sample_rate {
            extraction.sample_rate = rate;
        }
        if args.mono {
            extraction.mono = true;
        }

        let run = Self {
            inputs: args.inputs.clone(),
            asset_type: args.asset_type,
            descriptors: args.descriptors.clone(),
            jobs: resolve_jobs(args.jobs, config.scheduler.jobs),
            queue_size: args.queue_size.unwrap_or(config.scheduler.queue_size),
            batch_size: args.batch_size.unwrap_or(config.scheduler.batch_size),
            force: args.force,
            database: args
                .database
                .clone()
                .unwrap_or_else(|| config.database_path()),
            catalog: config.catalog.clone(),
            extraction,
        };
        run.validate()?;

        info!(
            asset_type = %run.asset_type,
            jobs = run.jobs,
            queue_size = run.queue_size,
            batch_size = run.batch_size,
            force = run.force,
            database = %run.database.display(),
            "Run configuration resolved"
        );
        Ok(run)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(IngestError::Config("jobs must be at least 1".to_string()));
        }
        if self.queue_size == 0 || self.batch_size == 0 {
            return Err(IngestError::Config(
                "queue size and batch size must be at least 1".to_string(),
            ));
        }
        if self.extraction.sample_rate == 0 {
            return Err(IngestError::Config("sample rate must be positive".to_string()));
        }
        Ok(())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::from(&self.extraction)
    }
}

/// Worker count: CLI → config → one per CPU
fn resolve_jobs(cli: Option<usize>, config: Option<usize>) -> usize {
    if let Some(jobs) = cli {
        debug!(jobs, "Worker count from command line");
        return jobs;
    }
    if let Some(jobs) = config {
        debug!(jobs, "Worker count from config file");
        return jobs;
    }
    num_cpus::get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_config() {
        let mut config = AfxConfig::default();
        config.scheduler.jobs = Some(3);
        config.scheduler.queue_size = 32;
        config.database = Some(PathBuf::from("/data/from-config.db"));

        let args = Args::try_parse_from([
            "afx-ingest",
            "-j",
            "5",
            "--database",
            "/data/cli.db",
            "--mono",
        ])
        .unwrap();
        let run = RunConfig::from_args(&args, &config).unwrap();

        assert_eq!(run.jobs, 5);
        assert_eq!(run.queue_size, 32);
        assert_eq!(run.batch_size, 1);
        assert_eq!(run.database, PathBuf::from("/data/cli.db"));
        assert!(run.extraction.mono);
    }

    #[test]
    fn test_config_used_when_flags_absent() {
        let mut config = AfxConfig::default();
        config.scheduler.jobs = Some(2);
        config.extraction.sample_rate = 22_050;

        let args = Args::try_parse_from(["afx-ingest"]).unwrap();
        let run = RunConfig::from_args(&args, &config).unwrap();
        assert_eq!(run.jobs, 2);
        assert_eq!(run.extract_options().sample_rate, 22_050);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let args = Args::try_parse_from(["afx-ingest", "--batch-size", "0"]).unwrap();
        assert!(RunConfig::from_args(&args, &AfxConfig::default()).is_err());

        let args = Args::try_parse_from(["afx-ingest", "-j", "0"]).unwrap();
        assert!(RunConfig::from_args(&args, &AfxConfig::default()).is_err());
    }

    #[test]
    fn test_defaults_use_all_cpus() {
        let run = RunConfig::new(vec![PathBuf::from("/music")]);
        assert_eq!(run.jobs, num_cpus::get());
        assert!(run.validate().is_ok());
    }
}
