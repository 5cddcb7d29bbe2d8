//! Command-line arguments for afx-ingest

use std::path::PathBuf;

use afx_common::AssetType;
use clap::Parser;

use crate::services::descriptor_selection::DescriptorToken;

/// Command-line arguments
///
/// Flags left unset fall back to the config file, then to compiled defaults.
#[derive(Parser, Debug, Clone)]
#[command(name = "afx-ingest")]
#[command(about = "Incremental audio feature extraction into SQLite")]
#[command(version)]
pub struct Args {
    /// Audio files or directories to ingest
    #[arg(default_value = ".")]
    pub inputs: Vec<PathBuf>,

    /// Config file (overrides AFX_CONFIG and the platform config dir)
    #[arg(short = 'c', long = "cfg")]
    pub config: Option<PathBuf>,

    /// Asset type: track or sample
    #[arg(short = 't', long = "type", default_value = "track")]
    pub asset_type: AssetType,

    /// Descriptor groups to extract, comma separated (default: all)
    #[arg(short = 'd', long = "descriptors", value_enum, value_delimiter = ',')]
    pub descriptors: Vec<DescriptorToken>,

    /// Worker threads (default: one per CPU)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Assets per super-batch
    #[arg(long = "queue-size", visible_alias = "qs")]
    pub queue_size: Option<usize>,

    /// Assets per job
    #[arg(long = "batch-size", visible_alias = "bs")]
    pub batch_size: Option<usize>,

    /// Reprocess every asset, ignoring stored fingerprints
    #[arg(short, long)]
    pub force: bool,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Analysis sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Downmix to mono before analysis
    #[arg(long)]
    pub mono: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["afx-ingest"]).unwrap();
        assert_eq!(args.inputs, vec![PathBuf::from(".")]);
        assert_eq!(args.asset_type, AssetType::Track);
        assert!(args.descriptors.is_empty());
        assert!(!args.force);
        assert!(!args.json);
    }

    #[test]
    fn test_json_summary_flag() {
        let args = Args::try_parse_from(["afx-ingest", "--json", "/music"]).unwrap();
        assert!(args.json);
    }

    #[test]
    fn test_descriptor_list() {
        let args = Args::try_parse_from([
            "afx-ingest",
            "-t",
            "sample",
            "-d",
            "rhythm,mel_spec",
            "--qs",
            "8",
            "/music",
        ])
        .unwrap();
        assert_eq!(args.asset_type, AssetType::Sample);
        assert_eq!(
            args.descriptors,
            vec![DescriptorToken::Rhythm, DescriptorToken::MelSpec]
        );
        assert_eq!(args.queue_size, Some(8));
        assert_eq!(args.inputs, vec![PathBuf::from("/music")]);
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(Args::try_parse_from(["afx-ingest", "-t", "loop"]).is_err());
        assert!(Args::try_parse_from(["afx-ingest", "-d", "chords"]).is_err());
    }
}
