//! afx-ingest - incremental audio feature extraction
//!
//! Walks the given inputs, skips assets whose stored fingerprint still
//! matches, extracts descriptors for the rest on a worker pool, and writes
//! them to the feature database.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use afx_ingest::cli::Args;
use afx_ingest::config::RunConfig;
use afx_ingest::logging;
use afx_ingest::services::pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Subscriber before config so fallback warnings are shown
    let log_level = logging::init();
    let config = afx_common::config::load_or_default(args.config.as_deref())?;
    log_level.apply_config_level(&config.logging.level)?;

    info!("Starting afx-ingest v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build: {} ({}) [{}]",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let run_config = RunConfig::from_args(&args, &config)?;
    let summary = pipeline::run(&run_config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    if !summary.is_clean() {
        info!(
            failed = summary.extraction_failed + summary.insert_failed,
            "Some assets were not committed; they will be retried on the next run"
        );
    }
    Ok(())
}
