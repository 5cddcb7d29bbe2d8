//! Ingest pipeline
//!
//! One run, start to finish:
//! 1. Catalog the inputs
//! 2. Classify against persisted fingerprints; keep new, modified and moved
//! 3. Resolve the extraction plan once
//! 4. Per super-batch: dispatch jobs to the worker pool, wait for all of
//!    them, then marshal and insert each result in submission order
//!
//! Inserts only happen here, on the controlling task, between super-batches.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::db::{init_database_pool, SqliteFeatureStore, SqliteFingerprintIndex};
use crate::error::Result;
use crate::services::asset_catalog::AssetCatalog;
use crate::services::change_detector::ChangeDetector;
use crate::services::descriptor_selection::ExtractionPlan;
use crate::services::extraction::{AnalysisExtractor, FeatureExtractor};
use crate::services::insertion_driver::InsertionDriver;
use crate::services::marshaller::marshal;
use crate::services::scheduler::{make_jobs, partition, ExtractionResult, WorkerPool};
use crate::services::summary::RunSummary;
use crate::types::{FeatureStore, FingerprintIndex};

/// Orchestrates one ingest run over injected collaborators
pub struct Pipeline<'a, S: FeatureStore> {
    config: &'a RunConfig,
    index: &'a dyn FingerprintIndex,
    driver: InsertionDriver<S>,
    workers: WorkerPool,
}

impl<'a, S: FeatureStore> Pipeline<'a, S> {
    pub fn new(
        config: &'a RunConfig,
        index: &'a dyn FingerprintIndex,
        store: S,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> Result<Self> {
        config.validate()?;
        let workers = WorkerPool::new(config.jobs, extractor, config.extract_options())?;
        Ok(Self {
            config,
            index,
            driver: InsertionDriver::new(store, config.asset_type),
            workers,
        })
    }

    /// Give the store back once the run is over
    pub fn into_store(self) -> S {
        self.driver.into_store()
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        let started = Instant::now();
        let asset_type = self.config.asset_type;
        let mut summary = RunSummary::default();

        info!(
            inputs = self.config.inputs.len(),
            asset_type = %asset_type,
            "Starting ingest run"
        );

        let scan = AssetCatalog::new(&self.config.catalog).scan(&self.config.inputs);
        summary.discovered = scan.assets.len();
        summary.catalog_errors = scan.errors.len();

        let changes = ChangeDetector::new(self.index)
            .on_pool(self.workers.thread_pool())
            .detect(scan.assets, asset_type, self.config.force)
            .await?;
        summary.unchanged = changes.unchanged.len();
        summary.unreadable = changes.unreadable.len();
        for pending in &changes.pending {
            summary.record_status(&pending.status);
        }

        if changes.pending.is_empty() {
            info!(unchanged = summary.unchanged, "Nothing to process");
            return Ok(summary);
        }

        let plan = Arc::new(ExtractionPlan::resolve(&self.config.descriptors));
        info!(
            descriptors = %plan.descriptor_list(),
            workers = self.workers.workers(),
            "Extraction plan resolved"
        );

        let total = changes.pending.len();
        let mut done = 0usize;
        let mut next_job = 0usize;

        for super_batch in partition(
            changes.pending,
            self.config.queue_size,
            self.config.batch_size,
        ) {
            let jobs = make_jobs(super_batch, &plan, next_job);
            next_job += jobs.len();

            let results = self.workers.dispatch(jobs).await?;
            for ExtractionResult { pending, outcome } in results {
                done += 1;
                let bundle = match outcome {
                    Ok(bundle) => bundle,
                    Err(_) => {
                        // Logged by the worker; the asset stays uncommitted
                        summary.extraction_failed += 1;
                        continue;
                    }
                };

                let marshalled = marshal(&pending.asset, &pending.fingerprint, &bundle, asset_type, &plan);
                let report = self.driver.insert(&pending, marshalled).await;
                debug!(file = %pending.asset, state = ?report.state, "Asset finished");
                summary.record_report(&report);
            }

            info!("processed {}/{}", done, total);
        }

        info!(
            committed = summary.committed,
            failed = summary.extraction_failed + summary.insert_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingest run complete"
        );
        Ok(summary)
    }
}

/// Run against the SQLite database named in the config with the default
/// extractor
pub async fn run(config: &RunConfig) -> Result<RunSummary> {
    let pool = init_database_pool(&config.database).await?;
    let index = SqliteFingerprintIndex::new(pool.clone());
    let store = SqliteFeatureStore::acquire(&pool).await?;
    let extractor: Arc<dyn FeatureExtractor> =
        Arc::new(AnalysisExtractor::from_config(&config.extraction));

    let mut pipeline = Pipeline::new(config, &index, store, extractor)?;
    let summary = pipeline.run().await;
    drop(pipeline);
    pool.close().await;
    summary
}
