//! Job scheduler and worker pool
//!
//! The processing set is cut into super-batches of `queue_size` assets, and
//! each super-batch into jobs of `batch_size` assets. Only one super-batch is
//! in flight at a time, which bounds the number of resident bundles.
//!
//! Jobs run on a dedicated rayon pool entered from `spawn_blocking`; results
//! come back in submission order whatever order workers finish in. Workers
//! never touch the store.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bundle::DescriptorBundle;
use crate::error::{ExtractError, IngestError, Result};
use crate::services::descriptor_selection::ExtractionPlan;
use crate::services::extraction::{ExtractOptions, FeatureExtractor};
use crate::types::PendingAsset;

/// Bounded unit of work for one worker invocation
#[derive(Debug, Clone)]
pub struct Job {
    /// Submission index within the run
    pub id: usize,
    pub assets: Vec<PendingAsset>,
    pub plan: Arc<ExtractionPlan>,
}

/// Outcome of extracting one asset
#[derive(Debug)]
pub struct ExtractionResult {
    pub pending: PendingAsset,
    pub outcome: std::result::Result<DescriptorBundle, ExtractError>,
}

/// Two-level partition: super-batches of `queue_size`, split into chunks of
/// `batch_size`
///
/// Every input item lands in exactly one chunk; order is preserved. Sizes
/// of zero are treated as one.
pub fn partition<T>(items: Vec<T>, queue_size: usize, batch_size: usize) -> Vec<Vec<Vec<T>>> {
    let queue_size = queue_size.max(1);
    let batch_size = batch_size.max(1);

    let mut super_batches = Vec::with_capacity(items.len().div_ceil(queue_size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        let outer: Vec<T> = iter.by_ref().take(queue_size).collect();
        let mut inner = Vec::with_capacity(outer.len().div_ceil(batch_size));
        let mut outer_iter = outer.into_iter().peekable();
        while outer_iter.peek().is_some() {
            inner.push(outer_iter.by_ref().take(batch_size).collect());
        }
        super_batches.push(inner);
    }
    super_batches
}

/// Build the jobs of one super-batch
pub fn make_jobs(
    chunks: Vec<Vec<PendingAsset>>,
    plan: &Arc<ExtractionPlan>,
    first_id: usize,
) -> Vec<Job> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, assets)| Job {
            id: first_id + i,
            assets,
            plan: Arc::clone(plan),
        })
        .collect()
}

/// Fixed-size pool of extraction workers
pub struct WorkerPool {
    pool: Arc<rayon::ThreadPool>,
    extractor: Arc<dyn FeatureExtractor>,
    options: ExtractOptions,
}

impl WorkerPool {
    pub fn new(
        jobs: usize,
        extractor: Arc<dyn FeatureExtractor>,
        options: ExtractOptions,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name(|i| format!("afx-worker-{}", i))
            .build()
            .map_err(|e| IngestError::WorkerPool(e.to_string()))?;

        Ok(Self {
            pool: Arc::new(pool),
            extractor,
            options,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Threads behind the workers, shared with fingerprinting
    pub fn thread_pool(&self) -> Arc<rayon::ThreadPool> {
        Arc::clone(&self.pool)
    }

    /// Run every job of a super-batch and wait for all of them
    ///
    /// Results are flattened in job submission order, then asset order
    /// within each job.
    pub async fn dispatch(&self, jobs: Vec<Job>) -> Result<Vec<ExtractionResult>> {
        let pool = Arc::clone(&self.pool);
        let extractor = Arc::clone(&self.extractor);
        let options = self.options;

        debug!(jobs = jobs.len(), workers = self.workers(), "Dispatching super-batch");

        let per_job: Vec<Vec<ExtractionResult>> = tokio::task::spawn_blocking(move || {
            pool.install(|| {
                jobs.into_par_iter()
                    .map(|job| run_job(extractor.as_ref(), &options, job))
                    .collect()
            })
        })
        .await
        .map_err(|e| IngestError::WorkerPool(format!("Super-batch task failed: {}", e)))?;

        Ok(per_job.into_iter().flatten().collect())
    }
}

/// Extract every asset of one job; failures and panics stay per asset
fn run_job(
    extractor: &dyn FeatureExtractor,
    options: &ExtractOptions,
    job: Job,
) -> Vec<ExtractionResult> {
    let Job { id, assets, plan } = job;
    assets
        .into_iter()
        .map(|pending| {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                extractor.extract(&pending.asset.path, options, &plan)
            }))
            .unwrap_or_else(|panic| Err(ExtractError::Panicked(panic_message(panic.as_ref()))));

            if let Err(e) = &outcome {
                warn!(job = id, file = %pending.asset, error = %e, "Extraction failed");
            }
            ExtractionResult { pending, outcome }
        })
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_exactly_once() {
        for total in [0usize, 1, 7, 16, 33] {
            for queue_size in [1usize, 3, 16] {
                for batch_size in [1usize, 2, 5] {
                    let items: Vec<usize> = (0..total).collect();
                    let batches = partition(items, queue_size, batch_size);

                    let flat: Vec<usize> = batches.iter().flatten().flatten().copied().collect();
                    assert_eq!(flat, (0..total).collect::<Vec<_>>());

                    for outer in &batches {
                        assert!(outer.iter().map(Vec::len).sum::<usize>() <= queue_size);
                        assert!(outer.iter().all(|c| !c.is_empty() && c.len() <= batch_size));
                    }
                }
            }
        }
    }

    #[test]
    fn test_partition_shape() {
        let batches = partition((0..10).collect::<Vec<_>>(), 4, 3);
        let shape: Vec<Vec<usize>> = batches
            .iter()
            .map(|outer| outer.iter().map(Vec::len).collect())
            .collect();
        assert_eq!(shape, vec![vec![3, 1], vec![3, 1], vec![2]]);
    }

    #[test]
    fn test_zero_sizes_treated_as_one() {
        let batches = partition(vec!['a', 'b'], 0, 0);
        assert_eq!(batches, vec![vec![vec!['a']], vec![vec!['b']]]);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }

    struct EmptyExtractor;

    impl FeatureExtractor for EmptyExtractor {
        fn extract(
            &self,
            _path: &std::path::Path,
            _options: &ExtractOptions,
            _plan: &ExtractionPlan,
        ) -> std::result::Result<DescriptorBundle, ExtractError> {
            Ok(DescriptorBundle::new())
        }
    }

    #[test]
    fn test_thread_pool_is_the_worker_pool() {
        let workers = WorkerPool::new(3, Arc::new(EmptyExtractor), ExtractOptions::default()).unwrap();
        let shared = workers.thread_pool();
        assert_eq!(shared.current_num_threads(), 3);
        assert!(Arc::ptr_eq(&shared, &workers.thread_pool()));

        let name = shared.install(|| std::thread::current().name().map(str::to_string));
        assert!(name.unwrap().starts_with("afx-worker-"));
    }
}
