//! Orchestration services
//!
//! Stages of an ingest run, in pipeline order:
//! - [`asset_catalog`]: enumerate candidate audio files
//! - [`change_detector`]: classify against persisted fingerprints
//! - [`descriptor_selection`]: resolve the extraction plan
//! - [`scheduler`]: partition into jobs and run the worker pool
//! - [`extraction`]: per-asset descriptor extraction
//! - [`marshaller`]: descriptor bundle to typed records
//! - [`insertion_driver`]: sequential persistence
//!
//! [`pipeline`] wires them together and [`summary`] counts the outcome.

pub mod asset_catalog;
pub mod change_detector;
pub mod descriptor_selection;
pub mod extraction;
pub mod insertion_driver;
pub mod marshaller;
pub mod pipeline;
pub mod scheduler;
pub mod summary;

pub use asset_catalog::{AssetCatalog, CatalogScan};
pub use change_detector::{ChangeDetector, ChangeSet};
pub use descriptor_selection::{Capability, DescriptorToken, ExtractionPlan};
pub use extraction::{AnalysisExtractor, ExtractOptions, FeatureExtractor};
pub use insertion_driver::{AssetReport, AttachmentOutcome, InsertionDriver, InsertionState};
pub use marshaller::{marshal, MarshalledAsset};
pub use pipeline::Pipeline;
pub use scheduler::{ExtractionResult, Job, WorkerPool};
pub use summary::RunSummary;
