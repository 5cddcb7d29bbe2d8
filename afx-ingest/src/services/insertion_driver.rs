//! Insertion driver
//!
//! Persists one marshalled asset at a time through the single store handle:
//!
//! `Pending → Inserted → TagsAttached → FeaturesAttached → SpectraAttached → Committed`
//!
//! Each attachment is skipped when its group is absent and logged and
//! omitted when marshalling or the store call failed. Only a failed asset
//! insert (or commit) ends in `Failed`, and only for that asset.

use std::path::PathBuf;

use afx_common::AssetType;
use tracing::{debug, error, warn};

use crate::records::{Field, GroupOutcome, RecordGroup};
use crate::services::marshaller::MarshalledAsset;
use crate::types::{ChangeStatus, FeatureStore, PendingAsset};

/// Insertion progress of one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionState {
    Pending,
    Inserted(i64),
    TagsAttached(i64),
    FeaturesAttached(i64),
    SpectraAttached(i64),
    Committed(i64),
    Failed(String),
}

impl InsertionState {
    fn asset_id(&self) -> Option<i64> {
        match self {
            InsertionState::Inserted(id)
            | InsertionState::TagsAttached(id)
            | InsertionState::FeaturesAttached(id)
            | InsertionState::SpectraAttached(id)
            | InsertionState::Committed(id) => Some(*id),
            InsertionState::Pending | InsertionState::Failed(_) => None,
        }
    }

    /// Next attachment stage; `None` once attachments are done or terminal
    fn next_stage(&self) -> Option<InsertionState> {
        match self {
            InsertionState::Inserted(id) => Some(InsertionState::TagsAttached(*id)),
            InsertionState::TagsAttached(id) => Some(InsertionState::FeaturesAttached(*id)),
            InsertionState::FeaturesAttached(id) => Some(InsertionState::SpectraAttached(*id)),
            _ => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, InsertionState::Committed(_))
    }
}

/// Groups attached when entering a stage
fn stage_groups(stage: &InsertionState) -> &'static [RecordGroup] {
    match stage {
        InsertionState::TagsAttached(_) => &[RecordGroup::TrackTags, RecordGroup::MusicBrainzTags],
        InsertionState::FeaturesAttached(_) => &[
            RecordGroup::LowLevel,
            RecordGroup::Rhythm,
            RecordGroup::Sfx,
            RecordGroup::Tonal,
        ],
        InsertionState::SpectraAttached(_) => &[RecordGroup::Spectrograms],
        _ => &[],
    }
}

/// Result of one group attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    Attached,
    /// Group absent or not stored for this asset type
    Skipped,
    MarshalFailed(String),
    StoreFailed(String),
}

impl AttachmentOutcome {
    /// Whether the group was expected but did not make it into the store
    pub fn is_omission(&self) -> bool {
        matches!(
            self,
            AttachmentOutcome::MarshalFailed(_) | AttachmentOutcome::StoreFailed(_)
        )
    }
}

/// Final report for one asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReport {
    pub path: PathBuf,
    pub status: ChangeStatus,
    pub state: InsertionState,
    pub attachments: Vec<(RecordGroup, AttachmentOutcome)>,
}

impl AssetReport {
    pub fn attachment(&self, group: RecordGroup) -> Option<&AttachmentOutcome> {
        self.attachments
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, outcome)| outcome)
    }
}

/// Sequential writer over the feature store
pub struct InsertionDriver<S: FeatureStore> {
    store: S,
    asset_type: AssetType,
}

impl<S: FeatureStore> InsertionDriver<S> {
    pub fn new(store: S, asset_type: AssetType) -> Self {
        Self { store, asset_type }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Drive one asset through the state machine
    pub async fn insert(&mut self, pending: &PendingAsset, marshalled: MarshalledAsset) -> AssetReport {
        let (record, groups) = marshalled.into_groups();
        let mut groups: Vec<(RecordGroup, Option<GroupOutcome<Vec<Field>>>)> =
            groups.into_iter().map(|(g, o)| (g, Some(o))).collect();

        let mut report = AssetReport {
            path: pending.asset.path.clone(),
            status: pending.status.clone(),
            state: InsertionState::Pending,
            attachments: Vec::new(),
        };

        match self
            .store
            .insert_asset(self.asset_type, &record, &pending.status)
            .await
        {
            Ok(id) => report.state = InsertionState::Inserted(id),
            Err(e) => {
                error!(file = %pending.asset, stage = "insert", error = %e, "Asset insert failed");
                report.state = InsertionState::Failed(e.to_string());
                return report;
            }
        }

        while let Some(stage) = report.state.next_stage() {
            let Some(asset_id) = stage.asset_id() else {
                break;
            };
            for group in stage_groups(&stage) {
                let outcome = groups
                    .iter_mut()
                    .find(|(g, _)| g == group)
                    .and_then(|(_, o)| o.take())
                    .unwrap_or(GroupOutcome::Absent);
                let attached = self.attach(pending, asset_id, *group, outcome).await;
                report.attachments.push((*group, attached));
            }
            report.state = stage;
        }

        if let Some(asset_id) = report.state.asset_id() {
            match self.store.commit_asset(self.asset_type, asset_id).await {
                Ok(()) => report.state = InsertionState::Committed(asset_id),
                Err(e) => {
                    error!(file = %pending.asset, stage = "commit", error = %e, "Asset commit failed");
                    report.state = InsertionState::Failed(e.to_string());
                }
            }
        }

        report
    }

    async fn attach(
        &mut self,
        pending: &PendingAsset,
        asset_id: i64,
        group: RecordGroup,
        outcome: GroupOutcome<Vec<Field>>,
    ) -> AttachmentOutcome {
        let fields = match outcome {
            GroupOutcome::Present(fields) => fields,
            GroupOutcome::Absent => {
                debug!(file = %pending.asset, group = %group, "Group absent, skipping");
                return AttachmentOutcome::Skipped;
            }
            GroupOutcome::Failed(reason) => {
                warn!(file = %pending.asset, group = %group, stage = "marshal", error = %reason, "Group omitted");
                return AttachmentOutcome::MarshalFailed(reason);
            }
        };

        if group.table(self.asset_type).is_none() {
            return AttachmentOutcome::Skipped;
        }

        match self.store.attach(self.asset_type, asset_id, group, &fields).await {
            Ok(()) => AttachmentOutcome::Attached,
            Err(e) => {
                warn!(file = %pending.asset, group = %group, stage = "store", error = %e, "Group omitted");
                AttachmentOutcome::StoreFailed(e.to_string())
            }
        }
    }
}
