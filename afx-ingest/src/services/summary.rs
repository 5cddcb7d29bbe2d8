//! Run summary
//!
//! Counters for one ingest run, filled in by the pipeline as it goes and
//! printed at the end.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::records::RecordGroup;
use crate::services::insertion_driver::{AssetReport, InsertionState};
use crate::types::ChangeStatus;

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Candidates the catalog produced
    pub discovered: usize,
    /// Inputs the catalog could not resolve or read
    pub catalog_errors: usize,
    /// Assets whose fingerprint could not be read
    pub unreadable: usize,
    pub unchanged: usize,
    pub new: usize,
    pub modified: usize,
    pub moved: usize,
    /// Assets committed to the store
    pub committed: usize,
    pub extraction_failed: usize,
    pub insert_failed: usize,
    /// Groups expected but not stored, per group
    pub group_omissions: BTreeMap<String, usize>,
}

impl RunSummary {
    /// Size of the processing set
    pub fn pending(&self) -> usize {
        self.new + self.modified + self.moved
    }

    /// Assets that went through the pipeline, successfully or not
    pub fn processed(&self) -> usize {
        self.committed + self.extraction_failed + self.insert_failed
    }

    pub fn record_status(&mut self, status: &ChangeStatus) {
        match status {
            ChangeStatus::New => self.new += 1,
            ChangeStatus::Modified => self.modified += 1,
            ChangeStatus::Moved => self.moved += 1,
            ChangeStatus::Unchanged => self.unchanged += 1,
            ChangeStatus::Invalid(_) => {}
        }
    }

    pub fn record_report(&mut self, report: &AssetReport) {
        match report.state {
            InsertionState::Committed(_) => self.committed += 1,
            InsertionState::Failed(_) => self.insert_failed += 1,
            _ => {}
        }
        for (group, outcome) in &report.attachments {
            if outcome.is_omission() {
                self.record_omission(*group);
            }
        }
    }

    pub fn record_omission(&mut self, group: RecordGroup) {
        *self.group_omissions.entry(group.to_string()).or_default() += 1;
    }

    /// Whether every asset in the processing set was committed
    pub fn is_clean(&self) -> bool {
        self.extraction_failed == 0 && self.insert_failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} assets found, {} unchanged, {} new, {} modified, {} moved",
            self.discovered, self.unchanged, self.new, self.modified, self.moved
        )?;
        write!(
            f,
            "{} of {} committed, {} extraction failures, {} insert failures",
            self.committed,
            self.pending(),
            self.extraction_failed,
            self.insert_failed
        )?;
        if self.catalog_errors + self.unreadable > 0 {
            write!(
                f,
                "\n{} catalog errors, {} unreadable",
                self.catalog_errors, self.unreadable
            )?;
        }
        for (group, count) in &self.group_omissions {
            write!(f, "\n{}: {} omitted", group, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::insertion_driver::AttachmentOutcome;
    use std::path::PathBuf;

    #[test]
    fn test_report_counts() {
        let mut summary = RunSummary::default();
        summary.record_status(&ChangeStatus::New);
        summary.record_status(&ChangeStatus::Moved);
        summary.record_report(&AssetReport {
            path: PathBuf::from("/a.wav"),
            status: ChangeStatus::New,
            state: InsertionState::Committed(1),
            attachments: vec![
                (RecordGroup::Rhythm, AttachmentOutcome::Skipped),
                (RecordGroup::Tonal, AttachmentOutcome::MarshalFailed("bad".into())),
            ],
        });
        summary.record_report(&AssetReport {
            path: PathBuf::from("/b.wav"),
            status: ChangeStatus::Moved,
            state: InsertionState::Failed("locked".into()),
            attachments: vec![],
        });

        assert_eq!(summary.pending(), 2);
        assert_eq!(summary.committed, 1);
        assert_eq!(summary.insert_failed, 1);
        assert_eq!(summary.group_omissions.get("tonal"), Some(&1));
        assert!(!summary.group_omissions.contains_key("rhythm"));
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_display() {
        let summary = RunSummary {
            discovered: 3,
            unchanged: 3,
            ..Default::default()
        };
        let text = summary.to_string();
        assert!(text.contains("3 assets found, 3 unchanged"));
        assert!(text.contains("0 of 0 committed"));
    }

    #[test]
    fn test_json_output() {
        let mut summary = RunSummary {
            discovered: 2,
            new: 2,
            committed: 1,
            extraction_failed: 1,
            ..Default::default()
        };
        summary.record_omission(RecordGroup::Spectrograms);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["discovered"], 2);
        assert_eq!(value["committed"], 1);
        assert_eq!(value["extraction_failed"], 1);
        assert_eq!(value["group_omissions"]["spectrograms"], 1);
    }
}
