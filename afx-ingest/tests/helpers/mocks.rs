//! Mock collaborators: extractor, fingerprint index, feature store

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use afx_common::AssetType;
use afx_ingest::bundle::{DescriptorBundle, DescriptorValue};
use afx_ingest::error::ExtractError;
use afx_ingest::records::{AudioAssetRecord, Field, RecordGroup};
use afx_ingest::services::{ExtractOptions, ExtractionPlan, FeatureExtractor};
use afx_ingest::types::{AssetPath, ChangeStatus, FeatureStore, FileFingerprint, FingerprintIndex};
use async_trait::async_trait;

const LOWLEVEL_VECTORS: &[&str] = &[
    "barkbands_kurtosis",
    "barkbands_skewness",
    "barkbands_spread",
    "dissonance",
    "hfc",
    "pitch",
    "pitch_instantaneous_confidence",
    "pitch_salience",
    "silence_rate_20dB",
    "silence_rate_30dB",
    "silence_rate_60dB",
    "spectral_centroid",
    "spectral_complexity",
    "spectral_crest",
    "spectral_decrease",
    "spectral_energy",
    "spectral_energyband_high",
    "spectral_energyband_low",
    "spectral_energyband_middle_high",
    "spectral_energyband_middle_low",
    "spectral_flatness_db",
    "spectral_flux",
    "spectral_kurtosis",
    "spectral_rms",
    "spectral_rolloff",
    "spectral_skewness",
    "spectral_spread",
    "spectral_strongpeak",
    "zerocrossingrate",
];

fn frames(rows: usize, width: usize) -> DescriptorValue {
    DescriptorValue::Matrix(
        (0..rows)
            .map(|r| (0..width).map(|c| (r * width + c) as f32 * 0.1).collect())
            .collect(),
    )
}

/// Bundle with every group a full extractor run produces
pub fn full_bundle(path: &Path) -> DescriptorBundle {
    use DescriptorValue::*;

    let mut b = DescriptorBundle::new();
    b.insert("metadata.file.path", Text(path.display().to_string()));
    b.insert("metadata.audio.duration", Real(0.25));
    b.insert("metadata.audio.channels", Real(1.0));
    b.insert("metadata.audio.samplerate", Real(8000.0));
    b.insert("metadata.tags.artist", Text("Mock Artist".to_string()));
    b.insert("metadata.tags.title", Text("Mock Title".to_string()));
    b.insert(
        "metadata.tags.musicbrainz_trackid",
        Text("b1a9c0e9-d987-4042-ae91-78d6a3267d69".to_string()),
    );

    b.insert("lowLevel.average_loudness", Real(0.8));
    for name in LOWLEVEL_VECTORS {
        b.insert(format!("lowLevel.{}", name), Vector(vec![0.5; 4]));
    }
    for name in ["barkbands", "mfcc", "sccoeffs", "scvalleys"] {
        b.insert(format!("lowLevel.{}", name), frames(4, 6));
    }

    b.insert("rhythm.bpm", Real(120.0));
    b.insert("rhythm.confidence", Real(3.5));
    b.insert("rhythm.beats_position", Vector(vec![0.5, 1.0, 1.5]));
    b.insert("rhythm.beats_loudness_band_ratio", frames(3, 6));

    for name in [
        "pitch_after_max_to_before_max_energy_ratio",
        "pitch_centroid",
        "pitch_max_to_total",
        "pitch_min_to_total",
    ] {
        b.insert(format!("sfx.{}", name), Real(0.25));
    }
    b.insert("sfx.inharmonicity", Vector(vec![0.1; 4]));
    b.insert("sfx.oddtoevenharmonicenergyratio", Vector(vec![1.0; 4]));
    b.insert("sfx.tristimulus", frames(4, 3));

    for name in [
        "chords_changes_rate",
        "chords_number_rate",
        "key_strength",
        "tuning_diatonic_strength",
        "tuning_equal_tempered_deviation",
        "tuning_frequency",
        "tuning_nontempered_energy_ratio",
    ] {
        b.insert(format!("tonal.{}", name), Real(0.5));
    }
    for name in ["chords_strength", "chords_histogram", "thpcp"] {
        b.insert(format!("tonal.{}", name), Vector(vec![0.2; 12]));
    }
    b.insert("tonal.hpcp", frames(4, 12));
    b.insert("tonal.chords_key", Text("A".to_string()));
    b.insert("tonal.chords_scale", Text("minor".to_string()));
    b.insert("tonal.key_key", Text("A".to_string()));
    b.insert("tonal.key_scale", Text("minor".to_string()));
    b.insert(
        "tonal.chords_progression",
        TextList(vec!["Am".to_string(), "C".to_string(), "Am".to_string()]),
    );

    b.insert("mel_spec", frames(4, 8));
    b.insert("log_spec", frames(4, 8));
    b.insert("freq_spec", frames(4, 8));
    b
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Scriptable extractor
///
/// Behavior is keyed by file name: delay, fail, panic, or succeed with
/// [`full_bundle`] minus any omitted groups.
#[derive(Default)]
pub struct MockExtractor {
    calls: AtomicUsize,
    seen: Mutex<Vec<PathBuf>>,
    delays: HashMap<String, Duration>,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    omit_groups: Vec<String>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on.insert(name.to_string());
        self
    }

    pub fn panicking_on(mut self, name: &str) -> Self {
        self.panic_on.insert(name.to_string());
        self
    }

    pub fn omitting(mut self, group: &str) -> Self {
        self.omit_groups.push(group.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl FeatureExtractor for MockExtractor {
    fn extract(
        &self,
        path: &Path,
        _options: &ExtractOptions,
        plan: &ExtractionPlan,
    ) -> Result<DescriptorBundle, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(path.to_path_buf());

        let name = file_name(path);
        if let Some(delay) = self.delays.get(&name) {
            std::thread::sleep(*delay);
        }
        if self.panic_on.contains(&name) {
            panic!("mock extractor blew up on {}", name);
        }
        if self.fail_on.contains(&name) {
            return Err(ExtractError::AnalysisFailed(format!("mock failure on {}", name)));
        }

        let mut bundle = full_bundle(path);
        for group in &self.omit_groups {
            bundle.remove_group(group);
        }
        bundle.retain_selected(plan);
        Ok(bundle)
    }
}

/// Fingerprint index with canned answers; unknown paths are "not found"
#[derive(Default)]
pub struct MemoryIndex {
    answers: HashMap<String, String>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, status: &str) -> Self {
        self.answers.insert(name.to_string(), status.to_string());
        self
    }
}

#[async_trait]
impl FingerprintIndex for MemoryIndex {
    async fn query_status(
        &self,
        asset: &AssetPath,
        _fingerprint: &FileFingerprint,
        _asset_type: AssetType,
    ) -> afx_common::Result<String> {
        let name = file_name(&asset.path);
        Ok(self
            .answers
            .get(&name)
            .cloned()
            .unwrap_or_else(|| "not found".to_string()))
    }
}

/// Feature store that records every call
#[derive(Default)]
pub struct RecordingStore {
    next_id: i64,
    /// Asset paths in insertion order
    pub inserted: Vec<String>,
    pub statuses: Vec<ChangeStatus>,
    pub attached: Vec<(i64, RecordGroup)>,
    pub committed: Vec<i64>,
    pub fail_group: Option<RecordGroup>,
    pub fail_insert_for: Option<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every attachment of `group`
    pub fn failing_group(mut self, group: RecordGroup) -> Self {
        self.fail_group = Some(group);
        self
    }

    /// Reject the asset insert for paths ending in `name`
    pub fn failing_insert_for(mut self, name: &str) -> Self {
        self.fail_insert_for = Some(name.to_string());
        self
    }

    pub fn groups_for(&self, asset_id: i64) -> Vec<RecordGroup> {
        self.attached
            .iter()
            .filter(|(id, _)| *id == asset_id)
            .map(|(_, g)| *g)
            .collect()
    }

    pub fn inserted_names(&self) -> Vec<String> {
        self.inserted
            .iter()
            .map(|p| file_name(Path::new(p)))
            .collect()
    }
}

#[async_trait]
impl FeatureStore for RecordingStore {
    async fn insert_asset(
        &mut self,
        _asset_type: AssetType,
        record: &AudioAssetRecord,
        status: &ChangeStatus,
    ) -> afx_common::Result<i64> {
        if let Some(name) = &self.fail_insert_for {
            if record.path.ends_with(name.as_str()) {
                return Err(afx_common::Error::Internal("database is locked".to_string()));
            }
        }
        self.next_id += 1;
        self.inserted.push(record.path.clone());
        self.statuses.push(status.clone());
        Ok(self.next_id)
    }

    async fn attach(
        &mut self,
        _asset_type: AssetType,
        asset_id: i64,
        group: RecordGroup,
        _fields: &[Field],
    ) -> afx_common::Result<()> {
        if self.fail_group == Some(group) {
            return Err(afx_common::Error::Internal(format!("cannot store {}", group)));
        }
        self.attached.push((asset_id, group));
        Ok(())
    }

    async fn commit_asset(&mut self, _asset_type: AssetType, asset_id: i64) -> afx_common::Result<()> {
        self.committed.push(asset_id);
        Ok(())
    }
}
