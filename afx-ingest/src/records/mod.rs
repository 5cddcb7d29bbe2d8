//! Fixed-schema feature records
//!
//! Every record type declares its column layout once in a static
//! [`ColumnSpec`] table and emits named [`Field`]s in exactly that order.
//! The persistence gateway binds by name, so a field/column mismatch is a
//! test failure rather than silent misalignment.
//!
//! Matrices occupy two adjacent columns: `<name>_frame_size` (row length)
//! immediately followed by `<name>` (row-major payload).

mod asset;
mod features;
mod spectrogram;
mod tags;

pub use asset::AudioAssetRecord;
pub use features::{LowLevelRecord, RhythmRecord, SfxRecord, TonalRecord};
pub use spectrogram::SpectrogramRecord;
pub use tags::{MusicBrainzTagsRecord, TrackTagsRecord};

use afx_common::db::ColumnDefinition;
use afx_common::AssetType;

// ============================================================================
// Values
// ============================================================================

/// Frame-major 2-D matrix stored flat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixReal {
    /// Row length (values per frame)
    pub frame_size: usize,
    /// Row-major payload, `frames * frame_size` values
    pub data: Vec<f32>,
}

impl MatrixReal {
    /// Flatten rows, rejecting ragged or empty input
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, String> {
        let frame_size = rows.first().map(|r| r.len()).unwrap_or(0);
        if frame_size == 0 {
            return Err("matrix has no columns".to_string());
        }
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != frame_size) {
            return Err(format!(
                "row {} has {} values, expected {}",
                idx,
                row.len(),
                frame_size
            ));
        }
        Ok(Self {
            frame_size,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        if self.frame_size == 0 {
            0
        } else {
            self.data.len() / self.frame_size
        }
    }
}

/// Encode floats as a little-endian BLOB
pub fn encode_f32_blob(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a little-endian float BLOB; trailing partial values are dropped
pub fn decode_f32_blob(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Typed value bound to one column
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(Option<i64>),
    Real(Option<f64>),
    Text(Option<String>),
    Vector(Option<Vec<f32>>),
}

/// Named column value
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

// ============================================================================
// Schema
// ============================================================================

/// Storage kind of a declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    /// Float sequence stored as a BLOB
    Vector,
    /// `<name>_frame_size` INTEGER then `<name>` BLOB
    Matrix,
}

/// Declared column of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// Only used for matrices: the preceding row-length column
    pub frame_size_name: Option<&'static str>,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn integer(name: &'static str) -> Self {
        Self { name, frame_size_name: None, kind: ColumnKind::Integer }
    }

    pub const fn real(name: &'static str) -> Self {
        Self { name, frame_size_name: None, kind: ColumnKind::Real }
    }

    pub const fn text(name: &'static str) -> Self {
        Self { name, frame_size_name: None, kind: ColumnKind::Text }
    }

    pub const fn vector(name: &'static str) -> Self {
        Self { name, frame_size_name: None, kind: ColumnKind::Vector }
    }

    pub const fn matrix(name: &'static str, frame_size_name: &'static str) -> Self {
        Self { name, frame_size_name: Some(frame_size_name), kind: ColumnKind::Matrix }
    }
}

/// Expand declared columns into the physical column order
pub fn column_names(schema: &[ColumnSpec]) -> Vec<&'static str> {
    let mut names = Vec::with_capacity(schema.len());
    for spec in schema {
        if let Some(frame_size) = spec.frame_size_name {
            names.push(frame_size);
        }
        names.push(spec.name);
    }
    names
}

/// Expand declared columns into table column definitions
pub fn column_definitions(schema: &[ColumnSpec]) -> Vec<ColumnDefinition> {
    let mut columns = Vec::with_capacity(schema.len());
    for spec in schema {
        match spec.kind {
            ColumnKind::Integer => columns.push(ColumnDefinition::new(spec.name, "INTEGER")),
            ColumnKind::Real => columns.push(ColumnDefinition::new(spec.name, "REAL")),
            ColumnKind::Text => columns.push(ColumnDefinition::new(spec.name, "TEXT")),
            ColumnKind::Vector => columns.push(ColumnDefinition::new(spec.name, "BLOB")),
            ColumnKind::Matrix => {
                if let Some(frame_size) = spec.frame_size_name {
                    columns.push(ColumnDefinition::new(frame_size, "INTEGER"));
                }
                columns.push(ColumnDefinition::new(spec.name, "BLOB"));
            }
        }
    }
    columns
}

/// Ordered field emission following a record's declared schema
#[derive(Debug, Default)]
pub struct FieldsBuilder {
    fields: Vec<Field>,
}

impl FieldsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn integer(mut self, name: &'static str, value: Option<i64>) -> Self {
        self.fields.push(Field { name, value: FieldValue::Integer(value) });
        self
    }

    pub fn real(mut self, name: &'static str, value: Option<f64>) -> Self {
        self.fields.push(Field { name, value: FieldValue::Real(value) });
        self
    }

    pub fn text(mut self, name: &'static str, value: Option<impl AsRef<str>>) -> Self {
        let value = value.map(|v| v.as_ref().to_string());
        self.fields.push(Field { name, value: FieldValue::Text(value) });
        self
    }

    pub fn vector(mut self, name: &'static str, value: Option<impl AsRef<[f32]>>) -> Self {
        let value = value.map(|v| v.as_ref().to_vec());
        self.fields.push(Field { name, value: FieldValue::Vector(value) });
        self
    }

    /// Row length first, then the flattened payload
    pub fn matrix(
        mut self,
        frame_size_name: &'static str,
        name: &'static str,
        value: Option<&MatrixReal>,
    ) -> Self {
        self.fields.push(Field {
            name: frame_size_name,
            value: FieldValue::Integer(value.map(|m| m.frame_size as i64)),
        });
        self.fields.push(Field {
            name,
            value: FieldValue::Vector(value.map(|m| m.data.clone())),
        });
        self
    }

    pub fn build(self) -> Vec<Field> {
        self.fields
    }
}

/// Fixed-schema record attached to an asset
pub trait FeatureRecord {
    /// Group this record belongs to
    const GROUP: RecordGroup;
    /// Declared column layout, excluding keys
    const SCHEMA: &'static [ColumnSpec];

    /// Field values in schema order
    fn fields(&self) -> Vec<Field>;
}

// ============================================================================
// Groups
// ============================================================================

/// Attachable feature group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordGroup {
    TrackTags,
    MusicBrainzTags,
    LowLevel,
    Rhythm,
    Sfx,
    Tonal,
    Spectrograms,
}

impl RecordGroup {
    /// All groups in attachment order
    pub fn all() -> [RecordGroup; 7] {
        [
            RecordGroup::TrackTags,
            RecordGroup::MusicBrainzTags,
            RecordGroup::LowLevel,
            RecordGroup::Rhythm,
            RecordGroup::Sfx,
            RecordGroup::Tonal,
            RecordGroup::Spectrograms,
        ]
    }

    /// Table holding this group for the asset type; tags exist for tracks only
    pub fn table(&self, asset_type: AssetType) -> Option<&'static str> {
        match (self, asset_type) {
            (RecordGroup::TrackTags, AssetType::Track) => Some("track_tags"),
            (RecordGroup::MusicBrainzTags, AssetType::Track) => Some("track_tags_musicbrainz"),
            (RecordGroup::TrackTags | RecordGroup::MusicBrainzTags, AssetType::Sample) => None,
            (RecordGroup::LowLevel, AssetType::Track) => Some("track_features_lowlevel"),
            (RecordGroup::LowLevel, AssetType::Sample) => Some("sample_features_lowlevel"),
            (RecordGroup::Rhythm, AssetType::Track) => Some("track_features_rhythm"),
            (RecordGroup::Rhythm, AssetType::Sample) => Some("sample_features_rhythm"),
            (RecordGroup::Sfx, AssetType::Track) => Some("track_features_sfx"),
            (RecordGroup::Sfx, AssetType::Sample) => Some("sample_features_sfx"),
            (RecordGroup::Tonal, AssetType::Track) => Some("track_features_tonal"),
            (RecordGroup::Tonal, AssetType::Sample) => Some("sample_features_tonal"),
            (RecordGroup::Spectrograms, AssetType::Track) => Some("track_images"),
            (RecordGroup::Spectrograms, AssetType::Sample) => Some("sample_images"),
        }
    }

    /// Declared columns of the group's record type
    pub fn schema(&self) -> &'static [ColumnSpec] {
        match self {
            RecordGroup::TrackTags => TrackTagsRecord::SCHEMA,
            RecordGroup::MusicBrainzTags => MusicBrainzTagsRecord::SCHEMA,
            RecordGroup::LowLevel => LowLevelRecord::SCHEMA,
            RecordGroup::Rhythm => RhythmRecord::SCHEMA,
            RecordGroup::Sfx => SfxRecord::SCHEMA,
            RecordGroup::Tonal => TonalRecord::SCHEMA,
            RecordGroup::Spectrograms => SpectrogramRecord::SCHEMA,
        }
    }
}

impl std::fmt::Display for RecordGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordGroup::TrackTags => "tags",
            RecordGroup::MusicBrainzTags => "musicbrainz",
            RecordGroup::LowLevel => "lowlevel",
            RecordGroup::Rhythm => "rhythm",
            RecordGroup::Sfx => "sfx",
            RecordGroup::Tonal => "tonal",
            RecordGroup::Spectrograms => "spectrograms",
        };
        f.write_str(name)
    }
}

/// Marshalling result for one feature group
///
/// `Absent` means the group was not computed; it is never a zero-filled record.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome<T> {
    Present(T),
    Absent,
    Failed(String),
}

impl<T> GroupOutcome<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, GroupOutcome::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, GroupOutcome::Absent)
    }
}

impl<T: FeatureRecord> GroupOutcome<T> {
    /// Erase the record type, keeping its emitted fields
    pub fn into_fields(self) -> GroupOutcome<Vec<Field>> {
        match self {
            GroupOutcome::Present(record) => GroupOutcome::Present(record.fields()),
            GroupOutcome::Absent => GroupOutcome::Absent,
            GroupOutcome::Failed(reason) => GroupOutcome::Failed(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_fields_follow_schema<T: FeatureRecord + Default>() {
        let emitted: Vec<&str> = T::default().fields().iter().map(|f| f.name).collect();
        assert_eq!(emitted, column_names(T::SCHEMA), "{:?}", T::GROUP);
        assert_eq!(column_definitions(T::SCHEMA).len(), emitted.len());
    }

    #[test]
    fn test_every_record_emits_schema_order() {
        assert_fields_follow_schema::<TrackTagsRecord>();
        assert_fields_follow_schema::<MusicBrainzTagsRecord>();
        assert_fields_follow_schema::<LowLevelRecord>();
        assert_fields_follow_schema::<RhythmRecord>();
        assert_fields_follow_schema::<SfxRecord>();
        assert_fields_follow_schema::<TonalRecord>();
        assert_fields_follow_schema::<SpectrogramRecord>();
    }

    #[test]
    fn test_group_schema_matches_record_type() {
        assert_eq!(RecordGroup::LowLevel.schema(), LowLevelRecord::SCHEMA);
        assert_eq!(LowLevelRecord::GROUP, RecordGroup::LowLevel);
        assert_eq!(SpectrogramRecord::GROUP, RecordGroup::Spectrograms);
    }

    #[test]
    fn test_matrix_from_rows() {
        let m = MatrixReal::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(m.frame_size, 2);
        assert_eq!(m.frames(), 3);
        assert_eq!(m.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert!(MatrixReal::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(MatrixReal::from_rows(&[]).is_err());
    }

    #[test]
    fn test_blob_encoding_is_little_endian() {
        let bytes = encode_f32_blob(&[1.0, -2.5]);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(decode_f32_blob(&bytes), vec![1.0, -2.5]);
    }

    #[test]
    fn test_tag_tables_only_for_tracks() {
        assert_eq!(RecordGroup::TrackTags.table(AssetType::Sample), None);
        assert_eq!(
            RecordGroup::Rhythm.table(AssetType::Sample),
            Some("sample_features_rhythm")
        );
        assert_eq!(RecordGroup::Spectrograms.table(AssetType::Track), Some("track_images"));
    }
}
