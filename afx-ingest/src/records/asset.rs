use super::{ColumnSpec, Field, FieldsBuilder};

/// Asset-level row: file identity plus audio properties
///
/// Doubles as the persisted fingerprint read back by the change detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioAssetRecord {
    pub path: String,
    pub filesize: u64,
    pub duration: Option<f64>,
    pub channels: Option<u32>,
    pub bitrate: Option<u32>,
    pub samplerate: Option<u32>,
    pub modified_ms: i64,
    pub checksum: String,
}

impl AudioAssetRecord {
    pub const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::text("path"),
        ColumnSpec::integer("filesize"),
        ColumnSpec::real("duration"),
        ColumnSpec::integer("channels"),
        ColumnSpec::integer("bitrate"),
        ColumnSpec::integer("samplerate"),
        ColumnSpec::integer("modified_ms"),
        ColumnSpec::text("checksum"),
    ];

    pub fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .text("path", Some(&self.path))
            .integer("filesize", Some(self.filesize as i64))
            .real("duration", self.duration)
            .integer("channels", self.channels.map(i64::from))
            .integer("bitrate", self.bitrate.map(i64::from))
            .integer("samplerate", self.samplerate.map(i64::from))
            .integer("modified_ms", Some(self.modified_ms))
            .text("checksum", Some(&self.checksum))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::column_names;

    #[test]
    fn test_fields_follow_schema() {
        let names: Vec<&str> = AudioAssetRecord::default().fields().iter().map(|f| f.name).collect();
        assert_eq!(names, column_names(AudioAssetRecord::SCHEMA));
    }
}
