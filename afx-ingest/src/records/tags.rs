use super::{ColumnSpec, FeatureRecord, Field, FieldsBuilder, RecordGroup};
use uuid::Uuid;

/// Free-text track tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTagsRecord {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub tracknumber: Option<String>,
    pub format: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub label: Option<String>,
    pub producer: Option<String>,
    pub engineer: Option<String>,
    pub mixer: Option<String>,
}

impl TrackTagsRecord {
    /// True when no tag carried a value
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|f| f.value == super::FieldValue::Text(None))
    }
}

impl FeatureRecord for TrackTagsRecord {
    const GROUP: RecordGroup = RecordGroup::TrackTags;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::text("artist"),
        ColumnSpec::text("title"),
        ColumnSpec::text("album"),
        ColumnSpec::text("genre"),
        ColumnSpec::text("date"),
        ColumnSpec::text("tracknumber"),
        ColumnSpec::text("format"),
        ColumnSpec::text("language"),
        ColumnSpec::text("country"),
        ColumnSpec::text("label"),
        ColumnSpec::text("producer"),
        ColumnSpec::text("engineer"),
        ColumnSpec::text("mixer"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .text("artist", self.artist.as_deref())
            .text("title", self.title.as_deref())
            .text("album", self.album.as_deref())
            .text("genre", self.genre.as_deref())
            .text("date", self.date.as_deref())
            .text("tracknumber", self.tracknumber.as_deref())
            .text("format", self.format.as_deref())
            .text("language", self.language.as_deref())
            .text("country", self.country.as_deref())
            .text("label", self.label.as_deref())
            .text("producer", self.producer.as_deref())
            .text("engineer", self.engineer.as_deref())
            .text("mixer", self.mixer.as_deref())
            .build()
    }
}

/// MusicBrainz identifiers
///
/// Identifier columns hold hyphenated UUIDs; anything that does not parse
/// as a UUID is rejected at marshalling time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusicBrainzTagsRecord {
    pub albumartistid: Option<Uuid>,
    pub albumid: Option<Uuid>,
    pub albumstatus: Option<String>,
    pub albumtype: Option<String>,
    pub artistid: Option<Uuid>,
    pub releasegroupid: Option<Uuid>,
    pub releasetrackid: Option<Uuid>,
    pub trackid: Option<Uuid>,
    pub asin: Option<String>,
    pub musicip_puid: Option<Uuid>,
}

impl MusicBrainzTagsRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn uuid_text(id: &Option<Uuid>) -> Option<String> {
    id.map(|u| u.hyphenated().to_string())
}

impl FeatureRecord for MusicBrainzTagsRecord {
    const GROUP: RecordGroup = RecordGroup::MusicBrainzTags;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::text("albumartistid"),
        ColumnSpec::text("albumid"),
        ColumnSpec::text("albumstatus"),
        ColumnSpec::text("albumtype"),
        ColumnSpec::text("artistid"),
        ColumnSpec::text("releasegroupid"),
        ColumnSpec::text("releasetrackid"),
        ColumnSpec::text("trackid"),
        ColumnSpec::text("asin"),
        ColumnSpec::text("musicip_puid"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .text("albumartistid", uuid_text(&self.albumartistid).as_deref())
            .text("albumid", uuid_text(&self.albumid).as_deref())
            .text("albumstatus", self.albumstatus.as_deref())
            .text("albumtype", self.albumtype.as_deref())
            .text("artistid", uuid_text(&self.artistid).as_deref())
            .text("releasegroupid", uuid_text(&self.releasegroupid).as_deref())
            .text("releasetrackid", uuid_text(&self.releasetrackid).as_deref())
            .text("trackid", uuid_text(&self.trackid).as_deref())
            .text("asin", self.asin.as_deref())
            .text("musicip_puid", uuid_text(&self.musicip_puid).as_deref())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tags() {
        assert!(TrackTagsRecord::default().is_empty());
        let tags = TrackTagsRecord {
            title: Some("Intro".to_string()),
            ..Default::default()
        };
        assert!(!tags.is_empty());
    }

    #[test]
    fn test_musicbrainz_ids_render_hyphenated() {
        let id = Uuid::parse_str("f27ec8db-af05-4f36-916e-3d57f91ecf5e").unwrap();
        let record = MusicBrainzTagsRecord {
            trackid: Some(id),
            ..Default::default()
        };
        let trackid = record.fields().into_iter().find(|f| f.name == "trackid").unwrap();
        assert_eq!(
            trackid.value,
            super::super::FieldValue::Text(Some("f27ec8db-af05-4f36-916e-3d57f91ecf5e".to_string()))
        );
    }
}
