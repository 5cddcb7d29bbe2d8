//! In-process metadata pass
//!
//! Reads audio properties and tags with lofty into `metadata.*` descriptors:
//! - `metadata.file.path`, `metadata.file.size`
//! - `metadata.audio.duration` (seconds), `.channels`, `.bitrate` (kbps), `.samplerate`
//! - `metadata.tags.<name>` for text tags and MusicBrainz identifiers

use std::path::Path;

use lofty::file::{FileType, TaggedFileExt};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};

use crate::bundle::{DescriptorBundle, DescriptorValue};
use crate::error::ExtractError;

/// Tags with a native lofty key
fn mapped_tags() -> [(&'static str, ItemKey); 17] {
    [
        ("artist", ItemKey::TrackArtist),
        ("title", ItemKey::TrackTitle),
        ("album", ItemKey::AlbumTitle),
        ("genre", ItemKey::Genre),
        ("date", ItemKey::RecordingDate),
        ("tracknumber", ItemKey::TrackNumber),
        ("language", ItemKey::Language),
        ("label", ItemKey::Label),
        ("producer", ItemKey::Producer),
        ("engineer", ItemKey::Engineer),
        ("mixer", ItemKey::MixEngineer),
        ("musicbrainz_albumartistid", ItemKey::MusicBrainzReleaseArtistId),
        ("musicbrainz_albumid", ItemKey::MusicBrainzReleaseId),
        ("musicbrainz_artistid", ItemKey::MusicBrainzArtistId),
        ("musicbrainz_releasegroupid", ItemKey::MusicBrainzReleaseGroupId),
        ("musicbrainz_releasetrackid", ItemKey::MusicBrainzTrackId),
        ("musicbrainz_trackid", ItemKey::MusicBrainzRecordingId),
    ]
}

/// Tags only reachable through format-specific free-form keys
const FREEFORM_TAGS: &[&str] = &[
    "releasecountry",
    "musicbrainz_albumstatus",
    "musicbrainz_albumtype",
    "asin",
    "musicip_puid",
];

/// Metadata reader
#[derive(Debug, Default, Clone)]
pub struct MetadataReader;

impl MetadataReader {
    pub fn new() -> Self {
        Self
    }

    /// Read properties and tags into a bundle
    pub fn read(&self, path: &Path) -> Result<DescriptorBundle, ExtractError> {
        let file_size = std::fs::metadata(path)?.len();

        let tagged_file = Probe::open(path)
            .map_err(|e| ExtractError::Read(e.to_string()))?
            .guess_file_type()
            .map_err(|e| ExtractError::Read(e.to_string()))?
            .read()
            .map_err(|e| ExtractError::Read(e.to_string()))?;

        let mut bundle = DescriptorBundle::new();
        bundle.insert(
            "metadata.file.path",
            DescriptorValue::Text(path.display().to_string()),
        );
        bundle.insert("metadata.file.size", DescriptorValue::Real(file_size as f64));

        let properties = tagged_file.properties();
        bundle.insert(
            "metadata.audio.duration",
            DescriptorValue::Real(properties.duration().as_secs_f64()),
        );
        if let Some(channels) = properties.channels() {
            bundle.insert("metadata.audio.channels", DescriptorValue::Real(channels as f64));
        }
        if let Some(bitrate) = properties.audio_bitrate() {
            bundle.insert("metadata.audio.bitrate", DescriptorValue::Real(bitrate as f64));
        }
        if let Some(sample_rate) = properties.sample_rate() {
            bundle.insert(
                "metadata.audio.samplerate",
                DescriptorValue::Real(sample_rate as f64),
            );
        }

        bundle.insert(
            "metadata.tags.format",
            DescriptorValue::Text(format_name(tagged_file.file_type()).to_string()),
        );

        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            read_tags(tag, &mut bundle);
        }

        Ok(bundle)
    }
}

fn read_tags(tag: &Tag, bundle: &mut DescriptorBundle) {
    for (name, key) in mapped_tags() {
        if let Some(value) = tag.get_string(&key) {
            insert_tag(bundle, name, value);
        }
    }

    for item in tag.items() {
        if let ItemKey::Unknown(raw) = item.key() {
            let normalized = normalize_key(raw);
            let matched = FREEFORM_TAGS
                .iter()
                .find(|name| normalize_key(name) == normalized);
            if let (Some(name), Some(value)) = (matched, item.value().text()) {
                insert_tag(bundle, name, value);
            }
        }
    }
}

fn insert_tag(bundle: &mut DescriptorBundle, name: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        bundle.insert(
            format!("metadata.tags.{}", name),
            DescriptorValue::Text(value.to_string()),
        );
    }
}

/// `MusicBrainz Album Status`, `MUSICBRAINZ_ALBUMSTATUS` and
/// `musicbrainz_albumstatus` all compare equal
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn format_name(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Mpeg => "MP3",
        FileType::Flac => "FLAC",
        FileType::Opus => "Opus",
        FileType::Vorbis => "OGG Vorbis",
        FileType::Aac => "AAC",
        FileType::Aiff => "AIFF",
        FileType::Wav => "WAV",
        FileType::WavPack => "WavPack",
        FileType::Mp4 => "MP4",
        _ => "Unknown",
    }
}
