//! Record marshaller
//!
//! Reshapes a descriptor bundle into the fixed-schema record family. Each
//! feature group resolves independently:
//! - not requested, or a required descriptor missing: [`GroupOutcome::Absent`]
//! - a descriptor with the wrong shape or type: [`GroupOutcome::Failed`]
//!
//! A group is never partially filled with zeros.

use afx_common::AssetType;
use uuid::Uuid;

use crate::bundle::{optional, DescriptorBundle};
use crate::error::MarshalIssue;
use crate::records::{
    AudioAssetRecord, Field, GroupOutcome, LowLevelRecord, MusicBrainzTagsRecord,
    RecordGroup, RhythmRecord, SfxRecord, SpectrogramRecord, TonalRecord, TrackTagsRecord,
};
use crate::services::descriptor_selection::{Capability, ExtractionPlan};
use crate::types::{AssetPath, FileFingerprint};

/// Record family for one asset
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledAsset {
    pub asset: AudioAssetRecord,
    pub track_tags: GroupOutcome<TrackTagsRecord>,
    pub musicbrainz_tags: GroupOutcome<MusicBrainzTagsRecord>,
    pub lowlevel: GroupOutcome<LowLevelRecord>,
    pub rhythm: GroupOutcome<RhythmRecord>,
    pub sfx: GroupOutcome<SfxRecord>,
    pub tonal: GroupOutcome<TonalRecord>,
    pub spectrograms: GroupOutcome<SpectrogramRecord>,
}

impl MarshalledAsset {
    /// Group outcomes in attachment order, record types erased
    pub fn into_groups(self) -> (AudioAssetRecord, Vec<(RecordGroup, GroupOutcome<Vec<Field>>)>) {
        let groups = vec![
            (RecordGroup::TrackTags, self.track_tags.into_fields()),
            (RecordGroup::MusicBrainzTags, self.musicbrainz_tags.into_fields()),
            (RecordGroup::LowLevel, self.lowlevel.into_fields()),
            (RecordGroup::Rhythm, self.rhythm.into_fields()),
            (RecordGroup::Sfx, self.sfx.into_fields()),
            (RecordGroup::Tonal, self.tonal.into_fields()),
            (RecordGroup::Spectrograms, self.spectrograms.into_fields()),
        ];
        (self.asset, groups)
    }
}

/// Marshal every group of one asset
pub fn marshal(
    asset: &AssetPath,
    fingerprint: &FileFingerprint,
    bundle: &DescriptorBundle,
    asset_type: AssetType,
    plan: &ExtractionPlan,
) -> MarshalledAsset {
    let wants = |group: RecordGroup| plan.wants_group(group) && group.table(asset_type).is_some();

    MarshalledAsset {
        asset: asset_record(asset, fingerprint, bundle),
        track_tags: resolve(wants(RecordGroup::TrackTags), || track_tags(bundle)),
        musicbrainz_tags: resolve(wants(RecordGroup::MusicBrainzTags), || {
            musicbrainz_tags(bundle)
        }),
        lowlevel: resolve(wants(RecordGroup::LowLevel), || lowlevel(bundle)),
        rhythm: resolve(wants(RecordGroup::Rhythm), || rhythm(bundle)),
        sfx: resolve(wants(RecordGroup::Sfx), || sfx(bundle)),
        tonal: resolve(wants(RecordGroup::Tonal), || tonal(bundle)),
        spectrograms: resolve(wants(RecordGroup::Spectrograms), || {
            spectrograms(bundle, plan)
        }),
    }
}

fn resolve<T>(
    wanted: bool,
    build: impl FnOnce() -> Result<T, MarshalIssue>,
) -> GroupOutcome<T> {
    if !wanted {
        return GroupOutcome::Absent;
    }
    match build() {
        Ok(record) => GroupOutcome::Present(record),
        Err(MarshalIssue::Missing(_)) => GroupOutcome::Absent,
        Err(issue) => GroupOutcome::Failed(issue.to_string()),
    }
}

/// Asset row: identity from the fingerprint, audio properties from metadata
pub fn asset_record(
    asset: &AssetPath,
    fingerprint: &FileFingerprint,
    bundle: &DescriptorBundle,
) -> AudioAssetRecord {
    let count = |name: &str| {
        bundle
            .real(name)
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u32)
    };

    AudioAssetRecord {
        path: asset.path.display().to_string(),
        filesize: fingerprint.size,
        duration: bundle.real("metadata.audio.duration").ok(),
        channels: count("metadata.audio.channels"),
        bitrate: count("metadata.audio.bitrate"),
        samplerate: count("metadata.audio.samplerate"),
        modified_ms: fingerprint.modified_ms,
        checksum: fingerprint.checksum.clone(),
    }
}

fn tag(bundle: &DescriptorBundle, name: &str) -> Result<Option<String>, MarshalIssue> {
    optional(bundle.text(&format!("metadata.tags.{}", name)))
}

fn tag_uuid(bundle: &DescriptorBundle, name: &str) -> Result<Option<Uuid>, MarshalIssue> {
    let full = format!("metadata.tags.{}", name);
    match optional(bundle.text(&full))? {
        None => Ok(None),
        Some(text) => Uuid::parse_str(text.trim())
            .map(Some)
            .map_err(|e| MarshalIssue::Malformed {
                name: full,
                reason: e.to_string(),
            }),
    }
}

fn track_tags(b: &DescriptorBundle) -> Result<TrackTagsRecord, MarshalIssue> {
    let record = TrackTagsRecord {
        artist: tag(b, "artist")?,
        title: tag(b, "title")?,
        album: tag(b, "album")?,
        genre: tag(b, "genre")?,
        date: tag(b, "date")?,
        tracknumber: tag(b, "tracknumber")?,
        format: tag(b, "format")?,
        language: tag(b, "language")?,
        country: tag(b, "releasecountry")?,
        label: tag(b, "label")?,
        producer: tag(b, "producer")?,
        engineer: tag(b, "engineer")?,
        mixer: tag(b, "mixer")?,
    };
    if record.is_empty() {
        return Err(MarshalIssue::Missing("metadata.tags".to_string()));
    }
    Ok(record)
}

fn musicbrainz_tags(b: &DescriptorBundle) -> Result<MusicBrainzTagsRecord, MarshalIssue> {
    let record = MusicBrainzTagsRecord {
        albumartistid: tag_uuid(b, "musicbrainz_albumartistid")?,
        albumid: tag_uuid(b, "musicbrainz_albumid")?,
        albumstatus: tag(b, "musicbrainz_albumstatus")?,
        albumtype: tag(b, "musicbrainz_albumtype")?,
        artistid: tag_uuid(b, "musicbrainz_artistid")?,
        releasegroupid: tag_uuid(b, "musicbrainz_releasegroupid")?,
        releasetrackid: tag_uuid(b, "musicbrainz_releasetrackid")?,
        trackid: tag_uuid(b, "musicbrainz_trackid")?,
        asin: tag(b, "asin")?,
        musicip_puid: tag_uuid(b, "musicip_puid")?,
    };
    if record.is_empty() {
        return Err(MarshalIssue::Missing("metadata.tags.musicbrainz_*".to_string()));
    }
    Ok(record)
}

fn lowlevel(b: &DescriptorBundle) -> Result<LowLevelRecord, MarshalIssue> {
    let v = |name: &str| b.vector(&format!("lowLevel.{}", name));
    let m = |name: &str| b.matrix(&format!("lowLevel.{}", name));

    Ok(LowLevelRecord {
        average_loudness: b.real("lowLevel.average_loudness")?,
        barkbands_kurtosis: v("barkbands_kurtosis")?,
        barkbands_skewness: v("barkbands_skewness")?,
        barkbands_spread: v("barkbands_spread")?,
        barkbands: m("barkbands")?,
        dissonance: v("dissonance")?,
        hfc: v("hfc")?,
        pitch: v("pitch")?,
        pitch_instantaneous_confidence: v("pitch_instantaneous_confidence")?,
        pitch_salience: v("pitch_salience")?,
        silence_rate_20db: v("silence_rate_20dB")?,
        silence_rate_30db: v("silence_rate_30dB")?,
        silence_rate_60db: v("silence_rate_60dB")?,
        spectral_centroid: v("spectral_centroid")?,
        spectral_complexity: v("spectral_complexity")?,
        spectral_crest: v("spectral_crest")?,
        spectral_decrease: v("spectral_decrease")?,
        spectral_energy: v("spectral_energy")?,
        spectral_energyband_high: v("spectral_energyband_high")?,
        spectral_energyband_low: v("spectral_energyband_low")?,
        spectral_energyband_middle_high: v("spectral_energyband_middle_high")?,
        spectral_energyband_middle_low: v("spectral_energyband_middle_low")?,
        spectral_flatness_db: v("spectral_flatness_db")?,
        spectral_flux: v("spectral_flux")?,
        spectral_kurtosis: v("spectral_kurtosis")?,
        spectral_rms: v("spectral_rms")?,
        spectral_rolloff: v("spectral_rolloff")?,
        spectral_skewness: v("spectral_skewness")?,
        spectral_spread: v("spectral_spread")?,
        spectral_strongpeak: v("spectral_strongpeak")?,
        zerocrossingrate: v("zerocrossingrate")?,
        mfcc: m("mfcc")?,
        sccoeffs: m("sccoeffs")?,
        scvalleys: m("scvalleys")?,
    })
}

fn rhythm(b: &DescriptorBundle) -> Result<RhythmRecord, MarshalIssue> {
    let r = |name: &str| optional(b.real(&format!("rhythm.{}", name)));
    let v = |name: &str| optional(b.vector(&format!("rhythm.{}", name)));

    Ok(RhythmRecord {
        bpm: b.real("rhythm.bpm")?,
        confidence: r("confidence")?,
        onset_rate: r("onset_rate")?,
        beats_loudness: v("beats_loudness")?,
        first_peak_bpm: r("first_peak_bpm")?,
        first_peak_spread: r("first_peak_spread")?,
        first_peak_weight: r("first_peak_weight")?,
        second_peak_bpm: r("second_peak_bpm")?,
        second_peak_spread: r("second_peak_spread")?,
        second_peak_weight: r("second_peak_weight")?,
        beats_position: v("beats_position")?,
        bpm_estimates: v("bpm_estimates")?,
        bpm_intervals: v("bpm_intervals")?,
        onset_times: v("onset_times")?,
        beats_loudness_band_ratio: optional(b.matrix("rhythm.beats_loudness_band_ratio"))?,
        histogram: v("histogram")?,
    })
}

fn sfx(b: &DescriptorBundle) -> Result<SfxRecord, MarshalIssue> {
    Ok(SfxRecord {
        pitch_after_max_to_before_max_energy_ratio: b
            .real("sfx.pitch_after_max_to_before_max_energy_ratio")?,
        pitch_centroid: b.real("sfx.pitch_centroid")?,
        pitch_max_to_total: b.real("sfx.pitch_max_to_total")?,
        pitch_min_to_total: b.real("sfx.pitch_min_to_total")?,
        inharmonicity: b.vector("sfx.inharmonicity")?,
        oddtoevenharmonicenergyratio: b.vector("sfx.oddtoevenharmonicenergyratio")?,
        tristimulus: b.matrix("sfx.tristimulus")?,
    })
}

fn tonal(b: &DescriptorBundle) -> Result<TonalRecord, MarshalIssue> {
    let r = |name: &str| b.real(&format!("tonal.{}", name));
    let v = |name: &str| b.vector(&format!("tonal.{}", name));
    let t = |name: &str| b.text(&format!("tonal.{}", name));

    Ok(TonalRecord {
        chords_changes_rate: r("chords_changes_rate")?,
        chords_number_rate: r("chords_number_rate")?,
        key_strength: r("key_strength")?,
        tuning_diatonic_strength: r("tuning_diatonic_strength")?,
        tuning_equal_tempered_deviation: r("tuning_equal_tempered_deviation")?,
        tuning_frequency: r("tuning_frequency")?,
        tuning_nontempered_energy_ratio: r("tuning_nontempered_energy_ratio")?,
        chords_strength: v("chords_strength")?,
        chords_histogram: v("chords_histogram")?,
        thpcp: v("thpcp")?,
        hpcp: b.matrix("tonal.hpcp")?,
        chords_key: t("chords_key")?,
        chords_scale: t("chords_scale")?,
        key_key: t("key_key")?,
        key_scale: t("key_scale")?,
        chords_progression: b.text_list("tonal.chords_progression")?,
    })
}

fn spectrograms(
    b: &DescriptorBundle,
    plan: &ExtractionPlan,
) -> Result<SpectrogramRecord, MarshalIssue> {
    let spec = |capability: Capability, name: &str| {
        if plan.contains(capability) {
            optional(b.matrix(name))
        } else {
            Ok(None)
        }
    };

    let record = SpectrogramRecord {
        mel_spec: spec(Capability::MelSpec, "mel_spec")?,
        log_spec: spec(Capability::LogSpec, "log_spec")?,
        freq_spec: spec(Capability::FreqSpec, "freq_spec")?,
    };
    if record.is_empty() {
        return Err(MarshalIssue::Missing("spectrograms".to_string()));
    }
    Ok(record)
}
