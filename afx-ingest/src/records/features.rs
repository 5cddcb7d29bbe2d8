//! Descriptor feature records: low-level, rhythm, sfx and tonal
//!
//! Frame-level descriptors are float sequences (one value per analysis
//! frame); matrix descriptors carry one row per frame.

use super::{ColumnSpec, FeatureRecord, Field, FieldsBuilder, MatrixReal, RecordGroup};

/// Spectral, loudness and pitch descriptors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LowLevelRecord {
    pub average_loudness: f64,
    pub barkbands_kurtosis: Vec<f32>,
    pub barkbands_skewness: Vec<f32>,
    pub barkbands_spread: Vec<f32>,
    pub barkbands: MatrixReal,
    pub dissonance: Vec<f32>,
    pub hfc: Vec<f32>,
    pub pitch: Vec<f32>,
    pub pitch_instantaneous_confidence: Vec<f32>,
    pub pitch_salience: Vec<f32>,
    pub silence_rate_20db: Vec<f32>,
    pub silence_rate_30db: Vec<f32>,
    pub silence_rate_60db: Vec<f32>,
    pub spectral_centroid: Vec<f32>,
    pub spectral_complexity: Vec<f32>,
    pub spectral_crest: Vec<f32>,
    pub spectral_decrease: Vec<f32>,
    pub spectral_energy: Vec<f32>,
    pub spectral_energyband_high: Vec<f32>,
    pub spectral_energyband_low: Vec<f32>,
    pub spectral_energyband_middle_high: Vec<f32>,
    pub spectral_energyband_middle_low: Vec<f32>,
    pub spectral_flatness_db: Vec<f32>,
    pub spectral_flux: Vec<f32>,
    pub spectral_kurtosis: Vec<f32>,
    pub spectral_rms: Vec<f32>,
    pub spectral_rolloff: Vec<f32>,
    pub spectral_skewness: Vec<f32>,
    pub spectral_spread: Vec<f32>,
    pub spectral_strongpeak: Vec<f32>,
    pub zerocrossingrate: Vec<f32>,
    pub mfcc: MatrixReal,
    pub sccoeffs: MatrixReal,
    pub scvalleys: MatrixReal,
}

impl FeatureRecord for LowLevelRecord {
    const GROUP: RecordGroup = RecordGroup::LowLevel;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::real("average_loudness"),
        ColumnSpec::vector("barkbands_kurtosis"),
        ColumnSpec::vector("barkbands_skewness"),
        ColumnSpec::vector("barkbands_spread"),
        ColumnSpec::matrix("barkbands", "barkbands_frame_size"),
        ColumnSpec::vector("dissonance"),
        ColumnSpec::vector("hfc"),
        ColumnSpec::vector("pitch"),
        ColumnSpec::vector("pitch_instantaneous_confidence"),
        ColumnSpec::vector("pitch_salience"),
        ColumnSpec::vector("silence_rate_20db"),
        ColumnSpec::vector("silence_rate_30db"),
        ColumnSpec::vector("silence_rate_60db"),
        ColumnSpec::vector("spectral_centroid"),
        ColumnSpec::vector("spectral_complexity"),
        ColumnSpec::vector("spectral_crest"),
        ColumnSpec::vector("spectral_decrease"),
        ColumnSpec::vector("spectral_energy"),
        ColumnSpec::vector("spectral_energyband_high"),
        ColumnSpec::vector("spectral_energyband_low"),
        ColumnSpec::vector("spectral_energyband_middle_high"),
        ColumnSpec::vector("spectral_energyband_middle_low"),
        ColumnSpec::vector("spectral_flatness_db"),
        ColumnSpec::vector("spectral_flux"),
        ColumnSpec::vector("spectral_kurtosis"),
        ColumnSpec::vector("spectral_rms"),
        ColumnSpec::vector("spectral_rolloff"),
        ColumnSpec::vector("spectral_skewness"),
        ColumnSpec::vector("spectral_spread"),
        ColumnSpec::vector("spectral_strongpeak"),
        ColumnSpec::vector("zerocrossingrate"),
        ColumnSpec::matrix("mfcc", "mfcc_frame_size"),
        ColumnSpec::matrix("sccoeffs", "sccoeffs_frame_size"),
        ColumnSpec::matrix("scvalleys", "scvalleys_frame_size"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .real("average_loudness", Some(self.average_loudness))
            .vector("barkbands_kurtosis", Some(&self.barkbands_kurtosis))
            .vector("barkbands_skewness", Some(&self.barkbands_skewness))
            .vector("barkbands_spread", Some(&self.barkbands_spread))
            .matrix("barkbands_frame_size", "barkbands", Some(&self.barkbands))
            .vector("dissonance", Some(&self.dissonance))
            .vector("hfc", Some(&self.hfc))
            .vector("pitch", Some(&self.pitch))
            .vector("pitch_instantaneous_confidence", Some(&self.pitch_instantaneous_confidence))
            .vector("pitch_salience", Some(&self.pitch_salience))
            .vector("silence_rate_20db", Some(&self.silence_rate_20db))
            .vector("silence_rate_30db", Some(&self.silence_rate_30db))
            .vector("silence_rate_60db", Some(&self.silence_rate_60db))
            .vector("spectral_centroid", Some(&self.spectral_centroid))
            .vector("spectral_complexity", Some(&self.spectral_complexity))
            .vector("spectral_crest", Some(&self.spectral_crest))
            .vector("spectral_decrease", Some(&self.spectral_decrease))
            .vector("spectral_energy", Some(&self.spectral_energy))
            .vector("spectral_energyband_high", Some(&self.spectral_energyband_high))
            .vector("spectral_energyband_low", Some(&self.spectral_energyband_low))
            .vector("spectral_energyband_middle_high", Some(&self.spectral_energyband_middle_high))
            .vector("spectral_energyband_middle_low", Some(&self.spectral_energyband_middle_low))
            .vector("spectral_flatness_db", Some(&self.spectral_flatness_db))
            .vector("spectral_flux", Some(&self.spectral_flux))
            .vector("spectral_kurtosis", Some(&self.spectral_kurtosis))
            .vector("spectral_rms", Some(&self.spectral_rms))
            .vector("spectral_rolloff", Some(&self.spectral_rolloff))
            .vector("spectral_skewness", Some(&self.spectral_skewness))
            .vector("spectral_spread", Some(&self.spectral_spread))
            .vector("spectral_strongpeak", Some(&self.spectral_strongpeak))
            .vector("zerocrossingrate", Some(&self.zerocrossingrate))
            .matrix("mfcc_frame_size", "mfcc", Some(&self.mfcc))
            .matrix("sccoeffs_frame_size", "sccoeffs", Some(&self.sccoeffs))
            .matrix("scvalleys_frame_size", "scvalleys", Some(&self.scvalleys))
            .build()
    }
}

/// Tempo, beat and onset descriptors
///
/// Only `bpm` is required; the remaining descriptors are stored as NULL
/// when the extractor did not produce them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RhythmRecord {
    pub bpm: f64,
    pub confidence: Option<f64>,
    pub onset_rate: Option<f64>,
    pub beats_loudness: Option<Vec<f32>>,
    pub first_peak_bpm: Option<f64>,
    pub first_peak_spread: Option<f64>,
    pub first_peak_weight: Option<f64>,
    pub second_peak_bpm: Option<f64>,
    pub second_peak_spread: Option<f64>,
    pub second_peak_weight: Option<f64>,
    pub beats_position: Option<Vec<f32>>,
    pub bpm_estimates: Option<Vec<f32>>,
    pub bpm_intervals: Option<Vec<f32>>,
    pub onset_times: Option<Vec<f32>>,
    pub beats_loudness_band_ratio: Option<MatrixReal>,
    pub histogram: Option<Vec<f32>>,
}

impl FeatureRecord for RhythmRecord {
    const GROUP: RecordGroup = RecordGroup::Rhythm;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::real("bpm"),
        ColumnSpec::real("confidence"),
        ColumnSpec::real("onset_rate"),
        ColumnSpec::vector("beats_loudness"),
        ColumnSpec::real("first_peak_bpm"),
        ColumnSpec::real("first_peak_spread"),
        ColumnSpec::real("first_peak_weight"),
        ColumnSpec::real("second_peak_bpm"),
        ColumnSpec::real("second_peak_spread"),
        ColumnSpec::real("second_peak_weight"),
        ColumnSpec::vector("beats_position"),
        ColumnSpec::vector("bpm_estimates"),
        ColumnSpec::vector("bpm_intervals"),
        ColumnSpec::vector("onset_times"),
        ColumnSpec::matrix("beats_loudness_band_ratio", "beats_loudness_band_ratio_frame_size"),
        ColumnSpec::vector("histogram"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .real("bpm", Some(self.bpm))
            .real("confidence", self.confidence)
            .real("onset_rate", self.onset_rate)
            .vector("beats_loudness", self.beats_loudness.as_deref())
            .real("first_peak_bpm", self.first_peak_bpm)
            .real("first_peak_spread", self.first_peak_spread)
            .real("first_peak_weight", self.first_peak_weight)
            .real("second_peak_bpm", self.second_peak_bpm)
            .real("second_peak_spread", self.second_peak_spread)
            .real("second_peak_weight", self.second_peak_weight)
            .vector("beats_position", self.beats_position.as_deref())
            .vector("bpm_estimates", self.bpm_estimates.as_deref())
            .vector("bpm_intervals", self.bpm_intervals.as_deref())
            .vector("onset_times", self.onset_times.as_deref())
            .matrix(
                "beats_loudness_band_ratio_frame_size",
                "beats_loudness_band_ratio",
                self.beats_loudness_band_ratio.as_ref(),
            )
            .vector("histogram", self.histogram.as_deref())
            .build()
    }
}

/// Sound-effect descriptors (pitch envelope and harmonic balance)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SfxRecord {
    pub pitch_after_max_to_before_max_energy_ratio: f64,
    pub pitch_centroid: f64,
    pub pitch_max_to_total: f64,
    pub pitch_min_to_total: f64,
    pub inharmonicity: Vec<f32>,
    pub oddtoevenharmonicenergyratio: Vec<f32>,
    pub tristimulus: MatrixReal,
}

impl FeatureRecord for SfxRecord {
    const GROUP: RecordGroup = RecordGroup::Sfx;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::real("pitch_after_max_to_before_max_energy_ratio"),
        ColumnSpec::real("pitch_centroid"),
        ColumnSpec::real("pitch_max_to_total"),
        ColumnSpec::real("pitch_min_to_total"),
        ColumnSpec::vector("inharmonicity"),
        ColumnSpec::vector("oddtoevenharmonicenergyratio"),
        ColumnSpec::matrix("tristimulus", "tristimulus_frame_size"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .real(
                "pitch_after_max_to_before_max_energy_ratio",
                Some(self.pitch_after_max_to_before_max_energy_ratio),
            )
            .real("pitch_centroid", Some(self.pitch_centroid))
            .real("pitch_max_to_total", Some(self.pitch_max_to_total))
            .real("pitch_min_to_total", Some(self.pitch_min_to_total))
            .vector("inharmonicity", Some(&self.inharmonicity))
            .vector("oddtoevenharmonicenergyratio", Some(&self.oddtoevenharmonicenergyratio))
            .matrix("tristimulus_frame_size", "tristimulus", Some(&self.tristimulus))
            .build()
    }
}

/// Key, tuning and chord descriptors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TonalRecord {
    pub chords_changes_rate: f64,
    pub chords_number_rate: f64,
    pub key_strength: f64,
    pub tuning_diatonic_strength: f64,
    pub tuning_equal_tempered_deviation: f64,
    pub tuning_frequency: f64,
    pub tuning_nontempered_energy_ratio: f64,
    pub chords_strength: Vec<f32>,
    pub chords_histogram: Vec<f32>,
    pub thpcp: Vec<f32>,
    pub hpcp: MatrixReal,
    pub chords_key: String,
    pub chords_scale: String,
    pub key_key: String,
    pub key_scale: String,
    /// One chord label per frame
    pub chords_progression: Vec<String>,
}

impl TonalRecord {
    /// Chord labels never contain `|`, so the progression is stored pipe-joined
    pub fn progression_text(&self) -> String {
        self.chords_progression.join("|")
    }
}

impl FeatureRecord for TonalRecord {
    const GROUP: RecordGroup = RecordGroup::Tonal;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::real("chords_changes_rate"),
        ColumnSpec::real("chords_number_rate"),
        ColumnSpec::real("key_strength"),
        ColumnSpec::real("tuning_diatonic_strength"),
        ColumnSpec::real("tuning_equal_tempered_deviation"),
        ColumnSpec::real("tuning_frequency"),
        ColumnSpec::real("tuning_nontempered_energy_ratio"),
        ColumnSpec::vector("chords_strength"),
        ColumnSpec::vector("chords_histogram"),
        ColumnSpec::vector("thpcp"),
        ColumnSpec::matrix("hpcp", "hpcp_frame_size"),
        ColumnSpec::text("chords_key"),
        ColumnSpec::text("chords_scale"),
        ColumnSpec::text("key_key"),
        ColumnSpec::text("key_scale"),
        ColumnSpec::text("chords_progression"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .real("chords_changes_rate", Some(self.chords_changes_rate))
            .real("chords_number_rate", Some(self.chords_number_rate))
            .real("key_strength", Some(self.key_strength))
            .real("tuning_diatonic_strength", Some(self.tuning_diatonic_strength))
            .real("tuning_equal_tempered_deviation", Some(self.tuning_equal_tempered_deviation))
            .real("tuning_frequency", Some(self.tuning_frequency))
            .real("tuning_nontempered_energy_ratio", Some(self.tuning_nontempered_energy_ratio))
            .vector("chords_strength", Some(&self.chords_strength))
            .vector("chords_histogram", Some(&self.chords_histogram))
            .vector("thpcp", Some(&self.thpcp))
            .matrix("hpcp_frame_size", "hpcp", Some(&self.hpcp))
            .text("chords_key", Some(&self.chords_key))
            .text("chords_scale", Some(&self.chords_scale))
            .text("key_key", Some(&self.key_key))
            .text("key_scale", Some(&self.key_scale))
            .text("chords_progression", Some(&self.progression_text()))
            .build()
    }
}
