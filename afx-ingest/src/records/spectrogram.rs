use super::{ColumnSpec, FeatureRecord, Field, FieldsBuilder, MatrixReal, RecordGroup};

/// Mel, log and linear-frequency spectrograms
///
/// Each spectrogram is independently optional; the record as a whole is only
/// produced when at least one of them is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrogramRecord {
    pub mel_spec: Option<MatrixReal>,
    pub log_spec: Option<MatrixReal>,
    pub freq_spec: Option<MatrixReal>,
}

impl SpectrogramRecord {
    pub fn is_empty(&self) -> bool {
        self.mel_spec.is_none() && self.log_spec.is_none() && self.freq_spec.is_none()
    }
}

impl FeatureRecord for SpectrogramRecord {
    const GROUP: RecordGroup = RecordGroup::Spectrograms;
    const SCHEMA: &'static [ColumnSpec] = &[
        ColumnSpec::matrix("mel_spec", "mel_spec_frame_size"),
        ColumnSpec::matrix("log_spec", "log_spec_frame_size"),
        ColumnSpec::matrix("freq_spec", "freq_spec_frame_size"),
    ];

    fn fields(&self) -> Vec<Field> {
        FieldsBuilder::new()
            .matrix("mel_spec_frame_size", "mel_spec", self.mel_spec.as_ref())
            .matrix("log_spec_frame_size", "log_spec", self.log_spec.as_ref())
            .matrix("freq_spec_frame_size", "freq_spec", self.freq_spec.as_ref())
            .build()
    }
}
