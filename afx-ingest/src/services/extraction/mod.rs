//! Feature extraction adapter
//!
//! [`FeatureExtractor`] is the boundary workers call once per asset. The
//! production implementation, [`AnalysisExtractor`], combines the in-process
//! metadata pass with the external analysis program.

mod essentia;
mod metadata;

pub use essentia::CommandExtractor;
pub use metadata::MetadataReader;

use std::path::Path;

use afx_common::config::ExtractionConfig;
use tracing::warn;

use crate::bundle::DescriptorBundle;
use crate::error::ExtractError;
use crate::services::descriptor_selection::ExtractionPlan;

/// Per-run analysis parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Analysis sample rate (Hz)
    pub sample_rate: u32,
    /// Downmix to mono before analysis
    pub mono: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            mono: false,
        }
    }
}

impl From<&ExtractionConfig> for ExtractOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            mono: config.mono,
        }
    }
}

/// Descriptor extraction for a single asset
///
/// Called from worker threads; implementations must not touch the store.
pub trait FeatureExtractor: Send + Sync {
    fn extract(
        &self,
        path: &Path,
        options: &ExtractOptions,
        plan: &ExtractionPlan,
    ) -> Result<DescriptorBundle, ExtractError>;
}

/// Metadata pass plus external analysis
pub struct AnalysisExtractor {
    metadata: MetadataReader,
    analyzer: CommandExtractor,
}

impl AnalysisExtractor {
    pub fn new(analyzer: CommandExtractor) -> Self {
        Self {
            metadata: MetadataReader::new(),
            analyzer,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(CommandExtractor::from_config(config))
    }
}

impl FeatureExtractor for AnalysisExtractor {
    fn extract(
        &self,
        path: &Path,
        options: &ExtractOptions,
        plan: &ExtractionPlan,
    ) -> Result<DescriptorBundle, ExtractError> {
        // Unreadable tags only sink the asset when there is nothing else to extract
        let mut bundle = match self.metadata.read(path) {
            Ok(bundle) => bundle,
            Err(e) if plan.needs_analysis() => {
                warn!(
                    file = %path.display(),
                    error = %e,
                    "Metadata unreadable, continuing with analysis"
                );
                DescriptorBundle::new()
            }
            Err(e) => return Err(e),
        };

        if plan.needs_analysis() {
            let mut features = self.analyzer.analyze(path, options, plan)?;
            // The metadata pass owns metadata.*
            features.remove_group("metadata");
            bundle.merge(features);
        }

        bundle.retain_selected(plan);
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::descriptor_selection::DescriptorToken;
    use std::io::Write;

    fn undeterminable_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("track.wma");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11])
            .unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        path
    }

    fn rhythm_analyzer() -> CommandExtractor {
        CommandExtractor::new(
            "sh",
            vec![
                "-c".into(),
                r#"printf '{"rhythm":{"bpm":98.0}}' > "$1""#.into(),
                "sh".into(),
                "{output}".into(),
            ],
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_metadata_still_analyzed() {
        let dir = tempfile::tempdir().unwrap();
        let path = undeterminable_file(dir.path());
        let extractor = AnalysisExtractor::new(rhythm_analyzer());

        let bundle = extractor
            .extract(&path, &ExtractOptions::default(), &ExtractionPlan::all())
            .unwrap();
        assert_eq!(bundle.real("rhythm.bpm").unwrap(), 98.0);
        assert!(!bundle.has_group("metadata"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_metadata_fails_metadata_only_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = undeterminable_file(dir.path());
        let extractor = AnalysisExtractor::new(rhythm_analyzer());
        let plan = ExtractionPlan::resolve(&[DescriptorToken::Metadata]);
        assert!(!plan.needs_analysis());

        assert!(extractor
            .extract(&path, &ExtractOptions::default(), &plan)
            .is_err());
    }
}
