//! Descriptor selection resolution
//!
//! Turns the user's descriptor tokens into an [`ExtractionPlan`]: the closed
//! set of capabilities the extraction adapter must run. Resolution is pure
//! and happens once per run; workers share the plan read-only.

use std::collections::BTreeSet;

use clap::ValueEnum;

use crate::records::RecordGroup;

/// Descriptor group token accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DescriptorToken {
    Metadata,
    Features,
    Lowlevel,
    Rhythm,
    Sfx,
    Tonal,
    Spectrograms,
    #[value(name = "mel_spec")]
    MelSpec,
    #[value(name = "log_spec")]
    LogSpec,
    #[value(name = "freq_spec")]
    FreqSpec,
    All,
}

/// Extraction sub-step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// File and audio properties (always on)
    Metadata,
    /// Text and MusicBrainz tags
    Tags,
    /// Base frame analysis pass of the external extractor
    Features,
    LowLevel,
    Rhythm,
    Sfx,
    Tonal,
    MelSpec,
    LogSpec,
    FreqSpec,
}

impl Capability {
    /// Capabilities that must run first
    pub fn requires(&self) -> &'static [Capability] {
        match self {
            Capability::LowLevel | Capability::Rhythm | Capability::Sfx | Capability::Tonal => {
                &[Capability::Features]
            }
            Capability::Tags => &[Capability::Metadata],
            Capability::Metadata
            | Capability::Features
            | Capability::MelSpec
            | Capability::LogSpec
            | Capability::FreqSpec => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Metadata => "metadata",
            Capability::Tags => "tags",
            Capability::Features => "features",
            Capability::LowLevel => "lowlevel",
            Capability::Rhythm => "rhythm",
            Capability::Sfx => "sfx",
            Capability::Tonal => "tonal",
            Capability::MelSpec => "mel_spec",
            Capability::LogSpec => "log_spec",
            Capability::FreqSpec => "freq_spec",
        }
    }

    fn all() -> [Capability; 10] {
        [
            Capability::Metadata,
            Capability::Tags,
            Capability::Features,
            Capability::LowLevel,
            Capability::Rhythm,
            Capability::Sfx,
            Capability::Tonal,
            Capability::MelSpec,
            Capability::LogSpec,
            Capability::FreqSpec,
        ]
    }
}

impl DescriptorToken {
    fn capabilities(&self) -> Vec<Capability> {
        match self {
            DescriptorToken::Metadata => vec![Capability::Tags],
            DescriptorToken::Features => vec![
                Capability::LowLevel,
                Capability::Rhythm,
                Capability::Sfx,
                Capability::Tonal,
            ],
            DescriptorToken::Lowlevel => vec![Capability::LowLevel],
            DescriptorToken::Rhythm => vec![Capability::Rhythm],
            DescriptorToken::Sfx => vec![Capability::Sfx],
            DescriptorToken::Tonal => vec![Capability::Tonal],
            DescriptorToken::Spectrograms => vec![
                Capability::MelSpec,
                Capability::LogSpec,
                Capability::FreqSpec,
            ],
            DescriptorToken::MelSpec => vec![Capability::MelSpec],
            DescriptorToken::LogSpec => vec![Capability::LogSpec],
            DescriptorToken::FreqSpec => vec![Capability::FreqSpec],
            DescriptorToken::All => Capability::all().to_vec(),
        }
    }
}

/// Resolved, dependency-closed capability set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPlan {
    capabilities: BTreeSet<Capability>,
}

impl ExtractionPlan {
    /// Resolve tokens; an empty selection means everything
    pub fn resolve(tokens: &[DescriptorToken]) -> Self {
        let mut pending: Vec<Capability> = if tokens.is_empty() {
            Capability::all().to_vec()
        } else {
            tokens.iter().flat_map(|t| t.capabilities()).collect()
        };
        pending.push(Capability::Metadata);

        let mut capabilities = BTreeSet::new();
        while let Some(cap) = pending.pop() {
            if capabilities.insert(cap) {
                pending.extend_from_slice(cap.requires());
            }
        }

        Self { capabilities }
    }

    /// Plan running every capability
    pub fn all() -> Self {
        Self::resolve(&[])
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }

    /// Whether the external extractor has to run at all
    pub fn needs_analysis(&self) -> bool {
        self.contains(Capability::Features) || self.wants_group(RecordGroup::Spectrograms)
    }

    /// Whether a feature group should be marshalled and attached
    pub fn wants_group(&self, group: RecordGroup) -> bool {
        match group {
            RecordGroup::TrackTags | RecordGroup::MusicBrainzTags => self.contains(Capability::Tags),
            RecordGroup::LowLevel => self.contains(Capability::LowLevel),
            RecordGroup::Rhythm => self.contains(Capability::Rhythm),
            RecordGroup::Sfx => self.contains(Capability::Sfx),
            RecordGroup::Tonal => self.contains(Capability::Tonal),
            RecordGroup::Spectrograms => {
                self.contains(Capability::MelSpec)
                    || self.contains(Capability::LogSpec)
                    || self.contains(Capability::FreqSpec)
            }
        }
    }

    /// Whether a flattened descriptor name belongs to a selected group
    pub fn keeps_descriptor(&self, name: &str) -> bool {
        let group = name.split('.').next().unwrap_or(name);
        match group {
            "metadata" => true,
            "lowLevel" => self.contains(Capability::LowLevel),
            "rhythm" => self.contains(Capability::Rhythm),
            "sfx" => self.contains(Capability::Sfx),
            "tonal" => self.contains(Capability::Tonal),
            "mel_spec" => self.contains(Capability::MelSpec),
            "log_spec" => self.contains(Capability::LogSpec),
            "freq_spec" => self.contains(Capability::FreqSpec),
            _ => false,
        }
    }

    /// Comma-joined capability names, for extractor argument templates
    pub fn descriptor_list(&self) -> String {
        self.capabilities
            .iter()
            .map(Capability::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_is_all() {
        let plan = ExtractionPlan::resolve(&[]);
        assert_eq!(plan, ExtractionPlan::resolve(&[DescriptorToken::All]));
        for group in RecordGroup::all() {
            assert!(plan.wants_group(group), "{}", group);
        }
    }

    #[test]
    fn test_rhythm_pulls_in_features_pass() {
        let plan = ExtractionPlan::resolve(&[DescriptorToken::Rhythm]);
        assert!(plan.contains(Capability::Features));
        assert!(plan.contains(Capability::Rhythm));
        assert!(plan.contains(Capability::Metadata));
        assert!(!plan.contains(Capability::LowLevel));
        assert!(!plan.wants_group(RecordGroup::TrackTags));
        assert!(plan.needs_analysis());
    }

    #[test]
    fn test_metadata_only_skips_analysis() {
        let plan = ExtractionPlan::resolve(&[DescriptorToken::Metadata]);
        assert!(plan.contains(Capability::Tags));
        assert!(!plan.contains(Capability::Features));
        assert!(!plan.needs_analysis());
        assert!(plan.wants_group(RecordGroup::MusicBrainzTags));
    }

    #[test]
    fn test_single_spectrogram() {
        let plan = ExtractionPlan::resolve(&[DescriptorToken::MelSpec]);
        assert!(plan.wants_group(RecordGroup::Spectrograms));
        assert!(plan.keeps_descriptor("mel_spec"));
        assert!(!plan.keeps_descriptor("log_spec"));
        assert!(!plan.contains(Capability::Features));
        assert!(plan.needs_analysis());
    }

    #[test]
    fn test_keeps_descriptor_by_group() {
        let plan = ExtractionPlan::resolve(&[DescriptorToken::Lowlevel]);
        assert!(plan.keeps_descriptor("metadata.audio.duration"));
        assert!(plan.keeps_descriptor("lowLevel.mfcc"));
        assert!(!plan.keeps_descriptor("tonal.key_key"));
        assert!(!plan.keeps_descriptor("unknown.thing"));
    }

    #[test]
    fn test_token_names() {
        assert_eq!(
            DescriptorToken::from_str("mel_spec", false).unwrap(),
            DescriptorToken::MelSpec
        );
        assert_eq!(
            DescriptorToken::from_str("lowlevel", false).unwrap(),
            DescriptorToken::Lowlevel
        );
    }
}
