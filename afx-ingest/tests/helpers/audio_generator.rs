//! Audio test fixture generator
//!
//! Short mono tones; every file gets a distinct frequency so no two share a
//! checksum.

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.25,
            sample_rate: 8000,
            channels: 1,
            frequency: 440.0,
        }
    }
}

/// Write a 16-bit PCM sine tone
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample = (0.3 * (2.0 * std::f32::consts::PI * config.frequency * t).sin()
            * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Write `names` into `dir`, each with its own tone
pub fn generate_test_library(dir: &Path, names: &[&str]) -> anyhow::Result<Vec<PathBuf>> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let config = AudioConfig {
                frequency: 220.0 + 55.0 * i as f32,
                ..Default::default()
            };
            generate_test_wav(&dir.join(name), &config)
        })
        .collect()
}
