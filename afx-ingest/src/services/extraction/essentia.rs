//! External feature extractor
//!
//! Runs an analysis program (by default `essentia_streaming_extractor_music`)
//! that writes a JSON descriptor pool, then flattens the pool into a bundle.
//! The argument template supports `{input}`, `{output}`, `{sample_rate}`,
//! `{mono}` and `{descriptors}` placeholders.
//!
//! The program is expected to emit frame-level pools; aggregated statistics
//! (`mean`, `var`, ...) flatten to names the marshaller does not read.

use std::path::{Path, PathBuf};
use std::process::Command;

use afx_common::config::ExtractionConfig;
use tracing::debug;

use super::ExtractOptions;
use crate::bundle::DescriptorBundle;
use crate::error::ExtractError;
use crate::services::descriptor_selection::ExtractionPlan;

/// Temporary output file, removed when dropped
struct TempOutput(PathBuf);

impl TempOutput {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("afx_{}.json", uuid::Uuid::new_v4())))
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Command-line extractor
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(
        &self,
        input: &Path,
        output: &Path,
        options: &ExtractOptions,
        plan: &ExtractionPlan,
    ) -> Vec<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        let sample_rate = options.sample_rate.to_string();
        let mono = if options.mono { "1" } else { "0" };
        let descriptors = plan.descriptor_list();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{sample_rate}", &sample_rate)
                    .replace("{mono}", mono)
                    .replace("{descriptors}", &descriptors)
            })
            .collect()
    }

    /// Run the program on one file and parse its JSON pool
    pub fn analyze(
        &self,
        path: &Path,
        options: &ExtractOptions,
        plan: &ExtractionPlan,
    ) -> Result<DescriptorBundle, ExtractError> {
        let temp_output = TempOutput::new();
        let args = self.render_args(path, &temp_output.0, options, plan);

        debug!(
            audio_file = %path.display(),
            output_file = %temp_output.0.display(),
            program = %self.program,
            "Running feature extractor"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractError::Execution(format!("{} not found in PATH", self.program))
                } else {
                    ExtractError::Execution(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::AnalysisFailed(format!(
                "Exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let json_content = std::fs::read_to_string(&temp_output.0)?;
        let pool: serde_json::Value =
            serde_json::from_str(&json_content).map_err(|e| ExtractError::Parse(e.to_string()))?;

        Ok(DescriptorBundle::from_json(&pool))
    }
}
