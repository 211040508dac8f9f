//! Run configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "voice": "alex",
//!   "engine": { "program": "/opt/tortoise/bin/synth", "extra_args": ["--low-vram"] },
//!   "batch_output_dir": "out/batch"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engines::command::{
    default_voices_dir, CommandEngineParams, DEFAULT_PROGRAM, DEFAULT_VOICE,
};
use crate::engines::Device;
use crate::error::VoiceGenError;

/// External synthesizer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Synthesizer program name or path.
    pub program: PathBuf,
    /// Arguments passed to the program before the generated ones.
    pub extra_args: Vec<String>,
    /// `cuda`, `mps` or `cpu`; probed when absent.
    pub device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            extra_args: Vec::new(),
            device: None,
        }
    }
}

/// Paths and engine settings for every CLI mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Name of the cloned voice.
    pub voice: String,
    /// Directory holding one subdirectory of reference clips per voice.
    pub voices_dir: PathBuf,
    pub engine: EngineConfig,
    /// Where `batch` writes its WAV files.
    pub batch_output_dir: PathBuf,
    /// JSON report for `batch`.
    pub batch_report: PathBuf,
    /// Where `compare` writes its WAV files.
    pub comparison_output_dir: PathBuf,
    /// JSON report for `compare`.
    pub comparison_report: PathBuf,
    /// File written by `create-samples`.
    pub sample_file: PathBuf,
    /// Where `prepare-voice` reads recordings from.
    pub processed_audio_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            voices_dir: default_voices_dir(),
            engine: EngineConfig::default(),
            batch_output_dir: PathBuf::from("batch_output"),
            batch_report: PathBuf::from("batch_results.json"),
            comparison_output_dir: PathBuf::from("comparison_output"),
            comparison_report: PathBuf::from("comparison_results.json"),
            sample_file: PathBuf::from("sample_texts.txt"),
            processed_audio_dir: PathBuf::from("audio_data/your_voice_processed"),
        }
    }
}

impl GeneratorConfig {
    /// Load a JSON config file; fields it omits keep their defaults.
    pub fn load(path: &Path) -> Result<Self, VoiceGenError> {
        let content = fs::read_to_string(path).map_err(|e| {
            VoiceGenError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| VoiceGenError::Config(format!("{}: {e}", path.display())))?;
        config.device()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parsed device override, if one is configured.
    pub fn device(&self) -> Result<Option<Device>, VoiceGenError> {
        self.engine
            .device
            .as_deref()
            .map(|d| d.parse::<Device>().map_err(VoiceGenError::Config))
            .transpose()
    }

    pub fn engine_params(&self) -> Result<CommandEngineParams, VoiceGenError> {
        Ok(CommandEngineParams {
            program: self.engine.program.clone(),
            extra_args: self.engine.extra_args.clone(),
            voice: self.voice.clone(),
            voices_dir: self.voices_dir.clone(),
            device: self.device()?,
        })
    }
}
