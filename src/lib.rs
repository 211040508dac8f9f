//! # voicegen-rs
//!
//! Quality presets and batch orchestration for voice-cloned text-to-speech.
//!
//! ## Features
//!
//! - **Preset Registry**: named quality tiers trading generation speed for audio quality
//! - **Batch Orchestration**: synthesize a file of lines or compare presets on one text,
//!   tolerating per-item failures and persisting a JSON report
//! - **Pluggable Engines**: any type implementing [`SynthesisEngine`] can drive a run;
//!   [`engines::command::CommandEngine`] runs an external synthesizer program
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use voicegen_rs::batch::BatchOrchestrator;
//! use voicegen_rs::engines::command::{CommandEngine, CommandEngineParams};
//! use voicegen_rs::presets::PresetRegistry;
//!
//! let registry = PresetRegistry::default();
//! let mut engine = CommandEngine::new(CommandEngineParams::default());
//!
//! let lines = vec!["Hello, world!".to_string()];
//! let run = BatchOrchestrator::new(&registry, &mut engine)
//!     .run_batch(&lines, "custom_optimized", &PathBuf::from("batch_output"))?;
//! println!("{} of {} succeeded", run.summary.succeeded, run.summary.attempted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod config;
pub mod engines;
pub mod error;
pub mod presets;
pub mod voice;

use std::path::Path;

pub use engines::SynthesisError;
pub use error::VoiceGenError;
pub use presets::{PresetConfig, PresetRegistry, UnknownPresetError};

/// Sample rate of every file this crate writes.
pub const SAMPLE_RATE: u32 = 24000;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Raw mono audio samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for the voice-cloning model)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a mono 16-bit signed PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), SynthesisError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(to_pcm16(sample))?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn to_pcm16(sample: f32) -> i16 {
    let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    (clamped * i16::MAX as f32).round() as i16
}

/// Common interface for text-to-speech synthesis engines.
///
/// The orchestration core only ever talks to an engine through this trait, so
/// tests can substitute deterministic stubs for real model inference.
pub trait SynthesisEngine {
    /// Prepare the engine before the first request of a run.
    ///
    /// An error here means the engine is unusable and the whole run is aborted
    /// before any item is attempted.
    fn load(&mut self) -> Result<(), SynthesisError> {
        Ok(())
    }

    /// Release any resources held by the engine.
    fn unload(&mut self) {}

    /// Synthesize speech for `text` using the parameters in `preset`.
    fn synthesize(
        &mut self,
        text: &str,
        preset: &PresetConfig,
    ) -> Result<SynthesisResult, SynthesisError>;

    /// Synthesize speech and write it to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    /// On failure nothing is left at `wav_path`, including a file from an
    /// earlier run.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        preset: &PresetConfig,
        wav_path: &Path,
    ) -> Result<SynthesisResult, SynthesisError> {
        let outcome = self
            .synthesize(text, preset)
            .and_then(|result| result.write_wav(wav_path).map(|()| result));
        if outcome.is_err() {
            remove_partial(wav_path);
        }
        outcome
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Could not remove {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{to_pcm16, SynthesisEngine, SynthesisError, SynthesisResult, SAMPLE_RATE};
    use crate::presets::PresetRegistry;
    use crate::PresetConfig;

    struct FailingEngine;

    impl SynthesisEngine for FailingEngine {
        fn synthesize(
            &mut self,
            _text: &str,
            _preset: &PresetConfig,
        ) -> Result<SynthesisResult, SynthesisError> {
            Err(SynthesisError::Failed("no audio".to_string()))
        }
    }

    #[test]
    fn failed_synthesis_removes_stale_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("001_Hello.wav");
        std::fs::write(&path, b"left over from an earlier run").expect("seed file");

        let registry = PresetRegistry::default();
        let preset = registry.lookup("fast").expect("preset");
        let mut engine = FailingEngine;
        assert!(engine.synthesize_to_file("Hello", preset, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn pcm16_conversion_clamps_and_scales() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), i16::MAX);
        assert_eq!(to_pcm16(2.5), i16::MAX);
        assert_eq!(to_pcm16(-1.0), -i16::MAX);
        assert_eq!(to_pcm16(f32::NAN), 0);
    }

    #[test]
    fn writes_mono_16_bit_wav_at_24khz() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        let result = SynthesisResult {
            samples: vec![0.0, 0.5, -0.5, 0.25],
            sample_rate: SAMPLE_RATE,
        };
        result.write_wav(&path).expect("write wav");

        let reader = hound::WavReader::open(&path).expect("open wav");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn duration_is_samples_over_rate() {
        let result = SynthesisResult {
            samples: vec![0.0; 12000],
            sample_rate: SAMPLE_RATE,
        };
        assert!((result.duration_secs() - 0.5).abs() < f64::EPSILON);
    }
}
