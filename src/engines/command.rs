//! Synthesis through an external voice-cloning program.
//!
//! The heavy lifting (model loading, autoregressive sampling, diffusion,
//! voice conditioning) happens in a separate synthesizer process. For every
//! request the engine:
//!
//! 1. spawns the program with the voice, device and preset parameters as
//!    command-line flags,
//! 2. writes the text, newline-terminated, to its stdin,
//! 3. reads a WAV stream from its stdout.
//!
//! # Program arguments
//!
//! ```text
//! <program> [extra args] --voice <name> --voices-dir <dir> --device <cuda|mps|cpu>
//!           --autoregressive-batch-size <n> [--half]
//!           ( --preset <name>
//!           | --num-autoregressive-samples <n> --diffusion-iterations <n>
//!             --temperature <t> --repetition-penalty <r> --length-penalty <l> )
//! ```
//!
//! `--preset` is used when the preset names one built into the model,
//! explicit parameters otherwise.
//!
//! # Voice Directory Layout
//!
//! ```text
//! ~/.cache/tortoise/voices/
//! └── target_voice/
//!     ├── sample_01.wav
//!     └── sample_02.wav
//! ```

use std::borrow::Cow;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::device::Device;
use super::SynthesisError;
use crate::presets::PresetConfig;
use crate::voice::list_wav_files;
use crate::{SynthesisEngine, SynthesisResult, SAMPLE_RATE};

/// Program run when none is configured.
pub const DEFAULT_PROGRAM: &str = "tortoise-synth";

/// Voice used when none is configured.
pub const DEFAULT_VOICE: &str = "target_voice";

/// `~/.cache/tortoise/voices`, or a relative `voices` directory when the home
/// directory cannot be determined.
pub fn default_voices_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cache").join("tortoise").join("voices"))
        .unwrap_or_else(|| PathBuf::from("voices"))
}

/// Parameters for configuring the external synthesizer.
#[derive(Debug, Clone)]
pub struct CommandEngineParams {
    /// Program name (looked up on `PATH`) or path.
    pub program: PathBuf,
    /// Arguments passed before the generated ones.
    pub extra_args: Vec<String>,
    /// Name of the cloned voice, a subdirectory of `voices_dir`.
    pub voice: String,
    /// Directory holding one subdirectory of reference clips per voice.
    pub voices_dir: PathBuf,
    /// `None` probes the environment on load.
    pub device: Option<Device>,
}

impl Default for CommandEngineParams {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            extra_args: Vec::new(),
            voice: DEFAULT_VOICE.to_string(),
            voices_dir: default_voices_dir(),
            device: None,
        }
    }
}

struct Resolved {
    program: PathBuf,
    device: Device,
}

/// Engine that delegates synthesis to an external program.
///
/// ```rust,no_run
/// use voicegen_rs::engines::command::{CommandEngine, CommandEngineParams};
/// use voicegen_rs::{PresetRegistry, SynthesisEngine};
///
/// let registry = PresetRegistry::default();
/// let mut engine = CommandEngine::new(CommandEngineParams {
///     voice: "alex".to_string(),
///     ..Default::default()
/// });
/// engine.load()?;
/// let audio = engine.synthesize("Hello, world!", registry.lookup("fast")?)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CommandEngine {
    params: CommandEngineParams,
    resolved: Option<Resolved>,
}

impl CommandEngine {
    pub fn new(params: CommandEngineParams) -> Self {
        Self {
            params,
            resolved: None,
        }
    }

    pub fn params(&self) -> &CommandEngineParams {
        &self.params
    }

    /// Device chosen at load time, if loaded.
    pub fn device(&self) -> Option<Device> {
        self.resolved.as_ref().map(|r| r.device)
    }

    fn voice_dir(&self) -> PathBuf {
        self.params.voices_dir.join(&self.params.voice)
    }
}

impl Drop for CommandEngine {
    fn drop(&mut self) {
        self.unload();
    }
}

impl SynthesisEngine for CommandEngine {
    fn load(&mut self) -> Result<(), SynthesisError> {
        if self.resolved.is_some() {
            return Ok(());
        }

        let program = resolve_program(&self.params.program).ok_or_else(|| {
            SynthesisError::Unavailable(format!(
                "synthesizer program '{}' not found on PATH",
                self.params.program.display()
            ))
        })?;

        let voice_dir = self.voice_dir();
        let samples = list_wav_files(&voice_dir).unwrap_or_default();
        if samples.is_empty() {
            return Err(SynthesisError::Unavailable(format!(
                "no voice samples found in {}; run `voicegen prepare-voice` first",
                voice_dir.display()
            )));
        }

        let device = self.params.device.unwrap_or_else(Device::probe);
        log::info!(
            "Using {} on {device} with voice '{}' ({} samples)",
            program.display(),
            self.params.voice,
            samples.len()
        );
        self.resolved = Some(Resolved { program, device });
        Ok(())
    }

    fn unload(&mut self) {
        self.resolved = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        preset: &PresetConfig,
    ) -> Result<SynthesisResult, SynthesisError> {
        self.load()?;
        let resolved = self
            .resolved
            .as_ref()
            .ok_or_else(|| SynthesisError::Unavailable("engine not loaded".to_string()))?;

        let mut args = self.params.extra_args.clone();
        args.extend(build_args(
            &self.params.voice,
            &self.params.voices_dir,
            resolved.device,
            preset,
        ));
        log::debug!("Running {} {}", resolved.program.display(), args.join(" "));

        let wav = run_synthesizer(&resolved.program, &args, text)?;
        decode_wav(&wav)
    }
}

/// Command-line flags describing one request.
pub fn build_args(
    voice: &str,
    voices_dir: &Path,
    device: Device,
    preset: &PresetConfig,
) -> Vec<String> {
    let mut args = vec![
        "--voice".to_string(),
        voice.to_string(),
        "--voices-dir".to_string(),
        voices_dir.display().to_string(),
        "--device".to_string(),
        device.to_string(),
        "--autoregressive-batch-size".to_string(),
        device.autoregressive_batch_size().to_string(),
    ];
    if device.use_half() {
        args.push("--half".to_string());
    }

    match &preset.engine_preset {
        Some(name) => {
            args.push("--preset".to_string());
            args.push(name.clone());
        }
        None => {
            args.extend([
                "--num-autoregressive-samples".to_string(),
                preset.sampling_budget.to_string(),
                "--diffusion-iterations".to_string(),
                preset.refinement_steps.to_string(),
                "--temperature".to_string(),
                preset.temperature.to_string(),
                "--repetition-penalty".to_string(),
                preset.effective_repetition_penalty().to_string(),
                "--length-penalty".to_string(),
                preset.effective_length_penalty().to_string(),
            ]);
        }
    }
    args
}

fn run_synthesizer(program: &Path, args: &[String], text: &str) -> Result<Vec<u8>, SynthesisError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SynthesisError::Unavailable(format!("{} not found", program.display()))
            } else {
                SynthesisError::Io(e)
            }
        })?;

    // A program that dies at startup closes stdin early; report its exit
    // status and stderr rather than the broken pipe.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(terminate_line(text).as_bytes()),
        None => Ok(()),
    };

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SynthesisError::Failed(format!(
            "{} exited with code {:?}: {}",
            program.display(),
            output.status.code(),
            stderr.trim()
        )));
    }
    written?;
    Ok(output.stdout)
}

fn terminate_line(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n"))
    }
}

/// Decode a WAV stream into mono f32 samples.
///
/// Multi-channel audio is averaged down to one channel. Anything other than
/// 24 kHz is rejected.
pub fn decode_wav(bytes: &[u8]) -> Result<SynthesisResult, SynthesisError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_rate != SAMPLE_RATE {
        return Err(SynthesisError::Failed(format!(
            "synthesizer produced {} Hz audio, expected {SAMPLE_RATE} Hz",
            spec.sample_rate
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<f32>, _>>()?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples: Vec<f32> = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    if samples.is_empty() {
        return Err(SynthesisError::Failed(
            "synthesizer produced no audio".to_string(),
        ));
    }

    Ok(SynthesisResult {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Find `program` on `PATH`, or check it directly when it contains a path
/// separator.
fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
