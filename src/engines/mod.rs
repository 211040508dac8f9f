//! Speech synthesis engines.
//!
//! The batch core drives engines only through [`SynthesisEngine`](crate::SynthesisEngine).
//!
//! # Available Engines
//!
//! - [`command::CommandEngine`] - runs an external voice-cloning synthesizer
//!   program and reads the WAV it produces

pub mod command;
pub mod device;

pub use command::{CommandEngine, CommandEngineParams};
pub use device::Device;

/// Failure reported by a synthesis engine.
///
/// [`Failed`](Self::Failed), I/O and WAV errors concern one request and a
/// batch moves on to the next item. [`Unavailable`](Self::Unavailable) means
/// the engine itself cannot serve requests and the run should stop.
#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("Synthesis failed: {0}")]
    Failed(String),
    #[error("Synthesis engine unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl SynthesisError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
