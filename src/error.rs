use std::path::PathBuf;

use crate::batch::BatchResult;
use crate::presets::UnknownPresetError;

/// Errors that abort a run.
///
/// Per-item synthesis failures never surface here; they are recorded in the
/// item's [`BatchResult`] instead.
#[derive(thiserror::Error, Debug)]
pub enum VoiceGenError {
    #[error(transparent)]
    UnknownPreset(#[from] UnknownPresetError),
    #[error("Invalid preset table: {0}")]
    InvalidPreset(String),
    #[error("Input file not found: {}", .0.display())]
    MissingInputFile(PathBuf),
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Synthesis engine could not be initialized: {0}")]
    CollaboratorInit(String),
    #[error("Synthesis engine became unusable after {} item(s): {reason}", .completed.len())]
    CollaboratorLost {
        reason: String,
        completed: Vec<BatchResult>,
    },
    #[error("Invalid config file: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write report: {0}")]
    Json(#[from] serde_json::Error),
}

impl VoiceGenError {
    /// True for errors caused by the user's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPreset(_) | Self::MissingInputFile(_) | Self::MissingInput(_)
        )
    }
}
