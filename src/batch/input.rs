use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::VoiceGenError;

/// Example sentences written by [`create_sample_text_file`].
pub const SAMPLE_TEXTS: [&str; 8] = [
    "Hello, this is a test of my cloned voice using Tortoise TTS.",
    "The quick brown fox jumps over the lazy dog.",
    "I'm experimenting with different voice cloning technologies.",
    "This sentence tests how well the model handles longer phrases with multiple clauses.",
    "Short test.",
    "How are you doing today? I hope you're having a wonderful time!",
    "Voice cloning technology has advanced significantly in recent years.",
    "Let's see how this sounds with some technical terminology and acronyms like AI, ML, and TTS.",
];

/// Read one text item per non-blank line, trimmed, in file order.
///
/// A missing file or a file without any text is an input error; nothing has
/// been attempted yet when either is returned.
pub fn read_text_items(path: &Path) -> Result<Vec<String>, VoiceGenError> {
    if !path.is_file() {
        return Err(VoiceGenError::MissingInputFile(path.to_path_buf()));
    }

    let reader = BufReader::new(fs::File::open(path)?);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            items.push(trimmed.to_string());
        }
    }

    if items.is_empty() {
        return Err(VoiceGenError::MissingInput(format!(
            "no text found in {}",
            path.display()
        )));
    }
    log::debug!("Read {} text items from {}", items.len(), path.display());
    Ok(items)
}

/// Write [`SAMPLE_TEXTS`] to `path`, one sentence per line.
///
/// Returns the number of lines written.
pub fn create_sample_text_file(path: &Path) -> Result<usize, VoiceGenError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    for text in SAMPLE_TEXTS {
        writeln!(file, "{text}")?;
    }
    log::info!(
        "Created sample text file {} ({} lines)",
        path.display(),
        SAMPLE_TEXTS.len()
    );
    Ok(SAMPLE_TEXTS.len())
}
