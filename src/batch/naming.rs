use std::path::{Path, PathBuf};

/// Characters of source text used in batch file names.
pub const BATCH_SLUG_CHARS: usize = 20;

/// Characters of source text used in single-generation file names.
pub const SINGLE_SLUG_CHARS: usize = 25;

/// Filesystem-safe slice of `text`.
///
/// Takes the first `max_chars` characters, keeps alphanumerics, spaces and
/// underscores, trims the ends and replaces spaces with underscores.
pub fn sanitize_slug(text: &str, max_chars: usize) -> String {
    let kept: String = text
        .chars()
        .take(max_chars)
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.trim().replace(' ', "_")
}

/// `NNN_slug.wav` inside `dir`, with the index zero-padded to width 3.
pub fn batch_output_path(dir: &Path, index: usize, text: &str) -> PathBuf {
    dir.join(format!(
        "{index:03}_{}.wav",
        sanitize_slug(text, BATCH_SLUG_CHARS)
    ))
}

/// `comparison_<preset>.wav` inside `dir`.
pub fn comparison_output_path(dir: &Path, preset: &str) -> PathBuf {
    dir.join(format!("comparison_{preset}.wav"))
}

/// Default file for a one-off generation: `improved_<slug>_<preset>.wav`.
pub fn single_output_path(text: &str, preset: &str) -> PathBuf {
    PathBuf::from(format!(
        "improved_{}_{preset}.wav",
        sanitize_slug(text, SINGLE_SLUG_CHARS)
    ))
}
