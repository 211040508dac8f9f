//! Reference audio for the cloned voice.
//!
//! The synthesizer conditions on every `.wav` file in
//! `<voices_dir>/<voice>/`. [`prepare_voice`] fills that directory from a
//! folder of processed recordings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::VoiceGenError;

/// `.wav` files directly inside `dir`, sorted by name.
pub fn list_wav_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy every `.wav` in `source_dir` into `voices_dir/voice`.
///
/// Returns the copied destination paths. Existing files with the same name
/// are overwritten.
pub fn prepare_voice(
    source_dir: &Path,
    voices_dir: &Path,
    voice: &str,
) -> Result<Vec<PathBuf>, VoiceGenError> {
    if !source_dir.is_dir() {
        return Err(VoiceGenError::MissingInputFile(source_dir.to_path_buf()));
    }
    let sources = list_wav_files(source_dir)?;
    if sources.is_empty() {
        return Err(VoiceGenError::MissingInput(format!(
            "no audio files found in {}",
            source_dir.display()
        )));
    }
    log::info!("Found {} audio files in {}", sources.len(), source_dir.display());

    let target_dir = voices_dir.join(voice);
    fs::create_dir_all(&target_dir)?;

    let mut copied = Vec::with_capacity(sources.len());
    for src in sources {
        let Some(name) = src.file_name() else {
            continue;
        };
        let dst = target_dir.join(name);
        fs::copy(&src, &dst)?;
        log::debug!("Copied {} -> {}", src.display(), dst.display());
        copied.push(dst);
    }

    log::info!(
        "Voice '{voice}' ready with {} samples in {}",
        copied.len(),
        target_dir.display()
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_only_wav_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("processed");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("b.wav"), b"b").unwrap();
        fs::write(src.join("a.WAV"), b"a").unwrap();
        fs::write(src.join("notes.txt"), b"skip").unwrap();

        let voices = dir.path().join("voices");
        let copied = prepare_voice(&src, &voices, "alex").unwrap();

        let names: Vec<_> = copied
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.WAV", "b.wav"]);
        assert_eq!(fs::read(voices.join("alex").join("b.wav")).unwrap(), b"b");
        assert!(!voices.join("alex").join("notes.txt").exists());
    }

    #[test]
    fn missing_source_directory_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_voice(&dir.path().join("nope"), dir.path(), "alex").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn directory_without_audio_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_voice(dir.path(), &dir.path().join("voices"), "alex").unwrap_err();
        assert!(matches!(err, VoiceGenError::MissingInput(_)));
    }
}
