//! Resolving the transcription input into a list of audio files.

use crate::defaults::AUDIO_EXTENSIONS;
use crate::error::{Result, SpeechError};
use std::fs;
use std::path::{Path, PathBuf};

/// Whether `path` has one of the supported audio extensions
/// (case-insensitive).
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let dotted = format!(".{}", ext.to_lowercase());
            AUDIO_EXTENSIONS.contains(&dotted.as_str())
        })
        .unwrap_or(false)
}

/// Resolve `input` into the files to transcribe.
///
/// A directory yields its audio files (non-recursive, sorted by path). A file
/// is returned as-is, whatever its extension, so the caller can report it as
/// skipped. Nothing to process is an [`SpeechError::InputNotFound`].
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() && is_audio_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            return Err(not_found(input));
        }
        Ok(files)
    } else if input.exists() {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(not_found(input))
    }
}

fn not_found(input: &Path) -> SpeechError {
    SpeechError::InputNotFound {
        path: input.display().to_string(),
    }
}
