//! Joining synthesized WAV parts into one file.

use crate::audio::wav::{AudioFileHandle, AudioParams, WavSink};
use crate::error::{Result, SpeechError};
use std::path::{Path, PathBuf};

/// Summary of a finished concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatReport {
    pub output: PathBuf,
    pub params: AudioParams,
    pub parts: usize,
    pub frames: usize,
}

/// Concatenate the frame data of `inputs`, in order, into `output`.
///
/// All inputs must share channel count, sample width and frame rate with the
/// first one. Every header is checked before anything is written, so a
/// mismatch leaves no output file behind. Sample data is streamed one input
/// at a time; a read failure part way through removes the partial output.
pub fn concat_wavs<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<ConcatReport> {
    let Some((first, rest)) = inputs.split_first() else {
        return Err(SpeechError::EmptyInput);
    };

    let first = AudioFileHandle::open(first.as_ref())?;
    let params = first.params;
    let mut handles = Vec::with_capacity(inputs.len());
    handles.push(first);

    for path in rest {
        let path = path.as_ref();
        let handle = AudioFileHandle::open(path)?;
        if handle.params != params {
            return Err(SpeechError::FormatMismatch {
                path: path.to_path_buf(),
                expected: params.to_string(),
                actual: handle.params.to_string(),
            });
        }
        handles.push(handle);
    }

    tracing::debug!(parts = handles.len(), %params, "concatenating wav parts");
    if let Err(e) = stream_parts(&handles, params, output) {
        if output.exists()
            && let Err(remove) = std::fs::remove_file(output)
        {
            tracing::warn!(path = %output.display(), error = %remove, "failed to remove partial wav");
        }
        return Err(e);
    }

    Ok(ConcatReport {
        output: output.to_path_buf(),
        params,
        parts: handles.len(),
        frames: handles.iter().map(AudioFileHandle::frame_count).sum(),
    })
}

fn stream_parts(handles: &[AudioFileHandle], params: AudioParams, output: &Path) -> Result<()> {
    let mut sink = WavSink::create(output, params)?;
    for handle in handles {
        sink.append(handle)?;
    }
    sink.finalize()
}
