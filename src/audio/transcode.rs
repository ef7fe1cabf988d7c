//! MP3 derivative of the final WAV via an external encoder.
//!
//! The `CommandExecutor` trait keeps the encoder call testable without
//! ffmpeg installed.

use crate::error::{Result, SpeechError};
use std::path::Path;
use std::process::Command;

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync for use in concurrent contexts.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the command fails or is not found.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String>;
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(command).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeechError::ToolNotFound {
                    tool: command.to_string(),
                }
            } else {
                SpeechError::ToolFailed {
                    message: format!("Failed to execute {}: {}", command, e),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::ToolFailed {
                message: format!(
                    "{} failed with status {:?}: {}",
                    command,
                    output.status.code(),
                    stderr.trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Result of a transcode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Written,
    /// The encoder binary is not installed; nothing was produced.
    EncoderMissing { tool: String },
}

/// Produces compressed derivatives through an external encoder.
pub struct FormatTranscoder<E: CommandExecutor> {
    executor: E,
    encoder: String,
    bitrate: String,
}

impl<E: CommandExecutor> FormatTranscoder<E> {
    pub fn new(executor: E, encoder: impl Into<String>, bitrate: impl Into<String>) -> Self {
        Self {
            executor,
            encoder: encoder.into(),
            bitrate: bitrate.into(),
        }
    }

    /// Encode `input` (WAV) to MP3 at `output`.
    ///
    /// A missing encoder is not an error: the caller reports it and moves on.
    pub fn wav_to_mp3(&self, input: &Path, output: &Path) -> Result<TranscodeOutcome> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let args: [&str; 10] = [
            "-y",
            "-loglevel",
            "error",
            "-i",
            &input,
            "-codec:a",
            "libmp3lame",
            "-b:a",
            &self.bitrate,
            &output,
        ];

        match self.executor.execute(&self.encoder, &args) {
            Ok(_) => Ok(TranscodeOutcome::Written),
            Err(SpeechError::ToolNotFound { tool }) => Ok(TranscodeOutcome::EncoderMissing { tool }),
            Err(e) => Err(e),
        }
    }
}
