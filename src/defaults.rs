//! Default configuration constants for speechcli.
//!
//! Shared between the config file defaults, the CLI and the pipelines so the
//! two entry points agree on one set of values.

use std::time::Duration;

/// Default recognition language tag.
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

/// Default transcription output directory, relative to the home directory.
pub const TRANSCRIBE_OUTPUT_DIR: &str = "~/speechcli/stt_out";

/// Default synthesis output directory.
pub const SYNTHESIZE_OUTPUT_DIR: &str = "out";

/// Region used for synthesis when neither region variable is set.
pub const DEFAULT_SYNTHESIS_REGION: &str = "canadacentral";

/// Maximum `<voice>` elements per synthesized part.
///
/// The service rejects SSML documents with more than 50 voice elements;
/// 48 leaves a small margin.
pub const MAX_VOICES_PER_PART: usize = 48;

/// Retries after the initial synthesis attempt.
pub const SYNTHESIS_RETRIES: u32 = 2;

/// Backoff unit; attempt `n` waits `n * SYNTHESIS_BACKOFF_SECS`.
pub const SYNTHESIS_BACKOFF_SECS: f64 = 1.5;

/// Output format requested from the synthesis endpoint.
///
/// Every part uses the same format so the parts can be concatenated
/// frame-for-frame.
pub const SYNTHESIS_OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

/// Bitrate for the optional MP3 derivative.
pub const MP3_BITRATE: &str = "160k";

/// Encoder binary used for the MP3 derivative.
pub const FFMPEG_BINARY: &str = "ffmpeg";

/// Per-request HTTP timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Audio extensions accepted for transcription (lowercase, with dot).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    ".wav", ".mp3", ".mp4", ".m4a", ".wma", ".ogg", ".flac", ".aac",
];

/// Recognition offsets and durations are expressed in 100ns ticks.
pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Ticks in one millisecond.
pub const TICKS_PER_MILLISECOND: u64 = 10_000;

/// API version of the fast transcription endpoint.
pub const TRANSCRIPTION_API_VERSION: &str = "2024-11-15";

/// Backoff before retry number `attempt` (1-based).
pub fn backoff_for_attempt(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt)
}
