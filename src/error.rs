//! Error types for speechcli.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Input errors
    #[error("No audio files to process: {path}")]
    InputNotFound { path: String },

    #[error("Input file not found: {}", path.display())]
    DocumentNotFound { path: PathBuf },

    #[error("No *.part*.ssml parts found in {}", dir.display())]
    NoSplitParts { dir: PathBuf },

    // Document errors
    #[error("Malformed document: {message}")]
    MalformedDocument { message: String },

    // Audio errors
    #[error("No audio parts to concatenate")]
    EmptyInput,

    #[error("Audio format mismatch in {}: expected {expected}, got {actual}", path.display())]
    FormatMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Remote service errors
    #[error("Transient remote error: {message}")]
    TransientRemote { message: String },

    #[error("Remote request failed: {message}")]
    FatalRemote { message: String },

    #[error("HTTP transport error: {message}")]
    Http { message: String },

    #[error("Invalid service response: {0}")]
    Json(#[from] serde_json::Error),

    // External tool errors
    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("External tool failed: {message}")]
    ToolFailed { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SpeechError {
    /// Process exit code for this error when it ends a command.
    pub fn exit_code(&self) -> i32 {
        match self {
            SpeechError::Configuration { .. }
            | SpeechError::ConfigInvalidValue { .. }
            | SpeechError::InputNotFound { .. } => 2,
            SpeechError::DocumentNotFound { .. } => 3,
            SpeechError::MalformedDocument { .. } => 4,
            SpeechError::NoSplitParts { .. } => 5,
            SpeechError::TransientRemote { .. } | SpeechError::FatalRemote { .. } => 6,
            _ => 1,
        }
    }

    /// Follow-up advice printed under the error line, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SpeechError::Configuration { .. } => {
                Some("export SPEECH_KEY=<your key> (and SPEECH_REGION for transcription)")
            }
            SpeechError::MalformedDocument { .. } => Some(
                "a leading <?xml ...?> declaration or comment is handled automatically; \
                 check that the <speak> root element is properly paired",
            ),
            SpeechError::NoSplitParts { .. } => {
                Some("run once without --no-split to create the parts")
            }
            _ => None,
        }
    }
}

#[cfg(feature = "azure")]
impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        SpeechError::Http {
            message: e.to_string(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SpeechError>;
