use crate::defaults;
use crate::error::{Result, SpeechError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub transcribe: TranscribeConfig,
    pub synthesize: SynthesizeConfig,
    pub service: ServiceConfig,
}

/// Transcription pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscribeConfig {
    pub language: String,
    pub output_dir: String,
    /// Upper bound on waiting for a recognition stream to end.
    /// Unset means wait until the service signals completion.
    pub timeout_secs: Option<u64>,
}

/// Synthesis pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesizeConfig {
    pub output_dir: String,
    pub max_voices: usize,
    pub retries: u32,
    pub backoff_secs: f64,
    pub output_format: String,
    pub mp3_bitrate: String,
    pub ffmpeg_path: Option<String>,
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub request_timeout_secs: u64,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            output_dir: defaults::TRANSCRIBE_OUTPUT_DIR.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for SynthesizeConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::SYNTHESIZE_OUTPUT_DIR.to_string(),
            max_voices: defaults::MAX_VOICES_PER_PART,
            retries: defaults::SYNTHESIS_RETRIES,
            backoff_secs: defaults::SYNTHESIS_BACKOFF_SECS,
            output_format: defaults::SYNTHESIS_OUTPUT_FORMAT.to_string(),
            mp3_bitrate: defaults::MP3_BITRATE.to_string(),
            ffmpeg_path: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SynthesizeConfig {
    /// Backoff unit between synthesis attempts.
    pub fn backoff_step(&self) -> Duration {
        Duration::try_from_secs_f64(self.backoff_secs).unwrap_or(Duration::ZERO)
    }

    /// Encoder binary for the MP3 derivative.
    pub fn encoder(&self) -> String {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| defaults::FFMPEG_BINARY.to_string())
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - FFMPEG_PATH → synthesize.ffmpeg_path
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::with_env_overrides`] with an explicit variable lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = non_empty(&lookup, "FFMPEG_PATH") {
            self.synthesize.ffmpeg_path = Some(path);
        }
        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/speechcli/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("speechcli")
            .join("config.toml")
    }
}

/// Where requests for a subscription are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTarget {
    Region(String),
    Endpoint(String),
}

/// Subscription key plus the service location it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub target: ServiceTarget,
}

// Keeps the key out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("target", &self.target)
            .finish()
    }
}

impl Credentials {
    /// Credentials for transcription from the process environment.
    pub fn for_transcription() -> Result<Self> {
        Self::for_transcription_from(|name| std::env::var(name).ok())
    }

    /// Credentials for synthesis from the process environment.
    pub fn for_synthesis() -> Result<Self> {
        Self::for_synthesis_from(|name| std::env::var(name).ok())
    }

    /// Transcription needs `SPEECH_KEY` and one of `SPEECH_REGION` /
    /// `SPEECH_ENDPOINT`. The region wins when both are set.
    pub fn for_transcription_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = non_empty(&lookup, "SPEECH_KEY").ok_or_else(|| SpeechError::Configuration {
            message: "missing environment variable SPEECH_KEY".to_string(),
        })?;

        let target = match (
            non_empty(&lookup, "SPEECH_REGION"),
            non_empty(&lookup, "SPEECH_ENDPOINT"),
        ) {
            (Some(region), _) => ServiceTarget::Region(region),
            (None, Some(endpoint)) => ServiceTarget::Endpoint(endpoint),
            (None, None) => {
                return Err(SpeechError::Configuration {
                    message: "missing SPEECH_REGION or SPEECH_ENDPOINT (set one)".to_string(),
                });
            }
        };

        Ok(Self { key, target })
    }

    /// Synthesis accepts `SPEECH_KEY` or `AZURE_SPEECH_KEY`, and
    /// `SPEECH_REGION` or `AZURE_SPEECH_REGION`, falling back to the
    /// default region.
    pub fn for_synthesis_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = non_empty(&lookup, "SPEECH_KEY")
            .or_else(|| non_empty(&lookup, "AZURE_SPEECH_KEY"))
            .ok_or_else(|| SpeechError::Configuration {
                message: "missing environment variable SPEECH_KEY (export SPEECH_KEY=<your key>)"
                    .to_string(),
            })?;

        let region = non_empty(&lookup, "SPEECH_REGION")
            .or_else(|| non_empty(&lookup, "AZURE_SPEECH_REGION"))
            .unwrap_or_else(|| defaults::DEFAULT_SYNTHESIS_REGION.to_string());

        Ok(Self {
            key,
            target: ServiceTarget::Region(region),
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.transcribe.language, "zh-CN");
        assert_eq!(config.transcribe.output_dir, "~/speechcli/stt_out");
        assert_eq!(config.transcribe.timeout_secs, None);

        assert_eq!(config.synthesize.output_dir, "out");
        assert_eq!(config.synthesize.max_voices, 48);
        assert_eq!(config.synthesize.retries, 2);
        assert_eq!(config.synthesize.backoff_secs, 1.5);
        assert_eq!(config.synthesize.output_format, "riff-24khz-16bit-mono-pcm");
        assert_eq!(config.synthesize.mp3_bitrate, "160k");
        assert_eq!(config.synthesize.ffmpeg_path, None);

        assert_eq!(config.service.request_timeout_secs, 600);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [transcribe]
            language = "en-US"
            timeout_secs = 900

            [synthesize]
            max_voices = 20
            retries = 4
        "#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.transcribe.language, "en-US");
        assert_eq!(config.transcribe.timeout_secs, Some(900));
        assert_eq!(config.synthesize.max_voices, 20);
        assert_eq!(config.synthesize.retries, 4);
        // Unspecified fields keep their defaults
        assert_eq!(config.transcribe.output_dir, "~/speechcli/stt_out");
        assert_eq!(config.synthesize.backoff_secs, 1.5);
    }

    #[test]
    fn test_load_or_default_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[synthesize\nmax_voices = ").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_ffmpeg_override_from_env() {
        let config = Config::default().with_overrides_from(env(&[("FFMPEG_PATH", "/opt/ff")]));
        assert_eq!(config.synthesize.ffmpeg_path.as_deref(), Some("/opt/ff"));

        let config = Config::default().with_overrides_from(env(&[("FFMPEG_PATH", "")]));
        assert_eq!(config.synthesize.ffmpeg_path, None);
    }

    #[test]
    fn test_backoff_step_from_seconds() {
        let mut config = SynthesizeConfig::default();
        assert_eq!(config.backoff_step(), Duration::from_millis(1500));
        config.backoff_secs = -1.0;
        assert_eq!(config.backoff_step(), Duration::ZERO);
    }

    #[test]
    fn test_transcription_credentials_require_key() {
        let err = Credentials::for_transcription_from(env(&[("SPEECH_REGION", "westus")]))
            .unwrap_err();
        assert!(err.to_string().contains("SPEECH_KEY"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_transcription_credentials_require_region_or_endpoint() {
        let err = Credentials::for_transcription_from(env(&[("SPEECH_KEY", "k")])).unwrap_err();
        assert!(err.to_string().contains("SPEECH_REGION"));
    }

    #[test]
    fn test_transcription_prefers_region_over_endpoint() {
        let creds = Credentials::for_transcription_from(env(&[
            ("SPEECH_KEY", "k"),
            ("SPEECH_REGION", "westus"),
            ("SPEECH_ENDPOINT", "https://example.invalid"),
        ]))
        .unwrap();
        assert_eq!(creds.target, ServiceTarget::Region("westus".to_string()));
    }

    #[test]
    fn test_transcription_uses_endpoint_without_region() {
        let creds = Credentials::for_transcription_from(env(&[
            ("SPEECH_KEY", "k"),
            ("SPEECH_ENDPOINT", "https://example.invalid"),
        ]))
        .unwrap();
        assert_eq!(
            creds.target,
            ServiceTarget::Endpoint("https://example.invalid".to_string())
        );
    }

    #[test]
    fn test_synthesis_accepts_alternate_names_and_default_region() {
        let creds = Credentials::for_synthesis_from(env(&[("AZURE_SPEECH_KEY", "k2")])).unwrap();
        assert_eq!(creds.key, "k2");
        assert_eq!(
            creds.target,
            ServiceTarget::Region("canadacentral".to_string())
        );

        let creds = Credentials::for_synthesis_from(env(&[
            ("SPEECH_KEY", "k1"),
            ("AZURE_SPEECH_KEY", "k2"),
            ("AZURE_SPEECH_REGION", "eastus"),
        ]))
        .unwrap();
        assert_eq!(creds.key, "k1");
        assert_eq!(creds.target, ServiceTarget::Region("eastus".to_string()));
    }

    #[test]
    fn test_synthesis_missing_key_is_configuration_error() {
        let err = Credentials::for_synthesis_from(env(&[("SPEECH_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, SpeechError::Configuration { .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials {
            key: "super-secret".to_string(),
            target: ServiceTarget::Region("westus".to_string()),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("westus"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("out"), PathBuf::from("out"));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/speechcli"), home.join("speechcli"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
