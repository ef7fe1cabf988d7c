//! Command-line interface for speechcli
//!
//! Provides argument parsing using clap derive macros.

use crate::stt::subtitle::SubtitleFormat;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Batch transcription and SSML synthesis with Azure Speech
#[derive(Parser, Debug)]
#[command(
    name = "speechcli",
    version,
    about = "Batch transcription and SSML synthesis with Azure Speech"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose diagnostics (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a wait limit. Bare numbers are seconds; anything `humantime`
/// accepts (`90s`, `5m`, `1h30m`) works too.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe audio files to text and subtitles
    Transcribe(TranscribeArgs),

    /// Split an SSML document, synthesize each part and join the audio
    Synthesize(SynthesizeArgs),

    /// Check the encoder and credentials
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct TranscribeArgs {
    /// Audio file or directory of audio files
    #[arg(short, long, value_name = "PATH")]
    pub input: String,

    /// Recognition language (default: zh-CN)
    #[arg(short, long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Output directory (default: ~/speechcli/stt_out)
    #[arg(short, long, value_name = "DIR")]
    pub outdir: Option<String>,

    /// Write plain text
    #[arg(long)]
    pub txt: bool,

    /// Write tab-separated start/end/text
    #[arg(long)]
    pub tsv: bool,

    /// Write SRT subtitles
    #[arg(long)]
    pub srt: bool,

    /// Write WebVTT subtitles
    #[arg(long)]
    pub vtt: bool,

    /// Give up waiting on one file after this long (default: no limit)
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

impl TranscribeArgs {
    /// Formats selected by flags; all of them when none is set.
    pub fn requested_formats(&self) -> Vec<SubtitleFormat> {
        let selected: Vec<SubtitleFormat> = [
            (self.txt, SubtitleFormat::Text),
            (self.tsv, SubtitleFormat::Tsv),
            (self.srt, SubtitleFormat::Srt),
            (self.vtt, SubtitleFormat::Vtt),
        ]
        .into_iter()
        .filter_map(|(on, format)| on.then_some(format))
        .collect();

        if selected.is_empty() {
            SubtitleFormat::ALL.to_vec()
        } else {
            selected
        }
    }
}

#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// SSML document to synthesize
    #[arg(value_name = "SSML")]
    pub ssml: String,

    /// Output directory (default: out)
    #[arg(long, value_name = "DIR")]
    pub out: Option<String>,

    /// Maximum <voice> elements per part (default: 48)
    #[arg(long, value_name = "N")]
    pub max_voices: Option<usize>,

    /// Reuse parts from a previous split in <out>/parts
    #[arg(long)]
    pub no_split: bool,

    /// Also encode the final audio as MP3
    #[arg(long)]
    pub to_mp3: bool,

    /// Retries per part after the first attempt (default: 2)
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
}
