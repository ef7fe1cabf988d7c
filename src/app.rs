//! Command orchestration for `transcribe` and `synthesize`.
//!
//! Both runners are generic over the remote backend so the same flow drives
//! the Azure clients in production and the mocks in tests.

use crate::audio::concat::{ConcatReport, concat_wavs};
use crate::audio::transcode::{CommandExecutor, FormatTranscoder, TranscodeOutcome};
use crate::error::{Result, SpeechError};
use crate::output::Console;
use crate::stt::input::{collect_inputs, is_audio_file};
use crate::stt::recognizer::SpeechRecognizer;
use crate::stt::session::{RecognitionSession, SessionEnd};
use crate::stt::subtitle::{SubtitleFormat, write_subtitles};
use crate::tts::normalize::count_voice_elements;
use crate::tts::runner::{RetryPolicy, SynthesisRunner};
use crate::tts::split::split_ssml;
use crate::tts::synthesizer::SpeechSynthesizer;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one `transcribe` run.
#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    pub input: PathBuf,
    pub language: String,
    pub output_dir: PathBuf,
    pub formats: Vec<SubtitleFormat>,
    pub timeout: Option<Duration>,
}

/// What a `transcribe` run did, file by file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionSummary {
    /// Files that produced output.
    pub transcribed: Vec<PathBuf>,
    /// Every output file written.
    pub written: Vec<PathBuf>,
    /// Inputs without a supported audio extension.
    pub skipped: Vec<PathBuf>,
    /// Files recognized without any text.
    pub empty: Vec<PathBuf>,
    /// Files whose recognition could not be started.
    pub failed: Vec<PathBuf>,
}

/// Transcribe every input file and write the requested formats.
///
/// Per-file problems are reported and the batch moves on; only an input that
/// yields no files at all is an error.
pub async fn run_transcription<R: SpeechRecognizer + ?Sized>(
    recognizer: &R,
    options: &TranscriptionOptions,
    console: &Console,
) -> Result<TranscriptionSummary> {
    let files = collect_inputs(&options.input)?;
    let session = RecognitionSession::new(recognizer, options.timeout);
    let mut summary = TranscriptionSummary::default();

    for path in files {
        if !is_audio_file(&path) {
            console.skip(&format!("unsupported extension: {}", path.display()));
            summary.skipped.push(path);
            continue;
        }

        console.step(
            "STT",
            &format!(
                "{}  →  {}  (lang={})",
                path.display(),
                options.output_dir.display(),
                options.language
            ),
        );

        let transcript = match session.transcribe(&path, &options.language).await {
            Ok(t) => t,
            Err(e) => {
                console.warn(&format!("recognition failed to start for {}: {e}", path.display()));
                summary.failed.push(path);
                continue;
            }
        };

        match &transcript.end {
            SessionEnd::Stopped => {}
            SessionEnd::Canceled(details) => {
                console.warn(&format!("recognition canceled for {}: {details}", path.display()));
            }
            SessionEnd::TimedOut => {
                console.warn(&format!(
                    "recognition timed out for {}; keeping partial results",
                    path.display()
                ));
            }
            SessionEnd::Disconnected => {
                tracing::warn!(file = %path.display(), "recognizer closed without a stop event");
            }
        }

        if transcript.segments.is_empty() {
            console.warn(&format!("empty recognition result: {}", path.display()));
            summary.empty.push(path);
            continue;
        }

        let base = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript".to_string());
        let written = write_subtitles(
            &transcript.segments,
            &options.output_dir,
            &base,
            &options.formats,
        )?;
        for (format, out) in written {
            console.info(&format!("  {}: {}", format.label(), out.display()));
            summary.written.push(out);
        }
        summary.transcribed.push(path);
    }

    Ok(summary)
}

/// Settings for one `synthesize` run.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub max_voices: usize,
    /// Reuse `<out>/parts/*.part*.ssml` instead of splitting `input`.
    pub no_split: bool,
    pub to_mp3: bool,
    pub retry: RetryPolicy,
}

/// Files produced by a successful `synthesize` run.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSummary {
    pub parts: Vec<PathBuf>,
    pub wavs: Vec<PathBuf>,
    pub concat: ConcatReport,
    pub mp3: Option<PathBuf>,
}

/// Layout of the synthesis output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub parts_dir: PathBuf,
    pub wavs_dir: PathBuf,
    stem: String,
}

impl OutputLayout {
    pub fn new(root: &Path, input: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "speech".to_string());
        Self {
            root: root.to_path_buf(),
            parts_dir: root.join("parts"),
            wavs_dir: root.join("wavs"),
            stem,
        }
    }

    /// `parts/<stem>.partNN.ssml`, 1-based.
    pub fn part_path(&self, index: usize) -> PathBuf {
        self.parts_dir
            .join(format!("{}.part{index:02}.ssml", self.stem))
    }

    /// `wavs/<part stem>.wav`
    pub fn wav_for_part(&self, part: &Path) -> PathBuf {
        let stem = part
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.wavs_dir.join(format!("{stem}.wav"))
    }

    pub fn final_wav(&self) -> PathBuf {
        self.root.join(format!("{}.final.wav", self.stem))
    }

    pub fn final_mp3(&self) -> PathBuf {
        self.root.join(format!("{}.final.mp3", self.stem))
    }
}

/// Whether `name` matches `*.part*.ssml`.
pub fn is_part_file(name: &str) -> bool {
    name.strip_suffix(".ssml")
        .is_some_and(|stem| stem.contains(".part"))
}

/// Part documents left by an earlier split, sorted by name.
pub fn find_existing_parts(parts_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut parts = Vec::new();
    if parts_dir.is_dir() {
        for entry in fs::read_dir(parts_dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_part_file);
            if matches && path.is_file() {
                parts.push(path);
            }
        }
    }
    parts.sort();
    if parts.is_empty() {
        return Err(SpeechError::NoSplitParts {
            dir: parts_dir.to_path_buf(),
        });
    }
    Ok(parts)
}

/// Split `ssml` into part files under the layout's `parts` directory.
fn write_parts(
    ssml: &str,
    layout: &OutputLayout,
    max_voices: usize,
    console: &Console,
) -> Result<Vec<PathBuf>> {
    console.info(&format!(
        "input SSML contains {} <voice> elements",
        count_voice_elements(ssml)
    ));

    let parts = split_ssml(ssml, max_voices)?;
    let mut paths = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let path = layout.part_path(i + 1);
        fs::write(&path, part)?;
        paths.push(path);
    }

    console.info(&format!(
        "split into {} parts (at most {max_voices} <voice> each)",
        paths.len()
    ));
    Ok(paths)
}

/// Split, synthesize, concatenate and optionally encode one document.
///
/// The first part that cannot be synthesized aborts the run.
pub async fn run_synthesis<S, E>(
    synthesizer: &S,
    transcoder: &FormatTranscoder<E>,
    options: &SynthesisOptions,
    console: &Console,
) -> Result<SynthesisSummary>
where
    S: SpeechSynthesizer + ?Sized,
    E: CommandExecutor,
{
    if !options.input.is_file() {
        return Err(SpeechError::DocumentNotFound {
            path: options.input.clone(),
        });
    }

    let layout = OutputLayout::new(&options.output_dir, &options.input);
    fs::create_dir_all(&layout.parts_dir)?;
    fs::create_dir_all(&layout.wavs_dir)?;

    let parts = if options.no_split {
        let parts = find_existing_parts(&layout.parts_dir)?;
        console.info(&format!("reusing {} existing parts", parts.len()));
        parts
    } else {
        let ssml = fs::read_to_string(&options.input)?;
        write_parts(&ssml, &layout, options.max_voices, console)?
    };

    let runner = SynthesisRunner::new(synthesizer, options.retry);
    let mut wavs = Vec::with_capacity(parts.len());
    for part in &parts {
        let wav = layout.wav_for_part(part);
        let ssml = fs::read_to_string(part)?;
        console.step("TTS", &part.display().to_string());

        match runner.synthesize_to_wav(&ssml, &wav).await {
            Ok(report) => {
                if report.attempts > 1 {
                    console.success(&format!(
                        "synthesized: {} (after {} attempts)",
                        wav.display(),
                        report.attempts
                    ));
                } else {
                    console.success(&format!("synthesized: {}", wav.display()));
                }
                wavs.push(wav);
            }
            Err(e) => {
                console.fail(&format!("{} failed; aborting", part.display()));
                return Err(e);
            }
        }
    }

    let concat = concat_wavs(&wavs, &layout.final_wav())?;
    console.success(&format!(
        "concatenated {} parts: {}",
        concat.parts,
        concat.output.display()
    ));

    let mp3 = if options.to_mp3 {
        let target = layout.final_mp3();
        match transcoder.wav_to_mp3(&concat.output, &target)? {
            TranscodeOutcome::Written => {
                console.success(&format!("MP3: {}", target.display()));
                Some(target)
            }
            TranscodeOutcome::EncoderMissing { tool } => {
                console.warn(&format!("{tool} not found; skipping MP3 export"));
                None
            }
        }
    } else {
        None
    };

    console.success(&format!("done. output directory: {}", layout.root.display()));
    Ok(SynthesisSummary {
        parts,
        wavs,
        concat,
        mp3,
    })
}
