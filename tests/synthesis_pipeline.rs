use speechcli::app::{SynthesisOptions, run_synthesis};
use speechcli::audio::transcode::{CommandExecutor, FormatTranscoder};
use speechcli::audio::wav::AudioFileHandle;
use speechcli::output::Console;
use speechcli::remote::CancellationDetails;
use speechcli::tts::runner::RetryPolicy;
use speechcli::tts::synthesizer::{MockStep, MockSynthesizer};
use speechcli::{Result, SpeechError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Stands in for ffmpeg: touches the output file, or pretends to be missing.
#[derive(Default)]
struct FakeEncoder {
    missing: bool,
}

impl CommandExecutor for FakeEncoder {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        if self.missing {
            return Err(SpeechError::ToolNotFound {
                tool: command.to_string(),
            });
        }
        if let Some(output) = args.last() {
            fs::write(output, b"ID3")?;
        }
        Ok(String::new())
    }
}

fn lesson(voices: usize) -> String {
    let mut body = String::new();
    for i in 1..=voices {
        body.push_str(&format!(
            "  <voice name=\"zh-CN-XiaoxiaoNeural\">Sentence {i}.</voice>\n"
        ));
    }
    format!(
        "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- lesson -->\n\
         <speak version=\"1.0\" xml:lang=\"zh-CN\">\n{body}</speak>\n"
    )
}

fn write_input(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn options(input: &Path, out: &Path, max_voices: usize) -> SynthesisOptions {
    SynthesisOptions {
        input: input.to_path_buf(),
        output_dir: out.to_path_buf(),
        max_voices,
        no_split: false,
        to_mp3: false,
        retry: RetryPolicy {
            retries: 2,
            backoff_step: Duration::ZERO,
        },
    }
}

fn transcoder(encoder: FakeEncoder) -> FormatTranscoder<FakeEncoder> {
    FormatTranscoder::new(encoder, "ffmpeg", "160k")
}

#[tokio::test]
async fn splits_synthesizes_and_concatenates_in_order() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "lesson01.ssml", &lesson(5));
    let out = dir.path().join("out");
    let synth = MockSynthesizer::new();

    let summary = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &options(&input, &out, 2),
        &Console::quiet(),
    )
    .await
    .unwrap();

    assert_eq!(
        summary.parts,
        vec![
            out.join("parts/lesson01.part01.ssml"),
            out.join("parts/lesson01.part02.ssml"),
            out.join("parts/lesson01.part03.ssml"),
        ]
    );
    assert_eq!(summary.wavs[2], out.join("wavs/lesson01.part03.wav"));
    assert_eq!(summary.concat.output, out.join("lesson01.final.wav"));
    assert!(summary.mp3.is_none());

    // Every part is a standalone document with the original root tag
    for part in &summary.parts {
        let text = fs::read_to_string(part).unwrap();
        assert!(text.starts_with("<speak version=\"1.0\" xml:lang=\"zh-CN\">\n"));
        assert!(text.ends_with("\n</speak>"));
    }
    let last = fs::read_to_string(&summary.parts[2]).unwrap();
    assert_eq!(last.matches("<voice").count(), 1);

    // Mock call N writes samples equal to N, so order is visible in the output
    let final_wav = out.join("lesson01.final.wav");
    assert_eq!(AudioFileHandle::open(&final_wav).unwrap().frame_count(), 12);
    let samples: Vec<i32> = hound::WavReader::open(&final_wav)
        .unwrap()
        .samples::<i32>()
        .map(|s| s.unwrap())
        .collect();
    assert_eq!(samples, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
    assert_eq!(synth.call_count(), 3);
}

#[tokio::test]
async fn transient_failures_are_retried_to_success() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let out = dir.path().join("out");
    let synth = MockSynthesizer::new().with_script([
        MockStep::TransportError("connection reset by peer".to_string()),
        MockStep::Cancel(CancellationDetails::new(
            "Error",
            "ConnectionFailure",
            "websocket closed",
        )),
    ]);

    let summary = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &options(&input, &out, 48),
        &Console::quiet(),
    )
    .await
    .unwrap();

    assert_eq!(synth.call_count(), 3);
    assert_eq!(summary.concat.parts, 1);
    assert!(out.join("a.final.wav").exists());
}

#[tokio::test]
async fn fatal_failure_aborts_before_concatenation() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(4));
    let out = dir.path().join("out");
    let synth = MockSynthesizer::new().with_script([
        MockStep::Complete,
        MockStep::Cancel(CancellationDetails::new(
            "Error",
            "BadRequest",
            "HTTP 400 Bad Request: invalid SSML",
        )),
    ]);

    let err = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &options(&input, &out, 2),
        &Console::quiet(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SpeechError::FatalRemote { .. }));
    assert_eq!(err.exit_code(), 6);
    assert_eq!(synth.call_count(), 2);
    assert!(!out.join("a.final.wav").exists());
}

#[tokio::test]
async fn exhausted_retries_exit_with_remote_failure() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let out = dir.path().join("out");
    let timeout = || {
        MockStep::Cancel(CancellationDetails::new(
            "Error",
            "ServiceTimeout",
            "HTTP 504 Gateway Timeout",
        ))
    };
    let synth = MockSynthesizer::new().with_script([timeout(), timeout(), timeout()]);

    let err = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &options(&input, &out, 48),
        &Console::quiet(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), 6);
    assert_eq!(synth.call_count(), 3);
}

#[tokio::test]
async fn missing_document_exits_3() {
    let dir = TempDir::new().unwrap();
    let synth = MockSynthesizer::new();
    let err = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &options(&dir.path().join("nope.ssml"), &dir.path().join("out"), 48),
        &Console::quiet(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SpeechError::DocumentNotFound { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(synth.call_count(), 0);
}

#[tokio::test]
async fn document_without_root_exits_4() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "bad.ssml", "<voice name=\"x\">no root</voice>");
    let synth = MockSynthesizer::new();

    let err = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &options(&input, &dir.path().join("out"), 48),
        &Console::quiet(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SpeechError::MalformedDocument { .. }));
    assert_eq!(err.exit_code(), 4);
    assert!(err.hint().is_some());
    assert_eq!(synth.call_count(), 0);
}

#[tokio::test]
async fn zero_max_voices_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let err = run_synthesis(
        &MockSynthesizer::new(),
        &transcoder(FakeEncoder::default()),
        &options(&input, &dir.path().join("out"), 0),
        &Console::quiet(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpeechError::ConfigInvalidValue { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn no_split_without_parts_exits_5() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let mut opts = options(&input, &dir.path().join("out"), 48);
    opts.no_split = true;

    let err = run_synthesis(
        &MockSynthesizer::new(),
        &transcoder(FakeEncoder::default()),
        &opts,
        &Console::quiet(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpeechError::NoSplitParts { .. }));
    assert_eq!(err.exit_code(), 5);
}

#[tokio::test]
async fn no_split_reuses_existing_parts_sorted() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", "ignored when not splitting");
    let out = dir.path().join("out");
    let parts = out.join("parts");
    fs::create_dir_all(&parts).unwrap();
    fs::write(parts.join("a.part02.ssml"), "<speak>two</speak>").unwrap();
    fs::write(parts.join("a.part01.ssml"), "<speak>one</speak>").unwrap();
    fs::write(parts.join("readme.txt"), "not a part").unwrap();

    let mut opts = options(&input, &out, 48);
    opts.no_split = true;
    let synth = MockSynthesizer::new();
    let summary = run_synthesis(
        &synth,
        &transcoder(FakeEncoder::default()),
        &opts,
        &Console::quiet(),
    )
    .await
    .unwrap();

    let sent: Vec<String> = synth.calls().into_iter().map(|(ssml, _)| ssml).collect();
    assert_eq!(sent, vec!["<speak>one</speak>", "<speak>two</speak>"]);
    assert_eq!(summary.wavs[0], out.join("wavs/a.part01.wav"));
}

#[tokio::test]
async fn no_split_ignores_max_voices() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let out = dir.path().join("out");
    let parts = out.join("parts");
    fs::create_dir_all(&parts).unwrap();
    fs::write(parts.join("a.part01.ssml"), "<speak>one</speak>").unwrap();

    let mut opts = options(&input, &out, 0);
    opts.no_split = true;
    let summary = run_synthesis(
        &MockSynthesizer::new(),
        &transcoder(FakeEncoder::default()),
        &opts,
        &Console::quiet(),
    )
    .await
    .unwrap();

    assert_eq!(summary.concat.parts, 1);
    assert!(out.join("a.final.wav").exists());
}

#[tokio::test]
async fn mp3_export_invokes_encoder() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let out = dir.path().join("out");
    let mut opts = options(&input, &out, 48);
    opts.to_mp3 = true;
    let transcoder = transcoder(FakeEncoder::default());

    let summary = run_synthesis(&MockSynthesizer::new(), &transcoder, &opts, &Console::quiet())
        .await
        .unwrap();

    assert_eq!(summary.mp3, Some(out.join("a.final.mp3")));
    assert!(out.join("a.final.mp3").exists());
}

#[tokio::test]
async fn missing_encoder_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a.ssml", &lesson(1));
    let out = dir.path().join("out");
    let mut opts = options(&input, &out, 48);
    opts.to_mp3 = true;
    let encoder = FakeEncoder { missing: true };

    let summary = run_synthesis(
        &MockSynthesizer::new(),
        &transcoder(encoder),
        &opts,
        &Console::quiet(),
    )
    .await
    .unwrap();

    assert!(summary.mp3.is_none());
    assert!(out.join("a.final.wav").exists());
}
