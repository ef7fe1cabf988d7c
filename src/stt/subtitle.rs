//! Rendering segments as text, TSV, SRT and WebVTT.

use crate::error::Result;
use crate::stt::segment::AudioSegment;
use std::fs;
use std::path::{Path, PathBuf};

/// Output formats produced from one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleFormat {
    Text,
    Tsv,
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub const ALL: [SubtitleFormat; 4] = [
        SubtitleFormat::Text,
        SubtitleFormat::Tsv,
        SubtitleFormat::Srt,
        SubtitleFormat::Vtt,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Text => "txt",
            SubtitleFormat::Tsv => "tsv",
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    /// Label used in status lines.
    pub fn label(self) -> &'static str {
        match self {
            SubtitleFormat::Text => "TXT",
            SubtitleFormat::Tsv => "TSV",
            SubtitleFormat::Srt => "SRT",
            SubtitleFormat::Vtt => "VTT",
        }
    }

    pub fn render(self, segments: &[AudioSegment]) -> String {
        match self {
            SubtitleFormat::Text => render_text(segments),
            SubtitleFormat::Tsv => render_tsv(segments),
            SubtitleFormat::Srt => render_srt(segments),
            SubtitleFormat::Vtt => render_vtt(segments),
        }
    }
}

/// Split seconds into (hours, minutes, seconds, milliseconds), rounding to
/// the nearest millisecond first. Negative input clamps to zero.
fn split_timestamp(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
}

/// `HH:MM:SS,mmm`
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// `HH:MM:SS.mmm`
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

fn render_text(segments: &[AudioSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&seg.text);
        out.push('\n');
    }
    out
}

fn render_tsv(segments: &[AudioSegment]) -> String {
    let mut out = String::from("start_s\tend_s\ttext\n");
    for seg in segments {
        out.push_str(&format!("{:.2}\t{:.2}\t{}\n", seg.start, seg.end, seg.text));
    }
    out
}

fn render_srt(segments: &[AudioSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(seg.start),
            format_srt_timestamp(seg.end),
            seg.text
        ));
    }
    out
}

fn render_vtt(segments: &[AudioSegment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for seg in segments {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_timestamp(seg.start),
            format_vtt_timestamp(seg.end),
            seg.text
        ));
    }
    out
}

/// Write `segments` to `<dir>/<base>.<ext>` for each requested format.
///
/// Returns the written paths in the order the formats were given.
pub fn write_subtitles(
    segments: &[AudioSegment],
    dir: &Path,
    base: &str,
    formats: &[SubtitleFormat],
) -> Result<Vec<(SubtitleFormat, PathBuf)>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(format!("{base}.{}", format.extension()));
        fs::write(&path, format.render(segments))?;
        tracing::debug!(path = %path.display(), format = format.label(), "wrote transcript");
        written.push((format, path));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<AudioSegment> {
        vec![
            AudioSegment::new(0.0, 1.5, "A"),
            AudioSegment::new(1.5, 3.25, "B"),
        ]
    }

    #[test]
    fn srt_matches_reference_output() {
        assert_eq!(
            SubtitleFormat::Srt.render(&sample()),
            "1\n00:00:00,000 --> 00:00:01,500\nA\n\n2\n00:00:01,500 --> 00:00:03,250\nB\n\n"
        );
    }

    #[test]
    fn vtt_matches_reference_output() {
        assert_eq!(
            SubtitleFormat::Vtt.render(&sample()),
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nA\n\n00:00:01.500 --> 00:00:03.250\nB\n\n"
        );
    }

    #[test]
    fn tsv_has_header_and_two_decimals() {
        let segments = vec![AudioSegment::new(0.004, 1.237, "hello world")];
        assert_eq!(
            SubtitleFormat::Tsv.render(&segments),
            "start_s\tend_s\ttext\n0.00\t1.24\thello world\n"
        );
    }

    #[test]
    fn text_is_one_line_per_segment() {
        assert_eq!(SubtitleFormat::Text.render(&sample()), "A\nB\n");
    }

    #[test]
    fn empty_transcript_renders_headers_only() {
        assert_eq!(SubtitleFormat::Srt.render(&[]), "");
        assert_eq!(SubtitleFormat::Vtt.render(&[]), "WEBVTT\n\n");
        assert_eq!(SubtitleFormat::Tsv.render(&[]), "start_s\tend_s\ttext\n");
    }

    #[test]
    fn timestamps_round_before_splitting() {
        assert_eq!(format_srt_timestamp(1.9996), "00:00:02,000");
        assert_eq!(format_vtt_timestamp(59.9999), "00:01:00.000");
        assert_eq!(format_srt_timestamp(3725.042), "01:02:05,042");
        assert_eq!(format_srt_timestamp(-0.5), "00:00:00,000");
    }

    #[test]
    fn writes_requested_formats_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let written = write_subtitles(
            &sample(),
            &out,
            "talk",
            &[SubtitleFormat::Srt, SubtitleFormat::Text],
        )
        .unwrap();

        assert_eq!(
            written,
            vec![
                (SubtitleFormat::Srt, out.join("talk.srt")),
                (SubtitleFormat::Text, out.join("talk.txt")),
            ]
        );
        assert_eq!(fs::read_to_string(out.join("talk.txt")).unwrap(), "A\nB\n");
        assert!(!out.join("talk.vtt").exists());
    }
}
