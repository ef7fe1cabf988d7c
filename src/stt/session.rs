//! One recognition stream per audio file.
//!
//! Results arrive on a channel while the stream runs; the session waits on the
//! channel until the stream reports that it stopped or was canceled, then
//! stops the stream.

use crate::error::Result;
use crate::remote::CancellationDetails;
use crate::stt::recognizer::{EventReceiver, RecognitionEvent, SpeechRecognizer};
use crate::stt::segment::AudioSegment;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// How a recognition stream ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    Stopped,
    Canceled(CancellationDetails),
    /// The configured wait limit elapsed first.
    TimedOut,
    /// The backend went away without a termination event.
    Disconnected,
}

/// Segments collected from one file, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub segments: Vec<AudioSegment>,
    pub end: SessionEnd,
}

pub struct RecognitionSession<'a, R: SpeechRecognizer + ?Sized> {
    recognizer: &'a R,
    timeout: Option<Duration>,
}

impl<'a, R: SpeechRecognizer + ?Sized> RecognitionSession<'a, R> {
    /// `timeout` of `None` waits for as long as the stream runs.
    pub fn new(recognizer: &'a R, timeout: Option<Duration>) -> Self {
        Self {
            recognizer,
            timeout,
        }
    }

    /// Recognize `audio` and return its segments.
    ///
    /// An empty transcript is a valid result.
    pub async fn transcribe(&self, audio: &Path, language: &str) -> Result<Transcript> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = self.recognizer.start_continuous(audio, language, tx)?;

        let mut segments = Vec::new();
        let end = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, collect_segments(&mut rx, &mut segments))
                .await
                .unwrap_or(SessionEnd::TimedOut),
            None => collect_segments(&mut rx, &mut segments).await,
        };
        handle.stop().await;

        tracing::debug!(
            file = %audio.display(),
            segments = segments.len(),
            end = ?end,
            "recognition finished"
        );
        Ok(Transcript { segments, end })
    }
}

async fn collect_segments(rx: &mut EventReceiver, segments: &mut Vec<AudioSegment>) -> SessionEnd {
    while let Some(event) = rx.recv().await {
        match event {
            RecognitionEvent::Recognized {
                offset_ticks,
                duration_ticks,
                text,
            } => {
                if !text.is_empty() {
                    segments.push(AudioSegment::from_ticks(offset_ticks, duration_ticks, text));
                }
            }
            RecognitionEvent::NoMatch => tracing::debug!("no match for utterance"),
            RecognitionEvent::SessionStopped => return SessionEnd::Stopped,
            RecognitionEvent::Canceled(details) => return SessionEnd::Canceled(details),
        }
    }
    SessionEnd::Disconnected
}
