use crate::error::{Result, SpeechError};
use crate::remote::CancellationDetails;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events delivered by a continuous recognition stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// A final result for one utterance. Offsets are in 100ns ticks.
    Recognized {
        offset_ticks: u64,
        duration_ticks: u64,
        text: String,
    },
    /// Speech was detected but could not be recognized.
    NoMatch,
    /// The stream finished normally.
    SessionStopped,
    /// The stream was abandoned.
    Canceled(CancellationDetails),
}

pub type EventSender = mpsc::UnboundedSender<RecognitionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<RecognitionEvent>;

/// Handle to a running recognition stream.
#[derive(Debug, Default)]
pub struct RecognitionHandle {
    task: Option<JoinHandle<()>>,
}

impl RecognitionHandle {
    /// A stream driven by a background task.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// A stream that has already delivered all its events.
    pub fn finished() -> Self {
        Self { task: None }
    }

    /// Stop the stream, aborting its task if it is still running.
    pub async fn stop(self) {
        if let Some(task) = self.task {
            task.abort();
            if let Err(e) = task.await
                && !e.is_cancelled()
            {
                tracing::warn!(error = %e, "recognition task failed");
            }
        }
    }
}

/// Trait for continuous speech recognition.
///
/// This trait allows swapping implementations (Azure vs mock). Results are
/// pushed to `events` as they arrive; the stream ends with either
/// [`RecognitionEvent::SessionStopped`] or [`RecognitionEvent::Canceled`].
pub trait SpeechRecognizer: Send + Sync {
    /// Begin recognizing `audio` in `language`.
    fn start_continuous(
        &self,
        audio: &Path,
        language: &str,
        events: EventSender,
    ) -> Result<RecognitionHandle>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Mock recognizer for testing.
///
/// Replays a fixed event list per file name; files without a script get the
/// default list.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    default_events: Vec<RecognitionEvent>,
    scripts: HashMap<String, Vec<RecognitionEvent>>,
    fail_start: bool,
    hold_open: bool,
    held: Mutex<Vec<EventSender>>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl MockRecognizer {
    /// Create a mock that stops immediately without results.
    pub fn new() -> Self {
        Self {
            default_events: vec![RecognitionEvent::SessionStopped],
            ..Self::default()
        }
    }

    /// Events for files without their own script.
    pub fn with_events(mut self, events: Vec<RecognitionEvent>) -> Self {
        self.default_events = events;
        self
    }

    /// Events for the file named `file_name`.
    pub fn with_script(mut self, file_name: &str, events: Vec<RecognitionEvent>) -> Self {
        self.scripts.insert(file_name.to_string(), events);
        self
    }

    /// Fail every `start_continuous` call.
    pub fn with_start_failure(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Keep the event channel open after the scripted events, so the stream
    /// never ends on its own.
    pub fn holding_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Files and languages passed to `start_continuous`, in order.
    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn start_continuous(
        &self,
        audio: &Path,
        language: &str,
        events: EventSender,
    ) -> Result<RecognitionHandle> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((audio.to_path_buf(), language.to_string()));
        }
        if self.fail_start {
            return Err(SpeechError::Other(format!(
                "mock recognizer refused {}",
                audio.display()
            )));
        }

        let script = audio
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.scripts.get(n))
            .unwrap_or(&self.default_events);
        for event in script {
            if events.send(event.clone()).is_err() {
                break;
            }
        }

        if self.hold_open
            && let Ok(mut held) = self.held.lock()
        {
            held.push(events);
        }
        Ok(RecognitionHandle::finished())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
