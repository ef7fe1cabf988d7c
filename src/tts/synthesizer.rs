use crate::audio::wav::{AudioParams, write_wav};
use crate::error::{Result, SpeechError};
use crate::remote::CancellationDetails;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What the service reported for one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Audio was written to the output path.
    Completed { bytes: u64 },
    /// The service refused or abandoned the request.
    Canceled(CancellationDetails),
}

/// Trait for SSML-to-audio synthesis.
///
/// This trait allows swapping implementations (Azure vs mock).
/// Transport failures are returned as `Err`; service-side refusals as
/// [`SynthesisOutcome::Canceled`].
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `ssml` and write the audio file to `output`.
    async fn speak_ssml_to_file(&self, ssml: &str, output: &Path) -> Result<SynthesisOutcome>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// One scripted response of [`MockSynthesizer`].
#[derive(Debug, Clone)]
pub enum MockStep {
    Complete,
    Cancel(CancellationDetails),
    TransportError(String),
}

/// Mock synthesizer for testing.
///
/// Replays scripted steps, then completes every further call. A completed
/// call writes a short WAV whose samples all equal the 1-based call number,
/// so the order of parts survives into concatenated output.
#[derive(Debug)]
pub struct MockSynthesizer {
    script: Mutex<VecDeque<MockStep>>,
    calls: Mutex<Vec<(String, PathBuf)>>,
    params: AudioParams,
    frames_per_call: usize,
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            params: AudioParams {
                channel_count: 1,
                sample_width: 2,
                frame_rate: 24000,
            },
            frames_per_call: 4,
        }
    }

    /// Queue responses returned before the default completion.
    pub fn with_script(self, steps: impl IntoIterator<Item = MockStep>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(steps);
        }
        self
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// SSML and output path of every request, in order.
    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn speak_ssml_to_file(&self, ssml: &str, output: &Path) -> Result<SynthesisOutcome> {
        let call_number = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| SpeechError::Other("mock call log poisoned".to_string()))?;
            calls.push((ssml.to_string(), output.to_path_buf()));
            calls.len()
        };
        let step = self
            .script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or(MockStep::Complete);

        match step {
            MockStep::Complete => {
                let frames = vec![call_number as i32; self.frames_per_call * self.params.channel_count as usize];
                write_wav(output, self.params, [frames.as_slice()])?;
                let bytes = std::fs::metadata(output)?.len();
                Ok(SynthesisOutcome::Completed { bytes })
            }
            MockStep::Cancel(details) => Ok(SynthesisOutcome::Canceled(details)),
            MockStep::TransportError(message) => Err(SpeechError::Http { message }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
