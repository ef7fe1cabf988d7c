//! Synthesis of one part with bounded retry.

use crate::defaults;
use crate::error::{Result, SpeechError};
use crate::tts::synthesizer::{SpeechSynthesizer, SynthesisOutcome};
use std::path::Path;
use std::time::Duration;

/// How often and how patiently a part is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Attempt `n` is followed by a wait of `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: defaults::SYNTHESIS_RETRIES,
            backoff_step: Duration::from_secs_f64(defaults::SYNTHESIS_BACKOFF_SECS),
        }
    }
}

/// Attempt counter for a single part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.retries.saturating_add(1),
        }
    }

    /// Start the next attempt.
    fn begin(&mut self) {
        self.attempt += 1;
    }

    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

/// Summary of a successful part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisReport {
    pub attempts: u32,
    pub bytes: u64,
}

/// Drives a [`SpeechSynthesizer`] for one part at a time.
pub struct SynthesisRunner<'a, S: SpeechSynthesizer + ?Sized> {
    synthesizer: &'a S,
    policy: RetryPolicy,
}

impl<'a, S: SpeechSynthesizer + ?Sized> SynthesisRunner<'a, S> {
    pub fn new(synthesizer: &'a S, policy: RetryPolicy) -> Self {
        Self {
            synthesizer,
            policy,
        }
    }

    /// Synthesize `ssml` into `output`.
    ///
    /// Transport errors and network-flavoured cancellations are retried with
    /// linear backoff until the budget runs out. Any other cancellation fails
    /// at once.
    pub async fn synthesize_to_wav(&self, ssml: &str, output: &Path) -> Result<SynthesisReport> {
        let mut state = RetryState::new(&self.policy);

        loop {
            state.begin();
            tracing::debug!(
                attempt = state.attempt,
                max_attempts = state.max_attempts,
                backend = self.synthesizer.name(),
                output = %output.display(),
                "synthesizing part"
            );

            let message = match self.synthesizer.speak_ssml_to_file(ssml, output).await {
                Ok(SynthesisOutcome::Completed { bytes }) => {
                    return Ok(SynthesisReport {
                        attempts: state.attempt,
                        bytes,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt = state.attempt, error = %e, "synthesis request failed");
                    e.to_string()
                }
                Ok(SynthesisOutcome::Canceled(details)) => {
                    tracing::warn!(
                        attempt = state.attempt,
                        reason = %details.reason,
                        code = %details.code,
                        details = %details.details,
                        "synthesis canceled"
                    );
                    if !details.is_transient() {
                        discard_partial(output);
                        return Err(SpeechError::FatalRemote {
                            message: format!("synthesis canceled: {details}"),
                        });
                    }
                    format!("synthesis canceled: {details}")
                }
            };

            discard_partial(output);
            if !state.can_retry() {
                return Err(SpeechError::TransientRemote {
                    message: format!("{message} (gave up after {} attempts)", state.attempt),
                });
            }

            let wait = defaults::backoff_for_attempt(self.policy.backoff_step, state.attempt);
            tracing::info!(
                "retrying ({}/{}) in {:.1}s",
                state.attempt,
                self.policy.retries,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

fn discard_partial(output: &Path) {
    if output.exists()
        && let Err(e) = std::fs::remove_file(output)
    {
        tracing::warn!(path = %output.display(), error = %e, "failed to remove partial audio");
    }
}
